//! API request and response models.

use serde::{Deserialize, Serialize};

use guardme_core::history::{ActionCounts, CategoryDistribution, HistoryEntry};
use guardme_core::session::{SessionState, SubmitOutcome};

/// Request body for PUT /api/input.
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    /// New contents of the input box.
    pub text: String,
}

/// Request body for POST /api/analyze.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// Text to analyze; when absent the current input text is used.
    #[serde(default)]
    pub text: Option<String>,
}

/// Form body for POST /analyze.
#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    pub text: String,
}

/// Session snapshot with its category distribution.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub state: SessionState,
    pub distribution: CategoryDistribution,
}

impl From<SessionState> for SessionResponse {
    fn from(state: SessionState) -> Self {
        let distribution = guardme_core::history::aggregate(&state.history);
        Self {
            state,
            distribution,
        }
    }
}

/// Response body for POST /api/analyze.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// `classified`, `failed` or `skipped`.
    pub outcome: &'static str,
    /// The recorded entry on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<HistoryEntry>,
    /// Session after the submission.
    pub session: SessionResponse,
}

impl AnalyzeResponse {
    /// Builds a response from a submit outcome and the resulting state.
    pub fn new(outcome: SubmitOutcome, state: SessionState) -> Self {
        let name = outcome.as_str();
        let entry = match outcome {
            SubmitOutcome::Classified(entry) => Some(entry),
            _ => None,
        };
        Self {
            outcome: name,
            entry,
            session: state.into(),
        }
    }
}

/// Response body for GET /api/stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_scans: usize,
    pub blocked_count: usize,
    pub warned_count: usize,
    pub allowed_count: usize,
    pub category_counts: CategoryDistribution,
}

impl StatsResponse {
    /// Builds the stats body from the session aggregates.
    pub fn new(actions: ActionCounts, categories: CategoryDistribution) -> Self {
        Self {
            total_scans: actions.total(),
            blocked_count: actions.blocked,
            warned_count: actions.warned,
            allowed_count: actions.allowed,
            category_counts: categories,
        }
    }
}
