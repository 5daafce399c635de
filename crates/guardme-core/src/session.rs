//! Session state controller.
//!
//! Owns the input text, the in-flight flag, the latest verdict or error and
//! the ordered history for one session. All mutation goes through
//! [`SessionController::submit`], [`SessionController::submit_text`],
//! [`SessionController::clear`] and [`SessionController::set_input_text`];
//! readers take a cloned
//! [`SessionState`] snapshot.
//!
//! At most one classification is in flight per controller. A `submit` issued
//! while another is pending returns [`SubmitOutcome::Busy`] without touching
//! the state.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::{ClassificationResult, ContentClassifier};
use crate::history::{
    aggregate, aggregate_actions, ActionCounts, CategoryDistribution, HistoryEntry,
};

/// Message shown for any failed classification.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze content. Please try again.";

/// Snapshot of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Current contents of the input box.
    pub input_text: String,
    /// True while a classification is pending.
    pub is_loading: bool,
    /// Latest verdict, if the last submission succeeded.
    pub current_result: Option<ClassificationResult>,
    /// User-facing error, if the last submission failed.
    pub current_error: Option<String>,
    /// Classified submissions, most recent first.
    pub history: Vec<HistoryEntry>,
}

/// Result of a [`SessionController::submit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Skipped,
    /// Another submission is in flight; nothing happened.
    Busy,
    /// The text was classified and recorded.
    Classified(HistoryEntry),
    /// Classification failed; the error message is set.
    Failed,
}

impl SubmitOutcome {
    /// Short name for logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Busy => "busy",
            Self::Classified(_) => "classified",
            Self::Failed => "failed",
        }
    }
}

/// Clears the in-flight flag when dropped, including when the submitting
/// future is cancelled.
struct LoadingGuard<'a> {
    state: &'a RwLock<SessionState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.write().is_loading = false;
    }
}

/// Controller for a single session.
pub struct SessionController {
    classifier: Arc<dyn ContentClassifier>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("classifier", &self.classifier.name())
            .field("state", &*self.state.read())
            .finish()
    }
}

impl SessionController {
    /// Creates an empty session backed by `classifier`.
    pub fn new(classifier: Arc<dyn ContentClassifier>) -> Self {
        Self {
            classifier,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Returns true while a classification is pending.
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    /// Returns the category distribution over the whole history.
    pub fn distribution(&self) -> CategoryDistribution {
        aggregate(&self.state.read().history)
    }

    /// Returns the action counts over the whole history.
    pub fn action_counts(&self) -> ActionCounts {
        aggregate_actions(&self.state.read().history)
    }

    /// Replaces the input text. No validation happens here.
    pub fn set_input_text(&self, text: impl Into<String>) {
        self.state.write().input_text = text.into();
    }

    /// Resets the input, verdict and error. History is kept.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.input_text.clear();
        state.current_result = None;
        state.current_error = None;
    }

    /// Submits the current input text.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.state.read().input_text.clone();
        self.submit(&text).await
    }

    /// Replaces the input text with `text` and submits it.
    ///
    /// The input is replaced and the in-flight flag claimed under one lock, so
    /// a call that returns [`SubmitOutcome::Busy`] leaves the pending
    /// submission's input untouched.
    pub async fn submit_text(&self, text: impl Into<String>) -> SubmitOutcome {
        let text = text.into();
        if let Some(outcome) = self.claim(&text, true) {
            return outcome;
        }
        self.classify_claimed(&text).await
    }

    /// Classifies `text` and records the outcome.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            debug!("Ignoring blank submission");
            return SubmitOutcome::Skipped;
        }
        if let Some(outcome) = self.claim(text, false) {
            return outcome;
        }
        self.classify_claimed(text).await
    }

    /// Marks the session as loading unless a submission is already in flight.
    ///
    /// Returns the outcome to report when nothing should be classified.
    fn claim(&self, text: &str, replace_input: bool) -> Option<SubmitOutcome> {
        let mut state = self.state.write();
        if state.is_loading {
            debug!("Rejecting submission while another is in flight");
            return Some(SubmitOutcome::Busy);
        }
        if replace_input {
            state.input_text = text.to_string();
        }
        if text.trim().is_empty() {
            debug!("Ignoring blank submission");
            return Some(SubmitOutcome::Skipped);
        }

        state.is_loading = true;
        state.current_result = None;
        state.current_error = None;
        None
    }

    async fn classify_claimed(&self, text: &str) -> SubmitOutcome {
        let _loading = LoadingGuard { state: &self.state };

        match self.classifier.classify(text).await {
            Ok(result) => {
                if let Err(violation) = result.check_contract() {
                    warn!(
                        classifier = self.classifier.name(),
                        %violation,
                        "Classifier reply breaks the safe verdict contract"
                    );
                }

                let entry = HistoryEntry::new(text, result.clone());
                let history_len = {
                    let mut state = self.state.write();
                    state.current_result = Some(result);
                    state.history.insert(0, entry.clone());
                    state.history.len()
                };

                info!(
                    entry_id = %entry.id,
                    action = %entry.action(),
                    history_len,
                    "Recorded classification"
                );
                SubmitOutcome::Classified(entry)
            }
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classification failed"
                );
                self.state.write().current_error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
                SubmitOutcome::Failed
            }
        }
    }
}
