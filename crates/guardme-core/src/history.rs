//! Session history entries and the category distribution shown in the chart.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{Action, Category, ClassificationResult};

/// Maximum number of characters kept in an excerpt.
pub const EXCERPT_LEN: usize = 50;

/// Marker appended to truncated excerpts.
pub const ELLIPSIS: &str = "...";

static ENTRY_SEQ: AtomicU64 = AtomicU64::new(0);

/// A classified submission recorded in the session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry ID derived from the capture time.
    pub id: String,
    /// When the classification completed.
    pub captured_at: DateTime<Utc>,
    /// Truncated preview of the submitted text.
    pub excerpt: String,
    /// The verdict.
    #[serde(flatten)]
    pub result: ClassificationResult,
}

impl HistoryEntry {
    /// Records a verdict for `text` captured now.
    pub fn new(text: &str, result: ClassificationResult) -> Self {
        Self::captured_at(text, result, Utc::now())
    }

    /// Records a verdict for `text` with an explicit capture time.
    pub fn captured_at(text: &str, result: ClassificationResult, at: DateTime<Utc>) -> Self {
        Self {
            id: next_id(at),
            captured_at: at,
            excerpt: excerpt(text),
            result,
        }
    }

    /// Shorthand for the verdict's category.
    pub fn category(&self) -> Category {
        self.result.primary_category
    }

    /// Shorthand for the verdict's action.
    pub fn action(&self) -> Action {
        self.result.action
    }
}

/// `<unix-millis>-<seq>`; the sequence keeps IDs distinct within a millisecond.
fn next_id(at: DateTime<Utc>) -> String {
    let seq = ENTRY_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", at.timestamp_millis(), seq)
}

/// Truncates `text` to [`EXCERPT_LEN`] characters, appending [`ELLIPSIS`]
/// when anything was cut.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Occurrence count per category label.
///
/// Labels with no occurrences are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryDistribution {
    counts: BTreeMap<&'static str, usize>,
}

impl CategoryDistribution {
    /// Returns the count for `label`, if present.
    pub fn get(&self, label: &str) -> Option<usize> {
        self.counts.get(label).copied()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no label has been counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Returns `(label, count)` pairs in chart order (Safe first, then the
    /// risk categories).
    pub fn bars(&self) -> Vec<(&'static str, usize)> {
        Category::all()
            .iter()
            .filter_map(|c| self.get(c.label()).map(|n| (c.label(), n)))
            .collect()
    }
}

/// Counts categories across the whole history, mapping `None` to "Safe".
pub fn aggregate(history: &[HistoryEntry]) -> CategoryDistribution {
    let mut counts = BTreeMap::new();
    for entry in history {
        *counts.entry(entry.category().label()).or_insert(0) += 1;
    }
    CategoryDistribution { counts }
}

/// Number of entries per recommended action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub blocked: usize,
    pub warned: usize,
    pub allowed: usize,
}

impl ActionCounts {
    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.blocked + self.warned + self.allowed
    }
}

/// Counts recommended actions across the whole history.
pub fn aggregate_actions(history: &[HistoryEntry]) -> ActionCounts {
    history
        .iter()
        .fold(ActionCounts::default(), |mut counts, entry| {
            match entry.action() {
                Action::Block => counts.blocked += 1,
                Action::Warn => counts.warned += 1,
                Action::Allow => counts.allowed += 1,
            }
            counts
        })
}
