//! Content classification for GuardME.
//!
//! The safety judgment itself is delegated to a remote generative model via a
//! structured-output request. This module defines the verdict types, the
//! [`ContentClassifier`] seam and the Gemini-backed implementation.

mod category;
mod gemini;
pub mod policy;

use async_trait::async_trait;
use thiserror::Error;

pub use category::{
    Action, Category, ClassificationResult, ContractViolation, RiskScore, MAX_RISK_SCORE,
};
pub use gemini::GeminiClassifier;

/// Errors returned by a classifier.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The submitted text was blank.
    #[error("input text cannot be empty")]
    EmptyInput,

    /// The service failed, timed out or replied with an unusable body.
    #[error("classification service error: {0}")]
    Service(String),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifyError::Service("request timed out".to_string())
        } else {
            ClassifyError::Service(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(err: serde_json::Error) -> Self {
        ClassifyError::Service(format!("malformed reply: {}", err))
    }
}

/// Trait for text safety classifiers.
///
/// [`GeminiClassifier`] is the production implementation; the session
/// controller only depends on this trait.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    /// Classifies `text`, failing with [`ClassifyError::EmptyInput`] when it
    /// is blank.
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifyError>;

    /// Returns the name of this classifier for logging.
    fn name(&self) -> &'static str;
}
