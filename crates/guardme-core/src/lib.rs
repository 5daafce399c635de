//! GuardME Core - classification client, history and session state.
//!
//! This crate provides the orchestration layer of the GuardME moderator:
//!
//! - [`classifier`]: verdict types and the Gemini-backed classifier
//! - [`history`]: history entries and the category distribution
//! - [`session`]: the per-session state controller
//! - [`config`]: classification service settings
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use guardme_core::classifier::GeminiClassifier;
//! use guardme_core::config::ClientConfig;
//! use guardme_core::session::SessionController;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = GeminiClassifier::new(ClientConfig::from_env()?)?;
//! let session = SessionController::new(Arc::new(classifier));
//!
//! session.submit("Some text to check").await;
//! println!("{:?}", session.snapshot().current_result);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod history;
pub mod session;

pub use classifier::{
    Action, Category, ClassificationResult, ClassifyError, ContentClassifier, GeminiClassifier,
    RiskScore,
};
pub use config::{ClientConfig, ConfigError};
pub use history::{aggregate, CategoryDistribution, HistoryEntry};
pub use session::{SessionController, SessionState, SubmitOutcome, ANALYSIS_FAILED_MESSAGE};
