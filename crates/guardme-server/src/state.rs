//! Application state for the API server.

use std::sync::Arc;

use guardme_core::classifier::ContentClassifier;
use guardme_core::session::SessionController;

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The session served by this process.
    pub session: Arc<SessionController>,
}

impl AppState {
    /// Creates application state around an existing session.
    pub fn new(session: Arc<SessionController>) -> Self {
        Self { session }
    }

    /// Creates application state with a fresh session backed by `classifier`.
    pub fn with_classifier(classifier: Arc<dyn ContentClassifier>) -> Self {
        Self::new(Arc::new(SessionController::new(classifier)))
    }
}
