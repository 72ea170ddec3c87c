//! Shared state for the intake API

use crate::api::auth::Sessions;
use crate::feedback::intake::FeedbackService;
use std::sync::Arc;

/// Handles every request handler needs
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn Sessions>,
    pub feedback: Arc<FeedbackService>,
}

impl AppState {
    pub fn new(sessions: Arc<dyn Sessions>, feedback: Arc<FeedbackService>) -> Self {
        Self { sessions, feedback }
    }
}
