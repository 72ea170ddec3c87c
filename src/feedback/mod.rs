//! Feedback ingestion
//!
//! Synchronous intake of interaction decisions, satisfaction feedback,
//! and wizard completions, plus the pure vocabulary mapping and metadata
//! reconciliation they depend on.

pub mod ghost;
pub mod intake;
pub mod metadata;
pub mod outcome;

pub use ghost::GhostCardDispatcher;
pub use intake::{
    FeedbackReceipt, FeedbackService, FeedbackSubmission, SatisfactionReceipt, WizardSubmission,
};
