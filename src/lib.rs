//! Sophrosyne - Feedback Ingestion & Asynchronous Learning Core
//!
//! The decision-processing subsystem of a purchase-pause assistant:
//! - Idempotent intake of interaction outcomes, satisfaction feedback,
//!   and wizard completions
//! - Fire-and-forget telemetry scoring and ghost card creation
//! - A deferred, staged learning pipeline (reflection → skill curation →
//!   parallel finalization) that never adds latency to a request
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Core records and vocabularies (Interaction, GhostCard, ...)
//! - **Storage**: The SQLite record store behind the `RecordStore` trait
//! - **Services**: Reflection generation and telemetry collaborators
//! - **Feedback**: Synchronous intake and its pure helpers
//! - **Learning**: The background orchestrator, curation, and skillbook
//! - **Api**: The axum intake surface
//!
//! # Example
//!
//! ```ignore
//! use sophrosyne_core::feedback::{FeedbackService, FeedbackSubmission};
//! use sophrosyne_core::types::ClientOutcome;
//!
//! let receipt = service
//!     .submit_feedback(
//!         "user-1",
//!         "int-1",
//!         FeedbackSubmission { outcome: ClientOutcome::Override, metadata: None },
//!     )
//!     .await?;
//! assert_eq!(receipt.feedback_id, "int-1");
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod feedback;
pub mod learning;
pub mod services;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SophrosyneError};
pub use feedback::{FeedbackService, GhostCardDispatcher};
pub use learning::{LearningDispatcher, LearningOrchestrator, SkillbookAdapter, SkillbookCurator};
pub use services::{LlmReflectionGenerator, ReflectionGenerator, Telemetry};
pub use storage::{sqlite::SqliteStore, RecordStore};
pub use types::{
    ClientOutcome, GhostCard, Interaction, InteractionMetadata, InteractionStatus, Outcome,
    SatisfactionFeedback, Skillbook, Tier, WizardOutcome, WizardResponse,
};
