//! Asynchronous learning pipeline
//!
//! Everything that runs after the feedback response has been written:
//! reflection generation, skill curation against the per-user skillbook,
//! and best-effort finalization. Dispatch is an in-process channel send;
//! nothing here is durable across a process restart.

pub mod curation;
pub mod orchestrator;
pub mod skillbook;

pub use curation::{SkillCurator, SkillbookCurator};
pub use orchestrator::{
    FeedbackJob, LearningDispatcher, LearningJob, LearningOrchestrator, SatisfactionJob,
};
pub use skillbook::SkillbookAdapter;
