//! Storage layer for the Sophrosyne feedback core
//!
//! Provides the record-store abstraction and its SQLite implementation.
//! All operations are point lookups or single-row writes executed under a
//! fixed time budget; a timeout, a missing row, and any other store
//! failure are surfaced as distinguishable conditions.

pub mod sqlite;

use crate::error::Result;
use crate::types::{
    GhostCard, Interaction, InteractionMetadata, InteractionStatus, Outcome, SatisfactionFeedback,
    Skillbook,
};
use async_trait::async_trait;

/// Record store trait defining all required operations
///
/// Lookups return `Ok(None)` for missing rows so callers can decide
/// between 404 and other policies; store-level failures (including the
/// timeout race) come back as errors.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new interaction (used by the intervention layer and tests)
    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()>;

    /// Point lookup of an interaction by id
    async fn get_interaction(&self, id: &str) -> Result<Option<Interaction>>;

    /// Persist a feedback decision: outcome, status, merged metadata
    async fn record_feedback(
        &self,
        id: &str,
        outcome: Outcome,
        status: InteractionStatus,
        metadata: &InteractionMetadata,
    ) -> Result<()>;

    /// Stamp the interaction's learning completion time
    async fn mark_learning_complete(&self, id: &str) -> Result<()>;

    /// Insert a pending ghost card
    async fn insert_ghost_card(&self, card: &GhostCard) -> Result<()>;

    /// Point lookup of a ghost card by id
    async fn get_ghost_card(&self, id: &str) -> Result<Option<GhostCard>>;

    /// All ghost cards attached to an interaction, oldest first
    ///
    /// Duplicates are possible: creation is not deduplicated against
    /// prior calls for the same interaction.
    async fn ghost_cards_for_interaction(&self, interaction_id: &str) -> Result<Vec<GhostCard>>;

    /// Persist satisfaction feedback on a ghost card
    async fn record_satisfaction(
        &self,
        id: &str,
        feedback: SatisfactionFeedback,
    ) -> Result<()>;

    /// Load a user's skillbook, if one exists
    async fn get_skillbook(&self, user_id: &str) -> Result<Option<Skillbook>>;

    /// Insert or replace a user's skillbook
    async fn upsert_skillbook(&self, skillbook: &Skillbook) -> Result<()>;
}
