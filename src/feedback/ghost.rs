//! Ghost card dispatch
//!
//! After a qualifying decision, a satisfaction-survey record is created
//! so the app can ask "was it worth it" later. Stateless: one pending
//! row per call, no uniqueness against prior calls for the same
//! interaction.

use crate::error::Result;
use crate::feedback::outcome::qualifies_for_ghost_card;
use crate::storage::RecordStore;
use crate::types::{GhostCard, GhostCardStatus, Outcome};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Creates ghost cards for qualifying outcomes
pub struct GhostCardDispatcher {
    store: Arc<dyn RecordStore>,
}

impl GhostCardDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create one pending ghost card if the outcome qualifies
    ///
    /// Returns the new card id, or `None` for non-qualifying outcomes.
    pub async fn dispatch(
        &self,
        interaction_id: &str,
        user_id: &str,
        outcome: Outcome,
    ) -> Result<Option<String>> {
        if !qualifies_for_ghost_card(outcome) {
            return Ok(None);
        }

        let card = GhostCard {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            interaction_id: interaction_id.to_string(),
            status: GhostCardStatus::Pending,
            satisfaction_feedback: None,
            created_at: Utc::now(),
        };

        self.store.insert_ghost_card(&card).await?;

        debug!(
            "Ghost card {} created for interaction {}",
            card.id, interaction_id
        );

        Ok(Some(card.id))
    }
}
