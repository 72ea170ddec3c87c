//! Feedback, satisfaction, and wizard-completion intake
//!
//! The synchronous half of the pipeline: validate, authorize, persist,
//! respond. Everything else — telemetry score, ghost card, learning —
//! is launched as an independent effect that can neither block nor fail
//! the response.
//!
//! Idempotency differs between the two interaction endpoints on
//! purpose: feedback represents a single decision the user may correct
//! (overwrite, `updated` flag), the wizard is a multi-step flow that
//! must not be replayed (write-once, conflict on a second attempt).

use crate::error::{Result, SophrosyneError};
use crate::feedback::ghost::GhostCardDispatcher;
use crate::feedback::metadata;
use crate::feedback::outcome::{acceptance_score, is_learnable, map_outcome, map_wizard_outcome};
use crate::learning::orchestrator::{
    FeedbackJob, LearningDispatcher, LearningJob, SatisfactionJob,
};
use crate::services::telemetry::Telemetry;
use crate::storage::RecordStore;
use crate::types::{
    ClientOutcome, InteractionMetadata, InteractionStatus, SatisfactionFeedback, WizardOutcome,
    WizardResponse,
};
use std::sync::Arc;
use tracing::warn;

/// Metric name for the acceptance score attached on feedback
const ACCEPTANCE_METRIC: &str = "intervention_acceptance";

/// A feedback submission after schema validation
#[derive(Debug, Clone)]
pub struct FeedbackSubmission {
    pub outcome: ClientOutcome,
    pub metadata: Option<InteractionMetadata>,
}

/// Result of a successful feedback submission
#[derive(Debug, Clone)]
pub struct FeedbackReceipt {
    pub feedback_id: String,

    /// True when the interaction already had an outcome before this write
    pub updated: bool,
}

/// Result of a successful satisfaction submission
#[derive(Debug, Clone)]
pub struct SatisfactionReceipt {
    pub ghost_card_id: String,
    pub satisfaction_feedback: SatisfactionFeedback,
}

/// A wizard-completion submission after schema validation
#[derive(Debug, Clone)]
pub struct WizardSubmission {
    pub responses: Vec<WizardResponse>,
    pub outcome: WizardOutcome,
}

/// Intake service for all three decision endpoints
pub struct FeedbackService {
    store: Arc<dyn RecordStore>,
    telemetry: Arc<dyn Telemetry>,
    ghost_cards: Arc<GhostCardDispatcher>,
    learning: LearningDispatcher,
}

impl FeedbackService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        telemetry: Arc<dyn Telemetry>,
        ghost_cards: Arc<GhostCardDispatcher>,
        learning: LearningDispatcher,
    ) -> Self {
        Self {
            store,
            telemetry,
            ghost_cards,
            learning,
        }
    }

    /// Record a user's decision about an interaction
    ///
    /// Idempotent by overwrite: a resubmission updates the same row and
    /// is distinguishable only by `updated: true`.
    pub async fn submit_feedback(
        &self,
        user_id: &str,
        interaction_id: &str,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackReceipt> {
        if interaction_id.trim().is_empty() {
            return Err(SophrosyneError::InvalidRequest(
                "interactionId must not be empty".to_string(),
            ));
        }

        let interaction = self
            .store
            .get_interaction(interaction_id)
            .await?
            .ok_or_else(|| SophrosyneError::NotFound(interaction_id.to_string()))?;

        if interaction.user_id != user_id {
            return Err(SophrosyneError::Forbidden);
        }

        let mapped = map_outcome(submission.outcome);
        let updated = interaction.outcome.is_some();

        let incoming = submission.metadata.unwrap_or_default();
        let merged = metadata::merge(&interaction.metadata, &incoming);

        self.store
            .record_feedback(
                interaction_id,
                mapped,
                InteractionStatus::FeedbackReceived,
                &merged,
            )
            .await?;

        // Response is determined; everything below is fire-and-forget
        // or deferred and must never surface to the caller.

        if let Some(score) = acceptance_score(submission.outcome) {
            let telemetry = self.telemetry.clone();
            let id = interaction_id.to_string();
            let reason = submission.outcome.as_str();
            tokio::spawn(async move {
                if let Err(e) = telemetry
                    .attach_score(&id, ACCEPTANCE_METRIC, score, reason)
                    .await
                {
                    warn!(error = %e, "Failed to attach acceptance score for interaction {}", id);
                }
            });
        }

        {
            let ghost_cards = self.ghost_cards.clone();
            let id = interaction_id.to_string();
            let owner = user_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = ghost_cards.dispatch(&id, &owner, mapped).await {
                    warn!(error = %e, "Failed to create ghost card for interaction {}", id);
                }
            });
        }

        if is_learnable(mapped) {
            // Carries the interaction's pre-update metadata and summary.
            self.learning.dispatch(LearningJob::Feedback(FeedbackJob {
                interaction_id: interaction_id.to_string(),
                user_id: user_id.to_string(),
                tier: interaction.tier,
                outcome: mapped,
                metadata: interaction.metadata,
                reasoning_summary: interaction.reasoning_summary,
            }));
        }

        Ok(FeedbackReceipt {
            feedback_id: interaction_id.to_string(),
            updated,
        })
    }

    /// Record post-hoc satisfaction feedback on a ghost card
    pub async fn submit_satisfaction(
        &self,
        user_id: &str,
        ghost_card_id: &str,
        feedback: SatisfactionFeedback,
    ) -> Result<SatisfactionReceipt> {
        if ghost_card_id.trim().is_empty() {
            return Err(SophrosyneError::InvalidRequest(
                "ghostCardId must not be empty".to_string(),
            ));
        }

        let card = self
            .store
            .get_ghost_card(ghost_card_id)
            .await?
            .ok_or_else(|| SophrosyneError::NotFound(ghost_card_id.to_string()))?;

        if card.user_id != user_id {
            return Err(SophrosyneError::Forbidden);
        }

        self.store
            .record_satisfaction(ghost_card_id, feedback)
            .await?;

        self.learning
            .dispatch(LearningJob::Satisfaction(SatisfactionJob {
                ghost_card_id: ghost_card_id.to_string(),
                interaction_id: card.interaction_id,
                user_id: user_id.to_string(),
                feedback,
            }));

        Ok(SatisfactionReceipt {
            ghost_card_id: ghost_card_id.to_string(),
            satisfaction_feedback: feedback,
        })
    }

    /// Record the decision wizard's answers, write-once
    pub async fn complete_wizard(
        &self,
        user_id: &str,
        interaction_id: &str,
        submission: WizardSubmission,
    ) -> Result<()> {
        if interaction_id.trim().is_empty() {
            return Err(SophrosyneError::InvalidRequest(
                "interactionId must not be empty".to_string(),
            ));
        }

        let interaction = self
            .store
            .get_interaction(interaction_id)
            .await?
            .ok_or_else(|| SophrosyneError::NotFound(interaction_id.to_string()))?;

        if interaction.user_id != user_id {
            return Err(SophrosyneError::Forbidden);
        }

        if interaction.outcome.is_some() {
            return Err(SophrosyneError::Conflict(
                "Interaction already has an outcome".to_string(),
            ));
        }

        let mapped = map_wizard_outcome(submission.outcome);

        // Full replace, not a merge: the wizard owns this document.
        let metadata = InteractionMetadata {
            wizard_responses: Some(submission.responses),
            ..Default::default()
        };

        self.store
            .record_feedback(
                interaction_id,
                mapped,
                InteractionStatus::FeedbackReceived,
                &metadata,
            )
            .await?;

        Ok(())
    }
}
