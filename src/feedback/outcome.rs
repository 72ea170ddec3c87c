//! Outcome vocabulary mapping
//!
//! Translates the client-facing outcome vocabulary into the persisted
//! one and owns the derived sets the intake path consults: which
//! outcomes feed the learning pipeline, which earn a ghost card, and
//! what acceptance score gets attached to the trace.

use crate::types::{ClientOutcome, Outcome, WizardOutcome};

/// Map a client outcome to the persisted vocabulary
///
/// Total over the closed input set; anything outside it is rejected by
/// schema validation before reaching this function.
pub fn map_outcome(outcome: ClientOutcome) -> Outcome {
    match outcome {
        ClientOutcome::Accepted | ClientOutcome::AcceptedSavings => Outcome::Accepted,
        ClientOutcome::Override | ClientOutcome::SkippedSavings => Outcome::Overridden,
        ClientOutcome::Wait => Outcome::Wait,
        ClientOutcome::Abandoned => Outcome::Abandoned,
    }
}

/// Map a wizard outcome to the persisted vocabulary
///
/// A bookmark is a deferral, not a decision, so it persists as `wait`.
pub fn map_wizard_outcome(outcome: WizardOutcome) -> Outcome {
    match outcome {
        WizardOutcome::Accepted | WizardOutcome::AcceptedSavings => Outcome::Accepted,
        WizardOutcome::Override | WizardOutcome::SkippedSavings => Outcome::Overridden,
        WizardOutcome::Wait | WizardOutcome::WizardBookmark => Outcome::Wait,
        WizardOutcome::Abandoned => Outcome::Abandoned,
    }
}

/// Whether the background learning pipeline runs for this outcome
pub fn is_learnable(outcome: Outcome) -> bool {
    matches!(
        outcome,
        Outcome::Accepted | Outcome::Overridden | Outcome::Wait | Outcome::Abandoned
    )
}

/// Whether a satisfaction-survey ghost card is worth creating
///
/// Only the outcomes where the user made a concrete call on the purchase:
/// they paused (accepted) or bought anyway (overridden). "Was it worth
/// it" has no referent for a wait or an abandoned session.
pub fn qualifies_for_ghost_card(outcome: Outcome) -> bool {
    matches!(outcome, Outcome::Accepted | Outcome::Overridden)
}

/// Acceptance score attached to the trace for a raw client outcome
///
/// Every client outcome has a configured score, so the attach always
/// fires; `None` is reserved for future vocabulary additions without a
/// score.
pub fn acceptance_score(outcome: ClientOutcome) -> Option<f64> {
    match outcome {
        ClientOutcome::Accepted | ClientOutcome::AcceptedSavings => Some(1.0),
        ClientOutcome::Wait => Some(0.7),
        ClientOutcome::Abandoned => Some(0.5),
        ClientOutcome::Override | ClientOutcome::SkippedSavings => Some(0.0),
    }
}
