//! Core data types for the Sophrosyne feedback core
//!
//! This module defines the records and vocabularies shared across the
//! intake endpoints, the record store, and the learning pipeline:
//! interactions, ghost cards, skillbooks, and the outcome enums in both
//! their client-facing and persisted forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intervention tier chosen by the (out-of-scope) agent layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Analyst,
    Negotiator,
    Therapist,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Analyst => "analyst",
            Tier::Negotiator => "negotiator",
            Tier::Therapist => "therapist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "analyst" => Some(Tier::Analyst),
            "negotiator" => Some(Tier::Negotiator),
            "therapist" => Some(Tier::Therapist),
            _ => None,
        }
    }
}

/// Interaction lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    Pending,
    Completed,
    FeedbackReceived,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Pending => "pending",
            InteractionStatus::Completed => "completed",
            InteractionStatus::FeedbackReceived => "feedback_received",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InteractionStatus::Pending),
            "completed" => Some(InteractionStatus::Completed),
            "feedback_received" => Some(InteractionStatus::FeedbackReceived),
            _ => None,
        }
    }
}

/// Outcome vocabulary accepted from clients on the feedback endpoint
///
/// This is a closed set: serde rejects anything else before the mapper
/// ever sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientOutcome {
    Accepted,
    Override,
    Wait,
    Abandoned,
    SkippedSavings,
    AcceptedSavings,
}

impl ClientOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientOutcome::Accepted => "accepted",
            ClientOutcome::Override => "override",
            ClientOutcome::Wait => "wait",
            ClientOutcome::Abandoned => "abandoned",
            ClientOutcome::SkippedSavings => "skipped_savings",
            ClientOutcome::AcceptedSavings => "accepted_savings",
        }
    }
}

/// Extended outcome vocabulary accepted on the wizard-completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardOutcome {
    Accepted,
    Override,
    Wait,
    Abandoned,
    SkippedSavings,
    AcceptedSavings,
    WizardBookmark,
}

/// Persisted outcome vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    Overridden,
    Wait,
    Abandoned,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Overridden => "overridden",
            Outcome::Wait => "wait",
            Outcome::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(Outcome::Accepted),
            "overridden" => Some(Outcome::Overridden),
            "wait" => Some(Outcome::Wait),
            "abandoned" => Some(Outcome::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Post-hoc satisfaction vocabulary for ghost cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionFeedback {
    WorthIt,
    RegretIt,
    NotSure,
}

impl SatisfactionFeedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            SatisfactionFeedback::WorthIt => "worth_it",
            SatisfactionFeedback::RegretIt => "regret_it",
            SatisfactionFeedback::NotSure => "not_sure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "worth_it" => Some(SatisfactionFeedback::WorthIt),
            "regret_it" => Some(SatisfactionFeedback::RegretIt),
            "not_sure" => Some(SatisfactionFeedback::NotSure),
            _ => None,
        }
    }
}

/// Ghost card lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostCardStatus {
    Pending,
    FeedbackGiven,
}

impl GhostCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GhostCardStatus::Pending => "pending",
            GhostCardStatus::FeedbackGiven => "feedback_given",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(GhostCardStatus::Pending),
            "feedback_given" => Some(GhostCardStatus::FeedbackGiven),
            _ => None,
        }
    }
}

/// One recorded answer from the decision wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardResponse {
    pub step: u32,
    pub question: String,
    pub answer: String,
}

/// Free-form interaction metadata with typed access to the fields the
/// pipeline reads
///
/// Known fields live as options; everything else a client sends rides in
/// the flattened map so nothing is dropped on a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionMetadata {
    /// What the user was about to buy, as recorded at intervention time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_context: Option<String>,

    /// Answers captured by the wizard-completion flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wizard_responses: Option<Vec<WizardResponse>>,

    /// Anything else the client attached
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InteractionMetadata {
    /// True when no known field is set and the extension map is empty
    pub fn is_empty(&self) -> bool {
        self.purchase_context.is_none() && self.wizard_responses.is_none() && self.extra.is_empty()
    }
}

/// One recorded instance of the agent intervening on a purchase decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Opaque identifier, immutable
    pub id: String,

    /// Owning user, immutable
    pub user_id: String,

    /// Card the intervention was rendered on, if any
    pub card_id: Option<String>,

    /// Intervention tier the agent chose
    pub tier: Tier,

    pub status: InteractionStatus,

    /// Null until the first feedback write
    pub outcome: Option<Outcome>,

    /// Purchase risk estimate, 0-100
    pub risk_score: Option<u8>,

    pub metadata: InteractionMetadata,

    /// Agent's reasoning summary from intervention time
    pub reasoning_summary: Option<String>,

    /// Set once the learning pipeline's finalization stage has run
    pub learning_completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// A deferred satisfaction-survey record attached to a qualifying
/// interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostCard {
    pub id: String,
    pub user_id: String,
    pub interaction_id: String,
    pub status: GhostCardStatus,
    pub satisfaction_feedback: Option<SatisfactionFeedback>,
    pub created_at: DateTime<Utc>,
}

/// Per-user accumulated strategy state
///
/// The skills document is opaque here: produced and consumed by the
/// curation step, read by the prompting layer. The version counter moves
/// only on a successful curation update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skillbook {
    pub user_id: String,
    pub skills: serde_json::Value,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Skillbook {
    /// Fresh skillbook for a user with no curated state yet
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            skills: serde_json::Value::Array(vec![]),
            version: 0,
            updated_at: Utc::now(),
        }
    }
}
