//! Staged background learning pipeline
//!
//! One invocation per dispatched job, no persisted pipeline state:
//!
//! 1. Reflection — absent result ends the pipeline silently.
//! 2. Skill update — hard dependency; an error aborts the invocation.
//! 3. Finalization — trace attachment and completion stamp run in
//!    parallel; each failure is logged on its own and affects nothing
//!    else.
//!
//! Jobs are queued on an in-process channel and executed by a single
//! worker task after the HTTP response has gone out. A crash between
//! enqueue and execution drops the job; a learning signal is allowed to
//! be lost.

use crate::error::Result;
use crate::learning::curation::SkillCurator;
use crate::services::reflection::{ReflectionGenerator, ReflectionRequest};
use crate::services::telemetry::Telemetry;
use crate::storage::RecordStore;
use crate::types::{InteractionMetadata, Outcome, SatisfactionFeedback, Tier};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Fallback purchase-context label when metadata has none
const GENERIC_PURCHASE_LABEL: &str = "this purchase";

/// Learning work generated by a feedback submission
#[derive(Debug, Clone)]
pub struct FeedbackJob {
    pub interaction_id: String,
    pub user_id: String,
    pub tier: Tier,
    pub outcome: Outcome,

    /// Interaction metadata as it stood before the feedback write
    pub metadata: InteractionMetadata,

    pub reasoning_summary: Option<String>,
}

/// Learning work generated by a satisfaction submission
#[derive(Debug, Clone)]
pub struct SatisfactionJob {
    pub ghost_card_id: String,
    pub interaction_id: String,
    pub user_id: String,
    pub feedback: SatisfactionFeedback,
}

/// A unit of deferred learning work
#[derive(Debug, Clone)]
pub enum LearningJob {
    Feedback(FeedbackJob),
    Satisfaction(SatisfactionJob),
}

impl LearningJob {
    /// Record id used when logging a failed invocation
    fn subject_id(&self) -> &str {
        match self {
            LearningJob::Feedback(job) => &job.interaction_id,
            LearningJob::Satisfaction(job) => &job.ghost_card_id,
        }
    }
}

/// Handle for enqueueing learning work
///
/// A send never blocks and never fails the caller; if the worker is
/// gone the job is dropped with a log line.
#[derive(Clone)]
pub struct LearningDispatcher {
    tx: mpsc::UnboundedSender<LearningJob>,
}

impl LearningDispatcher {
    pub fn dispatch(&self, job: LearningJob) {
        let subject = job.subject_id().to_string();
        if self.tx.send(job).is_err() {
            warn!("Learning worker stopped; dropping job for {}", subject);
        }
    }
}

/// The staged pipeline and its collaborators
pub struct LearningOrchestrator {
    reflection: Arc<dyn ReflectionGenerator>,
    curator: Arc<dyn SkillCurator>,
    telemetry: Arc<dyn Telemetry>,
    store: Arc<dyn RecordStore>,
}

impl LearningOrchestrator {
    pub fn new(
        reflection: Arc<dyn ReflectionGenerator>,
        curator: Arc<dyn SkillCurator>,
        telemetry: Arc<dyn Telemetry>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            reflection,
            curator,
            telemetry,
            store,
        }
    }

    /// Spawn the worker task and return the dispatcher feeding it
    pub fn spawn(self) -> (LearningDispatcher, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<LearningJob>();

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let subject = job.subject_id().to_string();
                if let Err(e) = self.run(job).await {
                    error!(error = %e, "Learning pipeline failed for {}", subject);
                }
            }
            debug!("Learning worker channel closed");
        });

        (LearningDispatcher { tx }, handle)
    }

    /// Run one pipeline invocation to completion
    pub async fn run(&self, job: LearningJob) -> Result<()> {
        match job {
            LearningJob::Feedback(job) => self.run_feedback(job).await,
            LearningJob::Satisfaction(job) => self.run_satisfaction(job).await,
        }
    }

    async fn run_feedback(&self, job: FeedbackJob) -> Result<()> {
        let context = job
            .metadata
            .purchase_context
            .as_deref()
            .unwrap_or(GENERIC_PURCHASE_LABEL);

        let request = ReflectionRequest {
            interaction_id: job.interaction_id.clone(),
            user_id: job.user_id.clone(),
            question: format!("Why did the user decide this way about: {}?", context),
            prior_answer: job.reasoning_summary.clone(),
            outcome: job.outcome.as_str().to_string(),
        };

        // Stage 1: absence and failure both end the pipeline quietly.
        let reflection = match self.reflection.generate(&request).await {
            Ok(Some(reflection)) => reflection,
            Ok(None) => {
                debug!(
                    "Nothing to learn from interaction {}, pipeline done",
                    job.interaction_id
                );
                return Ok(());
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Reflection generation failed for interaction {}", job.interaction_id
                );
                return Ok(());
            }
        };

        // Stage 2: hard dependency. An error here aborts the invocation
        // and is logged once at the worker loop, unretried.
        self.curator.apply(&job.user_id, &reflection).await?;

        // Stage 3: both settle regardless of the other's result.
        let tags = [
            ("tier".to_string(), job.tier.as_str().to_string()),
            ("outcome".to_string(), job.outcome.as_str().to_string()),
        ];
        let attach = self
            .telemetry
            .attach_output(&job.interaction_id, &reflection.insight, &tags);
        let mark = self.store.mark_learning_complete(&job.interaction_id);

        let (attach_result, mark_result) = tokio::join!(attach, mark);

        if let Err(e) = attach_result {
            warn!(
                error = %e,
                "Failed to attach reflection output for interaction {}", job.interaction_id
            );
        }
        if let Err(e) = mark_result {
            warn!(
                error = %e,
                "Failed to mark learning complete for interaction {}", job.interaction_id
            );
        }

        Ok(())
    }

    async fn run_satisfaction(&self, job: SatisfactionJob) -> Result<()> {
        let request = ReflectionRequest {
            interaction_id: job.interaction_id.clone(),
            user_id: job.user_id.clone(),
            question: "In hindsight, was this purchase worth it to the user?".to_string(),
            prior_answer: None,
            outcome: job.feedback.as_str().to_string(),
        };

        let reflection = match self.reflection.generate(&request).await {
            Ok(Some(reflection)) => reflection,
            Ok(None) => {
                debug!(
                    "Nothing to learn from ghost card {}, pipeline done",
                    job.ghost_card_id
                );
                return Ok(());
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Reflection generation failed for ghost card {}", job.ghost_card_id
                );
                return Ok(());
            }
        };

        self.curator.apply(&job.user_id, &reflection).await?;

        let tags = [
            ("stage".to_string(), "satisfaction".to_string()),
            ("feedback".to_string(), job.feedback.as_str().to_string()),
        ];
        if let Err(e) = self
            .telemetry
            .attach_output(&job.interaction_id, &reflection.insight, &tags)
            .await
        {
            warn!(
                error = %e,
                "Failed to attach satisfaction reflection for interaction {}",
                job.interaction_id
            );
        }

        Ok(())
    }
}
