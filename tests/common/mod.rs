//! Shared fixtures and stub collaborators for integration tests
//!
//! Not every binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sophrosyne_core::error::{Result, SophrosyneError};
use sophrosyne_core::learning::curation::SkillCurator;
use sophrosyne_core::services::reflection::{
    Reflection, ReflectionGenerator, ReflectionRequest, ReflectionSignal,
};
use sophrosyne_core::services::telemetry::Telemetry;
use sophrosyne_core::storage::sqlite::SqliteStore;
use sophrosyne_core::storage::RecordStore;
use sophrosyne_core::types::{
    GhostCard, GhostCardStatus, Interaction, InteractionMetadata, InteractionStatus, Outcome,
    SatisfactionFeedback, Skillbook, Tier,
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub async fn memory_store() -> Arc<SqliteStore> {
    let store = SqliteStore::new("sqlite::memory:", Duration::from_secs(10))
        .await
        .expect("in-memory store");
    store.run_migrations().await.expect("migrations");
    Arc::new(store)
}

/// Pending interaction with recorded purchase context, no outcome yet
pub fn pending_interaction(id: &str, user_id: &str) -> Interaction {
    Interaction {
        id: id.to_string(),
        user_id: user_id.to_string(),
        card_id: Some("card-1".to_string()),
        tier: Tier::Negotiator,
        status: InteractionStatus::Pending,
        outcome: None,
        risk_score: Some(64),
        metadata: serde_json::from_str(r#"{"purchaseContext":"espresso machine"}"#).unwrap(),
        reasoning_summary: Some("Third kitchen gadget this month".to_string()),
        learning_completed_at: None,
        created_at: Utc::now(),
    }
}

pub fn pending_ghost_card(id: &str, user_id: &str, interaction_id: &str) -> GhostCard {
    GhostCard {
        id: id.to_string(),
        user_id: user_id.to_string(),
        interaction_id: interaction_id.to_string(),
        status: GhostCardStatus::Pending,
        satisfaction_feedback: None,
        created_at: Utc::now(),
    }
}

pub fn sample_reflection(insight: &str) -> Reflection {
    Reflection {
        insight: insight.to_string(),
        signal: ReflectionSignal::Revise,
        confidence: 0.8,
    }
}

/// What a stub generator does when asked for a reflection
#[derive(Clone)]
pub enum ReflectionBehavior {
    Produce(Reflection),
    Nothing,
    Fail,
}

/// Reflection generator that records every request
#[derive(Clone)]
pub struct StubReflection {
    pub behavior: ReflectionBehavior,
    pub requests: Arc<Mutex<Vec<ReflectionRequest>>>,
}

impl StubReflection {
    pub fn new(behavior: ReflectionBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReflectionGenerator for StubReflection {
    async fn generate(&self, request: &ReflectionRequest) -> Result<Option<Reflection>> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            ReflectionBehavior::Produce(reflection) => Ok(Some(reflection.clone())),
            ReflectionBehavior::Nothing => Ok(None),
            ReflectionBehavior::Fail => {
                Err(SophrosyneError::LlmApi("stub generator down".to_string()))
            }
        }
    }
}

/// Telemetry sink that records every attach, optionally failing outputs
#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    pub scores: Arc<Mutex<Vec<(String, String, f64, String)>>>,
    pub outputs: Arc<Mutex<Vec<(String, String, Vec<(String, String)>)>>>,
    pub fail_outputs: bool,
}

impl RecordingTelemetry {
    pub fn failing_outputs() -> Self {
        Self {
            fail_outputs: true,
            ..Default::default()
        }
    }

    pub fn score_count(&self) -> usize {
        self.scores.lock().unwrap().len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.lock().unwrap().len()
    }
}

#[async_trait]
impl Telemetry for RecordingTelemetry {
    async fn attach_score(
        &self,
        interaction_id: &str,
        name: &str,
        value: f64,
        reason: &str,
    ) -> Result<()> {
        self.scores.lock().unwrap().push((
            interaction_id.to_string(),
            name.to_string(),
            value,
            reason.to_string(),
        ));
        Ok(())
    }

    async fn attach_output(
        &self,
        interaction_id: &str,
        output: &str,
        tags: &[(String, String)],
    ) -> Result<()> {
        self.outputs.lock().unwrap().push((
            interaction_id.to_string(),
            output.to_string(),
            tags.to_vec(),
        ));
        if self.fail_outputs {
            return Err(SophrosyneError::Telemetry("collector down".to_string()));
        }
        Ok(())
    }
}

/// Curator that always fails, for stage-2 abort tests
pub struct FailingCurator;

#[async_trait]
impl SkillCurator for FailingCurator {
    async fn apply(&self, _user_id: &str, _reflection: &Reflection) -> Result<()> {
        Err(SophrosyneError::Other("curation failed".to_string()))
    }
}

/// Store wrapper whose learning-completion stamp always fails
pub struct FailingMarkStore {
    pub inner: Arc<SqliteStore>,
}

#[async_trait]
impl RecordStore for FailingMarkStore {
    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        self.inner.insert_interaction(interaction).await
    }

    async fn get_interaction(&self, id: &str) -> Result<Option<Interaction>> {
        self.inner.get_interaction(id).await
    }

    async fn record_feedback(
        &self,
        id: &str,
        outcome: Outcome,
        status: InteractionStatus,
        metadata: &InteractionMetadata,
    ) -> Result<()> {
        self.inner
            .record_feedback(id, outcome, status, metadata)
            .await
    }

    async fn mark_learning_complete(&self, _id: &str) -> Result<()> {
        Err(SophrosyneError::Other("stamp failed".to_string()))
    }

    async fn insert_ghost_card(&self, card: &GhostCard) -> Result<()> {
        self.inner.insert_ghost_card(card).await
    }

    async fn get_ghost_card(&self, id: &str) -> Result<Option<GhostCard>> {
        self.inner.get_ghost_card(id).await
    }

    async fn ghost_cards_for_interaction(&self, interaction_id: &str) -> Result<Vec<GhostCard>> {
        self.inner.ghost_cards_for_interaction(interaction_id).await
    }

    async fn record_satisfaction(
        &self,
        id: &str,
        feedback: SatisfactionFeedback,
    ) -> Result<()> {
        self.inner.record_satisfaction(id, feedback).await
    }

    async fn get_skillbook(&self, user_id: &str) -> Result<Option<Skillbook>> {
        self.inner.get_skillbook(user_id).await
    }

    async fn upsert_skillbook(&self, skillbook: &Skillbook) -> Result<()> {
        self.inner.upsert_skillbook(skillbook).await
    }
}

/// Poll a condition until it holds or a second has passed
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 1s");
}
