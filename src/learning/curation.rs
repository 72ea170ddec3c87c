//! Skill curation
//!
//! Applies a reflection to the user's skillbook as one opaque update
//! batch. The pipeline only depends on the trait; the shipped curator
//! folds the reflection into the skills document and bumps the version
//! counter on every successful update.

use crate::error::Result;
use crate::learning::skillbook::SkillbookAdapter;
use crate::services::reflection::Reflection;
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

/// Cap on retained skill entries; oldest entries fall off first
const MAX_SKILL_ENTRIES: usize = 200;

/// Skill curation interface
///
/// May fail; the orchestrator treats a failure here as fatal for the
/// whole pipeline invocation.
#[async_trait]
pub trait SkillCurator: Send + Sync {
    /// Apply one reflection to the user's skillbook and persist
    async fn apply(&self, user_id: &str, reflection: &Reflection) -> Result<()>;
}

/// Curator that accumulates reflections in the skillbook document
pub struct SkillbookCurator {
    adapter: SkillbookAdapter,
}

impl SkillbookCurator {
    pub fn new(adapter: SkillbookAdapter) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl SkillCurator for SkillbookCurator {
    async fn apply(&self, user_id: &str, reflection: &Reflection) -> Result<()> {
        let mut skillbook = self.adapter.load(user_id).await?;

        let entry = serde_json::json!({
            "lesson": reflection.insight,
            "signal": reflection.signal,
            "confidence": reflection.confidence,
            "learned_at": Utc::now(),
        });

        let mut entries = match skillbook.skills {
            serde_json::Value::Array(entries) => entries,
            // Tolerate a blob written by an older curator
            other => vec![other],
        };
        entries.push(entry);

        if entries.len() > MAX_SKILL_ENTRIES {
            let excess = entries.len() - MAX_SKILL_ENTRIES;
            entries.drain(..excess);
        }

        skillbook.skills = serde_json::Value::Array(entries);
        skillbook.version += 1;
        self.adapter.save(&skillbook).await?;

        debug!(
            "Skillbook for user {} updated to version {}",
            user_id, skillbook.version
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reflection::ReflectionSignal;
    use crate::storage::sqlite::SqliteStore;
    use crate::storage::RecordStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn reflection(insight: &str) -> Reflection {
        Reflection {
            insight: insight.to_string(),
            signal: ReflectionSignal::Reinforce,
            confidence: 0.9,
        }
    }

    async fn curator() -> (SkillbookCurator, Arc<SqliteStore>) {
        let store = Arc::new(
            SqliteStore::new("sqlite::memory:", Duration::from_secs(10))
                .await
                .unwrap(),
        );
        store.run_migrations().await.unwrap();
        let adapter = SkillbookAdapter::new(store.clone(), 8000);
        (SkillbookCurator::new(adapter), store)
    }

    #[tokio::test]
    async fn test_apply_creates_skillbook_and_bumps_version() {
        let (curator, store) = curator().await;

        curator
            .apply("user-1", &reflection("waits stick on weekdays"))
            .await
            .unwrap();

        let skillbook = store.get_skillbook("user-1").await.unwrap().unwrap();
        assert_eq!(skillbook.version, 1);
        let entries = skillbook.skills.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["lesson"], "waits stick on weekdays");
    }

    #[tokio::test]
    async fn test_version_is_monotonic_across_updates() {
        let (curator, store) = curator().await;

        curator.apply("user-1", &reflection("first")).await.unwrap();
        curator.apply("user-1", &reflection("second")).await.unwrap();

        let skillbook = store.get_skillbook("user-1").await.unwrap().unwrap();
        assert_eq!(skillbook.version, 2);
        assert_eq!(skillbook.skills.as_array().unwrap().len(), 2);
    }
}
