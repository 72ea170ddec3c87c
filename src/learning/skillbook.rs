//! Skillbook loading and prompt-context serialization
//!
//! The skillbook is the per-user strategy state the curation step
//! accumulates and the prompting layer reads. When the serialized state
//! outgrows the character budget it is hard-truncated with an explicit
//! marker: availability over completeness, never an error.

use crate::error::Result;
use crate::storage::RecordStore;
use crate::types::Skillbook;
use std::sync::Arc;
use tracing::debug;

/// Marker appended to a truncated prompt context
const TRUNCATION_MARKER: &str = "…[truncated]";

/// Loads and saves per-user skillbooks and renders them for prompts
pub struct SkillbookAdapter {
    store: Arc<dyn RecordStore>,
    char_budget: usize,
}

impl SkillbookAdapter {
    pub fn new(store: Arc<dyn RecordStore>, char_budget: usize) -> Self {
        Self { store, char_budget }
    }

    /// Load a user's skillbook, starting from an empty one if none exists
    pub async fn load(&self, user_id: &str) -> Result<Skillbook> {
        match self.store.get_skillbook(user_id).await? {
            Some(skillbook) => Ok(skillbook),
            None => {
                debug!("No skillbook for user {}, starting empty", user_id);
                Ok(Skillbook::empty(user_id))
            }
        }
    }

    /// Persist a skillbook
    pub async fn save(&self, skillbook: &Skillbook) -> Result<()> {
        self.store.upsert_skillbook(skillbook).await
    }

    /// Serialize a skillbook into a prompt-context string
    ///
    /// Hard-truncates at the character budget with an explicit marker.
    pub fn prompt_context(&self, skillbook: &Skillbook) -> String {
        let serialized = skillbook.skills.to_string();

        if serialized.chars().count() <= self.char_budget {
            return serialized;
        }

        debug!(
            "Skillbook for user {} exceeds {} chars, truncating",
            skillbook.user_id, self.char_budget
        );

        let kept: String = serialized
            .chars()
            .take(self.char_budget.saturating_sub(TRUNCATION_MARKER.chars().count()))
            .collect();

        format!("{}{}", kept, TRUNCATION_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::SqliteStore;
    use std::time::Duration;

    async fn adapter(char_budget: usize) -> SkillbookAdapter {
        let store = SqliteStore::new("sqlite::memory:", Duration::from_secs(10))
            .await
            .unwrap();
        store.run_migrations().await.unwrap();
        SkillbookAdapter::new(Arc::new(store), char_budget)
    }

    #[tokio::test]
    async fn test_load_absent_starts_empty() {
        let adapter = adapter(8000).await;
        let skillbook = adapter.load("user-1").await.unwrap();
        assert_eq!(skillbook.version, 0);
        assert_eq!(skillbook.skills, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let adapter = adapter(8000).await;
        let mut skillbook = adapter.load("user-1").await.unwrap();
        skillbook.skills = serde_json::json!([{"lesson": "evening purchases get overridden"}]);
        skillbook.version = 1;
        adapter.save(&skillbook).await.unwrap();

        let reloaded = adapter.load("user-1").await.unwrap();
        assert_eq!(reloaded.version, 1);
    }

    #[tokio::test]
    async fn test_prompt_context_under_budget_is_unchanged() {
        let adapter = adapter(8000).await;
        let skillbook = Skillbook::empty("user-1");
        assert_eq!(adapter.prompt_context(&skillbook), "[]");
    }

    #[tokio::test]
    async fn test_prompt_context_truncates_with_marker() {
        let adapter = adapter(50).await;
        let mut skillbook = Skillbook::empty("user-1");
        skillbook.skills = serde_json::json!(["a".repeat(200)]);

        let context = adapter.prompt_context(&skillbook);
        assert_eq!(context.chars().count(), 50);
        assert!(context.ends_with(TRUNCATION_MARKER));
    }
}
