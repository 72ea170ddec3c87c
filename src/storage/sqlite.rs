//! SQLite record store implementation
//!
//! Persistent storage using SQLite via sqlx. Every operation races a
//! fixed timeout; when the timeout wins, the underlying query is
//! abandoned (not cancelled at the wire) and callers must tolerate it
//! completing later.

use crate::error::{Result, SophrosyneError};
use crate::storage::RecordStore;
use crate::types::{
    GhostCard, GhostCardStatus, Interaction, InteractionMetadata, InteractionStatus, Outcome,
    SatisfactionFeedback, Skillbook, Tier,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{ConnectOptions, Row};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// SQLite-backed record store
pub struct SqliteStore {
    pool: SqlitePool,
    op_timeout: Duration,
}

impl SqliteStore {
    /// Connect to a SQLite database
    ///
    /// # Arguments
    /// * `database_url` - e.g. `sqlite://sophrosyne.db?mode=rwc` or `sqlite::memory:`
    /// * `op_timeout` - budget for each store operation
    pub async fn new(database_url: &str, op_timeout: Duration) -> Result<Self> {
        info!("Connecting to SQLite database: {}", database_url);

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30));

        // Query logging is too verbose at default levels
        options = options.disable_statement_logging();

        // An in-memory database exists per connection; the pool must
        // hold exactly one and never recycle it.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        info!("SQLite connection established");

        Ok(Self { pool, op_timeout })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| SophrosyneError::Other(format!("migration failed: {}", e)))?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Race an operation against the configured budget
    ///
    /// The losing future is dropped, not cancelled at the network layer.
    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(SophrosyneError::DatabaseTimeout(self.op_timeout)),
        }
    }

    fn row_to_interaction(row: &SqliteRow) -> Result<Interaction> {
        let tier_str: String = row.try_get("tier")?;
        let tier = Tier::parse(&tier_str)
            .ok_or_else(|| SophrosyneError::Other(format!("invalid tier value: {}", tier_str)))?;

        let status_str: String = row.try_get("status")?;
        let status = InteractionStatus::parse(&status_str).ok_or_else(|| {
            SophrosyneError::Other(format!("invalid status value: {}", status_str))
        })?;

        let outcome_str: Option<String> = row.try_get("outcome")?;
        let outcome = match outcome_str {
            Some(s) => Some(Outcome::parse(&s).ok_or_else(|| {
                SophrosyneError::Other(format!("invalid outcome value: {}", s))
            })?),
            None => None,
        };

        let metadata_str: String = row.try_get("metadata")?;
        let metadata: InteractionMetadata = serde_json::from_str(&metadata_str)?;

        let risk_score: Option<i64> = row.try_get("risk_score")?;

        Ok(Interaction {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            card_id: row.try_get("card_id")?,
            tier,
            status,
            outcome,
            risk_score: risk_score.map(|v| v.clamp(0, 100) as u8),
            metadata,
            reasoning_summary: row.try_get("reasoning_summary")?,
            learning_completed_at: row.try_get("learning_completed_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_ghost_card(row: &SqliteRow) -> Result<GhostCard> {
        let status_str: String = row.try_get("status")?;
        let status = GhostCardStatus::parse(&status_str).ok_or_else(|| {
            SophrosyneError::Other(format!("invalid ghost card status: {}", status_str))
        })?;

        let feedback_str: Option<String> = row.try_get("satisfaction_feedback")?;
        let satisfaction_feedback = match feedback_str {
            Some(s) => Some(SatisfactionFeedback::parse(&s).ok_or_else(|| {
                SophrosyneError::Other(format!("invalid satisfaction value: {}", s))
            })?),
            None => None,
        };

        Ok(GhostCard {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            interaction_id: row.try_get("interaction_id")?,
            status,
            satisfaction_feedback,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_interaction(&self, interaction: &Interaction) -> Result<()> {
        debug!("Storing interaction: {}", interaction.id);

        let metadata = serde_json::to_string(&interaction.metadata)?;

        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO interactions (
                    id, user_id, card_id, tier, status, outcome,
                    risk_score, metadata, reasoning_summary,
                    learning_completed_at, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&interaction.id)
            .bind(&interaction.user_id)
            .bind(&interaction.card_id)
            .bind(interaction.tier.as_str())
            .bind(interaction.status.as_str())
            .bind(interaction.outcome.map(|o| o.as_str()))
            .bind(interaction.risk_score.map(|v| v as i64))
            .bind(metadata)
            .bind(&interaction.reasoning_summary)
            .bind(interaction.learning_completed_at)
            .bind(interaction.created_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn get_interaction(&self, id: &str) -> Result<Option<Interaction>> {
        debug!("Fetching interaction: {}", id);

        let row = self
            .bounded(
                sqlx::query("SELECT * FROM interactions WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(|r| Self::row_to_interaction(&r)).transpose()
    }

    async fn record_feedback(
        &self,
        id: &str,
        outcome: Outcome,
        status: InteractionStatus,
        metadata: &InteractionMetadata,
    ) -> Result<()> {
        debug!("Recording feedback for interaction: {}", id);

        let metadata = serde_json::to_string(metadata)?;

        self.bounded(
            sqlx::query(
                r#"
                UPDATE interactions
                SET outcome = ?, status = ?, metadata = ?
                WHERE id = ?
                "#,
            )
            .bind(outcome.as_str())
            .bind(status.as_str())
            .bind(metadata)
            .bind(id)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn mark_learning_complete(&self, id: &str) -> Result<()> {
        self.bounded(
            sqlx::query("UPDATE interactions SET learning_completed_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn insert_ghost_card(&self, card: &GhostCard) -> Result<()> {
        debug!(
            "Storing ghost card {} for interaction {}",
            card.id, card.interaction_id
        );

        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO ghost_cards (
                    id, user_id, interaction_id, status, satisfaction_feedback, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&card.id)
            .bind(&card.user_id)
            .bind(&card.interaction_id)
            .bind(card.status.as_str())
            .bind(card.satisfaction_feedback.map(|f| f.as_str()))
            .bind(card.created_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn get_ghost_card(&self, id: &str) -> Result<Option<GhostCard>> {
        debug!("Fetching ghost card: {}", id);

        let row = self
            .bounded(
                sqlx::query("SELECT * FROM ghost_cards WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(|r| Self::row_to_ghost_card(&r)).transpose()
    }

    async fn ghost_cards_for_interaction(&self, interaction_id: &str) -> Result<Vec<GhostCard>> {
        let rows = self
            .bounded(
                sqlx::query(
                    "SELECT * FROM ghost_cards WHERE interaction_id = ? ORDER BY created_at",
                )
                .bind(interaction_id)
                .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(Self::row_to_ghost_card).collect()
    }

    async fn record_satisfaction(
        &self,
        id: &str,
        feedback: SatisfactionFeedback,
    ) -> Result<()> {
        debug!("Recording satisfaction feedback for ghost card: {}", id);

        self.bounded(
            sqlx::query(
                r#"
                UPDATE ghost_cards
                SET satisfaction_feedback = ?, status = ?
                WHERE id = ?
                "#,
            )
            .bind(feedback.as_str())
            .bind(GhostCardStatus::FeedbackGiven.as_str())
            .bind(id)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn get_skillbook(&self, user_id: &str) -> Result<Option<Skillbook>> {
        let row = self
            .bounded(
                sqlx::query("SELECT * FROM skillbooks WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let skills_str: String = row.try_get("skills")?;
        let skills: serde_json::Value = serde_json::from_str(&skills_str)?;

        Ok(Some(Skillbook {
            user_id: row.try_get("user_id")?,
            skills,
            version: row.try_get("version")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn upsert_skillbook(&self, skillbook: &Skillbook) -> Result<()> {
        debug!(
            "Upserting skillbook for user {} (version {})",
            skillbook.user_id, skillbook.version
        );

        let skills = serde_json::to_string(&skillbook.skills)?;

        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO skillbooks (user_id, skills, version, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id) DO UPDATE SET
                    skills = excluded.skills,
                    version = excluded.version,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&skillbook.user_id)
            .bind(skills)
            .bind(skillbook.version)
            .bind(skillbook.updated_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }
}
