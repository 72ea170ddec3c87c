//! Sophrosyne - Feedback Ingestion & Asynchronous Learning Core
//!
//! Entry point for the intake service: loads configuration, connects the
//! record store, spawns the learning worker, and serves the API.

use clap::{Parser, Subcommand};
use sophrosyne_core::{
    api::{ApiServer, ApiServerConfig, AppState, HmacSessions},
    config::Config,
    error::SophrosyneError,
    feedback::{FeedbackService, GhostCardDispatcher},
    learning::{LearningOrchestrator, SkillbookAdapter, SkillbookCurator},
    services::{HttpTelemetry, LlmReflectionGenerator, NoopTelemetry, Telemetry},
    storage::sqlite::SqliteStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sophrosyne")]
#[command(about = "Feedback ingestion and asynchronous learning core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the intake API and learning worker
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,

        /// Override the configured database URL
        #[arg(long, env = "SOPHROSYNE_DATABASE_URL")]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            database_url,
        } => {
            let mut config = Config::load()?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(url) = database_url {
                config.database_url = url;
            }
            serve(config).await
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    if config.session_secret.is_empty() {
        return Err(SophrosyneError::Config(config::ConfigError::Message(
            "session_secret must be set (SOPHROSYNE_SESSION_SECRET)".to_string(),
        ))
        .into());
    }

    let store = Arc::new(SqliteStore::new(&config.database_url, config.store_timeout()).await?);
    store.run_migrations().await?;

    let telemetry: Arc<dyn Telemetry> = match &config.telemetry_url {
        Some(url) => {
            info!("Telemetry collector: {}", url);
            Arc::new(HttpTelemetry::new(url.clone()))
        }
        None => {
            warn!("No telemetry collector configured; score/output attachment disabled");
            Arc::new(NoopTelemetry)
        }
    };

    let reflection = Arc::new(LlmReflectionGenerator::new(
        config.anthropic_api_key(),
        config.reflection.clone(),
    )?);

    let skillbooks = SkillbookAdapter::new(store.clone(), config.skillbook_char_budget);
    let curator = Arc::new(SkillbookCurator::new(skillbooks));

    let orchestrator =
        LearningOrchestrator::new(reflection, curator, telemetry.clone(), store.clone());
    let (dispatcher, _worker) = orchestrator.spawn();

    let ghost_cards = Arc::new(GhostCardDispatcher::new(store.clone()));
    let feedback = Arc::new(FeedbackService::new(
        store,
        telemetry,
        ghost_cards,
        dispatcher,
    ));

    let sessions = Arc::new(HmacSessions::new(config.session_secret.as_bytes().to_vec()));
    let state = AppState::new(sessions, feedback);

    let addr = config
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {}: {}", config.bind_addr, e))?;

    ApiServer::new(ApiServerConfig { addr }, state).serve().await
}
