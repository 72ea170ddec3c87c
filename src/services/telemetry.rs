//! Telemetry attachment for intervention traces
//!
//! The collector records two things about an interaction: a numeric
//! acceptance score when feedback arrives, and the reflection output once
//! the learning pipeline has run. Both calls may fail independently and
//! callers on the hot path never await them to completion.

use crate::error::{Result, SophrosyneError};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Telemetry interface
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Attach a numeric score to an interaction's trace
    async fn attach_score(
        &self,
        interaction_id: &str,
        name: &str,
        value: f64,
        reason: &str,
    ) -> Result<()>;

    /// Attach a generated output to an interaction's trace, with tags
    async fn attach_output(
        &self,
        interaction_id: &str,
        output: &str,
        tags: &[(String, String)],
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ScorePayload<'a> {
    interaction_id: &'a str,
    name: &'a str,
    value: f64,
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct OutputPayload<'a> {
    interaction_id: &'a str,
    output: &'a str,
    tags: &'a [(String, String)],
}

/// HTTP collector client
pub struct HttpTelemetry {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTelemetry {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, payload: &T) -> Result<()> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.post(&url).json(payload).send().await?;

        if !response.status().is_success() {
            return Err(SophrosyneError::Telemetry(format!(
                "collector returned {} for {}",
                response.status(),
                url
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Telemetry for HttpTelemetry {
    async fn attach_score(
        &self,
        interaction_id: &str,
        name: &str,
        value: f64,
        reason: &str,
    ) -> Result<()> {
        debug!("Attaching score {} = {} to {}", name, value, interaction_id);

        self.post(
            "scores",
            &ScorePayload {
                interaction_id,
                name,
                value,
                reason,
            },
        )
        .await
    }

    async fn attach_output(
        &self,
        interaction_id: &str,
        output: &str,
        tags: &[(String, String)],
    ) -> Result<()> {
        debug!("Attaching output to {}", interaction_id);

        self.post(
            "outputs",
            &OutputPayload {
                interaction_id,
                output,
                tags,
            },
        )
        .await
    }
}

/// Telemetry sink for deployments without a collector
///
/// Keeps control flow identical: every attach succeeds immediately.
pub struct NoopTelemetry;

#[async_trait]
impl Telemetry for NoopTelemetry {
    async fn attach_score(
        &self,
        _interaction_id: &str,
        _name: &str,
        _value: f64,
        _reason: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn attach_output(
        &self,
        _interaction_id: &str,
        _output: &str,
        _tags: &[(String, String)],
    ) -> Result<()> {
        Ok(())
    }
}
