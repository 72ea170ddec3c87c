//! Reflection generation for the learning pipeline
//!
//! Given an interaction's purchase context, the agent's reasoning at
//! intervention time, and the user's final decision, produce a short
//! analysis of why that outcome occurred. "Nothing to learn" is a
//! legitimate result, not an error, and comes back as `None`.

use crate::config::ReflectionSettings;
use crate::error::{Result, SophrosyneError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sentinel the model returns when an outcome carries no usable signal
const NOTHING_TO_LEARN: &str = "NOTHING_TO_LEARN";

/// Input to one reflection call
#[derive(Debug, Clone)]
pub struct ReflectionRequest {
    pub interaction_id: String,
    pub user_id: String,

    /// Purchase-context question, e.g. "Why did the user decide this way
    /// about: wireless headphones?"
    pub question: String,

    /// The agent's reasoning summary from intervention time, if recorded
    pub prior_answer: Option<String>,

    /// Outcome label in persisted vocabulary (or a satisfaction value)
    pub outcome: String,
}

/// Direction a reflection pushes the skillbook in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionSignal {
    /// The intervention strategy worked; reinforce it
    Reinforce,
    /// The strategy missed; revise the approach
    Revise,
    /// Signal too weak to push either way
    Neutral,
}

/// One generated reflection, input to skill curation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    /// One-sentence analysis of why the outcome occurred
    pub insight: String,

    pub signal: ReflectionSignal,

    /// Model's confidence in the insight (0.0 - 1.0)
    pub confidence: f32,
}

/// Reflection generator interface
#[async_trait]
pub trait ReflectionGenerator: Send + Sync {
    /// Produce a reflection, or `None` when there is nothing to learn
    async fn generate(&self, request: &ReflectionRequest) -> Result<Option<Reflection>>;
}

/// Anthropic API message format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    text: String,
}

/// Claude-backed reflection generator
pub struct LlmReflectionGenerator {
    api_key: String,
    settings: ReflectionSettings,
    client: reqwest::Client,
}

impl LlmReflectionGenerator {
    pub fn new(api_key: String, settings: ReflectionSettings) -> Result<Self> {
        if api_key.is_empty() {
            return Err(SophrosyneError::Config(config::ConfigError::Message(
                "ANTHROPIC_API_KEY not set".to_string(),
            )));
        }

        Ok(Self {
            api_key,
            settings,
            client: reqwest::Client::new(),
        })
    }

    /// Make an API call to Claude
    async fn call_api(&self, prompt: &str) -> Result<String> {
        debug!("Calling Anthropic API");

        let request = AnthropicRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(SophrosyneError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SophrosyneError::LlmApi(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| SophrosyneError::LlmApi(format!("Failed to parse response: {}", e)))?;

        api_response
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| SophrosyneError::LlmApi("Empty response from API".to_string()))
    }

    /// Extract a field from a structured LLM response
    fn extract_field(response: &str, field: &str) -> Result<String> {
        response
            .lines()
            .find(|line| line.starts_with(field))
            .and_then(|line| line.strip_prefix(field))
            .map(|s| s.trim().to_string())
            .ok_or_else(|| SophrosyneError::LlmApi(format!("Failed to extract field: {}", field)))
    }

    fn parse_reflection(response: &str) -> Result<Option<Reflection>> {
        if response.trim() == NOTHING_TO_LEARN {
            return Ok(None);
        }

        let insight = Self::extract_field(response, "INSIGHT:")?;
        let signal_str = Self::extract_field(response, "SIGNAL:")?;
        let confidence_str = Self::extract_field(response, "CONFIDENCE:")?;

        let signal = match signal_str.as_str() {
            "reinforce" => ReflectionSignal::Reinforce,
            "revise" => ReflectionSignal::Revise,
            _ => ReflectionSignal::Neutral,
        };

        let confidence = confidence_str.parse::<f32>().unwrap_or(0.5).clamp(0.0, 1.0);

        Ok(Some(Reflection {
            insight,
            signal,
            confidence,
        }))
    }
}

#[async_trait]
impl ReflectionGenerator for LlmReflectionGenerator {
    async fn generate(&self, request: &ReflectionRequest) -> Result<Option<Reflection>> {
        debug!(
            "Generating reflection for interaction {}",
            request.interaction_id
        );

        let prior = request.prior_answer.as_deref().unwrap_or("(none recorded)");

        let prompt = format!(
            r#"You are analyzing the outcome of a purchase-pause intervention so the assistant can improve its future strategy.

Question under analysis: {}

The assistant's reasoning at intervention time:
{}

The user's final decision: {}

If this outcome carries no actionable lesson, respond with exactly:
{}

Otherwise format your response EXACTLY as:
INSIGHT: <one sentence explaining why this outcome occurred>
SIGNAL: <reinforce|revise|neutral>
CONFIDENCE: <0.0-1.0>
"#,
            request.question, prior, request.outcome, NOTHING_TO_LEARN
        );

        let response = self.call_api(&prompt).await?;
        Self::parse_reflection(&response)
    }
}
