//! Error types for the Sophrosyne feedback core
//!
//! This module provides comprehensive error handling using thiserror for
//! structured error definitions and anyhow for error propagation.

use thiserror::Error;

/// Main error type for Sophrosyne operations
///
/// Synchronous request-path variants map onto HTTP statuses in the API
/// layer (401/400/404/403/409/500); the remaining variants only travel
/// through background tasks and logs.
#[derive(Error, Debug)]
pub enum SophrosyneError {
    /// No valid session accompanied the request
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body or parameters violated the schema
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No such interaction or ghost card
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record exists but belongs to a different user
    #[error("Forbidden")]
    Forbidden,

    /// Write-once record already has a value
    #[error("{0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database operation exceeded its time budget
    #[error("Database operation timed out after {0:?}")]
    DatabaseTimeout(std::time::Duration),

    /// Reflection API request failed
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Telemetry collector call failed
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Sophrosyne operations
pub type Result<T> = std::result::Result<T, SophrosyneError>;

/// Convert anyhow::Error to SophrosyneError
impl From<anyhow::Error> for SophrosyneError {
    fn from(err: anyhow::Error) -> Self {
        SophrosyneError::Other(err.to_string())
    }
}

impl SophrosyneError {
    /// Whether this error originated on the synchronous store path
    /// (timeout or query failure), as opposed to a caller mistake.
    pub fn is_database(&self) -> bool {
        matches!(
            self,
            SophrosyneError::Database(_) | SophrosyneError::DatabaseTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SophrosyneError::NotFound("int-42".to_string());
        assert_eq!(err.to_string(), "Not found: int-42");
    }

    #[test]
    fn test_conflict_display_is_bare_message() {
        let err = SophrosyneError::Conflict("Interaction already has an outcome".to_string());
        assert_eq!(err.to_string(), "Interaction already has an outcome");
    }

    #[test]
    fn test_is_database() {
        let err = SophrosyneError::DatabaseTimeout(std::time::Duration::from_secs(10));
        assert!(err.is_database());
        assert!(!SophrosyneError::Forbidden.is_database());
    }
}
