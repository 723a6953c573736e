//! Error types for rowforge
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for rowforge
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to decode record: {message}")]
    Decode { message: String },

    // ============================================================================
    // Collaborator Errors
    // ============================================================================
    #[error("Source read failed for '{source_id}': {message}")]
    Source { source_id: String, message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Authorization failed: {message}")]
    Unauthorized { message: String },

    #[error("Failed to launch {kind} job: {message}")]
    Launch { kind: String, message: String },

    #[error("Sink write failed for '{destination}': {message}")]
    Sink {
        destination: String,
        message: String,
    },

    #[error("Failed to fetch results for {kind} job '{id}': {message}")]
    ResultFetch {
        kind: String,
        id: String,
        message: String,
    },

    // ============================================================================
    // Job Lifecycle Errors
    // ============================================================================
    #[error("{kind} job '{id}' failed")]
    JobFailed { kind: String, id: String },

    #[error("{kind} job '{id}' was cancelled")]
    JobCancelled { kind: String, id: String },

    #[error("{kind} job '{id}' did not reach a terminal state after {attempts} attempts")]
    JobTimeout {
        kind: String,
        id: String,
        attempts: u32,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a source error
    pub fn source(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create a transient probe error
    pub fn probe(message: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a launch error
    pub fn launch(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Launch {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Check if this error is transient
    ///
    /// Transient errors consume a polling attempt and the loop continues;
    /// everything else aborts the poll immediately. Authorization failures are
    /// never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Probe { .. })
    }
}

/// Result type alias for rowforge
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("database_name");
        assert_eq!(
            err.to_string(),
            "Missing required config field: database_name"
        );

        let err = Error::JobFailed {
            kind: "crawler".to_string(),
            id: "crawler_orders".to_string(),
        };
        assert_eq!(err.to_string(), "crawler job 'crawler_orders' failed");

        let err = Error::JobTimeout {
            kind: "query".to_string(),
            id: "q-123".to_string(),
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "query job 'q-123' did not reach a terminal state after 5 attempts"
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::probe("connection reset").is_transient());

        assert!(!Error::unauthorized("token expired").is_transient());
        assert!(!Error::config("test").is_transient());
        assert!(!Error::JobFailed {
            kind: "crawler".to_string(),
            id: "c1".to_string(),
        }
        .is_transient());
        assert!(!Error::sink("warehouse", "insert failed").is_transient());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
