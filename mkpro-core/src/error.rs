//! Error types for the Marketing PRO core library.
//!
//! Every controller returns [`MkproResult`]. The `Display` output of the
//! request-level variants is exactly the message shown to the user, so the
//! error code lives in [`MkproError::error_code`] rather than in the text.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Request | Network, timeout, HTTP status and response shape errors |
//! | E2001-E2099 | Config | Config file, environment and validation errors |
//! | E3001-E3099 | Validation | Client-side checks that block a request |
//! | E9001-E9099 | General | Internal, IO and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Fallback message for transport failures that carry no description.
pub const NETWORK_FALLBACK_MESSAGE: &str = "Error de red";

/// The main error type for the Marketing PRO core library.
#[derive(Debug, Error)]
pub enum MkproError {
    // ========================================================================
    // Request Errors (E1001-E1099)
    // ========================================================================
    /// The request never produced a response
    #[error("{}", network_message(.0))]
    Network(String),

    /// The request was cancelled by its timeout
    #[error("timeout")]
    Timeout,

    /// The backend answered with a non-2xx status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The response did not match the expected schema
    #[error("invalid response: {0}")]
    ResponseSchema(String),

    // ========================================================================
    // Config Errors (E2001-E2099)
    // ========================================================================
    /// Configuration file or environment could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A configuration value is present but unusable
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    // ========================================================================
    // Validation Errors (E3001-E3099)
    // ========================================================================
    /// A client-side precondition failed; no request was sent
    #[error("{0}")]
    Validation(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (unexpected state)
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn network_message(message: &str) -> &str {
    if message.trim().is_empty() {
        NETWORK_FALLBACK_MESSAGE
    } else {
        message
    }
}

/// Result type alias for Marketing PRO operations.
pub type MkproResult<T> = Result<T, MkproError>;

impl MkproError {
    pub fn validation(message: impl Into<String>) -> Self {
        MkproError::Validation(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        MkproError::ResponseSchema(message.into())
    }

    /// HTTP status of the failed response, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            MkproError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            MkproError::Network(_)
                | MkproError::Timeout
                | MkproError::Http { .. }
                | MkproError::ResponseSchema(_)
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MkproError::ConfigParse(_)
                | MkproError::InvalidConfigValue { .. }
                | MkproError::MissingEnvVar(_)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MkproError::Validation(_))
    }

    /// Returns true if retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            MkproError::Network(_) | MkproError::Timeout => true,
            MkproError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            MkproError::Network(_) => "E1001",
            MkproError::Timeout => "E1002",
            MkproError::Http { .. } => "E1003",
            MkproError::ResponseSchema(_) => "E1004",
            MkproError::ConfigParse(_) => "E2001",
            MkproError::InvalidConfigValue { .. } => "E2002",
            MkproError::MissingEnvVar(_) => "E2003",
            MkproError::Validation(_) => "E3001",
            MkproError::Internal(_) => "E9001",
            MkproError::Io(_) => "E9002",
            MkproError::Serialization(_) => "E9003",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            MkproError::Network(_) => {
                Some("Check that the backend is running and MKPRO_API_BASE points at it")
            }
            MkproError::Timeout => Some("The backend is slow to answer. Try again in a moment"),
            MkproError::Http { status: 401, .. } | MkproError::Http { status: 403, .. } => {
                Some("Check MKPRO_API_KEY in your environment or .env file")
            }
            MkproError::ConfigParse(_) | MkproError::InvalidConfigValue { .. } => {
                Some("Fix mkpro.toml or the MKPRO_* environment variables")
            }
            MkproError::MissingEnvVar(_) => {
                Some("Create a .env file or set the environment variable")
            }
            _ => None,
        }
    }

    /// Log this error with its code. Transient errors are warnings.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_transient() || self.is_validation() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Request failed: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<reqwest::Error> for MkproError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MkproError::Timeout
        } else if err.is_decode() {
            MkproError::ResponseSchema(err.to_string())
        } else if err.is_builder() {
            MkproError::Internal(err.to_string())
        } else {
            MkproError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MkproError {
    fn from(err: serde_json::Error) -> Self {
        MkproError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for MkproError {
    fn from(err: std::io::Error) -> Self {
        MkproError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for MkproError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => MkproError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => MkproError::ConfigParse(format!(
                "Failed to parse {}: {}",
                uri.unwrap_or_default(),
                cause
            )),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => MkproError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => MkproError::ConfigParse(err.to_string()),
        }
    }
}

impl From<crate::config::ConfigLoadError> for MkproError {
    fn from(err: crate::config::ConfigLoadError) -> Self {
        match err {
            crate::config::ConfigLoadError::Config(e) => e.into(),
            crate::config::ConfigLoadError::InvalidValue { key, message } => {
                MkproError::InvalidConfigValue { key, message }
            }
            crate::config::ConfigLoadError::MissingRequired(key) => {
                MkproError::InvalidConfigValue {
                    key,
                    message: "Missing required value".to_string(),
                }
            }
            crate::config::ConfigLoadError::Io(e) => e.into(),
        }
    }
}

/// Terminal rendering of an error: message, code and suggestion.
pub struct CliErrorDisplay<'a> {
    error: &'a MkproError,
    show_code: bool,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a MkproError) -> Self {
        Self {
            error,
            show_code: true,
            show_suggestion: true,
        }
    }

    pub fn without_code(mut self) -> Self {
        self.show_code = false;
        self
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.show_code {
            writeln!(f, "[{}] {}", self.error.error_code(), self.error)?;
        } else {
            writeln!(f, "{}", self.error)?;
        }

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
