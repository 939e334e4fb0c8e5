// src/error.rs

//! Unified error handling for the monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request failed outside the retry loop
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error (fatal)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error (fatal)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Page fetch failed after retries
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Notification delivery failed
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Persisting the state file failed
    #[error("Failed to write state to {path}: {message}")]
    StateWrite { path: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a state write error with the target path.
    pub fn state_write(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::StateWrite {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the process before any fetch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Validation(_) | Self::Toml(_) | Self::Url(_)
        )
    }
}

/// Failure to obtain a page after the retry budget is spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, timeout or body read error on the final attempt
    #[error("Fetch failed for {url}: {message}")]
    Transport { url: String, message: String },

    /// Server kept answering with a retryable status
    #[error("Fetch failed for {url}: status {status} after retries")]
    RetriesExhausted { url: String, status: u16 },

    /// Request could not be built (bad header, bad URL)
    #[error("Invalid request: {0}")]
    Client(String),
}

impl FetchError {
    pub fn transport(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Failure to deliver a notification message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Endpoint unreachable or timed out
    #[error("Notification transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
