//! Error types for stream-feed.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Feed client result type.
pub type FeedResult<T> = Result<T, FeedError>;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error payload returned by the feed service on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiError {
    /// Service error code.
    pub code: i64,
    /// Human readable detail message.
    pub detail: String,
    /// Exception name reported by the service.
    pub exception: String,
    /// HTTP status code echoed back in the payload.
    pub status_code: u16,
    /// Server-side processing time, e.g. `"12ms"`.
    pub duration: String,
    /// Per-field validation messages, present on input errors.
    pub exception_fields: Option<HashMap<String, Vec<String>>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exception.is_empty() {
            write!(f, "code {}: {}", self.code, self.detail)
        } else {
            write!(f, "{} (code {}): {}", self.exception, self.code, self.detail)
        }
    }
}

/// Feed client error type.
#[derive(Debug, Error)]
pub enum FeedError {
    // === Raised before any request is sent ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid feed: {0}")]
    InvalidFeed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    // === Raised by the round trip ===
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("API error (HTTP {status}): {error}")]
    Protocol { status: u16, error: ApiError },

    #[error("Failed to decode response body: {source}")]
    Decode {
        status: Option<u16>,
        #[source]
        source: serde_json::Error,
    },
}

impl FeedError {
    /// Returns the HTTP status of the response that produced this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            Self::Decode { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the decoded service error payload.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Protocol { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns whether the service reported the target as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns whether the failure happened before anything was sent.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidFeed(_)
                | Self::InvalidArgument(_)
                | Self::InvalidUrl(_)
                | Self::Encode(_)
        )
    }
}

impl From<config::ConfigError> for FeedError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
