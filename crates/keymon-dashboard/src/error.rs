//! Error types for the dashboard panel and its backend client

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors that can occur while talking to the backend or running the panel
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Transport-level failure: connection refused, DNS, timeout
    #[error("Request to {url} failed: {source}")]
    Request {
        /// URL that was requested
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status
    #[error("Backend returned {status} for {url}")]
    Status {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body was not the expected JSON shape
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// URL that was requested
        url: String,
        /// Decoder message
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Panel task failed to shut down cleanly
    #[error("Panel shutdown failed: {message}")]
    Shutdown {
        /// Error message
        message: String,
    },

    /// Error bubbled up from keymon-core
    #[error(transparent)]
    Core(#[from] keymon_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    /// Create a request error
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source,
        }
    }

    /// Create a status error
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a decode error
    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a shutdown error
    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
