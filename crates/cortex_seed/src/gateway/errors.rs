//! Error types for Cortex API operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::resource::ResourceKind;

/// Errors that can occur when talking to the Cortex API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an unexpected status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials were rejected or no token was returned.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A local file needed for the request could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation does not exist for this resource kind.
    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        operation: &'static str,
        kind: ResourceKind,
    },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Get a short error message suitable for progress lines and summaries.
pub fn short_error_message(err: &GatewayError) -> String {
    match err {
        GatewayError::Http(message) => {
            let first = message.lines().next().unwrap_or(message);
            format!("Network error: {first}")
        }
        GatewayError::Json(_) => "JSON parse error".to_string(),
        GatewayError::Api { status, message } => {
            if message.chars().count() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else if message.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
        GatewayError::Auth(_) => "Authentication failed".to_string(),
        GatewayError::Io { path, .. } => format!("Unreadable file: {}", path.display()),
        GatewayError::Unsupported { operation, kind } => {
            format!("{operation} unsupported for {kind}")
        }
        GatewayError::Config(msg) => format!("Config: {}", msg),
    }
}
