//! Error types for the signal-cli transport.

use query_core::TransportError;
use thiserror::Error;

/// Errors that can occur when interacting with the signal-cli daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON-RPC error response from daemon.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Connection to daemon failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Daemon health check failed.
    #[error("Health check failed")]
    HealthCheckFailed,

    /// SSE stream error.
    #[error("SSE error: {0}")]
    Sse(String),

    /// Reading a saved attachment failed.
    #[error("Attachment error: {0}")]
    Attachment(String),
}

impl From<DaemonError> for TransportError {
    fn from(err: DaemonError) -> Self {
        match err {
            DaemonError::Http(_) | DaemonError::Connection(_) | DaemonError::HealthCheckFailed => {
                TransportError::Connection(err.to_string())
            }
            DaemonError::Rpc { .. } => TransportError::SendFailed(err.to_string()),
            DaemonError::Sse(_) => TransportError::Stream(err.to_string()),
            DaemonError::Attachment(_) => TransportError::Download(err.to_string()),
        }
    }
}
