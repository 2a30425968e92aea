//! Error types for query orchestration.

use query_core::{StorageError, TransportError};
use thiserror::Error;

/// Terminal failures of a query.
///
/// The `Display` text of each variant is the message surfaced to callers.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The responder reported it has no data for the command.
    #[error("No se encontraron resultados.")]
    NotFound,

    /// No responder produced any message before its deadline.
    #[error("Ningún bot respondió a la consulta.")]
    NoResponse,

    /// The messaging transport failed.
    #[error("{0}")]
    Transport(#[from] TransportError),
}

/// Errors loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("{0} environment variable is required")]
    MissingEnvVar(String),

    /// A variable is set but cannot be parsed.
    #[error("Invalid {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Failure to turn one attachment into a public file.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("download failed: {0}")]
    Download(#[source] TransportError),

    #[error("storage failed: {0}")]
    Store(#[from] StorageError),
}
