//! Error types shared by transports and stores.

use thiserror::Error;

/// Errors raised by a messaging transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The session could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An operation was attempted without an open session.
    #[error("transport not connected")]
    NotConnected,

    /// The command could not be delivered.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The incoming message stream failed.
    #[error("message stream error: {0}")]
    Stream(String),

    /// The incoming message stream ended while it was still needed.
    #[error("message stream closed")]
    StreamClosed,

    /// Attachment content could not be fetched.
    #[error("download failed: {0}")]
    Download(String),
}

/// Errors raised by an object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The suggested path is not acceptable for this store.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    /// Writing the object failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}
