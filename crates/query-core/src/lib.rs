//! Core types and capability traits for the responder query engine.
//!
//! This crate provides the shared interface between the orchestration engine
//! and its external collaborators. It defines:
//!
//! - [`IncomingMessage`] / [`MessageAttachment`] - What a responder sends back
//! - [`QueryResult`] / [`FileDescriptor`] - The terminal payload for a caller
//! - [`Transport`] - Send commands to a responder and subscribe to its replies
//! - [`ObjectStore`] - Persist downloaded attachments under a key
//! - [`Clock`] - Wall-clock source, injectable for tests
//!
//! # Example
//!
//! ```rust
//! use query_core::{async_trait, IncomingMessage, MessageFeed, Transport, TransportError};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl Transport for Offline {
//!     async fn connect(&self) -> Result<(), TransportError> {
//!         Err(TransportError::Connection("offline".to_string()))
//!     }
//!
//!     async fn disconnect(&self) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//!
//!     async fn send_text(&self, _identity: &str, _text: &str) -> Result<(), TransportError> {
//!         Err(TransportError::NotConnected)
//!     }
//!
//!     async fn subscribe(&self, _identity: &str) -> Result<MessageFeed, TransportError> {
//!         Err(TransportError::NotConnected)
//!     }
//!
//!     async fn download(&self, _message: &IncomingMessage) -> Result<Vec<u8>, TransportError> {
//!         Err(TransportError::NotConnected)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Offline"
//!     }
//! }
//! ```

mod clock;
mod error;
mod message;
mod result;
mod storage;
mod transport;

pub use clock::{Clock, SystemClock};
pub use error::{StorageError, TransportError};
pub use message::{IncomingMessage, MessageAttachment};
pub use result::{FileDescriptor, QueryResult};
pub use storage::{ObjectStore, StoredObject};
pub use transport::{MessageFeed, Transport};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
