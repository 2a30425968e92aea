//! Messaging transport capability.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::TransportError;
use crate::message::IncomingMessage;

/// Stream of messages from one responder identity.
///
/// Dropping the stream releases the underlying subscription.
pub type MessageFeed = BoxStream<'static, Result<IncomingMessage, TransportError>>;

/// A free-text messaging backend.
///
/// Implementations must be safe to share between concurrent queries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the session.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Close the session.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Send a text command to `identity`.
    async fn send_text(&self, identity: &str, text: &str) -> Result<(), TransportError>;

    /// Subscribe to incoming messages sent by `identity`.
    ///
    /// The feed must be live when this returns: messages sent after the call
    /// completes are delivered.
    async fn subscribe(&self, identity: &str) -> Result<MessageFeed, TransportError>;

    /// Fetch the attachment content of `message`.
    async fn download(&self, message: &IncomingMessage) -> Result<Vec<u8>, TransportError>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}
