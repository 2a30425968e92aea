//! [`Transport`] implementation over the signal-cli daemon.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::future;
use futures::StreamExt;
use query_core::{IncomingMessage, MessageAttachment, MessageFeed, Transport, TransportError};
use tracing::debug;

use crate::client::SignalClient;
use crate::config::TransportConfig;
use crate::sse::MessageStream;
use crate::types::Envelope;

/// Convert an envelope into an incoming message if it came from `identity`
/// and carries text or an attachment.
///
/// The data message timestamp doubles as the sequence id. Only the first
/// attachment is kept.
pub fn to_incoming_message(envelope: &Envelope, identity: &str) -> Option<IncomingMessage> {
    if !envelope.is_from(identity) {
        return None;
    }
    let data = envelope.data_message.as_ref()?;
    if data.message.is_none() && data.attachments.is_empty() {
        return None;
    }

    if data.attachments.len() > 1 {
        debug!(
            count = data.attachments.len(),
            "Envelope carries several attachments, keeping the first"
        );
    }
    let attachment = data.attachments.first().and_then(|a| {
        a.id.as_ref().map(|id| MessageAttachment {
            reference: id.clone(),
            mime_type: (!a.content_type.is_empty()).then(|| a.content_type.clone()),
        })
    });

    let id = if data.timestamp > 0 {
        data.timestamp
    } else {
        envelope.timestamp
    };
    let received_at = Utc
        .timestamp_millis_opt(envelope.timestamp as i64)
        .single()
        .unwrap_or_else(Utc::now);

    Some(IncomingMessage {
        id,
        sender: identity.to_string(),
        text: data.message.clone(),
        attachment,
        received_at,
    })
}

/// A messaging transport backed by a signal-cli daemon.
#[derive(Debug, Clone)]
pub struct SignalTransport {
    client: SignalClient,
}

impl SignalTransport {
    /// Create a transport; no connection is made until [`Transport::connect`].
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = SignalClient::new(config)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &SignalClient {
        &self.client
    }
}

#[async_trait]
impl Transport for SignalTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.client.open().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.client.close();
        Ok(())
    }

    async fn send_text(&self, identity: &str, text: &str) -> Result<(), TransportError> {
        if !self.client.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let result = self.client.send_text(identity, text).await?;
        debug!(identity, timestamp = result.timestamp, "Command sent");
        Ok(())
    }

    async fn subscribe(&self, identity: &str) -> Result<MessageFeed, TransportError> {
        let stream = MessageStream::open(&self.client).await?;
        let identity = identity.to_string();

        let feed = stream.filter_map(move |item| {
            future::ready(match item {
                Ok(envelope) => to_incoming_message(&envelope, &identity).map(Ok),
                Err(e) => Some(Err(TransportError::from(e))),
            })
        });
        Ok(feed.boxed())
    }

    async fn download(&self, message: &IncomingMessage) -> Result<Vec<u8>, TransportError> {
        let attachment = message.attachment.as_ref().ok_or_else(|| {
            TransportError::Download(format!("message {} has no attachment", message.id))
        })?;
        Ok(self.client.read_attachment(&attachment.reference).await?)
    }

    fn name(&self) -> &str {
        "signal-cli"
    }
}
