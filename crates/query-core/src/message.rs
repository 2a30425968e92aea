//! Messages received from a responder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A binary attachment carried by an incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttachment {
    /// Transport-specific reference used to fetch the content.
    pub reference: String,
    /// Declared MIME type, if the transport reported one.
    pub mime_type: Option<String>,
}

/// One unit received from a responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Monotonically increasing sequence id assigned by the transport.
    pub id: u64,
    /// Identity of the responder that sent the message.
    pub sender: String,
    /// Text body, if any.
    pub text: Option<String>,
    /// Single attachment, if any.
    pub attachment: Option<MessageAttachment>,
    /// When the transport received the message.
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    /// Create a text message.
    pub fn text(id: u64, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: sender.into(),
            text: Some(text.into()),
            attachment: None,
            received_at: Utc::now(),
        }
    }

    /// Attach a binary reference to this message.
    pub fn with_attachment(
        mut self,
        reference: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Self {
        self.attachment = Some(MessageAttachment {
            reference: reference.into(),
            mime_type: mime_type.map(str::to_string),
        });
        self
    }

    /// Text body, or an empty string when the message has none.
    pub fn body(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Whether the message has a non-empty text body.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Newline-join the non-empty text bodies of `messages` in arrival order.
    pub fn consolidate(messages: &[IncomingMessage]) -> String {
        messages
            .iter()
            .filter(|m| m.has_text())
            .map(IncomingMessage::body)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
