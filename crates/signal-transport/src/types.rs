//! Wire types exchanged with the signal-cli daemon.

use serde::{Deserialize, Serialize};

/// An envelope pushed by the daemon for each incoming message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Sender address as reported by the daemon.
    #[serde(default)]
    pub source: String,

    /// Sender phone number, if known.
    #[serde(default)]
    pub source_number: String,

    /// Sender account UUID, if known.
    #[serde(default)]
    pub source_uuid: Option<String>,

    /// Server receive time, milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: u64,

    /// Present for ordinary text/attachment messages; absent for receipts.
    #[serde(default)]
    pub data_message: Option<DataMessage>,
}

impl Envelope {
    /// Whether this envelope was sent by `identity` (number or UUID).
    pub fn is_from(&self, identity: &str) -> bool {
        self.source == identity
            || self.source_number == identity
            || self.source_uuid.as_deref() == Some(identity)
    }
}

/// Body of an ordinary message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    /// Message timestamp, unique per sender.
    #[serde(default)]
    pub timestamp: u64,

    /// Text body or attachment caption.
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Metadata of an attachment the daemon has saved to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Declared MIME type; empty when the sender declared none.
    #[serde(default)]
    pub content_type: String,

    #[serde(default)]
    pub filename: Option<String>,

    /// Attachment ID; also the file name under the attachments directory.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub size: Option<u64>,
}

/// Payload of a `receive` SSE event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveEvent {
    pub envelope: Envelope,
}

/// Parameters of the JSON-RPC `send` method.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    /// Recipient numbers or UUIDs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipient: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Sending account; required when the daemon serves several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl SendParams {
    /// A plain text message to one recipient.
    pub fn text(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: vec![recipient.into()],
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Reply to a `send` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Timestamp the daemon assigned to the outgoing message.
    pub timestamp: u64,

    /// Per-recipient delivery outcome, when the daemon reports it.
    #[serde(default)]
    pub results: Vec<RecipientResult>,
}

/// Delivery outcome for one recipient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResult {
    /// Result type reported by signal-cli ("SUCCESS", "UNREGISTERED_FAILURE", ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl RecipientResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.kind.as_deref().map_or(true, |k| k == "SUCCESS")
    }
}
