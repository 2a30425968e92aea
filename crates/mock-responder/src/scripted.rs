//! Scripted transport - replies to each command with a pre-arranged timeline.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use query_core::{IncomingMessage, MessageFeed, Transport, TransportError};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

type Listener = mpsc::UnboundedSender<Result<IncomingMessage, TransportError>>;

/// What a scripted reply delivers.
#[derive(Debug, Clone)]
enum ReplyBody {
    Text(String),
    Attachment {
        text: Option<String>,
        reference: String,
        mime_type: Option<String>,
    },
    Failure(String),
}

/// One reply, delivered `delay` after the command is sent.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    delay: Duration,
    body: ReplyBody,
}

impl ScriptedReply {
    /// A text reply.
    pub fn text(delay: Duration, text: impl Into<String>) -> Self {
        Self {
            delay,
            body: ReplyBody::Text(text.into()),
        }
    }

    /// A reply carrying an attachment, with optional caption text.
    pub fn attachment(
        delay: Duration,
        caption: Option<&str>,
        reference: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Self {
        Self {
            delay,
            body: ReplyBody::Attachment {
                text: caption.map(str::to_string),
                reference: reference.into(),
                mime_type: mime_type.map(str::to_string),
            },
        }
    }

    /// A stream failure surfaced to subscribers.
    pub fn failure(delay: Duration, reason: impl Into<String>) -> Self {
        Self {
            delay,
            body: ReplyBody::Failure(reason.into()),
        }
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, VecDeque<Vec<ScriptedReply>>>,
    listeners: HashMap<String, Vec<Listener>>,
    sent: Vec<(String, String)>,
    downloads: HashMap<String, Vec<u8>>,
}

/// A transport whose responders follow pre-arranged scripts.
///
/// Each `send_text` to an identity consumes the next script queued for it and
/// delivers the script's replies to every live subscriber of that identity.
/// An identity with no script left stays silent.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
    connects: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    connect_error: Option<String>,
    send_error: Option<String>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            ..Default::default()
        }
    }

    /// A transport whose `connect` always fails.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            connect_error: Some(reason.into()),
            ..Self::new()
        }
    }

    /// A transport whose `send_text` always fails.
    pub fn rejecting_sends(reason: impl Into<String>) -> Self {
        Self {
            send_error: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Queue the replies for the next command sent to `identity`.
    pub fn script(&self, identity: &str, replies: Vec<ScriptedReply>) {
        self.lock()
            .scripts
            .entry(identity.to_string())
            .or_default()
            .push_back(replies);
    }

    /// Register downloadable content for an attachment reference.
    pub fn with_download(&self, reference: &str, bytes: &[u8]) {
        self.lock()
            .downloads
            .insert(reference.to_string(), bytes.to_vec());
    }

    /// All commands sent, as `(identity, text)` pairs in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.lock().sent.clone()
    }

    /// Commands sent to `identity`.
    pub fn sent_to(&self, identity: &str) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .filter(|(to, _)| to == identity)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Number of live subscriptions for `identity`.
    pub fn live_subscriptions(&self, identity: &str) -> usize {
        self.lock()
            .listeners
            .get(identity)
            .map_or(0, |l| l.iter().filter(|s| !s.is_closed()).count())
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn build_message(
        &self,
        identity: &str,
        body: ReplyBody,
    ) -> Result<IncomingMessage, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        match body {
            ReplyBody::Text(text) => Ok(IncomingMessage::text(id, identity, text)),
            ReplyBody::Attachment {
                text,
                reference,
                mime_type,
            } => {
                let mut msg = IncomingMessage::text(id, identity, "")
                    .with_attachment(reference, mime_type.as_deref());
                msg.text = text;
                Ok(msg)
            }
            ReplyBody::Failure(reason) => Err(TransportError::Stream(reason)),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.connect_error {
            Some(reason) => Err(TransportError::Connection(reason.clone())),
            None => Ok(()),
        }
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_text(&self, identity: &str, text: &str) -> Result<(), TransportError> {
        if let Some(reason) = &self.send_error {
            return Err(TransportError::SendFailed(reason.clone()));
        }

        let (replies, listeners) = {
            let mut state = self.lock();
            state.sent.push((identity.to_string(), text.to_string()));
            let replies = state
                .scripts
                .get_mut(identity)
                .and_then(VecDeque::pop_front)
                .unwrap_or_default();
            let listeners = state.listeners.get(identity).cloned().unwrap_or_default();
            (replies, listeners)
        };

        debug!(identity, replies = replies.len(), "Scripted command received");

        let transport = self.clone();
        let identity = identity.to_string();
        let sent_at = Instant::now();
        tokio::spawn(async move {
            for reply in replies {
                sleep_until(sent_at + reply.delay).await;
                let item = transport.build_message(&identity, reply.body);
                for listener in &listeners {
                    let _ = listener.send(item.clone());
                }
            }
        });

        Ok(())
    }

    async fn subscribe(&self, identity: &str) -> Result<MessageFeed, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let listeners = state.listeners.entry(identity.to_string()).or_default();
        listeners.retain(|l| !l.is_closed());
        listeners.push(tx);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    async fn download(&self, message: &IncomingMessage) -> Result<Vec<u8>, TransportError> {
        let reference = message
            .attachment
            .as_ref()
            .map(|a| a.reference.clone())
            .ok_or_else(|| {
                TransportError::Download(format!("message {} has no attachment", message.id))
            })?;

        self.lock()
            .downloads
            .get(&reference)
            .cloned()
            .ok_or_else(|| TransportError::Download(format!("unknown attachment {}", reference)))
    }

    fn name(&self) -> &str {
        "ScriptedTransport"
    }
}
