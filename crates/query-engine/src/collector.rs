//! Collection of a responder's multi-part reply.

use std::sync::Arc;

use futures::StreamExt;
use query_core::{IncomingMessage, Transport, TransportError};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::{CollectorSettings, Responder};

/// A message and the instant it came off the transport.
struct Arrival {
    at: Instant,
    message: IncomingMessage,
}

/// Live subscription to one responder.
///
/// A pump task forwards the transport feed into a bounded queue. Dropping the
/// subscription aborts the pump, which releases the feed.
struct Subscription {
    queue: mpsc::Receiver<Result<Arrival, TransportError>>,
    pump: JoinHandle<()>,
}

impl Subscription {
    async fn open<T: Transport>(
        transport: &T,
        identity: &str,
        capacity: usize,
    ) -> Result<Self, TransportError> {
        let mut feed = transport.subscribe(identity).await?;
        let (tx, queue) = mpsc::channel(capacity.max(1));

        let pump = tokio::spawn(async move {
            while let Some(item) = feed.next().await {
                let failed = item.is_err();
                let item = item.map(|message| Arrival {
                    at: Instant::now(),
                    message,
                });
                if tx.send(item).await.is_err() || failed {
                    return;
                }
            }
            let _ = tx.send(Err(TransportError::StreamClosed)).await;
        });

        Ok(Self { queue, pump })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Sends a command to a responder and gathers its reply.
///
/// Collections are serialized: the transport session is shared and replies
/// carry no correlation id, so only one collection may listen at a time.
pub struct ResponseCollector<T: Transport> {
    transport: Arc<T>,
    settings: CollectorSettings,
    channel: Mutex<()>,
}

impl<T: Transport> ResponseCollector<T> {
    pub fn new(transport: Arc<T>, settings: CollectorSettings) -> Self {
        Self {
            transport,
            settings,
            channel: Mutex::new(()),
        }
    }

    /// Send `command` to `responder` and return what it answered, in arrival order.
    ///
    /// Returns once at least one message has arrived and the responder has
    /// been silent for longer than the quiescence threshold, or once the
    /// responder's timeout has elapsed since the send. An empty list means the
    /// responder never answered.
    pub async fn collect(
        &self,
        responder: &Responder,
        command: &str,
    ) -> Result<Vec<IncomingMessage>, TransportError> {
        let _channel = self.channel.lock().await;

        let mut subscription = Subscription::open(
            self.transport.as_ref(),
            &responder.identity,
            self.settings.queue_capacity,
        )
        .await?;

        self.transport.send_text(&responder.identity, command).await?;
        let sent_at = Instant::now();
        let mut last_arrival = sent_at;
        let mut messages = Vec::new();

        loop {
            loop {
                match subscription.queue.try_recv() {
                    Ok(Ok(arrival)) => {
                        debug!(
                            identity = %responder.identity,
                            id = arrival.message.id,
                            "Message received"
                        );
                        last_arrival = last_arrival.max(arrival.at);
                        messages.push(arrival.message);
                    }
                    Ok(Err(e)) => return Err(e),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Err(TransportError::StreamClosed),
                }
            }

            let now = Instant::now();
            if !messages.is_empty()
                && now.duration_since(last_arrival) > self.settings.quiescence
            {
                break;
            }
            if now.duration_since(sent_at) > responder.timeout {
                break;
            }

            sleep(self.settings.poll_interval).await;
        }

        info!(
            identity = %responder.identity,
            tier = %responder.tier,
            count = messages.len(),
            elapsed_ms = sent_at.elapsed().as_millis() as u64,
            "Collection finished"
        );
        Ok(messages)
    }
}
