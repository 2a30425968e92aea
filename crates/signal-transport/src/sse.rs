//! Server-Sent Events (SSE) client for receiving messages.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, error, info, warn};

use crate::error::DaemonError;
use crate::types::{Envelope, ReceiveEvent};
use crate::SignalClient;

/// A stream of incoming Signal message envelopes.
///
/// Each stream owns its own SSE connection; dropping it closes the connection.
pub struct MessageStream {
    event_source: EventSource,
}

impl MessageStream {
    /// Open an SSE connection and wait until the daemon accepts it.
    ///
    /// Envelopes received after this returns are delivered on the stream.
    pub async fn open(client: &SignalClient) -> Result<Self, DaemonError> {
        let url = client.config().events_url();
        info!("Creating SSE connection to {}", url);

        // SSE connections are long-lived and must not share the RPC client's timeout
        let sse_client = reqwest::Client::builder().build().map_err(DaemonError::Http)?;

        let mut event_source = sse_client
            .get(&url)
            .eventsource()
            .map_err(|e| DaemonError::Sse(e.to_string()))?;

        match event_source.next().await {
            Some(Ok(Event::Open)) => {
                debug!("SSE connection opened");
                Ok(Self { event_source })
            }
            Some(Ok(Event::Message(msg))) => {
                warn!("SSE delivered {} before open; continuing", msg.event);
                Ok(Self { event_source })
            }
            Some(Err(e)) => {
                event_source.close();
                Err(DaemonError::Sse(e.to_string()))
            }
            None => Err(DaemonError::Sse("stream ended before opening".to_string())),
        }
    }
}

impl Stream for MessageStream {
    type Item = Result<Envelope, DaemonError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => {
                    debug!("SSE connection reopened");
                    continue;
                }
                Poll::Ready(Some(Ok(Event::Message(msg)))) => {
                    // The "receive" event type contains message data
                    if msg.event != "receive" {
                        debug!("Ignoring SSE event type: {}", msg.event);
                        continue;
                    }
                    match serde_json::from_str::<ReceiveEvent>(&msg.data) {
                        Ok(event) => return Poll::Ready(Some(Ok(event.envelope))),
                        Err(e) => {
                            warn!("Failed to parse SSE event data: {}", e);
                            debug!("Raw data: {}", msg.data);
                            continue;
                        }
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    error!("SSE error: {}", e);
                    return Poll::Ready(Some(Err(DaemonError::Sse(e.to_string()))));
                }
                Poll::Ready(None) => {
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
