//! signal-cli daemon transport.
//!
//! This crate talks to a signal-cli daemon over HTTP and exposes it as a
//! [`query_core::Transport`]. It supports:
//!
//! - Sending text commands to a responder (JSON-RPC `send`)
//! - Receiving a responder's replies via Server-Sent Events (SSE)
//! - Reading attachments the daemon saved to its attachments directory
//!
//! # Example
//!
//! ```no_run
//! use query_core::Transport;
//! use signal_transport::{SignalTransport, TransportConfig};
//!
//! # async fn example() -> Result<(), query_core::TransportError> {
//! let config = TransportConfig::with_account("http://127.0.0.1:8081", "+15550000000");
//! let transport = SignalTransport::new(config)?;
//!
//! transport.connect().await?;
//! let feed = transport.subscribe("+15551112222").await?;
//! transport.send_text("+15551112222", "/cla 12345678").await?;
//! # drop(feed);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod transport;
pub mod types;

pub use client::SignalClient;
pub use config::TransportConfig;
pub use error::DaemonError;
pub use sse::MessageStream;
pub use transport::{to_incoming_message, SignalTransport};
pub use types::*;
