//! Test doubles for the responder query engine.
//!
//! This crate provides mock implementations of the `query-core` capabilities:
//! - `ScriptedTransport` - Replies to commands with pre-scripted, timed messages
//! - `MemoryStore` - Keeps stored objects in memory
//! - `ManualClock` - A clock that only moves when told to
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use mock_responder::{ScriptedReply, ScriptedTransport};
//!
//! let transport = ScriptedTransport::new();
//! transport.script(
//!     "@primary",
//!     vec![ScriptedReply::text(Duration::from_millis(100), "Hello")],
//! );
//! ```

mod clock;
mod scripted;
mod store;

pub use clock::ManualClock;
pub use scripted::{ScriptedReply, ScriptedTransport};
pub use store::MemoryStore;

// Re-export query-core types for convenience
pub use query_core::{IncomingMessage, ObjectStore, Transport, TransportError};
