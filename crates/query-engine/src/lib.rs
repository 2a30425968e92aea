//! Query engine over unreliable free-text responders.
//!
//! This crate provides the [`QueryOrchestrator`] which sends a command to a
//! primary responder, gathers its multi-part reply, and falls back to a
//! backup responder when the primary is silent, cooling down, or deflecting
//! with an anti-spam notice.
//!
//! # Architecture
//!
//! ```text
//! Command ("/cla 12345678")
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     QUERY ORCHESTRATOR                      │
//! │                                                             │
//! │  1. Connect transport                                       │
//! │         ↓                                                   │
//! │  2. Primary blocked? ──yes──────────────┐                   │
//! │         ↓ no                            │                   │
//! │  3. Collect primary reply               │                   │
//! │     • silent     → block primary ───────┤                   │
//! │     • anti-spam  ───────────────────────┤                   │
//! │     • not found  → error                ↓                   │
//! │     • success    ─────┐       4. Collect backup reply       │
//! │                       │          • silent    → error        │
//! │                       │          • not found → error        │
//! │                       ↓          • otherwise ─┐             │
//! │  5. Normalize text, store attachments ←───────┘             │
//! │         ↓                                                   │
//! │  6. Disconnect transport                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use query_engine::{EngineConfig, LocalObjectStore, QueryOrchestrator};
//! use signal_transport::{SignalTransport, TransportConfig};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::from_env()?;
//! let transport = Arc::new(SignalTransport::new(TransportConfig::default())?);
//! let store = Arc::new(LocalObjectStore::new("downloads"));
//!
//! let orchestrator = QueryOrchestrator::new(config, transport, store);
//! let result = orchestrator.run_query("/cla 12345678").await;
//! ```

pub mod circuit;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod media;
pub mod normalizer;
pub mod orchestrator;
pub mod storage;

pub use circuit::CircuitBreaker;
pub use classifier::{classify, Classification};
pub use collector::ResponseCollector;
pub use config::{CollectorSettings, EngineConfig, Responder, Tier};
pub use error::{ConfigError, MediaError, QueryError};
pub use media::{extension_for, MediaResolver};
pub use normalizer::normalize;
pub use orchestrator::{QueryOrchestrator, QueryResponse};
pub use storage::{cache_key, command_slug, split_command, storage_path, LocalObjectStore};

// Re-export core types for convenience
pub use query_core::{FileDescriptor, IncomingMessage, ObjectStore, QueryResult, Transport};
