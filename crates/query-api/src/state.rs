//! Application state shared across handlers.

use std::sync::Arc;

use query_core::{async_trait, Clock, ObjectStore, QueryResult, Transport};
use query_engine::QueryOrchestrator;

/// Something that turns a command into a terminal result.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run_query(&self, command: &str) -> QueryResult;
}

#[async_trait]
impl<T, S, C> QueryRunner for QueryOrchestrator<T, S, C>
where
    T: Transport + 'static,
    S: ObjectStore + 'static,
    C: Clock + 'static,
{
    async fn run_query(&self, command: &str) -> QueryResult {
        QueryOrchestrator::run_query(self, command).await
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Runs validated commands.
    pub runner: Arc<dyn QueryRunner>,
}

impl AppState {
    /// Create new application state.
    pub fn new(runner: Arc<dyn QueryRunner>) -> Self {
        Self { runner }
    }
}
