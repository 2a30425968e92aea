//! Primary/backup fallback for one query.

use std::sync::Arc;

use query_core::{
    Clock, FileDescriptor, IncomingMessage, ObjectStore, QueryResult, SystemClock, Transport,
};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::circuit::CircuitBreaker;
use crate::classifier::{classify, Classification};
use crate::collector::ResponseCollector;
use crate::config::{EngineConfig, Tier};
use crate::error::QueryError;
use crate::media::MediaResolver;
use crate::normalizer::normalize;

/// A successful query before it is flattened into a [`QueryResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub text: String,
    pub files: Vec<FileDescriptor>,
    /// Responder whose reply was used.
    pub tier: Tier,
}

impl From<QueryResponse> for QueryResult {
    fn from(response: QueryResponse) -> Self {
        QueryResult::Success {
            text: response.text,
            files: response.files,
        }
    }
}

/// Where the fallback currently stands.
enum Stage {
    TryPrimary,
    TryBackup,
    Done(Tier, Vec<IncomingMessage>),
}

/// One query's hold on the shared transport session.
///
/// Released with [`SessionGuard::release`] on the normal path. A query future
/// dropped mid-flight releases its hold from [`Drop`] on a spawned task, so
/// the last holder still disconnects.
struct SessionGuard<T: Transport + 'static> {
    sessions: Arc<Mutex<usize>>,
    transport: Arc<T>,
    released: bool,
}

impl<T: Transport + 'static> SessionGuard<T> {
    async fn release(mut self) {
        if let Some(handle) = self.spawn_release() {
            if let Err(e) = handle.await {
                warn!("Session release task failed: {}", e);
            }
        }
    }

    fn spawn_release(&mut self) -> Option<JoinHandle<()>> {
        if self.released {
            return None;
        }
        self.released = true;

        let Ok(runtime) = Handle::try_current() else {
            warn!("No runtime to release transport session on");
            return None;
        };
        let sessions = self.sessions.clone();
        let transport = self.transport.clone();
        Some(runtime.spawn(async move {
            let mut count = sessions.lock().await;
            *count = count.saturating_sub(1);
            if *count == 0 {
                if let Err(e) = transport.disconnect().await {
                    warn!("Failed to disconnect transport: {}", e);
                }
            }
        }))
    }
}

impl<T: Transport + 'static> Drop for SessionGuard<T> {
    fn drop(&mut self) {
        if !self.released {
            debug!("Query dropped before finishing, releasing its session");
            self.spawn_release();
        }
    }
}

/// Runs commands against the primary responder and falls back to the backup.
///
/// The primary is skipped while its circuit is open and is blocked whenever
/// it lets a command go unanswered. An anti-spam notice from the primary
/// escalates to the backup without blocking. A not-found reply from either
/// responder ends the query. The backup has no circuit of its own.
///
/// Concurrent queries share one transport session: it is opened by the first
/// query in flight and closed when the last one finishes.
pub struct QueryOrchestrator<T: Transport, S: ObjectStore, C: Clock = SystemClock> {
    config: EngineConfig,
    transport: Arc<T>,
    sessions: Arc<Mutex<usize>>,
    collector: ResponseCollector<T>,
    media: MediaResolver<T, S>,
    circuit: Arc<CircuitBreaker<C>>,
}

impl<T: Transport + 'static, S: ObjectStore> QueryOrchestrator<T, S, SystemClock> {
    /// Create an orchestrator with its own system-clock circuit breaker.
    pub fn new(config: EngineConfig, transport: Arc<T>, store: Arc<S>) -> Self {
        let circuit = Arc::new(CircuitBreaker::new(config.cooldown));
        Self::with_circuit(config, transport, store, circuit)
    }
}

impl<T: Transport + 'static, S: ObjectStore, C: Clock> QueryOrchestrator<T, S, C> {
    /// Create an orchestrator sharing an existing circuit breaker.
    pub fn with_circuit(
        config: EngineConfig,
        transport: Arc<T>,
        store: Arc<S>,
        circuit: Arc<CircuitBreaker<C>>,
    ) -> Self {
        let collector = ResponseCollector::new(transport.clone(), config.collector);
        let media = MediaResolver::new(transport.clone(), store, config.public_url.clone());
        Self {
            config,
            transport,
            sessions: Arc::new(Mutex::new(0)),
            collector,
            media,
            circuit,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn circuit(&self) -> &Arc<CircuitBreaker<C>> {
        &self.circuit
    }

    /// Run `command` and flatten the outcome into the caller-facing result.
    pub async fn run_query(&self, command: &str) -> QueryResult {
        match self.query(command).await {
            Ok(response) => {
                info!(
                    command,
                    tier = %response.tier,
                    chars = response.text.chars().count(),
                    files = response.files.len(),
                    "Query succeeded"
                );
                response.into()
            }
            Err(e) => {
                info!(command, error = %e, "Query failed");
                QueryResult::error(e.to_string())
            }
        }
    }

    /// Run `command` through the fallback.
    ///
    /// The transport is connected for the duration of the query and
    /// released on every path out, including failures and cancellation.
    pub async fn query(&self, command: &str) -> Result<QueryResponse, QueryError> {
        info!(command, transport = self.transport.name(), "Query started");
        let session = self.open_session().await?;

        let outcome = self.execute(command).await;

        session.release().await;
        outcome
    }

    async fn open_session(&self) -> Result<SessionGuard<T>, QueryError> {
        let mut sessions = self.sessions.lock().await;
        if *sessions == 0 {
            self.transport.connect().await?;
            debug!(transport = self.transport.name(), "Transport connected");
        }
        *sessions += 1;
        Ok(SessionGuard {
            sessions: self.sessions.clone(),
            transport: self.transport.clone(),
            released: false,
        })
    }

    async fn execute(&self, command: &str) -> Result<QueryResponse, QueryError> {
        let mut stage = Stage::TryPrimary;
        loop {
            stage = match stage {
                Stage::TryPrimary => self.try_primary(command).await?,
                Stage::TryBackup => self.try_backup(command).await?,
                Stage::Done(tier, messages) => {
                    return Ok(self.assemble(command, tier, &messages).await)
                }
            };
        }
    }

    async fn try_primary(&self, command: &str) -> Result<Stage, QueryError> {
        let responder = &self.config.primary;

        if let Some(until) = self.circuit.blocked_until(&responder.identity).await {
            info!(
                identity = %responder.identity,
                until = %until,
                "Primary responder blocked, going to backup"
            );
            return Ok(Stage::TryBackup);
        }

        info!(identity = %responder.identity, "Querying primary responder");
        let messages = self.collector.collect(responder, command).await?;

        if messages.is_empty() {
            warn!(identity = %responder.identity, "Primary responder did not answer");
            self.circuit.record_failure(&responder.identity).await;
            return Ok(Stage::TryBackup);
        }

        match classify(&IncomingMessage::consolidate(&messages)) {
            Classification::NotFound => Err(QueryError::NotFound),
            Classification::AntiSpam => {
                info!(identity = %responder.identity, "Anti-spam notice, going to backup");
                Ok(Stage::TryBackup)
            }
            Classification::Success => Ok(Stage::Done(Tier::Primary, messages)),
        }
    }

    async fn try_backup(&self, command: &str) -> Result<Stage, QueryError> {
        let responder = &self.config.backup;

        info!(identity = %responder.identity, "Querying backup responder");
        let messages = self.collector.collect(responder, command).await?;

        if messages.is_empty() {
            warn!(identity = %responder.identity, "Backup responder did not answer");
            return Err(QueryError::NoResponse);
        }

        // Anti-spam text from the backup is passed through as content.
        match classify(&IncomingMessage::consolidate(&messages)) {
            Classification::NotFound => Err(QueryError::NotFound),
            _ => Ok(Stage::Done(Tier::Backup, messages)),
        }
    }

    async fn assemble(
        &self,
        command: &str,
        tier: Tier,
        messages: &[IncomingMessage],
    ) -> QueryResponse {
        let text = messages
            .iter()
            .filter(|m| m.has_text())
            .map(|m| normalize(m.body()))
            .filter(|body| !body.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let files = self.media.resolve(command, messages).await;

        QueryResponse { text, files, tier }
    }
}
