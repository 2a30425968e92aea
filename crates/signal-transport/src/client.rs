//! Signal-cli daemon HTTP client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::error::DaemonError;
use crate::types::{SendParams, SendResult};

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
    id: u64,
}

/// JSON-RPC 2.0 reply; exactly one of `result` and `error` is set.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

/// HTTP client for one signal-cli daemon account.
///
/// Clones share the connection flag and the request id counter.
#[derive(Clone)]
pub struct SignalClient {
    http: Client,
    config: TransportConfig,
    request_id: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
}

impl SignalClient {
    /// Build a client without contacting the daemon.
    pub fn new(config: TransportConfig) -> Result<Self, DaemonError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DaemonError::Http)?;

        Ok(Self {
            http,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build a client and verify the daemon is reachable.
    pub async fn connect(config: TransportConfig) -> Result<Self, DaemonError> {
        let client = Self::new(config)?;
        client.open().await?;
        Ok(client)
    }

    /// Verify the daemon is healthy and mark the session open.
    pub async fn open(&self) -> Result<(), DaemonError> {
        if self.health_check().await? {
            info!("Connected to signal-cli daemon at {}", self.config.base_url);
            Ok(())
        } else {
            Err(DaemonError::HealthCheckFailed)
        }
    }

    /// Mark the session closed.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!("Disconnected from signal-cli daemon");
        }
    }

    /// Whether the last health check succeeded and the session is open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Probe `/api/v1/check`, updating the connection flag.
    pub async fn health_check(&self) -> Result<bool, DaemonError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.http.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(DaemonError::Http(e))
            }
        }
    }

    /// Call `send`, filling in the configured account.
    ///
    /// A recipient-level failure is reported as an RPC error even when the call
    /// itself succeeded.
    pub async fn send(&self, mut params: SendParams) -> Result<SendResult, DaemonError> {
        if params.account.is_none() {
            params.account = self.config.account.clone();
        }

        let result: SendResult = self.rpc_call("send", Some(params)).await?;
        if let Some(failed) = result.results.iter().find(|r| !r.is_success()) {
            warn!(kind = ?failed.kind, "Recipient rejected message");
            return Err(DaemonError::Rpc {
                code: -1,
                message: failed
                    .error
                    .clone()
                    .or_else(|| failed.kind.clone())
                    .unwrap_or_else(|| "delivery failed".to_string()),
            });
        }
        Ok(result)
    }

    /// Send `message` to one recipient.
    pub async fn send_text(
        &self,
        recipient: &str,
        message: &str,
    ) -> Result<SendResult, DaemonError> {
        self.send(SendParams::text(recipient, message)).await
    }

    /// Read an attachment the daemon saved to disk, by attachment id.
    pub async fn read_attachment(&self, id: &str) -> Result<Vec<u8>, DaemonError> {
        let path = self
            .config
            .attachment_path(id)
            .ok_or_else(|| DaemonError::Attachment(format!("invalid attachment id {}", id)))?;

        debug!(path = %path.display(), "Reading attachment");
        tokio::fs::read(&path)
            .await
            .map_err(|e| DaemonError::Attachment(format!("{}: {}", path.display(), e)))
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Issue one JSON-RPC call and unwrap its result.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, DaemonError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let url = self.config.rpc_url();

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(DaemonError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DaemonError::Connection(format!("HTTP {}: {}", status, body)));
        }

        let rpc_response: RpcResponse<R> = response.json().await.map_err(DaemonError::Http)?;

        if let Some(error) = rpc_response.error {
            return Err(DaemonError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| DaemonError::Rpc {
            code: -1,
            message: "No result in response".to_string(),
        })
    }
}

impl std::fmt::Debug for SignalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
