//! Configuration for the signal-cli transport.

use std::path::{Path, PathBuf};

/// Default directory where signal-cli saves received attachments.
pub const DEFAULT_ATTACHMENTS_DIR: &str = ".local/share/signal-cli/attachments";

/// Configuration for connecting to the signal-cli daemon.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL of the daemon HTTP server (e.g., "http://localhost:8081").
    pub base_url: String,
    /// Registered account the daemon sends from (the session credential).
    /// If None, assumes single-account mode.
    pub account: Option<String>,
    /// Directory where the daemon stores received attachments.
    pub attachments_dir: PathBuf,
}

impl TransportConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account: None,
            attachments_dir: default_attachments_dir(),
        }
    }

    /// Create configuration for a specific account.
    pub fn with_account(base_url: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            account: Some(account.into()),
            ..Self::new(base_url)
        }
    }

    /// Override the attachments directory.
    pub fn with_attachments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attachments_dir = dir.into();
        self
    }

    /// Get the RPC endpoint URL.
    pub fn rpc_url(&self) -> String {
        format!("{}/api/v1/rpc", self.base_url)
    }

    /// Get the events endpoint URL (with account query param if set).
    pub fn events_url(&self) -> String {
        match &self.account {
            Some(account) => {
                let encoded = urlencoding::encode(account);
                format!("{}/api/v1/events?account={}", self.base_url, encoded)
            }
            None => format!("{}/api/v1/events", self.base_url),
        }
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }

    /// Location of a saved attachment, or None if the id would escape the directory.
    pub fn attachment_path(&self, attachment_id: &str) -> Option<PathBuf> {
        let relative = Path::new(attachment_id);
        let is_plain_name = relative.components().count() == 1
            && relative.file_name().is_some_and(|name| name == relative.as_os_str());
        is_plain_name.then(|| self.attachments_dir.join(relative))
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new("http://localhost:8081")
    }
}

fn default_attachments_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_ATTACHMENTS_DIR),
        None => PathBuf::from(DEFAULT_ATTACHMENTS_DIR),
    }
}
