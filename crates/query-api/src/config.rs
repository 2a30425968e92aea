//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use query_engine::EngineConfig;

/// Query API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Root directory for stored attachments, served under `/files`.
    pub download_dir: PathBuf,
    /// Signal daemon URL.
    pub signal_daemon_url: String,
    /// Account the daemon sends commands from.
    pub signal_account: String,
    /// Where the daemon saves received attachments, if not the default.
    pub signal_attachments_dir: Option<PathBuf>,
    /// Responders, timing and public URL.
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `QUERY_API_ADDR` | Server bind address | `0.0.0.0:8080` |
    /// | `DOWNLOAD_DIR` | Stored attachments root | `downloads` |
    /// | `SIGNAL_DAEMON_URL` | Signal daemon URL | `http://127.0.0.1:8081` |
    /// | `SIGNAL_ACCOUNT` | Account commands are sent from | (required) |
    /// | `SIGNAL_ATTACHMENTS_DIR` | Daemon attachments directory | signal-cli default |
    ///
    /// Engine variables are documented on [`EngineConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("QUERY_API_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let download_dir = lookup("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("downloads"));

        let signal_daemon_url =
            lookup("SIGNAL_DAEMON_URL").unwrap_or_else(|| "http://127.0.0.1:8081".to_string());

        let signal_account = lookup("SIGNAL_ACCOUNT")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingSignalAccount)?;

        let signal_attachments_dir = lookup("SIGNAL_ATTACHMENTS_DIR").map(PathBuf::from);

        let engine = EngineConfig::from_lookup(&lookup)?;

        Ok(Self {
            addr,
            download_dir,
            signal_daemon_url,
            signal_account,
            signal_attachments_dir,
            engine,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid QUERY_API_ADDR format")]
    InvalidAddr,

    #[error("SIGNAL_ACCOUNT environment variable is required")]
    MissingSignalAccount,

    #[error(transparent)]
    Engine(#[from] query_engine::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SIGNAL_ACCOUNT", "+15550001111"),
            ("PRIMARY_RESPONDER", "@primary"),
            ("BACKUP_RESPONDER", "@backup"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_in(&base_vars())).unwrap();

        assert_eq!(config.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.signal_daemon_url, "http://127.0.0.1:8081");
        assert_eq!(config.signal_account, "+15550001111");
        assert!(config.signal_attachments_dir.is_none());
        assert_eq!(config.engine.primary.identity, "@primary");
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.extend([
            ("QUERY_API_ADDR", "127.0.0.1:9000"),
            ("DOWNLOAD_DIR", "/srv/files"),
            ("SIGNAL_DAEMON_URL", "http://daemon:8081"),
            ("SIGNAL_ATTACHMENTS_DIR", "/data/attachments"),
            ("PUBLIC_URL", "https://api.example.com"),
        ]);

        let config = Config::from_lookup(lookup_in(&vars)).unwrap();

        assert_eq!(config.addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.download_dir, PathBuf::from("/srv/files"));
        assert_eq!(config.signal_daemon_url, "http://daemon:8081");
        assert_eq!(
            config.signal_attachments_dir,
            Some(PathBuf::from("/data/attachments"))
        );
        assert_eq!(config.engine.public_url, "https://api.example.com");
    }

    #[test]
    fn test_missing_signal_account() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "SIGNAL_ACCOUNT")
            .collect();

        let err = Config::from_lookup(lookup_in(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::MissingSignalAccount));
    }

    #[test]
    fn test_invalid_addr() {
        let mut vars = base_vars();
        vars.push(("QUERY_API_ADDR", "localhost"));

        let err = Config::from_lookup(lookup_in(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidAddr));
    }

    #[test]
    fn test_engine_errors_pass_through() {
        let vars = [("SIGNAL_ACCOUNT", "+15550001111")];

        let err = Config::from_lookup(lookup_in(&vars)).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Engine(query_engine::ConfigError::MissingEnvVar(_))
        ));
        assert_eq!(
            err.to_string(),
            "PRIMARY_RESPONDER environment variable is required"
        );
    }
}
