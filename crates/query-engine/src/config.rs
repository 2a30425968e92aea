//! Engine configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default deadline for the primary responder.
pub const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for the backup responder.
pub const DEFAULT_BACKUP_TIMEOUT: Duration = Duration::from_secs(40);

/// Default cooldown after a responder fails to answer (3 hours).
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3 * 60 * 60);

/// Default silence after the last message that ends a collection.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_secs(4);

/// Default collector polling tick.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default capacity of the per-collection message queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Which fallback tier a responder occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Primary,
    Backup,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Backup => "backup",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One responder and its per-attempt deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responder {
    pub tier: Tier,
    /// Transport identity the command is sent to.
    pub identity: String,
    pub timeout: Duration,
}

impl Responder {
    pub fn primary(identity: impl Into<String>) -> Self {
        Self {
            tier: Tier::Primary,
            identity: identity.into(),
            timeout: DEFAULT_PRIMARY_TIMEOUT,
        }
    }

    pub fn backup(identity: impl Into<String>) -> Self {
        Self {
            tier: Tier::Backup,
            identity: identity.into(),
            timeout: DEFAULT_BACKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Timing for the response collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Silence after the last message that ends a collection.
    pub quiescence: Duration,
    /// How often the collector inspects its queue.
    pub poll_interval: Duration,
    /// Bound of the queue between the subscription and the collector.
    pub queue_capacity: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            quiescence: DEFAULT_QUIESCENCE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Configuration for the query engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub primary: Responder,
    pub backup: Responder,
    /// How long a responder stays blocked after failing to answer.
    pub cooldown: Duration,
    pub collector: CollectorSettings,
    /// Base URL prepended to stored file keys, without trailing slash.
    pub public_url: String,
}

impl EngineConfig {
    /// Create a configuration with the default policy for the two responders.
    pub fn new(primary: impl Into<String>, backup: impl Into<String>) -> Self {
        Self {
            primary: Responder::primary(primary),
            backup: Responder::backup(backup),
            cooldown: DEFAULT_COOLDOWN,
            collector: CollectorSettings::default(),
            public_url: "http://127.0.0.1:8080".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PRIMARY_RESPONDER` | Primary responder identity | (required) |
    /// | `BACKUP_RESPONDER` | Backup responder identity | (required) |
    /// | `PRIMARY_TIMEOUT_SECS` | Primary deadline | `30` |
    /// | `BACKUP_TIMEOUT_SECS` | Backup deadline | `40` |
    /// | `RESPONDER_COOLDOWN_SECS` | Block duration after no answer | `10800` |
    /// | `QUIESCENCE_MILLIS` | Silence that ends a reply | `4000` |
    /// | `POLL_INTERVAL_MILLIS` | Collector tick | `500` |
    /// | `PUBLIC_URL` | Base URL for file links | `http://127.0.0.1:8080` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its
    /// value. [`EngineConfig::from_env`] passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let primary = required(&lookup, "PRIMARY_RESPONDER")?;
        let backup = required(&lookup, "BACKUP_RESPONDER")?;
        let mut config = Self::new(primary, backup);

        if let Some(secs) = parsed::<u64>(&lookup, "PRIMARY_TIMEOUT_SECS")? {
            config.primary.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed::<u64>(&lookup, "BACKUP_TIMEOUT_SECS")? {
            config.backup.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed::<u64>(&lookup, "RESPONDER_COOLDOWN_SECS")? {
            config.cooldown = Duration::from_secs(secs);
        }
        if let Some(millis) = parsed::<u64>(&lookup, "QUIESCENCE_MILLIS")? {
            config.collector.quiescence = Duration::from_millis(millis);
        }
        if let Some(millis) = parsed::<u64>(&lookup, "POLL_INTERVAL_MILLIS")? {
            if millis == 0 {
                return Err(ConfigError::Invalid {
                    name: "POLL_INTERVAL_MILLIS".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.collector.poll_interval = Duration::from_millis(millis);
        }
        if let Some(url) = lookup("PUBLIC_URL") {
            config = config.with_public_url(url);
        }

        Ok(config)
    }

    /// Set the public base URL (a trailing slash is removed).
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_collector(mut self, collector: CollectorSettings) -> Self {
        self.collector = collector;
        self
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
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

    const RESPONDERS: [(&str, &str); 2] = [
        ("PRIMARY_RESPONDER", "@primary"),
        ("BACKUP_RESPONDER", "@backup"),
    ];

    #[test]
    fn test_from_lookup_defaults() {
        let config = EngineConfig::from_lookup(lookup_in(&RESPONDERS)).unwrap();
        assert_eq!(config.primary.identity, "@primary");
        assert_eq!(config.backup.identity, "@backup");
        assert_eq!(config.primary.timeout, DEFAULT_PRIMARY_TIMEOUT);
        assert_eq!(config.collector, CollectorSettings::default());
        assert_eq!(config.public_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_from_lookup_missing_responder() {
        let err = EngineConfig::from_lookup(lookup_in(&[("PRIMARY_RESPONDER", "@primary")]))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvVar(ref name) if name == "BACKUP_RESPONDER")
        );

        let err = EngineConfig::from_lookup(lookup_in(&[
            ("PRIMARY_RESPONDER", "  "),
            ("BACKUP_RESPONDER", "@backup"),
        ]))
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvVar(ref name) if name == "PRIMARY_RESPONDER")
        );
    }

    #[test]
    fn test_from_lookup_unparsable_number() {
        let mut vars = RESPONDERS.to_vec();
        vars.push(("BACKUP_TIMEOUT_SECS", "forty"));

        let err = EngineConfig::from_lookup(lookup_in(&vars)).unwrap_err();

        assert!(
            matches!(err, ConfigError::Invalid { ref name, .. } if name == "BACKUP_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_from_lookup_zero_poll_interval() {
        let mut vars = RESPONDERS.to_vec();
        vars.push(("POLL_INTERVAL_MILLIS", "0"));

        let err = EngineConfig::from_lookup(lookup_in(&vars)).unwrap_err();

        assert!(
            matches!(err, ConfigError::Invalid { ref name, .. } if name == "POLL_INTERVAL_MILLIS")
        );
    }

    #[test]
    fn test_from_lookup_overrides() {
        let mut vars = RESPONDERS.to_vec();
        vars.extend([
            ("PRIMARY_TIMEOUT_SECS", "10"),
            ("BACKUP_TIMEOUT_SECS", " 20 "),
            ("RESPONDER_COOLDOWN_SECS", "60"),
            ("QUIESCENCE_MILLIS", "1500"),
            ("POLL_INTERVAL_MILLIS", "100"),
            ("PUBLIC_URL", "https://api.example.com/"),
        ]);

        let config = EngineConfig::from_lookup(lookup_in(&vars)).unwrap();

        assert_eq!(config.primary.timeout, Duration::from_secs(10));
        assert_eq!(config.backup.timeout, Duration::from_secs(20));
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.collector.quiescence, Duration::from_millis(1500));
        assert_eq!(config.collector.poll_interval, Duration::from_millis(100));
        assert_eq!(config.public_url, "https://api.example.com");
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("@primary", "@backup");
        assert_eq!(config.primary.tier, Tier::Primary);
        assert_eq!(config.primary.timeout, Duration::from_secs(30));
        assert_eq!(config.backup.tier, Tier::Backup);
        assert_eq!(config.backup.timeout, Duration::from_secs(40));
        assert_eq!(config.cooldown, Duration::from_secs(10_800));
        assert_eq!(config.collector.quiescence, Duration::from_secs(4));
        assert_eq!(config.collector.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_public_url_trailing_slash() {
        let config = EngineConfig::new("a", "b").with_public_url("https://api.example.com/");
        assert_eq!(config.public_url, "https://api.example.com");
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Primary.to_string(), "primary");
        assert_eq!(Tier::Backup.to_string(), "backup");
    }
}
