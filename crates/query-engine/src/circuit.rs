//! Per-responder cooldown after a failed attempt.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use query_core::{Clock, SystemClock};
use tokio::sync::RwLock;
use tracing::warn;

/// Tracks when each responder last failed to answer.
///
/// A responder is blocked while `now < last_failure + cooldown`. Blocking
/// lapses only by time passing; a later failure restarts the window. Shared
/// between concurrent queries.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    failures: RwLock<HashMap<String, DateTime<Utc>>>,
    cooldown: chrono::Duration,
    clock: C,
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker reading the system clock.
    pub fn new(cooldown: Duration) -> Self {
        Self::with_clock(cooldown, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker reading `clock`.
    pub fn with_clock(cooldown: Duration, clock: C) -> Self {
        Self {
            failures: RwLock::new(HashMap::new()),
            cooldown: chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX),
            clock,
        }
    }

    /// Whether `identity` is cooling down and must not be attempted.
    pub async fn is_blocked(&self, identity: &str) -> bool {
        self.blocked_until(identity).await.is_some()
    }

    /// End of the current cooldown for `identity`, if it is blocked.
    pub async fn blocked_until(&self, identity: &str) -> Option<DateTime<Utc>> {
        let last = *self.failures.read().await.get(identity)?;
        let until = self.window_end(last);
        (self.clock.now() < until).then_some(until)
    }

    /// Start (or restart) the cooldown for `identity` from now.
    pub async fn record_failure(&self, identity: &str) {
        let now = self.clock.now();
        let mut failures = self.failures.write().await;
        let entry = failures.entry(identity.to_string()).or_insert(now);
        // Failure timestamps only move forward.
        if now > *entry {
            *entry = now;
        }
        warn!(identity, until = %self.window_end(*entry), "Responder blocked");
    }

    /// When `identity` last failed, if ever.
    pub async fn last_failure(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.failures.read().await.get(identity).copied()
    }

    fn window_end(&self, last_failure: DateTime<Utc>) -> DateTime<Utc> {
        last_failure
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_responder::ManualClock;
    use std::sync::Arc;

    const THREE_HOURS: Duration = Duration::from_secs(3 * 60 * 60);

    fn breaker() -> (CircuitBreaker<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (CircuitBreaker::with_clock(THREE_HOURS, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_never_failed_is_open() {
        let (breaker, _) = breaker();
        assert!(!breaker.is_blocked("@primary").await);
        assert!(breaker.last_failure("@primary").await.is_none());
    }

    #[tokio::test]
    async fn test_blocked_for_exactly_cooldown() {
        let (breaker, clock) = breaker();
        breaker.record_failure("@primary").await;

        clock.advance(Duration::from_millis(1));
        assert!(breaker.is_blocked("@primary").await);

        clock.advance(THREE_HOURS - Duration::from_millis(2));
        assert!(breaker.is_blocked("@primary").await);

        clock.advance(Duration::from_millis(1));
        assert!(!breaker.is_blocked("@primary").await);

        clock.advance(Duration::from_secs(60));
        assert!(!breaker.is_blocked("@primary").await);
    }

    #[tokio::test]
    async fn test_new_failure_restarts_window() {
        let (breaker, clock) = breaker();
        breaker.record_failure("@primary").await;
        clock.advance(Duration::from_secs(2 * 60 * 60));
        breaker.record_failure("@primary").await;

        clock.advance(Duration::from_secs(2 * 60 * 60));
        assert!(breaker.is_blocked("@primary").await);

        clock.advance(Duration::from_secs(60 * 60));
        assert!(!breaker.is_blocked("@primary").await);
    }

    #[tokio::test]
    async fn test_identities_independent() {
        let (breaker, _) = breaker();
        breaker.record_failure("@primary").await;
        assert!(breaker.is_blocked("@primary").await);
        assert!(!breaker.is_blocked("@backup").await);
    }

    #[tokio::test]
    async fn test_blocked_until() {
        let (breaker, clock) = breaker();
        let start = clock.now();
        breaker.record_failure("@primary").await;
        assert_eq!(
            breaker.blocked_until("@primary").await,
            Some(start + chrono::Duration::hours(3))
        );
    }
}
