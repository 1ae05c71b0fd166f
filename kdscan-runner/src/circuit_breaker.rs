//! Circuit breaker for provider rate limiting and IP bans.
//!
//! When the chart API answers HTTP 403 (IP ban) or keeps answering 429/5xx,
//! the breaker trips and refuses every remaining request of the scan until
//! the cooldown has passed. Symbols refused this way are skipped as fetch
//! failures.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// State of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation: requests are allowed.
    Closed,
    /// Tripped: all requests are refused until cooldown expires.
    Open { tripped_at: Instant },
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
}

/// Circuit breaker shared by every request a provider makes.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    /// Create a breaker with the given cooldown that trips after 3 consecutive failures.
    pub fn new(cooldown: Duration) -> Self {
        Self::with_threshold(cooldown, 3)
    }

    pub fn with_threshold(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 30-minute cooldown; longer than any single scan.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }

    // Every critical section leaves the state consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if requests are currently allowed.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open { tripped_at } => {
                if tripped_at.elapsed() >= self.cooldown {
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Record a successful request; resets the failure counter.
    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    /// Record a failure. Trips the breaker once the threshold is reached.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            inner.state = BreakerState::Open {
                tripped_at: Instant::now(),
            };
        }
    }

    /// Immediately trip the breaker (403 Forbidden).
    pub fn trip(&self) {
        self.lock().state = BreakerState::Open {
            tripped_at: Instant::now(),
        };
    }

    /// Remaining cooldown time (zero if not tripped).
    pub fn remaining_cooldown(&self) -> Duration {
        match self.lock().state {
            BreakerState::Closed => Duration::ZERO,
            BreakerState::Open { tripped_at } => self.cooldown.saturating_sub(tripped_at.elapsed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        assert!(cb.is_allowed());
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.remaining_cooldown(), Duration::ZERO);
    }

    #[test]
    fn trips_after_threshold_failures() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_failure();
        assert!(!cb.is_allowed());
        assert!(cb.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn custom_threshold() {
        let cb = CircuitBreaker::with_threshold(Duration::from_secs(60), 1);
        cb.record_failure();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn immediate_trip() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.trip();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn success_resets_counter() {
        let cb = CircuitBreaker::new(Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.is_allowed());
    }

    #[test]
    fn expires_after_cooldown() {
        let cb = CircuitBreaker::new(Duration::from_millis(10));
        cb.trip();
        assert!(!cb.is_allowed());
        std::thread::sleep(Duration::from_millis(15));
        assert!(cb.is_allowed());
        assert_eq!(cb.state(), BreakerState::Closed);
    }
}
