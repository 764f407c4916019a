// Path: crates/conduit-middleware/src/breaker.rs
//! Per-service-instance circuit breaker: closed (pass) → open (reject until
//! recovery) → half-open (admit one probe) → closed or back to open.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// A circuit breaker guarding a single downstream dependency.
///
/// `threshold` consecutive failures trip the breaker to `Open`; it stays
/// open until `recovery_time` has elapsed since the last failure, at which
/// point a single probe is admitted (`HalfOpen`). The probe's outcome
/// decides whether the breaker closes again or reopens.
pub struct CircuitBreaker {
    threshold: u32,
    recovery_time: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            threshold,
            recovery_time,
            inner: Mutex::new(Inner { state: State::Closed, failure_count: 0, last_failure: None }),
        }
    }

    /// Returns `true` if a call should be admitted right now. Called before
    /// every breaker-admitted RPC; a half-open admission counts as the
    /// single outstanding probe until `after_call` resolves it.
    pub fn before_call(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => true,
            State::HalfOpen => true,
            State::Open => {
                let elapsed = inner.last_failure.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
                if elapsed >= self.recovery_time {
                    inner.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records the outcome of a call admitted by `before_call`.
    pub fn after_call(&self, success: bool) {
        let mut inner = self.inner.lock();
        if success {
            inner.state = State::Closed;
            inner.failure_count = 0;
            inner.last_failure = None;
            return;
        }

        inner.last_failure = Some(Instant::now());
        match inner.state {
            State::HalfOpen => {
                inner.state = State::Open;
                inner.failure_count = self.threshold;
            }
            State::Closed | State::Open => {
                inner.failure_count += 1;
                if inner.failure_count >= self.threshold {
                    inner.state = State::Open;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let breaker = CircuitBreaker::new(3, Duration::from_millis(50));
        assert!(breaker.before_call());
    }

    #[test]
    fn trips_open_after_threshold_failures() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.after_call(false);
        assert!(breaker.before_call());
        breaker.after_call(false);
        assert!(!breaker.before_call());
    }

    #[test]
    fn half_opens_after_recovery_time_and_closes_on_success() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.after_call(false);
        assert!(!breaker.before_call());
        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.before_call());
        breaker.after_call(true);
        assert!(breaker.before_call());
    }

    #[test]
    fn half_open_probe_failure_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.after_call(false);
        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.before_call());
        breaker.after_call(false);
        assert!(!breaker.before_call());
    }

    #[test]
    fn success_in_closed_state_keeps_failure_count_at_zero() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.after_call(false);
        breaker.after_call(true);
        breaker.after_call(false);
        assert!(breaker.before_call());
    }
}
