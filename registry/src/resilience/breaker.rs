//! Circuit breaker over a sliding failure window
//!
//! State machine: Closed (normal) → Open (short-circuit) when the failure
//! ratio within the window reaches 0.5 at minimum throughput → HalfOpen
//! after the open duration, admitting one trial call. One trial success
//! closes the breaker; a trial failure re-opens it.

use crate::error::{RegistryError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Breaker state, exposed for health reporting and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerInner {
    state: CircuitState,
    /// (instant, success) outcomes, oldest first, pruned to the window
    outcomes: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
}

/// Sliding-window circuit breaker. All transitions happen under one lock;
/// individual upstream attempts run outside it.
pub struct CircuitBreaker {
    window: Duration,
    min_throughput: u32,
    open_duration: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(window: Duration, min_throughput: u32, open_duration: Duration) -> Self {
        Self {
            window,
            min_throughput,
            open_duration,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                outcomes: VecDeque::new(),
                opened_at: None,
            }),
        }
    }

    /// Admit or short-circuit a call. An open breaker whose open duration
    /// has elapsed moves to half-open and admits the trial.
    pub fn try_acquire(&self) -> Result<()> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.open_duration)
                    .unwrap_or(true);
                if elapsed {
                    inner.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(RegistryError::unavailable_transport(
                        "circuit breaker open, upstream short-circuited",
                    ))
                }
            }
        }
    }

    /// Record a successful call. In half-open state this closes the breaker
    /// and clears the window.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.outcomes.clear();
            inner.opened_at = None;
            tracing::info!("circuit breaker closed after trial success");
            return;
        }
        let now = Instant::now();
        inner.outcomes.push_back((now, true));
        self.prune(&mut inner, now);
    }

    /// Record a failed call, opening the breaker when the window's failure
    /// ratio reaches 0.5 at minimum throughput. A half-open trial failure
    /// re-opens immediately.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        let now = Instant::now();
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(now);
            tracing::warn!("circuit breaker re-opened after trial failure");
            return;
        }

        inner.outcomes.push_back((now, false));
        self.prune(&mut inner, now);

        let total = inner.outcomes.len() as u32;
        if total < self.min_throughput {
            return;
        }
        let failures = inner.outcomes.iter().filter(|(_, ok)| !ok).count();
        if failures * 2 >= inner.outcomes.len() {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(now);
            tracing::warn!(
                failures,
                total,
                "circuit breaker opened on failure ratio"
            );
        }
    }

    /// Current state, resolving an elapsed open period to half-open.
    pub fn state(&self) -> CircuitState {
        let inner = self.lock();
        if inner.state == CircuitState::Open {
            let elapsed = inner
                .opened_at
                .map(|at| at.elapsed() >= self.open_duration)
                .unwrap_or(true);
            if elapsed {
                return CircuitState::HalfOpen;
            }
        }
        inner.state
    }

    fn prune(&self, inner: &mut BreakerInner, now: Instant) {
        while let Some((at, _)) = inner.outcomes.front() {
            if now.duration_since(*at) > self.window {
                inner.outcomes.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // A poisoned lock means a panic mid-transition; the window data is
        // still structurally sound, so keep serving.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(Duration::from_secs(30), 5, Duration::from_secs(15))
    }

    #[test]
    fn test_stays_closed_below_min_throughput() {
        let b = breaker();
        for _ in 0..4 {
            b.record_failure();
        }
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.try_acquire().is_ok());
    }

    #[test]
    fn test_opens_at_failure_ratio() {
        let b = breaker();
        for _ in 0..3 {
            b.record_success();
        }
        for _ in 0..3 {
            b.record_failure();
        }
        assert_eq!(b.state(), CircuitState::Open);
        assert!(b.try_acquire().is_err());
    }

    #[test]
    fn test_majority_success_keeps_closed() {
        let b = breaker();
        for _ in 0..8 {
            b.record_success();
        }
        for _ in 0..3 {
            b.record_failure();
        }
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_after_duration_then_closes_on_success() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        assert!(b.try_acquire().is_err());

        tokio::time::advance(Duration::from_secs(16)).await;
        assert_eq!(b.state(), CircuitState::HalfOpen);
        assert!(b.try_acquire().is_ok());

        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_trial_failure_reopens() {
        let b = breaker();
        for _ in 0..5 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(16)).await;
        assert!(b.try_acquire().is_ok());

        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(b.try_acquire().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_prunes_old_outcomes() {
        let b = breaker();
        for _ in 0..4 {
            b.record_failure();
        }
        // Old failures age out of the window before the fifth arrives.
        tokio::time::advance(Duration::from_secs(31)).await;
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
    }
}
