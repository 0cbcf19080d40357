//! Sweep pacing: interval/backoff between sweeps, optional deadline, optional cancellation.
//!
//! The defaults reproduce a fixed one-second busy-poll with no bound on how long a
//! phase may wait. A deadline or a [`CancellationToken`] is checked on every pause.

use std::{fmt, time::Duration};

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::CoreError;

/// Which waiting loop a pacer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for create handles.
    Launch,
    /// Polling tracked resources for the terminal state.
    Termination,
    /// Waiting for delete handles.
    Cleanup,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Launch => "launch",
            Phase::Termination => "termination",
            Phase::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delay between sweeps.
///
/// `factor == 1.0` keeps the interval fixed; larger factors grow it geometrically up to
/// `max_interval`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollStrategy {
    pub interval: Duration,
    pub factor: f64,
    pub max_interval: Duration,
}

impl Default for PollStrategy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl PollStrategy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            factor: 1.0,
            max_interval: interval,
        }
    }

    pub fn backoff(first: Duration, factor: f64, max_interval: Duration) -> Self {
        Self {
            interval: first,
            factor,
            max_interval,
        }
    }

    /// Delay that follows `current`; saturates at `max_interval`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.factor)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval.is_zero() {
            return Err(CoreError::InvalidConfig("poll interval must be non-zero".into()));
        }
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(CoreError::InvalidConfig(format!(
                "poll factor must be >= 1.0, got {}",
                self.factor
            )));
        }
        if self.max_interval < self.interval {
            return Err(CoreError::InvalidConfig(
                "max poll interval is shorter than the first interval".into(),
            ));
        }
        Ok(())
    }
}

/// Pacing for a whole batch.
#[derive(Debug, Clone, Default)]
pub struct Pacing {
    pub launch: PollStrategy,
    pub termination: PollStrategy,
    pub cleanup: PollStrategy,
    /// Upper bound on the whole batch, measured from its start. `None` waits forever.
    pub deadline: Option<Duration>,
    /// Consecutive failed status queries tolerated per resource before the batch fails.
    pub tolerated_query_errors: u32,
}

impl Pacing {
    /// Same fixed interval for every phase.
    pub fn uniform(interval: Duration) -> Self {
        Self {
            launch: PollStrategy::fixed(interval),
            termination: PollStrategy::fixed(interval),
            cleanup: PollStrategy::fixed(interval),
            ..Self::default()
        }
    }

    pub fn strategy(&self, phase: Phase) -> &PollStrategy {
        match phase {
            Phase::Launch => &self.launch,
            Phase::Termination => &self.termination,
            Phase::Cleanup => &self.cleanup,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.launch.validate()?;
        self.termination.validate()?;
        self.cleanup.validate()
    }
}

/// Drives the sleep between sweeps of one phase.
pub struct Pacer {
    phase: Phase,
    strategy: PollStrategy,
    current: Duration,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
    pauses: u32,
}

impl Pacer {
    pub fn new(phase: Phase, strategy: &PollStrategy) -> Self {
        Self {
            phase,
            strategy: strategy.clone(),
            current: strategy.interval,
            deadline: None,
            cancel: None,
            pauses: 0,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed pauses.
    #[inline]
    pub fn pauses(&self) -> u32 {
        self.pauses
    }

    /// Fail if the batch was cancelled or ran past its deadline.
    pub fn check(&self, pending: usize) -> Result<(), CoreError> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(CoreError::Cancelled {
                phase: self.phase,
                pending,
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CoreError::DeadlineExceeded {
                phase: self.phase,
                pending,
            });
        }
        Ok(())
    }

    /// Sleep until the next sweep, never past the deadline.
    pub async fn pause(&mut self, pending: usize) -> Result<(), CoreError> {
        self.check(pending)?;

        let delay = match self.deadline {
            Some(d) => self.current.min(d.saturating_duration_since(Instant::now())),
            None => self.current,
        };
        trace!(target: "flotilla.core.pacing", phase = %self.phase, ?delay, pending, "pause");

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {
                        return Err(CoreError::Cancelled { phase: self.phase, pending });
                    }
                    _ = sleep(delay) => {}
                }
            }
            None => sleep(delay).await,
        }

        self.pauses += 1;
        self.current = self.strategy.next_delay(self.current);
        self.check(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_strategy_never_grows() {
        let s = PollStrategy::fixed(Duration::from_secs(1));
        assert_eq!(s.next_delay(Duration::from_secs(1)), Duration::from_secs(1));
    }

    #[test]
    fn backoff_is_capped() {
        let s = PollStrategy::backoff(Duration::from_secs(1), 2.0, Duration::from_secs(5));
        let mut d = s.interval;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(d.as_secs());
            d = s.next_delay(d);
        }
        assert_eq!(seen, vec![1, 2, 4, 5, 5]);
    }

    #[test]
    fn uncapped_backoff_saturates() {
        let s = PollStrategy::backoff(Duration::from_secs(1), 2.0, Duration::MAX);
        assert!(s.validate().is_ok());

        let mut d = s.interval;
        for _ in 0..200 {
            d = s.next_delay(d);
        }
        assert_eq!(d, Duration::MAX);

        let huge = PollStrategy::backoff(Duration::from_secs(1), 1e30, Duration::MAX);
        assert_eq!(huge.next_delay(huge.interval), Duration::MAX);
    }

    #[test]
    fn validate_rejects_bad_strategies() {
        assert!(PollStrategy::fixed(Duration::ZERO).validate().is_err());
        assert!(
            PollStrategy::backoff(Duration::from_secs(1), 0.5, Duration::from_secs(2))
                .validate()
                .is_err()
        );
        assert!(
            PollStrategy::backoff(Duration::from_secs(3), 2.0, Duration::from_secs(2))
                .validate()
                .is_err()
        );
        assert!(Pacing::default().validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_the_interval() {
        let mut pacer = Pacer::new(Phase::Launch, &PollStrategy::fixed(Duration::from_secs(1)));
        let start = Instant::now();
        pacer.pause(3).await.unwrap();
        pacer.pause(3).await.unwrap();
        assert_eq!(start.elapsed().as_secs(), 2);
        assert_eq!(pacer.pauses(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_stops_the_pacer() {
        let deadline = Instant::now() + Duration::from_millis(2500);
        let mut pacer = Pacer::new(Phase::Termination, &PollStrategy::default())
            .with_deadline(Some(deadline));

        pacer.pause(1).await.unwrap();
        pacer.pause(1).await.unwrap();
        let err = pacer.pause(1).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::DeadlineExceeded {
                phase: Phase::Termination,
                pending: 1
            }
        ));
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        let token = CancellationToken::new();
        let mut pacer = Pacer::new(Phase::Cleanup, &PollStrategy::fixed(Duration::from_secs(60)))
            .with_cancel(Some(token.clone()));

        let child = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(5)).await;
            child.cancel();
        });

        let start = Instant::now();
        let err = pacer.pause(2).await.unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { phase: Phase::Cleanup, pending: 2 }));
        assert_eq!(start.elapsed().as_secs(), 5);
    }
}
