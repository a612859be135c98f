//! Edit Throttling
//!
//! Paces a single stream of writes so that two consecutive releases are never
//! closer together than a fixed delay, measured on a monotonic clock.

use std::time::Duration;

use tracing::debug;

use crate::clock::{Clock, MonotonicClock};

/// Minimum-interval rate limiter for one logical write stream.
///
/// `throttle` takes `&mut self`: one owner drives it, and callers that share a
/// throttle across threads must serialize access themselves.
#[derive(Debug)]
pub struct Throttle<C: Clock = MonotonicClock> {
    delay: Duration,
    last: Option<Duration>,
    clock: C,
}

impl Throttle<MonotonicClock> {
    /// Create a throttle on the process monotonic clock.
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, MonotonicClock::new())
    }

    /// Create a throttle from a delay in (possibly fractional) seconds.
    ///
    /// Negative or non-finite values are treated as no delay.
    pub fn from_secs_f64(delay_secs: f64) -> Self {
        let delay = Duration::try_from_secs_f64(delay_secs).unwrap_or(Duration::ZERO);
        Self::new(delay)
    }
}

impl<C: Clock> Throttle<C> {
    /// Create a throttle on an explicit clock.
    pub fn with_clock(delay: Duration, clock: C) -> Self {
        Self {
            delay,
            last: None,
            clock,
        }
    }

    /// Minimum interval between releases.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Clock reading taken when the previous call returned, if any.
    pub fn last_release(&self) -> Option<Duration> {
        self.last
    }

    /// Block until at least `delay` has passed since the previous call returned.
    ///
    /// The first call never blocks. The release time is re-sampled from the
    /// clock after any sleep, so oversleeping is never carried into the
    /// next interval.
    pub fn throttle(&mut self) {
        let now = self.clock.now();
        if let Some(last) = self.last {
            let elapsed = now.saturating_sub(last);
            if elapsed < self.delay {
                let wait = self.delay - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "throttling edit");
                self.clock.sleep(wait);
            }
        }
        self.last = Some(self.clock.now());
    }
}
