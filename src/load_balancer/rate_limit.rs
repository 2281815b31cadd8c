//! Per-(channel, class) rate limiting using GCRA.
//!
//! Wraps a direct (unkeyed) [`governor`] limiter. A waiter never reserves a
//! cell: it checks, sleeps until the earliest conforming instant, and checks
//! again. Dropping the wait at any point therefore leaves the limiter state
//! exactly as if the waiter had never arrived.

use governor::clock::Clock;
use governor::middleware::NoOpMiddleware;
use governor::nanos::Nanos;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::Instant;

/// Clock measured on the tokio timer, so limiter decisions follow
/// `tokio::time::pause`/`advance` in tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl Default for TokioClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    type Instant = Nanos;

    fn now(&self) -> Nanos {
        Nanos::from(self.origin.elapsed())
    }
}

type InnerLimiter =
    governor::RateLimiter<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<Nanos>>;

/// Rate limiter owned by one (channel, route class) pair.
pub struct RateLimiter {
    inner: InnerLimiter,
    clock: TokioClock,
    /// Tokens per second.
    rate: f64,
    burst: u32,
}

impl RateLimiter {
    /// Create a limiter with `burst` cells available immediately, refilled at
    /// `requests_per_second`. Config validation guarantees both are positive.
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let clock = TokioClock::default();
        let inner = InnerLimiter::direct_with_clock(quota(requests_per_second, burst), clock);

        Self {
            inner,
            clock,
            rate: requests_per_second,
            burst,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Take a cell if one conforms right now.
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }

    /// Wait for one cell. Returns how long the caller had to wait.
    ///
    /// Cancel-safe: nothing is held or reserved across the sleep.
    pub async fn acquire(&self) -> Duration {
        let started = Instant::now();
        while let Err(not_until) = self.inner.check() {
            tokio::time::sleep(not_until.wait_time_from(self.clock.now())).await;
        }
        started.elapsed()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.rate)
            .field("burst", &self.burst)
            .finish_non_exhaustive()
    }
}

/// One cell every `1 / rate` seconds with `burst` cells of headroom.
/// Fractional rates (below 1/s) are expressed through the period.
fn quota(requests_per_second: f64, burst: u32) -> Quota {
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    Duration::try_from_secs_f64(requests_per_second.recip())
        .ok()
        .and_then(Quota::with_period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX))
        .allow_burst(burst)
}
