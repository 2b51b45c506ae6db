// ── Admission rate limit ──
//
// One unkeyed GCRA limiter in front of the authorization path. The
// instance is built by the caller and injected into the server state, so
// tests and embedders get independent limiters.

use std::fmt;
use std::num::NonZeroU32;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};

pub use governor::Quota;

/// Requests admitted back to back before the refill rate applies.
pub const DEFAULT_BURST: NonZeroU32 = NonZeroU32::MIN.saturating_add(2);

/// Tokens restored per second.
pub const DEFAULT_REFILL_PER_SEC: NonZeroU32 = NonZeroU32::MIN;

type DirectLimiter<C> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Burst 3, one more request per second.
pub fn default_quota() -> Quota {
    Quota::per_second(DEFAULT_REFILL_PER_SEC).allow_burst(DEFAULT_BURST)
}

/// Process-wide limiter shared by all request workers.
pub struct RateLimiter<C: Clock = DefaultClock> {
    inner: DirectLimiter<C>,
    quota: Quota,
}

impl RateLimiter {
    pub fn new(quota: Quota) -> Self {
        Self::with_clock(quota, &DefaultClock::default())
    }

    /// Limiter allowing `burst` back-to-back requests, refilled at one per second.
    pub fn with_burst(burst: NonZeroU32) -> Self {
        Self::new(Quota::per_second(DEFAULT_REFILL_PER_SEC).allow_burst(burst))
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(quota: Quota, clock: &C) -> Self {
        Self {
            inner: governor::RateLimiter::direct_with_clock(quota, clock),
            quota,
        }
    }

    /// Take one cell if the quota allows it.
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(default_quota())
    }
}

impl<C: Clock> fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}
