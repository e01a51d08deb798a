use governor::clock::DefaultClock;
use governor::middleware::StateInformationMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::LedgerError;

type FailureLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, StateInformationMiddleware>;

/// Counts wrong PINs across login, bearer auth and PIN change.
///
/// Only failures spend the allowance. Once it is spent every attempt is
/// refused, correct PIN included, until a slot replenishes.
pub struct PinThrottle {
    failures: FailureLimiter,
    cooldown: Duration,
    locked_until: Mutex<Option<Instant>>,
}

impl PinThrottle {
    pub fn per_minute(failures: NonZeroU32) -> Self {
        let quota = Quota::per_minute(failures);
        Self {
            failures: RateLimiter::direct(quota).with_middleware::<StateInformationMiddleware>(),
            cooldown: quota.replenish_interval(),
            locked_until: Mutex::new(None),
        }
    }

    /// Call before checking a PIN.
    pub fn ensure_open(&self) -> Result<(), LedgerError> {
        let locked_until = self
            .locked_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *locked_until {
            Some(until) if Instant::now() < until => Err(LedgerError::TooManyAttempts),
            _ => Ok(()),
        }
    }

    /// Spend one slot for a wrong PIN, locking once none are left.
    pub fn record_failure(&self) {
        let exhausted = match self.failures.check() {
            Ok(snapshot) => snapshot.remaining_burst_capacity() == 0,
            Err(_) => true,
        };
        if exhausted {
            warn!(cooldown = ?self.cooldown, "PIN attempts exhausted");
            *self
                .locked_until
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now() + self.cooldown);
        }
    }
}
