//! Time-to-live memoization for derived metrics.

use perfwatch_core::Clock;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct Cached<T> {
    value:       T,
    computed_at: f64,
}

/// A single cached value that is recomputed once it is `ttl` old.
///
/// The refresh runs while the slot is locked, so concurrent misses queue
/// behind one recompute instead of racing.  As a consequence a reader never
/// sees a value computed earlier than one already handed to another reader.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl_secs: f64,
    slot:     Mutex<Option<Cached<T>>>,
}

impl<T: Copy> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_secs: ttl.as_secs_f64(),
            slot:     Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs_f64(self.ttl_secs)
    }

    /// Return the cached value if it is younger than the TTL, otherwise run
    /// `compute`, store its result stamped with the current time, and return it.
    pub fn get_or_refresh(&self, clock: &dyn Clock, compute: impl FnOnce() -> T) -> T {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let now = clock.now_secs();

        if let Some(cached) = *slot {
            if now - cached.computed_at < self.ttl_secs {
                return cached.value;
            }
        }

        let value = compute();
        *slot = Some(Cached {
            value,
            computed_at: now,
        });
        value
    }

    /// Clock reading at which the cached value was computed, if any.
    pub fn computed_at(&self) -> Option<f64> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|cached| cached.computed_at)
    }

    /// Drop the cached value so the next read recomputes.
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
