//! Injectable wall clock.
//!
//! Duration math never polls the system clock directly. Components take a
//! `Clock` (or an explicit `now` argument) so tests and simulations can
//! replay any instant deterministically.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and simulations.
///
/// Cloning shares the underlying instant, so a clone handed to a component
/// observes every `set`/`advance` made through the original.
#[derive(Debug, Clone)]
pub struct FixedClock {
    epoch_ms: Arc<AtomicI64>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            epoch_ms: Arc::new(AtomicI64::new(now.timestamp_millis())),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.epoch_ms.store(now.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta: Duration) {
        self.epoch_ms
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.epoch_ms.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
