//! Monotonic document stamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use backend_core::Timestamp;

/// Wall-clock source that never repeats or goes backwards.
///
/// Each reading is at least one microsecond after the previous reading from
/// the same clock (or any of its clones).
#[derive(Debug, Clone, Default)]
pub struct Clock {
    last_micros: Arc<AtomicI64>,
}

impl Clock {
    /// Create a new clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the clock.
    pub fn now(&self) -> Timestamp {
        let wall = Timestamp::now().as_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        let next = wall.max(previous + 1);
        Timestamp::from_micros(next).unwrap_or_else(Timestamp::now)
    }
}
