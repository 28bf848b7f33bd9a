//! Non-decreasing wall clock
//!
//! Order acceptance and fill times are reported in whole seconds since
//! the epoch. A raw system clock can step backwards (NTP adjustment),
//! which would break the older-order price rule, so reads go through an
//! atomic high-water mark.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonically non-decreasing seconds-since-epoch source
#[derive(Debug, Default)]
pub struct Clock {
    high_water: AtomicI64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in seconds since the epoch, never earlier than any
    /// previously returned value
    pub fn now(&self) -> i64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let prev = self.high_water.fetch_max(wall, Ordering::AcqRel);
        prev.max(wall)
    }
}
