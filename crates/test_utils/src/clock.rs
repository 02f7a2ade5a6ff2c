//! A manually driven clock for deterministic time-dependent tests

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use core_kernel::Clock;

use crate::fixtures::base_time;

/// Clock whose time only moves when a test tells it to
///
/// Starts at [`base_time`]; share it via `Arc` between the component under
/// test and the test body, then call [`ManualClock::advance`].
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Jumps the clock to an absolute instant
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(base_time())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
