//! Fixed-window rate limiter
//!
//! Counts calls per key inside a fixed window. The first call for a key
//! opens its window; once `limit` calls have been counted the rest are
//! refused until the window ends, at which point the next call opens a
//! fresh one. Time comes from the injected [`Clock`], so tests drive the
//! windows deterministically.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::warn;

use core_kernel::Clock;

struct Window {
    started: DateTime<Utc>,
    count: u32,
}

/// Per-key fixed-window limiter
pub struct FixedWindowLimiter {
    clock: Arc<dyn Clock>,
    window: Duration,
    limit: u32,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    /// Creates a limiter allowing `limit` calls per `window` per key
    pub fn new(clock: Arc<dyn Clock>, window: Duration, limit: u32) -> Self {
        FixedWindowLimiter {
            clock,
            window,
            limit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records a call for `key`; returns false if the key is over its limit
    pub fn check(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut windows = self.windows.lock();

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now - window.started >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.limit {
            warn!(key, limit = self.limit, "Rate limit exceeded");
            return false;
        }
        window.count += 1;
        true
    }

    /// Drops windows that ended before now; call periodically to bound memory
    pub fn sweep(&self) {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        windows.retain(|_, window| now - window.started < self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::ManualClock;

    #[test]
    fn test_limit_applies_within_window() {
        let clock = Arc::new(ManualClock::default());
        let limiter = FixedWindowLimiter::new(clock, Duration::minutes(1), 3);

        assert!(limiter.check("operator-1"));
        assert!(limiter.check("operator-1"));
        assert!(limiter.check("operator-1"));
        assert!(!limiter.check("operator-1"));
    }

    #[test]
    fn test_keys_are_independent() {
        let clock = Arc::new(ManualClock::default());
        let limiter = FixedWindowLimiter::new(clock, Duration::minutes(1), 1);

        assert!(limiter.check("operator-1"));
        assert!(!limiter.check("operator-1"));
        assert!(limiter.check("operator-2"));
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let clock = Arc::new(ManualClock::default());
        let limiter = FixedWindowLimiter::new(clock.clone(), Duration::minutes(1), 2);

        assert!(limiter.check("k"));
        assert!(limiter.check("k"));
        assert!(!limiter.check("k"));

        clock.advance(Duration::seconds(59));
        assert!(!limiter.check("k"));

        clock.advance(Duration::seconds(1));
        assert!(limiter.check("k"));
    }

    #[test]
    fn test_sweep_keeps_live_windows() {
        let clock = Arc::new(ManualClock::default());
        let limiter = FixedWindowLimiter::new(clock.clone(), Duration::minutes(1), 5);

        limiter.check("old");
        clock.advance(Duration::seconds(30));
        limiter.check("fresh");
        clock.advance(Duration::seconds(31));

        limiter.sweep();
        // "old" window ended and was dropped; the next call starts anew
        assert!(limiter.check("old"));
    }
}
