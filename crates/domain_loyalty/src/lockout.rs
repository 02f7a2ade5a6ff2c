//! Account lockout state machine
//!
//! Shared by every principal type that authenticates with a password
//! (customers and store staff). Repeated failures convert into a temporary
//! lock; the lock is never cleared by a timer, it is evaluated lazily on
//! each `is_locked` check.
//!
//! Transition table:
//!
//! | Event           | Unlocked                         | Locked                 |
//! |-----------------|----------------------------------|------------------------|
//! | failed auth     | failures+1; at max -> Locked     | no-op (clock untouched)|
//! | successful auth | failures = 0                     | caller must check `is_locked` first |
//! | expiry passes   | n/a                              | effectively Unlocked   |

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lockout thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicy {
    /// Failures tolerated before the lock engages
    pub max_attempts: u32,
    /// How long the lock holds once engaged
    pub lock_minutes: i64,
}

impl LockoutPolicy {
    pub fn new(max_attempts: u32, lock_minutes: i64) -> Self {
        Self {
            max_attempts,
            lock_minutes,
        }
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_minutes: 15,
        }
    }
}

/// Failure counter and lock expiry for one principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockoutState {
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl LockoutState {
    /// Creates a fresh, unlocked state
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the consecutive failure count
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Returns the lock expiry, if a lock is set
    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        self.locked_until
    }

    /// Returns true iff a lock is set and still in the future
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map(|until| now < until).unwrap_or(false)
    }

    /// Records a failed authentication attempt
    ///
    /// While already locked this is a no-op so that hammering a locked
    /// account cannot extend the lock. Callers are expected to check
    /// `is_locked` and reject before verifying credentials at all.
    pub fn record_failure(&mut self, policy: LockoutPolicy, now: DateTime<Utc>) {
        if self.is_locked(now) {
            return;
        }
        self.failed_attempts += 1;
        if self.failed_attempts >= policy.max_attempts {
            self.locked_until = Some(now + Duration::minutes(policy.lock_minutes));
        }
    }

    /// Records a successful authentication, resetting the machine
    pub fn record_success(&mut self) {
        self.failed_attempts = 0;
        self.locked_until = None;
    }
}
