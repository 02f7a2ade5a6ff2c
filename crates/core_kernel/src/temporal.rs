//! Temporal types for validity windows and the injectable clock
//!
//! Coupon validity and lockout expiry are both evaluated lazily against an
//! injected clock rather than by timers, so all time-dependent logic can be
//! driven by a manual clock in tests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: start {start} must not be after end {end}")]
    InvalidWindow { start: String, end: String },
}

/// An inclusive validity window `[start, end]`
///
/// Used for coupon validity. A window with `start == end` is a valid
/// single-instant window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// Start of the window (inclusive)
    pub start: DateTime<Utc>,
    /// End of the window (inclusive)
    pub end: DateTime<Utc>,
}

impl ValidityWindow {
    /// Creates a new validity window
    ///
    /// # Errors
    ///
    /// Returns [`TemporalError::InvalidWindow`] if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Returns true if the given instant falls inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Returns true if the window has fully elapsed at the given instant
    pub fn has_expired(&self, at: DateTime<Utc>) -> bool {
        at > self.end
    }

    /// Returns the window length
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Clock port
///
/// All domain and application code takes the current time from this trait
/// instead of calling `Utc::now()` directly, which keeps validity, lockout
/// and rate-limit logic deterministic under test.
pub trait Clock: Send + Sync {
    /// Returns the current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
