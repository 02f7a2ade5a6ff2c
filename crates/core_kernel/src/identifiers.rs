//! Strongly-typed identifiers for domain entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types. The customer-facing
//! card number is a separate value object with its own format rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Loyalty domain identifiers
define_id!(CustomerId, "CST");
define_id!(LedgerEntryId, "LED");

// Coupon domain identifiers
define_id!(CouponId, "CPN");
define_id!(AssignmentId, "ASG");

// Operational identifiers
define_id!(StoreId, "STR");
define_id!(OperatorId, "OPR");

/// Errors produced when parsing a card number
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardNumberError {
    #[error("Card number must be a prefix followed by exactly 9 digits, got {0:?}")]
    InvalidFormat(String),
}

/// A customer loyalty card number
///
/// Format: an uppercase alphabetic prefix followed by exactly nine digits
/// (e.g. `FID000123456`). Immutable and globally unique; uniqueness is
/// enforced by the storage adapter, the format by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    /// Number of digits following the prefix
    pub const DIGITS: usize = 9;

    /// Parses a card number, validating the prefix-plus-nine-digits format
    pub fn parse(s: &str) -> Result<Self, CardNumberError> {
        let prefix_len = s.len().saturating_sub(Self::DIGITS);
        if prefix_len == 0 {
            return Err(CardNumberError::InvalidFormat(s.to_string()));
        }
        let (prefix, digits) = s.split_at(prefix_len);
        let prefix_ok = prefix.chars().all(|c| c.is_ascii_uppercase());
        let digits_ok =
            digits.len() == Self::DIGITS && digits.chars().all(|c| c.is_ascii_digit());
        if !prefix_ok || !digits_ok {
            return Err(CardNumberError::InvalidFormat(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Generates a fresh card number under the given prefix
    ///
    /// The digit sequence is time-derived; the storage adapter's uniqueness
    /// constraint is the actual guarantee against collisions.
    pub fn generate(prefix: &str) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = (nanos % 1_000_000_000) as u64;
        Self(format!("{}{:09}", prefix.to_uppercase(), seq))
    }

    /// Returns the card number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CardNumber {
    type Err = CardNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
