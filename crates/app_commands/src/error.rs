//! Command-layer errors
//!
//! Every command surfaces its outcome as this discriminated result rather
//! than raising across the handler boundary. Business-rule rejections are
//! final; only `Internal` is worth retrying, and the idempotency guard
//! makes such retries safe.

use std::fmt;
use thiserror::Error;

use core_kernel::{Money, PortError};
use domain_coupon::CouponError;
use domain_loyalty::LoyaltyError;

/// Errors returned by command handlers
#[derive(Debug, Error)]
pub enum CommandError {
    /// Malformed or out-of-range input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced aggregate is missing, soft-deleted, or inactive
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// Duplicate or already-applied state; success-equivalent for
    /// idempotent callers
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Spend exceeds the available balance
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: i64, requested: i64 },

    /// The coupon is inactive, deleted, or outside its validity window
    #[error("Coupon is not valid for use")]
    CouponNotValid,

    /// The assignment has already been redeemed
    #[error("Assignment has already been redeemed")]
    AlreadyRedeemed,

    /// The customer does not meet the coupon's eligibility rules
    #[error("Customer is not eligible for this coupon")]
    NotEligible,

    /// The per-customer assignment cap has been reached
    #[error("Per-customer assignment limit of {cap} reached")]
    LimitExceeded { cap: u32 },

    /// The order is below the coupon's minimum amount
    #[error("Order amount {order} is below the minimum of {minimum}")]
    MinimumNotMet { minimum: Money, order: Money },

    /// Storage or transport failure; safe to retry
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CommandError {
    /// Creates an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CommandError::InvalidArgument(message.into())
    }

    /// Creates a not-found error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        CommandError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        CommandError::Conflict(message.into())
    }

    /// Creates an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CommandError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if the caller may retry the command
    ///
    /// Only internal failures are retryable; business-rule rejections are
    /// final, and the idempotency guard guarantees a retry of a committed
    /// command returns the original result instead of re-applying it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommandError::Internal { .. })
    }
}

impl From<LoyaltyError> for CommandError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::InvalidArgument(msg) => CommandError::InvalidArgument(msg),
            LoyaltyError::InsufficientBalance {
                available,
                requested,
            } => CommandError::InsufficientBalance {
                available,
                requested,
            },
            LoyaltyError::AccountInactive | LoyaltyError::AccountDeleted => {
                CommandError::invalid_argument(err.to_string())
            }
        }
    }
}

impl From<CouponError> for CommandError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::InvalidArgument(msg) => CommandError::InvalidArgument(msg),
            CouponError::NotValid => CommandError::CouponNotValid,
            CouponError::AlreadyRedeemed => CommandError::AlreadyRedeemed,
            CouponError::NotEligible => CommandError::NotEligible,
            CouponError::LimitExceeded { cap } => CommandError::LimitExceeded { cap },
            CouponError::MinimumNotMet { minimum, order } => {
                CommandError::MinimumNotMet { minimum, order }
            }
            CouponError::UsageCapReached { cap } => CommandError::LimitExceeded { cap },
        }
    }
}

impl From<PortError> for CommandError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => CommandError::NotFound { entity_type, id },
            PortError::Conflict { message } => CommandError::Conflict(message),
            other => CommandError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Internal {
            message: format!("Result serialization failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}
