//! Coupon domain errors

use core_kernel::Money;
use thiserror::Error;

/// Errors that can occur in the coupon domain
#[derive(Debug, Error, PartialEq)]
pub enum CouponError {
    /// Malformed or out-of-range coupon definition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The coupon is inactive, deleted, or outside its validity window
    #[error("Coupon is not valid for use")]
    NotValid,

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

    /// The global usage cap has been exhausted
    #[error("Global usage cap of {cap} reached")]
    UsageCapReached { cap: u32 },
}

impl CouponError {
    /// Creates an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CouponError::InvalidArgument(message.into())
    }
}
