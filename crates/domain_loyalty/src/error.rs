//! Loyalty domain errors

use thiserror::Error;

/// Errors that can occur in the loyalty domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoyaltyError {
    /// Malformed or out-of-range input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Spend exceeds the available balance
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: i64, requested: i64 },

    /// The account has been deactivated
    #[error("Account is inactive")]
    AccountInactive,

    /// The account is soft-deleted
    #[error("Account is deleted")]
    AccountDeleted,
}

impl LoyaltyError {
    /// Creates an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        LoyaltyError::InvalidArgument(message.into())
    }
}
