//! Core Kernel - Foundational types and utilities for the loyalty engine
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers and the customer card number value object
//! - Temporal types (validity windows) and the injectable clock port
//! - The unified boundary error for storage and notification adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, Rate, MoneyError};
pub use temporal::{ValidityWindow, Clock, SystemClock, TemporalError};
pub use identifiers::{
    CustomerId, CouponId, AssignmentId, LedgerEntryId,
    StoreId, OperatorId, CardNumber, CardNumberError,
};
pub use ports::{PortError, DomainPort};
pub use error::CoreError;
