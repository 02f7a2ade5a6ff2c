//! Command layer of the loyalty engine
//!
//! Commands enter through the [`idempotency::IdempotencyGuard`], are
//! orchestrated by [`handlers::CommandHandlers`] against the storage ports,
//! and surface their outcome as a [`error::CommandError`] discriminated
//! result. Domain events are dispatched to the notification sink only after
//! the storage commit succeeds.

pub mod error;
pub mod handlers;
pub mod idempotency;
pub mod memory;
pub mod ports;
pub mod rate_limit;

pub use error::CommandError;
pub use handlers::{
    AssignCouponCommand, AssignCouponReceipt, AssignPointsCommand, AssignPointsReceipt,
    CommandHandlers, CreateCouponCommand, CreateCouponReceipt, RedeemCouponCommand,
    RedeemCouponReceipt, RegisterCustomerCommand, RegisterCustomerReceipt,
};
pub use idempotency::{CommandHash, IdempotencyGuard, IdempotencyRecord};
pub use memory::InMemoryStore;
pub use ports::{
    CouponStore, IdempotencyStore, LoyaltyStore, Notification, NotificationSink, NoopSink,
    StoreDirectory,
};
pub use rate_limit::FixedWindowLimiter;
