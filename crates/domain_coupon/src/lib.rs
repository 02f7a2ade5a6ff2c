//! Coupon domain - offer definitions and redemption state
//!
//! A [`coupon::Coupon`] defines the offer: discount rule, validity window
//! and usage limits. A [`assignment::CouponAssignment`] is the grant of one
//! coupon instance to one customer and is the single source of truth for
//! whether that instance has been redeemed.

pub mod assignment;
pub mod coupon;
pub mod error;
pub mod events;

pub use assignment::{AssignmentReason, CouponAssignment};
pub use coupon::{Coupon, CouponBuilder, Discount};
pub use error::CouponError;
pub use events::CouponEvent;
