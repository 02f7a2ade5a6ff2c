//! Loyalty ledger and coupon redemption engine
//!
//! Facade crate re-exporting the workspace members. Callers embedding the
//! engine normally depend on `app_commands` directly; this crate exists so
//! the end-to-end test suite has a single root.

pub use app_commands;
pub use core_kernel;
pub use domain_coupon;
pub use domain_loyalty;
