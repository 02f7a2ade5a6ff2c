//! Loyalty domain - accounts, tiers, points and the login lockout machine
//!
//! The [`account::LoyaltyAccount`] aggregate is the consistency boundary for
//! a customer's point balance: every balance change goes through its
//! mutators, which keep the derived tier in sync and record the domain
//! events the command layer dispatches after commit.

pub mod account;
pub mod error;
pub mod events;
pub mod ledger;
pub mod lockout;
pub mod points;
pub mod tier;

pub use account::LoyaltyAccount;
pub use error::LoyaltyError;
pub use events::LoyaltyEvent;
pub use ledger::{LedgerEntry, LedgerEntryKind};
pub use lockout::{LockoutPolicy, LockoutState};
pub use points::points_for;
pub use tier::Tier;
