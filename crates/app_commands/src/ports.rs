//! Storage and notification ports
//!
//! The engine owns no persistence; it talks to these narrow traits. The
//! multi-entity commit methods are the unit of isolation: an adapter must
//! apply both writes atomically and enforce the optimistic version check
//! (the stored aggregate's version must be exactly one less than the
//! incoming aggregate's), surfacing violations as [`PortError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{
    AssignmentId, CouponId, CustomerId, DomainPort, PortError, Rate, StoreId,
};
use domain_coupon::{Coupon, CouponAssignment, CouponEvent};
use domain_loyalty::{LedgerEntry, LoyaltyAccount, LoyaltyEvent};

use crate::idempotency::{CommandHash, IdempotencyRecord};

/// Storage port for loyalty accounts and the transaction ledger
#[async_trait]
pub trait LoyaltyStore: DomainPort {
    /// Loads an account; soft-deleted accounts are filtered out
    async fn find_account(&self, id: CustomerId) -> Result<Option<LoyaltyAccount>, PortError>;

    /// Inserts a new account; duplicate card numbers are a conflict
    async fn insert_account(&self, account: &LoyaltyAccount) -> Result<(), PortError>;

    /// Lists all active, non-deleted accounts (for coupon fan-out)
    async fn active_accounts(&self) -> Result<Vec<LoyaltyAccount>, PortError>;

    /// Atomically persists the updated account, appends the ledger entry
    /// and claims the command's idempotency record
    ///
    /// The version check serializes concurrent accruals against one
    /// account: a stale writer gets `Conflict` and must reload. A record
    /// with the same hash already present is also a `Conflict`; since the
    /// record is written in the same unit as the effect, two carriers of
    /// one command can never both apply it.
    async fn commit_accrual(
        &self,
        account: &LoyaltyAccount,
        entry: &LedgerEntry,
        record: &IdempotencyRecord,
    ) -> Result<(), PortError>;

    /// Returns the ledger entries for a customer, oldest first
    async fn ledger_entries(&self, id: CustomerId) -> Result<Vec<LedgerEntry>, PortError>;
}

/// Storage port for coupons and their assignments
#[async_trait]
pub trait CouponStore: DomainPort {
    /// Loads a coupon; soft-deleted coupons are filtered out
    async fn find_coupon(&self, id: CouponId) -> Result<Option<Coupon>, PortError>;

    /// Loads a coupon by code; soft-deleted coupons are filtered out
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, PortError>;

    /// Inserts a new coupon; duplicate codes are a conflict
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<(), PortError>;

    /// Persists an updated coupon definition with a version check
    async fn update_coupon(&self, coupon: &Coupon) -> Result<(), PortError>;

    /// Loads an assignment
    async fn find_assignment(
        &self,
        id: AssignmentId,
    ) -> Result<Option<CouponAssignment>, PortError>;

    /// Returns true if an unredeemed grant exists for this pair
    async fn live_assignment_exists(
        &self,
        coupon_id: CouponId,
        customer_id: CustomerId,
    ) -> Result<bool, PortError>;

    /// Returns the customer's total assignment count for this coupon,
    /// redeemed grants included
    async fn assignment_count(
        &self,
        coupon_id: CouponId,
        customer_id: CustomerId,
    ) -> Result<u32, PortError>;

    /// Inserts a new assignment
    async fn insert_assignment(&self, assignment: &CouponAssignment) -> Result<(), PortError>;

    /// Atomically persists the redeemed assignment, the incremented coupon
    /// usage counter and the command's idempotency record
    ///
    /// The version check on the assignment is what prevents two concurrent
    /// redemptions from both succeeding; the record claim, written in the
    /// same unit, closes the same race for identical retries.
    async fn commit_redemption(
        &self,
        assignment: &CouponAssignment,
        coupon: &Coupon,
        record: &IdempotencyRecord,
    ) -> Result<(), PortError>;
}

/// Storage port for idempotency records
///
/// Records are only ever written through `commit_accrual` and
/// `commit_redemption`, inside the same atomic unit as the effect they
/// describe. This trait covers the read side and retention.
#[async_trait]
pub trait IdempotencyStore: DomainPort {
    /// Looks up a record by command hash
    async fn find(&self, hash: &CommandHash) -> Result<Option<IdempotencyRecord>, PortError>;

    /// Removes records created before the cutoff; returns how many
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, PortError>;
}

/// Per-store configuration lookup
#[async_trait]
pub trait StoreDirectory: DomainPort {
    /// Returns the points conversion rate for a store, None if unknown
    async fn conversion_rate(&self, store_id: StoreId) -> Result<Option<Rate>, PortError>;
}

/// A domain event crossing the notification boundary
#[derive(Debug, Clone)]
pub enum Notification {
    Loyalty(LoyaltyEvent),
    Coupon(CouponEvent),
}

impl Notification {
    /// Returns the event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Notification::Loyalty(event) => event.event_type(),
            Notification::Coupon(event) => event.event_type(),
        }
    }
}

/// Best-effort event delivery (email, push, audit log)
///
/// Handlers call this after the storage commit and swallow failures;
/// a broken sink must never fail or roll back a committed command.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<(), PortError>;
}

/// Sink that discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn deliver(&self, _notification: Notification) -> Result<(), PortError> {
        Ok(())
    }
}
