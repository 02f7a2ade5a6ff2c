//! In-memory storage adapter
//!
//! Backs every storage port with `parking_lot` maps. Each multi-entity
//! commit takes its locks once, performs the version check and every write
//! under them, and so is atomic with respect to other callers on the same
//! store. The version rule is the same one a relational adapter would
//! enforce with `WHERE version = $n`: the stored aggregate's version must
//! be exactly one less than the incoming one. Commits always acquire the
//! idempotency lock before the table lock; a duplicate command hash is a
//! conflict, mirroring a unique index on the hash column.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use core_kernel::{
    AssignmentId, CouponId, CustomerId, DomainPort, PortError, Rate, StoreId,
};
use domain_coupon::{Coupon, CouponAssignment};
use domain_loyalty::{LedgerEntry, LoyaltyAccount};

use crate::idempotency::{CommandHash, IdempotencyRecord};
use crate::ports::{CouponStore, IdempotencyStore, LoyaltyStore, StoreDirectory};

#[derive(Default)]
struct LoyaltyTables {
    accounts: HashMap<CustomerId, LoyaltyAccount>,
    ledger: Vec<LedgerEntry>,
}

#[derive(Default)]
struct CouponTables {
    coupons: HashMap<CouponId, Coupon>,
    assignments: HashMap<AssignmentId, CouponAssignment>,
}

/// In-memory implementation of every storage port
///
/// Clones share the underlying tables, so one instance can be handed to
/// the handlers as several `Arc<dyn ...>` ports.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    loyalty: Arc<RwLock<LoyaltyTables>>,
    coupons: Arc<RwLock<CouponTables>>,
    idempotency: Arc<RwLock<HashMap<CommandHash, IdempotencyRecord>>>,
    rates: Arc<RwLock<HashMap<StoreId, Rate>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a store's points conversion rate
    pub fn register_store(&self, store_id: StoreId, rate: Rate) {
        self.rates.write().insert(store_id, rate);
    }

    /// Total number of ledger entries across all customers (test helper)
    pub fn ledger_len(&self) -> usize {
        self.loyalty.read().ledger.len()
    }

    /// All assignments for one coupon-customer pair (test helper)
    pub fn assignments_for(
        &self,
        coupon_id: CouponId,
        customer_id: CustomerId,
    ) -> Vec<CouponAssignment> {
        self.coupons
            .read()
            .assignments
            .values()
            .filter(|assignment| {
                assignment.coupon_id() == coupon_id && assignment.customer_id() == customer_id
            })
            .cloned()
            .collect()
    }
}

fn version_check(stored: u32, incoming: u32, what: &str) -> Result<(), PortError> {
    if stored + 1 != incoming {
        return Err(PortError::conflict(format!(
            "Stale {} write: stored version {}, incoming {}",
            what, stored, incoming
        )));
    }
    Ok(())
}

fn claim_check(
    records: &HashMap<CommandHash, IdempotencyRecord>,
    record: &IdempotencyRecord,
) -> Result<(), PortError> {
    if records.contains_key(record.hash()) {
        return Err(PortError::conflict(format!(
            "Command {} has already been applied",
            record.hash()
        )));
    }
    Ok(())
}

impl DomainPort for InMemoryStore {}

#[async_trait]
impl LoyaltyStore for InMemoryStore {
    async fn find_account(&self, id: CustomerId) -> Result<Option<LoyaltyAccount>, PortError> {
        let tables = self.loyalty.read();
        Ok(tables
            .accounts
            .get(&id)
            .filter(|account| !account.is_deleted())
            .cloned())
    }

    async fn insert_account(&self, account: &LoyaltyAccount) -> Result<(), PortError> {
        let mut tables = self.loyalty.write();
        if tables.accounts.contains_key(&account.id()) {
            return Err(PortError::conflict(format!(
                "Account {} already exists",
                account.id()
            )));
        }
        if tables
            .accounts
            .values()
            .any(|existing| existing.card_number() == account.card_number())
        {
            return Err(PortError::conflict(format!(
                "Card number {} is already registered",
                account.card_number()
            )));
        }
        tables.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn active_accounts(&self) -> Result<Vec<LoyaltyAccount>, PortError> {
        let tables = self.loyalty.read();
        Ok(tables
            .accounts
            .values()
            .filter(|account| account.is_active())
            .cloned()
            .collect())
    }

    async fn commit_accrual(
        &self,
        account: &LoyaltyAccount,
        entry: &LedgerEntry,
        record: &IdempotencyRecord,
    ) -> Result<(), PortError> {
        // Idempotency lock first, then the table lock; every commit uses
        // this order.
        let mut records = self.idempotency.write();
        claim_check(&records, record)?;

        let mut tables = self.loyalty.write();
        let stored = tables
            .accounts
            .get(&account.id())
            .ok_or_else(|| PortError::not_found("LoyaltyAccount", account.id()))?;
        version_check(stored.version(), account.version(), "account")?;

        tables.accounts.insert(account.id(), account.clone());
        tables.ledger.push(entry.clone());
        records.insert(record.hash().clone(), record.clone());
        Ok(())
    }

    async fn ledger_entries(&self, id: CustomerId) -> Result<Vec<LedgerEntry>, PortError> {
        let tables = self.loyalty.read();
        Ok(tables
            .ledger
            .iter()
            .filter(|entry| entry.customer_id() == id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CouponStore for InMemoryStore {
    async fn find_coupon(&self, id: CouponId) -> Result<Option<Coupon>, PortError> {
        let tables = self.coupons.read();
        Ok(tables
            .coupons
            .get(&id)
            .filter(|coupon| !coupon.is_deleted())
            .cloned())
    }

    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, PortError> {
        let tables = self.coupons.read();
        Ok(tables
            .coupons
            .values()
            .find(|coupon| coupon.code() == code && !coupon.is_deleted())
            .cloned())
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> Result<(), PortError> {
        let mut tables = self.coupons.write();
        if tables
            .coupons
            .values()
            .any(|existing| existing.code() == coupon.code() && !existing.is_deleted())
        {
            return Err(PortError::conflict(format!(
                "Coupon code {} is already in use",
                coupon.code()
            )));
        }
        tables.coupons.insert(coupon.id(), coupon.clone());
        Ok(())
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<(), PortError> {
        let mut tables = self.coupons.write();
        let stored = tables
            .coupons
            .get(&coupon.id())
            .ok_or_else(|| PortError::not_found("Coupon", coupon.id()))?;
        version_check(stored.version(), coupon.version(), "coupon")?;
        tables.coupons.insert(coupon.id(), coupon.clone());
        Ok(())
    }

    async fn find_assignment(
        &self,
        id: AssignmentId,
    ) -> Result<Option<CouponAssignment>, PortError> {
        let tables = self.coupons.read();
        Ok(tables.assignments.get(&id).cloned())
    }

    async fn live_assignment_exists(
        &self,
        coupon_id: CouponId,
        customer_id: CustomerId,
    ) -> Result<bool, PortError> {
        let tables = self.coupons.read();
        Ok(tables.assignments.values().any(|assignment| {
            assignment.coupon_id() == coupon_id
                && assignment.customer_id() == customer_id
                && !assignment.is_redeemed()
        }))
    }

    async fn assignment_count(
        &self,
        coupon_id: CouponId,
        customer_id: CustomerId,
    ) -> Result<u32, PortError> {
        let tables = self.coupons.read();
        let count = tables
            .assignments
            .values()
            .filter(|assignment| {
                assignment.coupon_id() == coupon_id && assignment.customer_id() == customer_id
            })
            .count();
        Ok(count as u32)
    }

    async fn insert_assignment(&self, assignment: &CouponAssignment) -> Result<(), PortError> {
        let mut tables = self.coupons.write();
        if tables.assignments.contains_key(&assignment.id()) {
            return Err(PortError::conflict(format!(
                "Assignment {} already exists",
                assignment.id()
            )));
        }
        tables.assignments.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn commit_redemption(
        &self,
        assignment: &CouponAssignment,
        coupon: &Coupon,
        record: &IdempotencyRecord,
    ) -> Result<(), PortError> {
        let mut records = self.idempotency.write();
        claim_check(&records, record)?;

        let mut tables = self.coupons.write();
        let stored_assignment = tables
            .assignments
            .get(&assignment.id())
            .ok_or_else(|| PortError::not_found("CouponAssignment", assignment.id()))?;
        version_check(stored_assignment.version(), assignment.version(), "assignment")?;

        let stored_coupon = tables
            .coupons
            .get(&coupon.id())
            .ok_or_else(|| PortError::not_found("Coupon", coupon.id()))?;
        version_check(stored_coupon.version(), coupon.version(), "coupon")?;

        tables.assignments.insert(assignment.id(), assignment.clone());
        tables.coupons.insert(coupon.id(), coupon.clone());
        records.insert(record.hash().clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryStore {
    async fn find(&self, hash: &CommandHash) -> Result<Option<IdempotencyRecord>, PortError> {
        Ok(self.idempotency.read().get(hash).cloned())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, PortError> {
        let mut records = self.idempotency.write();
        let before = records.len();
        records.retain(|_, record| record.recorded_at() >= cutoff);
        Ok(before - records.len())
    }
}

#[async_trait]
impl StoreDirectory for InMemoryStore {
    async fn conversion_rate(&self, store_id: StoreId) -> Result<Option<Rate>, PortError> {
        Ok(self.rates.read().get(&store_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::CardNumber;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap()
    }

    fn record(n: i64, at: DateTime<Utc>) -> IdempotencyRecord {
        let hash = CommandHash::of("assign_points", &serde_json::json!({ "n": n })).unwrap();
        IdempotencyRecord::new(hash, "assign_points", serde_json::json!({ "points": n }), at)
    }

    #[tokio::test]
    async fn test_duplicate_card_number_conflicts() {
        let store = InMemoryStore::new();
        let card = CardNumber::parse("FID123456789").unwrap();
        let first = LoyaltyAccount::open(card.clone(), now());
        let second = LoyaltyAccount::open(card, now());

        store.insert_account(&first).await.unwrap();
        let err = store.insert_account(&second).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_commit_accrual_rejects_stale_version() {
        let store = InMemoryStore::new();
        let card = CardNumber::parse("FID000000011").unwrap();
        let account = LoyaltyAccount::open(card, now());
        store.insert_account(&account).await.unwrap();

        // Two handlers load the same snapshot; both mutate and commit.
        let mut first = store.find_account(account.id()).await.unwrap().unwrap();
        let mut second = first.clone();
        first
            .add_points(10, core_kernel::LedgerEntryId::new(), now())
            .unwrap();
        second
            .add_points(20, core_kernel::LedgerEntryId::new(), now())
            .unwrap();

        let entry = |delta: i64| {
            LedgerEntry::new(
                account.id(),
                StoreId::new(),
                None,
                core_kernel::Money::zero(core_kernel::Currency::EUR),
                delta,
                domain_loyalty::LedgerEntryKind::Accrual,
                None,
                now(),
            )
        };

        store
            .commit_accrual(&first, &entry(10), &record(10, now()))
            .await
            .unwrap();
        let err = store
            .commit_accrual(&second, &entry(20), &record(20, now()))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.ledger_len(), 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_account_is_invisible() {
        let store = InMemoryStore::new();
        let card = CardNumber::parse("FID000000021").unwrap();
        let mut account = LoyaltyAccount::open(card, now());
        store.insert_account(&account).await.unwrap();

        account.soft_delete(now());
        // Commit the delete through the accrual path used by admin tooling
        let stored = store.find_account(account.id()).await.unwrap();
        assert!(stored.is_some());

        let entry = LedgerEntry::new(
            account.id(),
            StoreId::new(),
            None,
            core_kernel::Money::zero(core_kernel::Currency::EUR),
            0,
            domain_loyalty::LedgerEntryKind::Adjustment,
            None,
            now(),
        );
        store
            .commit_accrual(&account, &entry, &record(0, now()))
            .await
            .unwrap();
        assert!(store.find_account(account.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_rejects_already_claimed_hash() {
        let store = InMemoryStore::new();
        let first = LoyaltyAccount::open(CardNumber::parse("FID000000031").unwrap(), now());
        let second = LoyaltyAccount::open(CardNumber::parse("FID000000032").unwrap(), now());
        store.insert_account(&first).await.unwrap();
        store.insert_account(&second).await.unwrap();

        let entry = |account: &LoyaltyAccount| {
            LedgerEntry::new(
                account.id(),
                StoreId::new(),
                None,
                core_kernel::Money::zero(core_kernel::Currency::EUR),
                10,
                domain_loyalty::LedgerEntryKind::Accrual,
                None,
                now(),
            )
        };

        let mut first = store.find_account(first.id()).await.unwrap().unwrap();
        let mut second = store.find_account(second.id()).await.unwrap().unwrap();
        first
            .add_points(10, core_kernel::LedgerEntryId::new(), now())
            .unwrap();
        second
            .add_points(10, core_kernel::LedgerEntryId::new(), now())
            .unwrap();

        // Same command hash on both commits: the version checks would pass,
        // the claim must not.
        let claim = record(7, now());
        store
            .commit_accrual(&first, &entry(&first), &claim)
            .await
            .unwrap();
        let err = store
            .commit_accrual(&second, &entry(&second), &claim)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.ledger_len(), 1);

        let winner = store.find(claim.hash()).await.unwrap().unwrap();
        assert_eq!(winner.receipt()["points"], 7);
    }

    #[tokio::test]
    async fn test_purge_removes_only_old_records() {
        let store = InMemoryStore::new();
        let old = record(1, now() - chrono::Duration::days(30));
        let fresh = record(2, now());
        for (account_card, claim) in [("FID000000041", &old), ("FID000000042", &fresh)] {
            let account = LoyaltyAccount::open(CardNumber::parse(account_card).unwrap(), now());
            store.insert_account(&account).await.unwrap();
            let mut account = store.find_account(account.id()).await.unwrap().unwrap();
            account
                .add_points(10, core_kernel::LedgerEntryId::new(), now())
                .unwrap();
            let entry = LedgerEntry::new(
                account.id(),
                StoreId::new(),
                None,
                core_kernel::Money::zero(core_kernel::Currency::EUR),
                10,
                domain_loyalty::LedgerEntryKind::Accrual,
                None,
                now(),
            );
            store.commit_accrual(&account, &entry, claim).await.unwrap();
        }

        let purged = store
            .purge_older_than(now() - chrono::Duration::days(7))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(store.find(old.hash()).await.unwrap().is_none());
        assert!(store.find(fresh.hash()).await.unwrap().is_some());
    }
}
