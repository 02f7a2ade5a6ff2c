//! Loyalty Account aggregate root
//!
//! The LoyaltyAccount is the consistency boundary for a customer's point
//! balance and tier.
//!
//! # Invariants
//!
//! - `available() = points_earned - points_spent >= 0` at all times
//! - `tier` is always `Tier::for_points(points_earned)`; it is never set
//!   independently and never recomputed on spend
//! - `points_earned` and `points_spent` are monotonic non-decreasing
//! - Accounts are soft-deactivated, never hard-deleted
//!
//! Balance changes happen only through [`LoyaltyAccount::add_points`] and
//! [`LoyaltyAccount::spend_points`]; the command layer persists the matching
//! ledger entry and the updated aggregate in one atomic unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CardNumber, CustomerId, LedgerEntryId};

use crate::error::LoyaltyError;
use crate::events::LoyaltyEvent;
use crate::lockout::{LockoutPolicy, LockoutState};
use crate::tier::Tier;

/// The loyalty account aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    /// Unique customer identifier
    id: CustomerId,
    /// Immutable customer-facing card number
    card_number: CardNumber,
    /// Cumulative points ever earned
    points_earned: i64,
    /// Cumulative points ever spent
    points_spent: i64,
    /// Derived from `points_earned`, cached for reads
    tier: Tier,
    /// Whether the account may participate in commands
    active: bool,
    /// Soft-delete marker; deleted accounts are filtered by all reads
    deleted: bool,
    /// Login failure counter and lock expiry
    lockout: LockoutState,
    /// Domain events pending dispatch
    #[serde(skip)]
    events: Vec<LoyaltyEvent>,
    /// Version for optimistic concurrency
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    /// Opens a new account at Bronze with a zero balance
    pub fn open(card_number: CardNumber, now: DateTime<Utc>) -> Self {
        Self {
            id: CustomerId::new_v7(),
            card_number,
            points_earned: 0,
            points_spent: 0,
            tier: Tier::Bronze,
            active: true,
            deleted: false,
            lockout: LockoutState::new(),
            events: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn card_number(&self) -> &CardNumber {
        &self.card_number
    }

    pub fn points_earned(&self) -> i64 {
        self.points_earned
    }

    pub fn points_spent(&self) -> i64 {
        self.points_spent
    }

    /// Points currently available to spend
    pub fn available(&self) -> i64 {
        self.points_earned - self.points_spent
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn is_active(&self) -> bool {
        self.active && !self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Version for optimistic concurrency checks at the storage boundary
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns accumulated domain events and clears them
    pub fn take_events(&mut self) -> Vec<LoyaltyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fails unless the account may participate in balance commands
    ///
    /// # Errors
    ///
    /// Returns `AccountDeleted` for a soft-deleted account, `AccountInactive`
    /// for a deactivated one.
    pub fn ensure_operable(&self) -> Result<(), LoyaltyError> {
        if self.deleted {
            return Err(LoyaltyError::AccountDeleted);
        }
        if !self.active {
            return Err(LoyaltyError::AccountInactive);
        }
        Ok(())
    }

    /// Adds points earned from a purchase
    ///
    /// The only legal way to increase the balance. Recomputes the tier and
    /// emits a `TierChanged` event only when the tier increased; always
    /// emits `PointsAdded` carrying the new balance and the ledger entry
    /// that justifies the change.
    ///
    /// # Errors
    ///
    /// Returns `AccountDeleted` or `AccountInactive` for an account that may
    /// not transact, `InvalidArgument` if `points <= 0`.
    pub fn add_points(
        &mut self,
        points: i64,
        cause: LedgerEntryId,
        now: DateTime<Utc>,
    ) -> Result<(), LoyaltyError> {
        self.ensure_operable()?;
        if points <= 0 {
            return Err(LoyaltyError::invalid_argument(format!(
                "point award must be positive, got {}",
                points
            )));
        }

        self.points_earned += points;
        let new_tier = Tier::for_points(self.points_earned);

        if new_tier > self.tier {
            self.events.push(LoyaltyEvent::TierChanged {
                customer_id: self.id,
                from: self.tier,
                to: new_tier,
                timestamp: now,
            });
        }
        self.tier = new_tier;

        self.events.push(LoyaltyEvent::PointsAdded {
            customer_id: self.id,
            cause,
            points,
            new_balance: self.available(),
            timestamp: now,
        });

        self.touch(now);
        Ok(())
    }

    /// Spends points on a reward
    ///
    /// Deliberately does not recompute the tier: the tier tracks lifetime
    /// earned points, so redeeming rewards never demotes a customer.
    ///
    /// # Errors
    ///
    /// Returns `AccountDeleted` or `AccountInactive` for an account that may
    /// not transact, `InvalidArgument` if `points <= 0`,
    /// `InsufficientBalance` if the available balance would go negative.
    pub fn spend_points(&mut self, points: i64, now: DateTime<Utc>) -> Result<(), LoyaltyError> {
        self.ensure_operable()?;
        if points <= 0 {
            return Err(LoyaltyError::invalid_argument(format!(
                "spend amount must be positive, got {}",
                points
            )));
        }
        if self.available() < points {
            return Err(LoyaltyError::InsufficientBalance {
                available: self.available(),
                requested: points,
            });
        }

        self.points_spent += points;
        self.touch(now);
        Ok(())
    }

    /// Records a failed login attempt
    ///
    /// Emits `AccountLocked` when this failure engages the lock. A failure
    /// while already locked is a no-op and does not move the expiry.
    pub fn record_login_failure(&mut self, policy: LockoutPolicy, now: DateTime<Utc>) {
        let was_locked = self.lockout.is_locked(now);
        self.lockout.record_failure(policy, now);

        if !was_locked {
            if let Some(locked_until) = self.lockout.locked_until() {
                self.events.push(LoyaltyEvent::AccountLocked {
                    customer_id: self.id,
                    locked_until,
                    timestamp: now,
                });
            }
            self.touch(now);
        }
    }

    /// Records a successful login, resetting the failure counter and lock
    pub fn record_login_success(&mut self, now: DateTime<Utc>) {
        self.lockout.record_success();
        self.touch(now);
    }

    /// Returns true iff the account is locked out at the given instant
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout.is_locked(now)
    }

    /// Returns the lockout state (for persistence adapters)
    pub fn lockout(&self) -> &LockoutState {
        &self.lockout
    }

    /// Soft-deactivates the account
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.touch(now);
    }

    /// Soft-deletes the account; reads must filter deleted accounts
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted = true;
        self.touch(now);
    }

    /// Restores a deactivated or soft-deleted account
    pub fn restore(&mut self, now: DateTime<Utc>) {
        self.active = true;
        self.deleted = false;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}
