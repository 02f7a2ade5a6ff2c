//! Domain events for the loyalty aggregate
//!
//! Events accumulate on the aggregate while a command executes and are
//! drained by the handler after the storage transaction commits, never
//! before - subscribers must only ever observe durable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, LedgerEntryId};

use crate::tier::Tier;

/// Domain events emitted by the LoyaltyAccount aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoyaltyEvent {
    /// Points were added to an account
    PointsAdded {
        customer_id: CustomerId,
        /// The ledger entry that justifies the balance change
        cause: LedgerEntryId,
        points: i64,
        new_balance: i64,
        timestamp: DateTime<Utc>,
    },

    /// The account climbed to a higher tier
    TierChanged {
        customer_id: CustomerId,
        from: Tier,
        to: Tier,
        timestamp: DateTime<Utc>,
    },

    /// Repeated login failures locked the account
    AccountLocked {
        customer_id: CustomerId,
        locked_until: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
}

impl LoyaltyEvent {
    /// Returns the customer this event concerns
    pub fn customer_id(&self) -> CustomerId {
        match self {
            LoyaltyEvent::PointsAdded { customer_id, .. } => *customer_id,
            LoyaltyEvent::TierChanged { customer_id, .. } => *customer_id,
            LoyaltyEvent::AccountLocked { customer_id, .. } => *customer_id,
        }
    }

    /// Returns the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LoyaltyEvent::PointsAdded { timestamp, .. } => *timestamp,
            LoyaltyEvent::TierChanged { timestamp, .. } => *timestamp,
            LoyaltyEvent::AccountLocked { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            LoyaltyEvent::PointsAdded { .. } => "PointsAdded",
            LoyaltyEvent::TierChanged { .. } => "TierChanged",
            LoyaltyEvent::AccountLocked { .. } => "AccountLocked",
        }
    }
}
