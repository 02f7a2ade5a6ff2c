//! Transaction ledger entries
//!
//! Each points-affecting event is recorded as an immutable [`LedgerEntry`]
//! written by a command handler in the same atomic commit as the account
//! update it justifies. Entries expose accessors only; once constructed
//! nothing can mutate them, and the storage adapter never updates or
//! deletes a persisted entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CustomerId, LedgerEntryId, Money, OperatorId, StoreId};

/// Classification of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntryKind {
    /// Points earned from a purchase
    Accrual,
    /// Points spent on a reward
    Redemption,
    /// Manual correction by an administrator
    Adjustment,
}

impl LedgerEntryKind {
    /// Storage-boundary string form
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::Accrual => "accrual",
            LedgerEntryKind::Redemption => "redemption",
            LedgerEntryKind::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LedgerEntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accrual" => Ok(LedgerEntryKind::Accrual),
            "redemption" => Ok(LedgerEntryKind::Redemption),
            "adjustment" => Ok(LedgerEntryKind::Adjustment),
            other => Err(format!("Unknown ledger entry kind: {}", other)),
        }
    }
}

/// An append-only record of a single points-affecting event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: LedgerEntryId,
    customer_id: CustomerId,
    store_id: StoreId,
    /// None means the entry was produced by the system itself
    operator_id: Option<OperatorId>,
    amount: Money,
    point_delta: i64,
    kind: LedgerEntryKind,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a new ledger entry with a time-ordered identifier
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: CustomerId,
        store_id: StoreId,
        operator_id: Option<OperatorId>,
        amount: Money,
        point_delta: i64,
        kind: LedgerEntryKind,
        note: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new_v7(),
            customer_id,
            store_id,
            operator_id,
            amount,
            point_delta,
            kind,
            note,
            recorded_at,
        }
    }

    pub fn id(&self) -> LedgerEntryId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// The staff member who performed the operation, if any
    pub fn operator_id(&self) -> Option<OperatorId> {
        self.operator_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// The resulting change in points (positive for accruals)
    pub fn point_delta(&self) -> i64 {
        self.point_delta
    }

    pub fn kind(&self) -> LedgerEntryKind {
        self.kind
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_carries_system_operator_as_none() {
        let entry = LedgerEntry::new(
            CustomerId::new(),
            StoreId::new(),
            None,
            Money::new(dec!(150), Currency::EUR),
            15,
            LedgerEntryKind::Accrual,
            Some("welcome bonus".to_string()),
            Utc::now(),
        );

        assert_eq!(entry.operator_id(), None);
        assert_eq!(entry.point_delta(), 15);
        assert_eq!(entry.kind(), LedgerEntryKind::Accrual);
        assert_eq!(entry.note(), Some("welcome bonus"));
    }

    #[test]
    fn test_kind_string_round_trip() {
        for kind in [
            LedgerEntryKind::Accrual,
            LedgerEntryKind::Redemption,
            LedgerEntryKind::Adjustment,
        ] {
            let parsed: LedgerEntryKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }
}
