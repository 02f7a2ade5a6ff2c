//! Coupon assignment - the grant of one coupon instance to one customer
//!
//! An assignment is a two-state machine: **Assigned** -> **Redeemed**, and
//! Redeemed is terminal. The redeemed flag, timestamp, operator and store
//! are stamped together, exactly once, and never reverted; this row is the
//! single source of truth for whether a granted coupon has been used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AssignmentId, CouponId, CustomerId, OperatorId, StoreId};

use crate::error::CouponError;

/// Why the grant was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentReason {
    /// Bulk fan-out when an active coupon is created
    Automatic,
    /// Explicit grant by an operator or administrator
    Manual,
    /// Granted in exchange for spent points
    Reward,
}

impl AssignmentReason {
    /// Storage-boundary string form
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentReason::Automatic => "automatic",
            AssignmentReason::Manual => "manual",
            AssignmentReason::Reward => "reward",
        }
    }
}

impl fmt::Display for AssignmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssignmentReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "automatic" => Ok(AssignmentReason::Automatic),
            "manual" => Ok(AssignmentReason::Manual),
            "reward" => Ok(AssignmentReason::Reward),
            other => Err(format!("Unknown assignment reason: {}", other)),
        }
    }
}

/// One customer-coupon grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponAssignment {
    id: AssignmentId,
    coupon_id: CouponId,
    customer_id: CustomerId,
    reason: AssignmentReason,
    assigned_at: DateTime<Utc>,
    redeemed: bool,
    redeemed_at: Option<DateTime<Utc>>,
    /// Stamped at redemption only
    redeemed_by: Option<OperatorId>,
    /// Stamped at redemption only
    redeemed_store: Option<StoreId>,
    /// Version for optimistic concurrency
    version: u32,
}

impl CouponAssignment {
    /// Creates a new assignment in the Assigned state
    pub fn new(
        coupon_id: CouponId,
        customer_id: CustomerId,
        reason: AssignmentReason,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::new_v7(),
            coupon_id,
            customer_id,
            reason,
            assigned_at: now,
            redeemed: false,
            redeemed_at: None,
            redeemed_by: None,
            redeemed_store: None,
            version: 1,
        }
    }

    pub fn id(&self) -> AssignmentId {
        self.id
    }

    pub fn coupon_id(&self) -> CouponId {
        self.coupon_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn reason(&self) -> AssignmentReason {
        self.reason
    }

    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    pub fn is_redeemed(&self) -> bool {
        self.redeemed
    }

    pub fn redeemed_at(&self) -> Option<DateTime<Utc>> {
        self.redeemed_at
    }

    pub fn redeemed_by(&self) -> Option<OperatorId> {
        self.redeemed_by
    }

    pub fn redeemed_store(&self) -> Option<StoreId> {
        self.redeemed_store
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Transitions the assignment to Redeemed
    ///
    /// Stamps the operator, store and timestamp together. Redeemed is
    /// terminal; a second call fails and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRedeemed` if the assignment was redeemed before.
    pub fn redeem(
        &mut self,
        operator: OperatorId,
        store: StoreId,
        now: DateTime<Utc>,
    ) -> Result<(), CouponError> {
        if self.redeemed {
            return Err(CouponError::AlreadyRedeemed);
        }
        self.redeemed = true;
        self.redeemed_at = Some(now);
        self.redeemed_by = Some(operator);
        self.redeemed_store = Some(store);
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 14, 0, 0).unwrap()
    }

    fn assignment() -> CouponAssignment {
        CouponAssignment::new(
            CouponId::new(),
            CustomerId::new(),
            AssignmentReason::Manual,
            now(),
        )
    }

    #[test]
    fn test_new_assignment_is_unredeemed() {
        let assignment = assignment();
        assert!(!assignment.is_redeemed());
        assert_eq!(assignment.redeemed_at(), None);
        assert_eq!(assignment.redeemed_by(), None);
        assert_eq!(assignment.redeemed_store(), None);
    }

    #[test]
    fn test_redeem_stamps_all_fields_together() {
        let mut assignment = assignment();
        let operator = OperatorId::new();
        let store = StoreId::new();

        assignment.redeem(operator, store, now()).unwrap();

        assert!(assignment.is_redeemed());
        assert_eq!(assignment.redeemed_at(), Some(now()));
        assert_eq!(assignment.redeemed_by(), Some(operator));
        assert_eq!(assignment.redeemed_store(), Some(store));
    }

    #[test]
    fn test_redeemed_is_terminal() {
        let mut assignment = assignment();
        let first_operator = OperatorId::new();
        assignment.redeem(first_operator, StoreId::new(), now()).unwrap();
        let stamped_at = assignment.redeemed_at();

        let result = assignment.redeem(OperatorId::new(), StoreId::new(), now());
        assert_eq!(result, Err(CouponError::AlreadyRedeemed));
        assert_eq!(assignment.redeemed_at(), stamped_at);
        assert_eq!(assignment.redeemed_by(), Some(first_operator));
    }

    #[test]
    fn test_reason_string_round_trip() {
        for reason in [
            AssignmentReason::Automatic,
            AssignmentReason::Manual,
            AssignmentReason::Reward,
        ] {
            let parsed: AssignmentReason = reason.as_str().parse().unwrap();
            assert_eq!(parsed, reason);
        }
    }
}
