//! Domain events for the coupon aggregate and its assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AssignmentId, CouponId, CustomerId, OperatorId, StoreId};

use crate::assignment::AssignmentReason;

/// Domain events emitted by the coupon domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CouponEvent {
    /// A new coupon offer was created
    CouponCreated {
        coupon_id: CouponId,
        code: String,
        timestamp: DateTime<Utc>,
    },

    /// A coupon instance was granted to a customer
    CouponAssigned {
        assignment_id: AssignmentId,
        coupon_id: CouponId,
        customer_id: CustomerId,
        reason: AssignmentReason,
        timestamp: DateTime<Utc>,
    },

    /// A granted coupon instance was redeemed
    CouponRedeemed {
        assignment_id: AssignmentId,
        coupon_id: CouponId,
        customer_id: CustomerId,
        operator_id: OperatorId,
        store_id: StoreId,
        timestamp: DateTime<Utc>,
    },
}

impl CouponEvent {
    /// Returns the coupon this event concerns
    pub fn coupon_id(&self) -> CouponId {
        match self {
            CouponEvent::CouponCreated { coupon_id, .. } => *coupon_id,
            CouponEvent::CouponAssigned { coupon_id, .. } => *coupon_id,
            CouponEvent::CouponRedeemed { coupon_id, .. } => *coupon_id,
        }
    }

    /// Returns the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CouponEvent::CouponCreated { timestamp, .. } => *timestamp,
            CouponEvent::CouponAssigned { timestamp, .. } => *timestamp,
            CouponEvent::CouponRedeemed { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            CouponEvent::CouponCreated { .. } => "CouponCreated",
            CouponEvent::CouponAssigned { .. } => "CouponAssigned",
            CouponEvent::CouponRedeemed { .. } => "CouponRedeemed",
        }
    }
}
