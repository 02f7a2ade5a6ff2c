//! Coupon aggregate root
//!
//! A coupon is an offer definition: a discount rule, a validity window and
//! optional usage limits.
//!
//! # Invariants
//!
//! - A coupon is "valid" iff active, not soft-deleted, and the current time
//!   falls inside its validity window
//! - The global usage counter is monotonic and incremented exactly once per
//!   redemption, never per assignment
//! - `validate()` is run at creation and update time only, never implicitly
//!
//! Coupons are soft-deleted, never physically removed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{CouponId, Money, ValidityWindow};
use domain_loyalty::Tier;

use crate::error::CouponError;

/// The discount rule attached to a coupon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Discount {
    /// Percentage off the order amount; value in (0, 100]
    Percentage(Decimal),
    /// Fixed amount off, independent of the order size
    Fixed(Money),
}

impl Discount {
    /// Storage-boundary string form of the discount kind
    pub fn kind_str(&self) -> &'static str {
        match self {
            Discount::Percentage(_) => "percentage",
            Discount::Fixed(_) => "fixed",
        }
    }
}

/// The coupon aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    id: CouponId,
    /// Unique human-facing code
    code: String,
    title: String,
    description: Option<String>,
    discount: Discount,
    validity: ValidityWindow,
    active: bool,
    deleted: bool,
    /// Minimum order amount required at redemption, if any
    min_order: Option<Money>,
    /// Cap on total redemptions across all customers, if any
    global_cap: Option<u32>,
    /// Cap on assignments per customer, if any
    per_customer_cap: Option<u32>,
    /// Lowest tier allowed to receive this coupon, if any
    min_tier: Option<Tier>,
    /// Total redemptions so far; monotonic
    times_used: u32,
    /// Version for optimistic concurrency
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn id(&self) -> CouponId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn discount(&self) -> Discount {
        self.discount
    }

    pub fn validity(&self) -> ValidityWindow {
        self.validity
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn min_order(&self) -> Option<Money> {
        self.min_order
    }

    pub fn global_cap(&self) -> Option<u32> {
        self.global_cap
    }

    pub fn per_customer_cap(&self) -> Option<u32> {
        self.per_customer_cap
    }

    pub fn min_tier(&self) -> Option<Tier> {
        self.min_tier
    }

    pub fn times_used(&self) -> u32 {
        self.times_used
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Validates the coupon definition
    ///
    /// Run at creation and update time; never called implicitly elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty code, a non-positive discount
    /// value, or a percentage above 100. The validity window ordering is
    /// enforced by [`ValidityWindow`] at construction.
    pub fn validate(&self) -> Result<(), CouponError> {
        if self.code.trim().is_empty() {
            return Err(CouponError::invalid_argument("coupon code must not be empty"));
        }
        match self.discount {
            Discount::Percentage(value) => {
                if value <= dec!(0) {
                    return Err(CouponError::invalid_argument(
                        "percentage discount must be positive",
                    ));
                }
                if value > dec!(100) {
                    return Err(CouponError::invalid_argument(
                        "percentage discount must not exceed 100",
                    ));
                }
            }
            Discount::Fixed(amount) => {
                if !amount.is_positive() {
                    return Err(CouponError::invalid_argument(
                        "fixed discount must be positive",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns true iff the coupon can be used at the given instant
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.deleted && self.validity.contains(now)
    }

    /// Fails with `NotValid` unless the coupon can be used right now
    pub fn ensure_valid(&self, now: DateTime<Utc>) -> Result<(), CouponError> {
        if !self.is_valid(now) {
            return Err(CouponError::NotValid);
        }
        Ok(())
    }

    /// Checks whether the customer may receive this coupon
    ///
    /// `prior_assignments` is the customer's total assignment count for this
    /// coupon, supplied by the caller from the assignment store.
    ///
    /// # Errors
    ///
    /// Returns `NotValid` for an unusable coupon, `LimitExceeded` once the
    /// per-customer cap is reached, `NotEligible` below the tier floor.
    pub fn ensure_eligible_for(
        &self,
        tier: Tier,
        prior_assignments: u32,
        now: DateTime<Utc>,
    ) -> Result<(), CouponError> {
        self.ensure_valid(now)?;
        if let Some(cap) = self.per_customer_cap {
            if prior_assignments >= cap {
                return Err(CouponError::LimitExceeded { cap });
            }
        }
        if let Some(min_tier) = self.min_tier {
            if tier < min_tier {
                return Err(CouponError::NotEligible);
            }
        }
        Ok(())
    }

    /// Returns true iff the customer may receive this coupon
    pub fn is_eligible_for(&self, tier: Tier, prior_assignments: u32, now: DateTime<Utc>) -> bool {
        self.ensure_eligible_for(tier, prior_assignments, now).is_ok()
    }

    /// Checks the order amount against the coupon's minimum, if it has one
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the minimum applies but no order
    /// amount was supplied, or when the order is in a different currency
    /// than the minimum; `MinimumNotMet` when the order is too small.
    pub fn ensure_minimum_met(&self, order: Option<Money>) -> Result<(), CouponError> {
        let Some(minimum) = self.min_order else {
            return Ok(());
        };
        let order = order.ok_or_else(|| {
            CouponError::invalid_argument("order amount is required for this coupon")
        })?;
        let ordering = order
            .checked_cmp(&minimum)
            .map_err(|e| CouponError::invalid_argument(e.to_string()))?;
        if ordering == std::cmp::Ordering::Less {
            return Err(CouponError::MinimumNotMet { minimum, order });
        }
        Ok(())
    }

    /// Computes the discount for an order amount
    ///
    /// Percentage discounts scale with the order; fixed discounts return
    /// the configured amount regardless of order size.
    pub fn compute_discount(&self, order: Money) -> Money {
        match self.discount {
            Discount::Percentage(value) => order.multiply(value / dec!(100)),
            Discount::Fixed(amount) => amount,
        }
    }

    /// Increments the global usage counter
    ///
    /// Called exactly once per redemption, never per assignment.
    ///
    /// # Errors
    ///
    /// Returns `UsageCapReached` when the global cap is exhausted.
    pub fn increment_usage(&mut self, now: DateTime<Utc>) -> Result<(), CouponError> {
        if let Some(cap) = self.global_cap {
            if self.times_used >= cap {
                return Err(CouponError::UsageCapReached { cap });
            }
        }
        self.times_used += 1;
        self.touch(now);
        Ok(())
    }

    /// Updates the offer definition, re-running validation
    pub fn update(
        &mut self,
        title: String,
        description: Option<String>,
        discount: Discount,
        validity: ValidityWindow,
        min_order: Option<Money>,
        now: DateTime<Utc>,
    ) -> Result<(), CouponError> {
        let previous = (
            std::mem::replace(&mut self.title, title),
            std::mem::replace(&mut self.description, description),
            std::mem::replace(&mut self.discount, discount),
            std::mem::replace(&mut self.validity, validity),
            std::mem::replace(&mut self.min_order, min_order),
        );

        if let Err(e) = self.validate() {
            // Roll the aggregate back so a failed update leaves no trace
            self.title = previous.0;
            self.description = previous.1;
            self.discount = previous.2;
            self.validity = previous.3;
            self.min_order = previous.4;
            return Err(e);
        }

        self.touch(now);
        Ok(())
    }

    /// Deactivates the coupon without deleting it
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.touch(now);
    }

    /// Soft-deletes the coupon; reads must filter deleted coupons
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted = true;
        self.touch(now);
    }

    /// Restores a soft-deleted coupon
    pub fn restore(&mut self, now: DateTime<Utc>) {
        self.deleted = false;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// Builder for creating new coupons
///
/// `build` runs [`Coupon::validate`], so an invalid definition never
/// produces an aggregate.
pub struct CouponBuilder {
    code: String,
    title: String,
    description: Option<String>,
    discount: Discount,
    validity: ValidityWindow,
    active: bool,
    min_order: Option<Money>,
    global_cap: Option<u32>,
    per_customer_cap: Option<u32>,
    min_tier: Option<Tier>,
}

impl CouponBuilder {
    /// Creates a builder with the required fields
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        discount: Discount,
        validity: ValidityWindow,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            description: None,
            discount,
            validity,
            active: true,
            min_order: None,
            global_cap: None,
            per_customer_cap: None,
            min_tier: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn min_order(mut self, min_order: Money) -> Self {
        self.min_order = Some(min_order);
        self
    }

    pub fn global_cap(mut self, cap: u32) -> Self {
        self.global_cap = Some(cap);
        self
    }

    pub fn per_customer_cap(mut self, cap: u32) -> Self {
        self.per_customer_cap = Some(cap);
        self
    }

    pub fn min_tier(mut self, tier: Tier) -> Self {
        self.min_tier = Some(tier);
        self
    }

    /// Builds and validates the coupon
    pub fn build(self, now: DateTime<Utc>) -> Result<Coupon, CouponError> {
        let coupon = Coupon {
            id: CouponId::new_v7(),
            code: self.code,
            title: self.title,
            description: self.description,
            discount: self.discount,
            validity: self.validity,
            active: self.active,
            deleted: false,
            min_order: self.min_order,
            global_cap: self.global_cap,
            per_customer_cap: self.per_customer_cap,
            min_tier: self.min_tier,
            times_used: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        coupon.validate()?;
        Ok(coupon)
    }
}
