//! Builders for test aggregates
//!
//! Each builder produces a consistent aggregate anchored at
//! [`fixtures::base_time`](crate::fixtures::base_time) with sensible
//! defaults, so a test only states what it cares about.

use chrono::{DateTime, Utc};
use fake::faker::company::en::CatchPhrase;
use fake::Fake;
use rust_decimal_macros::dec;

use core_kernel::{CardNumber, LedgerEntryId, Money, ValidityWindow};
use domain_coupon::{Coupon, CouponBuilder, Discount};
use domain_loyalty::{LoyaltyAccount, Tier};

use crate::fixtures::{base_time, next_card_number, standard_window};

/// Builds a [`LoyaltyAccount`] with a chosen balance history
pub struct AccountBuilder {
    card_number: Option<CardNumber>,
    earned: i64,
    spent: i64,
    now: DateTime<Utc>,
}

impl AccountBuilder {
    pub fn new() -> Self {
        AccountBuilder {
            card_number: None,
            earned: 0,
            spent: 0,
            now: base_time(),
        }
    }

    pub fn with_card_number(mut self, card_number: CardNumber) -> Self {
        self.card_number = Some(card_number);
        self
    }

    /// Lifetime earned points; also determines the resulting tier
    pub fn with_earned(mut self, points: i64) -> Self {
        self.earned = points;
        self
    }

    pub fn with_spent(mut self, points: i64) -> Self {
        self.spent = points;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> LoyaltyAccount {
        let card = self.card_number.unwrap_or_else(next_card_number);
        let mut account = LoyaltyAccount::open(card, self.now);
        if self.earned > 0 {
            account
                .add_points(self.earned, LedgerEntryId::new(), self.now)
                .expect("builder earned points are positive");
        }
        if self.spent > 0 {
            account
                .spend_points(self.spent, self.now)
                .expect("builder spend stays within earned");
        }
        // History already consumed; tests assert on events they cause
        account.take_events();
        account
    }
}

impl Default for AccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a valid [`Coupon`] with overridable limits
pub struct CouponFixtureBuilder {
    code: String,
    title: String,
    discount: Discount,
    validity: ValidityWindow,
    active: bool,
    min_order: Option<Money>,
    global_cap: Option<u32>,
    per_customer_cap: Option<u32>,
    min_tier: Option<Tier>,
}

impl CouponFixtureBuilder {
    /// Ten percent off, valid around [`base_time`], no limits
    pub fn new(code: impl Into<String>) -> Self {
        CouponFixtureBuilder {
            code: code.into(),
            title: CatchPhrase().fake(),
            discount: Discount::Percentage(dec!(10)),
            validity: standard_window(),
            active: true,
            min_order: None,
            global_cap: None,
            per_customer_cap: None,
            min_tier: None,
        }
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_min_order(mut self, min_order: Money) -> Self {
        self.min_order = Some(min_order);
        self
    }

    pub fn with_global_cap(mut self, cap: u32) -> Self {
        self.global_cap = Some(cap);
        self
    }

    pub fn with_per_customer_cap(mut self, cap: u32) -> Self {
        self.per_customer_cap = Some(cap);
        self
    }

    pub fn with_min_tier(mut self, tier: Tier) -> Self {
        self.min_tier = Some(tier);
        self
    }

    pub fn build(self) -> Coupon {
        let mut builder = CouponBuilder::new(self.code, self.title, self.discount, self.validity)
            .active(self.active);
        if let Some(min_order) = self.min_order {
            builder = builder.min_order(min_order);
        }
        if let Some(cap) = self.global_cap {
            builder = builder.global_cap(cap);
        }
        if let Some(cap) = self.per_customer_cap {
            builder = builder.per_customer_cap(cap);
        }
        if let Some(tier) = self.min_tier {
            builder = builder.min_tier(tier);
        }
        builder
            .build(base_time())
            .expect("fixture coupon definition is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_builder_reaches_requested_tier() {
        let account = AccountBuilder::new().with_earned(2500).with_spent(400).build();
        assert_eq!(account.tier(), Tier::Gold);
        assert_eq!(account.available(), 2100);
    }

    #[test]
    fn test_coupon_fixture_is_valid_at_base_time() {
        let coupon = CouponFixtureBuilder::new("FIXTURE").build();
        assert!(coupon.is_valid(base_time()));
    }
}
