//! Integration tests for the coupon domain

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::{Currency, Money, OperatorId, StoreId, ValidityWindow};
use domain_coupon::{AssignmentReason, CouponAssignment, CouponBuilder, Discount};
use domain_loyalty::Tier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn window() -> ValidityWindow {
    ValidityWindow::new(t0() - Duration::days(1), t0() + Duration::days(14)).unwrap()
}

fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

#[test]
fn coupon_expires_between_grant_and_use() {
    let coupon = CouponBuilder::new("EXP", "Expires", Discount::Percentage(dec!(10)), window())
        .build(t0())
        .unwrap();

    // Valid at assignment time
    assert!(coupon.is_valid(t0()));
    let mut assignment =
        CouponAssignment::new(coupon.id(), core_kernel::CustomerId::new(), AssignmentReason::Manual, t0());

    // Expired by redemption time: the handler must re-check is_valid and
    // refuse, leaving the assignment untouched.
    let redemption_time = t0() + Duration::days(15);
    assert!(!coupon.is_valid(redemption_time));
    assert!(!assignment.is_redeemed());

    // The state machine itself still permits redeem; validity is the
    // handler's cross-aggregate concern.
    assignment
        .redeem(OperatorId::new(), StoreId::new(), redemption_time)
        .unwrap();
    assert!(assignment.is_redeemed());
}

#[test]
fn discount_arithmetic_follows_product_rules() {
    let ten_percent =
        CouponBuilder::new("P10", "Ten percent", Discount::Percentage(dec!(10)), window())
            .build(t0())
            .unwrap();
    assert_eq!(ten_percent.compute_discount(eur(dec!(200))), eur(dec!(20)));

    let flat = CouponBuilder::new("F15", "Flat", Discount::Fixed(eur(dec!(15))), window())
        .build(t0())
        .unwrap();
    for order in [dec!(15), dec!(100), dec!(9999.99)] {
        assert_eq!(flat.compute_discount(eur(order)), eur(dec!(15)));
    }
}

#[test]
fn eligibility_combines_validity_tier_and_cap() {
    let coupon = CouponBuilder::new(
        "COMBO",
        "Combined rules",
        Discount::Percentage(dec!(25)),
        window(),
    )
    .min_tier(Tier::Silver)
    .per_customer_cap(1)
    .build(t0())
    .unwrap();

    // Tier too low
    assert!(!coupon.is_eligible_for(Tier::Bronze, 0, t0()));
    // Tier fine, cap free
    assert!(coupon.is_eligible_for(Tier::Silver, 0, t0()));
    // Cap reached
    assert!(!coupon.is_eligible_for(Tier::Silver, 1, t0()));
    // Outside the window nothing is eligible
    assert!(!coupon.is_eligible_for(Tier::Platinum, 0, t0() + Duration::days(60)));
}

mod discount_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn percentage_discount_stays_within_the_order(
            order_cents in 1i64..=10_000_000,
            pct in 1u32..=100,
        ) {
            let order = eur(Decimal::new(order_cents, 2));
            let coupon = CouponBuilder::new(
                "PCT",
                "Scaling",
                Discount::Percentage(Decimal::from(pct)),
                window(),
            )
            .build(t0())
            .unwrap();

            let discount = coupon.compute_discount(order);
            prop_assert_eq!(discount.currency(), order.currency());
            prop_assert!(discount.is_positive());
            prop_assert!(discount.amount() <= order.amount());
            prop_assert_eq!(
                discount.amount(),
                (order.amount() * Decimal::from(pct) / dec!(100)).round_dp(4)
            );
        }

        #[test]
        fn full_percentage_discount_covers_the_order(order_cents in 1i64..=10_000_000) {
            let order = eur(Decimal::new(order_cents, 2));
            let coupon = CouponBuilder::new(
                "FULL",
                "Everything",
                Discount::Percentage(dec!(100)),
                window(),
            )
            .build(t0())
            .unwrap();

            prop_assert_eq!(coupon.compute_discount(order), order);
        }
    }
}

#[test]
fn inactive_coupon_builder_flag() {
    let coupon = CouponBuilder::new("OFF", "Inactive", Discount::Percentage(dec!(10)), window())
        .active(false)
        .build(t0())
        .unwrap();
    assert!(!coupon.is_valid(t0()));
}
