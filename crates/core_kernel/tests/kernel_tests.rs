//! Integration tests for the core kernel types

use chrono::{Duration, TimeZone, Utc};
use core_kernel::{CardNumber, Currency, Money, Rate, ValidityWindow};
use rust_decimal_macros::dec;

#[test]
fn money_round_trips_through_serde() {
    let original = Money::new(dec!(42.5), Currency::EUR);
    let json = serde_json::to_string(&original).unwrap();
    let back: Money = serde_json::from_str(&json).unwrap();
    assert_eq!(original, back);
}

#[test]
fn rate_applied_to_money_yields_raw_product() {
    let rate = Rate::new(dec!(0.25));
    let spend = Money::new(dec!(99.99), Currency::EUR);
    assert_eq!(rate.apply(&spend), dec!(24.9975));
}

#[test]
fn validity_window_boundaries_are_inclusive() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let end = start + Duration::days(30);
    let window = ValidityWindow::new(start, end).unwrap();

    assert!(window.contains(start));
    assert!(window.contains(end));
    assert!(!window.contains(end + Duration::seconds(1)));
}

#[test]
fn card_number_round_trips_through_serde() {
    let card = CardNumber::parse("FID000000042").unwrap();
    let json = serde_json::to_string(&card).unwrap();
    assert_eq!(json, "\"FID000000042\"");
    let back: CardNumber = serde_json::from_str(&json).unwrap();
    assert_eq!(card, back);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_addition_is_commutative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::new(rust_decimal::Decimal::new(a, 2), Currency::EUR);
            let mb = Money::new(rust_decimal::Decimal::new(b, 2), Currency::EUR);
            prop_assert_eq!(ma + mb, mb + ma);
        }

        #[test]
        fn generated_card_numbers_parse(seed in "[A-Z]{2,4}") {
            let card = CardNumber::generate(&seed);
            prop_assert!(CardNumber::parse(card.as_str()).is_ok());
        }
    }
}
