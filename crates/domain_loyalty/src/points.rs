//! Points calculator
//!
//! Pure conversion from a purchase amount to a point award. The award is
//! `floor(amount * rate)`, clamped to zero for non-positive amounts. A zero
//! award is not an error here; the surrounding command decides whether a
//! zero-point accrual is worth rejecting.

use core_kernel::{Money, Rate};
use rust_decimal::prelude::ToPrimitive;

/// Returns the integer point award for a purchase at the given store rate
pub fn points_for(amount: &Money, rate: Rate) -> i64 {
    if !amount.is_positive() {
        return 0;
    }
    rate.apply(amount).floor().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn eur(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }

    #[test]
    fn test_default_rate_one_point_per_ten_units() {
        assert_eq!(points_for(&eur(dec!(100)), Rate::default()), 10);
        assert_eq!(points_for(&eur(dec!(10)), Rate::default()), 1);
    }

    #[test]
    fn test_award_is_floored() {
        assert_eq!(points_for(&eur(dec!(19.99)), Rate::default()), 1);
        assert_eq!(points_for(&eur(dec!(99.99)), Rate::default()), 9);
    }

    #[test]
    fn test_below_threshold_rounds_to_zero() {
        assert_eq!(points_for(&eur(dec!(9.99)), Rate::default()), 0);
    }

    #[test]
    fn test_non_positive_amounts_clamp_to_zero() {
        assert_eq!(points_for(&eur(dec!(0)), Rate::default()), 0);
        assert_eq!(points_for(&eur(dec!(-50)), Rate::default()), 0);
    }

    #[test]
    fn test_custom_store_rate() {
        let rate = Rate::new(dec!(0.5));
        assert_eq!(points_for(&eur(dec!(25)), rate), 12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::Currency;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    proptest! {
        #[test]
        fn award_is_never_negative(cents in -10_000_000i64..10_000_000i64) {
            let amount = Money::new(Decimal::new(cents, 2), Currency::EUR);
            prop_assert!(points_for(&amount, Rate::default()) >= 0);
        }

        #[test]
        fn award_is_monotonic_in_amount(
            a in 0i64..10_000_000i64,
            b in 0i64..10_000_000i64
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let ma = Money::new(Decimal::new(lo, 2), Currency::EUR);
            let mb = Money::new(Decimal::new(hi, 2), Currency::EUR);
            prop_assert!(points_for(&ma, Rate::default()) <= points_for(&mb, Rate::default()));
        }
    }
}
