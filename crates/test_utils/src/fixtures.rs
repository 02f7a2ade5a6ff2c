//! Fixed points in time and small value helpers

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use core_kernel::{CardNumber, Currency, Money, ValidityWindow};

static BASE_TIME: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap());

static CARD_SEQ: AtomicU64 = AtomicU64::new(1);

/// The instant every deterministic fixture is anchored to
pub fn base_time() -> DateTime<Utc> {
    *BASE_TIME
}

/// Euro amount shorthand
pub fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

/// A window open from one day before to thirty days after [`base_time`]
pub fn standard_window() -> ValidityWindow {
    ValidityWindow::new(base_time() - Duration::days(1), base_time() + Duration::days(30))
        .expect("fixture window is ordered")
}

/// A card number unique within the test process
pub fn next_card_number() -> CardNumber {
    let seq = CARD_SEQ.fetch_add(1, Ordering::Relaxed);
    CardNumber::parse(&format!("FID{:09}", seq)).expect("generated card number is well-formed")
}
