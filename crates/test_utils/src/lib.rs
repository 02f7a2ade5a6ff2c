//! Shared test support: builders, fixtures and a manual clock
//!
//! Everything here is deterministic unless a function name says otherwise;
//! fixtures pin their timestamps to [`fixtures::base_time`] so assertions
//! on windows and expiries are stable.

pub mod builders;
pub mod clock;
pub mod fixtures;

pub use builders::{AccountBuilder, CouponFixtureBuilder};
pub use clock::ManualClock;
pub use fixtures::{base_time, eur, next_card_number, standard_window};
