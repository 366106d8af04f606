//! Reservation pricing.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Price of `[start, end)` at `hourly_rate`.
///
/// `hourly_rate × hours`, rounded to cents with halves away from zero.
/// Works for any duration even though slots are currently one hour.
pub fn total_price(hourly_rate: Decimal, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let hours = Decimal::from((end - start).num_seconds()) / Decimal::from(3600);
    (hourly_rate * hours).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
