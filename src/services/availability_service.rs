//! Daily availability of a court.
//!
//! A court day is a fixed grid of one-hour slots from its opening hour
//! (inclusive) to its closing hour (exclusive), in venue-local time.
//! A slot is unavailable iff a blocking reservation overlaps it, where
//! blocking means not cancelled and not a pending hold whose payment
//! window has closed.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        court::Court,
        reservation::{Reservation, slot_duration},
        slot::{DayWindow, Slot},
    },
    state::BookingContext,
};

/// Whether `[start, end)` collides with any blocking reservation as of `now`.
///
/// Shared by booking (reject on `true`) and the slot grid (unavailable on `true`).
pub fn has_conflict<'a, I>(
    existing: I,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing
        .into_iter()
        .any(|reservation| reservation.is_blocking(now) && reservation.overlaps(start, end))
}

/// Build the slot grid of `court` for `day`.
///
/// Reservations of other courts are ignored. Deterministic for a given
/// reservation set and `now`.
pub fn build_slots(
    court: &Court,
    day: DayWindow,
    reservations: &[Reservation],
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let same_court: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.court_id == court.id)
        .collect();

    court
        .slot_hours()
        .map(|hour| {
            let starts_at = day.at_hour(hour);
            let ends_at = starts_at + slot_duration();
            Slot {
                starts_at,
                ends_at,
                available: !has_conflict(same_court.iter().copied(), starts_at, ends_at, now),
            }
        })
        .collect()
}

/// Slots of a court on a venue-local date.
///
/// # Errors
///
/// - `CourtNotFound`: the court does not exist
/// - `Database`: reservations could not be read
pub async fn compute_availability(
    ctx: &BookingContext,
    court_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Slot>, AppError> {
    let court = ctx
        .courts
        .get(court_id)
        .await?
        .ok_or(AppError::CourtNotFound)?;

    let day = DayWindow::for_local_date(date, ctx.venue_offset);
    let reservations = ctx.reservations.by_court_and_day(court.id, day).await?;
    let now = ctx.clock.now();

    Ok(build_slots(&court, day, &reservations, now))
}
