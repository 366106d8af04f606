//! Bookable time slots of a court day.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One cell of a court's daily grid.
///
/// # JSON Example
///
/// ```json
/// {
///   "starts_at": "2025-11-02T11:00:00Z",
///   "ends_at": "2025-11-02T12:00:00Z",
///   "available": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub available: bool,
}

/// Query string for the availability endpoint (`?date=2025-11-02`).
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

/// UTC bounds `[start, end)` of one venue-local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The day `date` as observed at `offset`.
    pub fn for_local_date(date: NaiveDate, offset: FixedOffset) -> Self {
        let start = local_to_utc(date.and_time(NaiveTime::MIN), offset);
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// The venue-local day containing `instant`.
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::for_local_date(instant.with_timezone(&offset).date_naive(), offset)
    }

    /// UTC instant of `hour:00` local time on this day.
    pub fn at_hour(&self, hour: u32) -> DateTime<Utc> {
        self.start + Duration::hours(i64::from(hour))
    }
}

/// Interpret a wall-clock time at a fixed offset.
pub fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    local.and_utc() - Duration::seconds(i64::from(offset.local_minus_utc()))
}
