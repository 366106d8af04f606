//! Court data model.
//!
//! Courts are managed by the catalogue service; the booking engine only
//! reads them to price reservations and build slot grids.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Represents a court record from the database.
///
/// # Database Table
///
/// Maps to the `courts` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Court {
    /// Unique identifier for this court
    pub id: Uuid,

    /// Display name shown to renters and on PIX charge descriptions
    pub name: String,

    /// Main sport played on the court (e.g. "Beach tennis")
    pub primary_sport: String,

    /// Price for one hour of play
    pub hourly_rate: Decimal,

    /// First bookable hour in venue-local time (inclusive)
    pub opening_hour: i16,

    /// Hour the court closes in venue-local time (exclusive)
    pub closing_hour: i16,

    /// Optional path to the court picture
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Court {
    /// Hours at which a one-hour slot starts, in ascending order.
    pub fn slot_hours(&self) -> impl Iterator<Item = u32> {
        let open = u32::try_from(self.opening_hour).unwrap_or(0);
        let close = u32::try_from(self.closing_hour).unwrap_or(0).min(24);
        open..close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn court(opening_hour: i16, closing_hour: i16) -> Court {
        Court {
            id: Uuid::new_v4(),
            name: "Court A".to_string(),
            primary_sport: "Beach volleyball".to_string(),
            hourly_rate: Decimal::new(10000, 2),
            opening_hour,
            closing_hour,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn slot_hours_cover_the_operating_window() {
        let hours: Vec<u32> = court(8, 20).slot_hours().collect();
        assert_eq!(hours.len(), 12);
        assert_eq!(hours.first(), Some(&8));
        assert_eq!(hours.last(), Some(&19));
    }

    #[test]
    fn inverted_window_yields_no_slots() {
        assert_eq!(court(20, 8).slot_hours().count(), 0);
    }
}
