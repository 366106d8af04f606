//! Persistence seams of the booking engine.
//!
//! Courts and renters belong to other services and are only looked up by
//! id. Reservations are owned here; the store is the single source of
//! truth for conflict detection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    court::Court,
    renter::Renter,
    reservation::{Reservation, ReservationState},
    slot::DayWindow,
};

pub mod court_repository;
pub mod renter_repository;
pub mod reservation_repository;

pub use court_repository::CourtRepository;
pub use renter_repository::RenterRepository;
pub use reservation_repository::ReservationRepository;

/// Read access to the court catalogue.
#[async_trait]
pub trait CourtLookup: Send + Sync {
    async fn get(&self, court_id: Uuid) -> Result<Option<Court>, AppError>;

    async fn list(&self) -> Result<Vec<Court>, AppError>;
}

/// Read access to registered users.
#[async_trait]
pub trait RenterLookup: Send + Sync {
    async fn get(&self, renter_id: Uuid) -> Result<Option<Renter>, AppError>;
}

/// Storage for reservations.
///
/// `add` and `update` are each committed atomically.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn by_id(&self, reservation_id: Uuid) -> Result<Option<Reservation>, AppError>;

    /// Reservations of one renter, ordered by start ascending.
    async fn by_renter(&self, renter_id: Uuid) -> Result<Vec<Reservation>, AppError>;

    /// Reservations of one court overlapping the given day.
    async fn by_court_and_day(
        &self,
        court_id: Uuid,
        day: DayWindow,
    ) -> Result<Vec<Reservation>, AppError>;

    /// Every reservation, ordered by start ascending.
    async fn all(&self) -> Result<Vec<Reservation>, AppError>;

    /// Insert a new reservation.
    ///
    /// Pending holds of the same court whose payment expired at `now` and
    /// which overlap the new interval are cancelled first. If an active
    /// reservation still overlaps, nothing is written and
    /// `AppError::SlotUnavailable` is returned, so concurrent bookings of
    /// one slot cannot both succeed.
    async fn add(&self, reservation: &Reservation, now: DateTime<Utc>) -> Result<(), AppError>;

    /// Persist state, cancel reason, payment status and `updated_at`,
    /// provided the stored row is still in the `from` state.
    ///
    /// Returns `false` and writes nothing when another request moved the
    /// row out of `from` first, or when the row does not exist.
    async fn update(
        &self,
        reservation: &Reservation,
        from: &ReservationState,
    ) -> Result<bool, AppError>;
}
