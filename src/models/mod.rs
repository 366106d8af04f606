//! Data models representing database entities and API bodies.

/// Court catalogue entry (read-only here)
pub mod court;
/// Renter / platform user (read-only here)
pub mod renter;
/// Reservation entity, lifecycle state and DTOs
pub mod reservation;
/// Daily availability grid
pub mod slot;
