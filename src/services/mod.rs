//! Business logic services.
//!
//! Services contain the booking rules separated from HTTP handlers:
//! slot generation, conflict detection, pricing, and the reservation
//! lifecycle coupled to the payment provider.

pub mod availability_service;
pub mod pricing;
pub mod reservation_service;
