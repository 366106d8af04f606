//! HTTP request handlers (route handlers).
//!
//! Handlers stay thin: extract path, query and body, call a service
//! with the shared `BookingContext`, and serialise the result.

/// Court catalogue and daily availability endpoints
pub mod courts;
/// Health check endpoint
pub mod health;
/// Booking, cancellation, listing and payment status endpoints
pub mod reservations;
