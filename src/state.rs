//! Shared application state handed to every handler.

use std::sync::Arc;

use chrono::{Duration, FixedOffset};

use crate::{
    clock::Clock,
    db::DbPool,
    payments::PaymentGateway,
    repositories::{CourtLookup, RenterLookup, ReservationStore},
};

/// Collaborators and policy of the booking engine.
///
/// Everything time- or I/O-dependent is behind a trait object so the
/// services can run against in-memory doubles and a pinned clock.
#[derive(Clone)]
pub struct BookingContext {
    pub courts: Arc<dyn CourtLookup>,
    pub renters: Arc<dyn RenterLookup>,
    pub reservations: Arc<dyn ReservationStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,

    /// Local time of the venue; daily grids are built in it
    pub venue_offset: FixedOffset,

    /// How long a new PIX charge can be paid
    pub payment_window: Duration,
}

/// State extracted by handlers through `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Used directly only by the health check
    pub pool: DbPool,
    pub booking: BookingContext,
}
