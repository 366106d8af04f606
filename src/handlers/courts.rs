//! Court HTTP handlers.
//!
//! - GET /api/courts - List courts
//! - GET /api/courts/{id} - Get court by ID
//! - GET /api/courts/{id}/available-slots?date=YYYY-MM-DD - Daily slot grid

use crate::{
    error::AppError,
    models::{
        court::Court,
        slot::{AvailabilityQuery, Slot},
    },
    services::availability_service,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

/// List every court, ordered by name.
pub async fn list_courts(State(state): State<AppState>) -> Result<Json<Vec<Court>>, AppError> {
    let courts = state.booking.courts.list().await?;
    Ok(Json(courts))
}

/// Get a court by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns the court
/// - **Error (404)**: Court not found
pub async fn get_court(
    State(state): State<AppState>,
    Path(court_id): Path<Uuid>,
) -> Result<Json<Court>, AppError> {
    let court = state
        .booking
        .courts
        .get(court_id)
        .await?
        .ok_or(AppError::CourtNotFound)?;

    Ok(Json(court))
}

/// Slot grid of a court on a venue-local date.
///
/// # Endpoint
///
/// `GET /api/courts/{id}/available-slots?date=2025-11-02`
///
/// # Response
///
/// - **Success (200 OK)**: One slot per operating hour, ascending
/// - **Error (400)**: Missing or malformed `date`
/// - **Error (404)**: Court not found
///
/// ```json
/// [
///   { "starts_at": "2025-11-02T11:00:00Z", "ends_at": "2025-11-02T12:00:00Z", "available": true },
///   { "starts_at": "2025-11-02T12:00:00Z", "ends_at": "2025-11-02T13:00:00Z", "available": false }
/// ]
/// ```
pub async fn available_slots(
    State(state): State<AppState>,
    Path(court_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let slots =
        availability_service::compute_availability(&state.booking, court_id, query.date).await?;
    Ok(Json(slots))
}
