//! Reservation HTTP handlers.
//!
//! This module implements the reservation API endpoints:
//! - POST /api/reservations - Book a slot and open its PIX charge
//! - GET /api/reservations/renter/{renter_id} - Reservations of one renter
//! - GET /api/reservations - Every reservation (administrators only)
//! - PATCH /api/reservations/{id}/cancel - Cancel a reservation
//! - GET /api/reservations/{id}/payment-status - Reconcile with the provider

use crate::{
    error::AppError,
    middleware::admin::AdminContext,
    models::reservation::{
        CreateReservationRequest, PaymentStatusProjection, ReservationPaymentResponse,
        ReservationResponse,
    },
    services::reservation_service,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

/// Book a one-hour slot.
///
/// # Endpoint
///
/// `POST /api/reservations`
///
/// # Request Body
///
/// ```json
/// {
///   "renter_id": "550e8400-e29b-41d4-a716-446655440000",
///   "court_id": "660e8400-e29b-41d4-a716-446655440001",
///   "starts_at": "2025-11-02T10:00:00-03:00"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Pending reservation plus PIX instructions
/// - **Error (400)**: Start is not in the future
/// - **Error (404)**: Court or renter not found
/// - **Error (409)**: Slot already held
/// - **Error (502)**: Payment provider unavailable (nothing was stored)
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "status": "pending",
///   "total_price": 100.0,
///   "payment_id": "1325117012",
///   "pix": {
///     "payment_id": "1325117012",
///     "qr_code": "00020126580014br.gov.bcb.pix...",
///     "qr_code_base64": "iVBORw0KGgo...",
///     "ticket_url": "https://www.mercadopago.com.br/payments/1325117012/ticket",
///     "expires_at": "2025-11-01T12:10:00Z",
///     "status": "pending"
///   }
/// }
/// ```
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationPaymentResponse>), AppError> {
    let booked = reservation_service::book(
        &state.booking,
        request.renter_id,
        request.court_id,
        request.starts_at.with_timezone(&Utc),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booked)))
}

/// Reservations of one renter, earliest start first.
///
/// An unknown renter simply has no reservations.
pub async fn list_renter_reservations(
    State(state): State<AppState>,
    Path(renter_id): Path<Uuid>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let reservations = reservation_service::list_for_renter(&state.booking, renter_id).await?;
    Ok(Json(reservations))
}

/// Every reservation on every court.
///
/// # Authentication
///
/// Requires `X-Admin-Id` naming an administrator (see `middleware::admin`).
pub async fn list_all_reservations(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    let reservations = reservation_service::list_all(&state.booking).await?;
    tracing::debug!(
        admin_id = %admin.renter_id,
        count = reservations.len(),
        "listed all reservations"
    );
    Ok(Json(reservations))
}

/// Cancel a reservation.
///
/// # Response
///
/// - **Success (204 No Content)**: Cancelled, or already cancelled
/// - **Error (404)**: Reservation not found
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    reservation_service::cancel(&state.booking, reservation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reconcile a reservation with the payment provider and report it.
///
/// # Response
///
/// - **Success (200 OK)**: Current payment projection
/// - **Error (404)**: Reservation not found
/// - **Error (502)**: Provider could not be queried (safe to retry)
///
/// ```json
/// {
///   "reservation_id": "770e8400-e29b-41d4-a716-446655440002",
///   "reservation_status": "cancelled",
///   "payment_status": "expired",
///   "paid": false,
///   "expired": true,
///   "payment_expires_at": "2025-11-01T12:10:00Z",
///   "paid_at": null
/// }
/// ```
pub async fn payment_status(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<PaymentStatusProjection>, AppError> {
    let projection =
        reservation_service::refresh_payment_status(&state.booking, reservation_id).await?;
    Ok(Json(projection))
}
