//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::payments::PaymentError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Lookup Errors**: referenced court, renter or reservation does not exist
/// - **Validation Errors**: malformed input such as a start in the past
/// - **Conflict Errors**: the requested interval is already held
/// - **Gateway Errors**: the PIX provider failed or answered unexpectedly
/// - **Database Errors**: persistence failed
///
/// Lookup, validation and conflict errors are raised before any call to
/// the payment provider, so a failed booking never leaves a row behind.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The payment provider could not create or report a charge.
    ///
    /// Returns HTTP 502 Bad Gateway. Safe to retry.
    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),

    /// Returns HTTP 404 Not Found.
    #[error("Court not found")]
    CourtNotFound,

    /// Returns HTTP 404 Not Found.
    #[error("Renter not found")]
    RenterNotFound,

    /// Returns HTTP 404 Not Found.
    #[error("Reservation not found")]
    ReservationNotFound,

    /// The interval overlaps an active reservation of the same court.
    ///
    /// Returns HTTP 409 Conflict. Clients should re-query availability.
    #[error("This time slot is already booked")]
    SlotUnavailable,

    /// Missing or non-admin `X-Admin-Id` header.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Only administrators can perform this operation")]
    AdminRequired,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `CourtNotFound` / `RenterNotFound` / `ReservationNotFound` → 404
/// - `InvalidRequest` → 400 Bad Request
/// - `SlotUnavailable` → 409 Conflict
/// - `AdminRequired` → 401 Unauthorized
/// - `Payment` → 502 Bad Gateway (hides provider details from client)
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::CourtNotFound => {
                (StatusCode::NOT_FOUND, "court_not_found", self.to_string())
            }
            AppError::RenterNotFound => {
                (StatusCode::NOT_FOUND, "renter_not_found", self.to_string())
            }
            AppError::ReservationNotFound => (
                StatusCode::NOT_FOUND,
                "reservation_not_found",
                self.to_string(),
            ),
            AppError::SlotUnavailable => {
                (StatusCode::CONFLICT, "slot_unavailable", self.to_string())
            }
            AppError::AdminRequired => {
                (StatusCode::UNAUTHORIZED, "admin_required", self.to_string())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Payment(ref err) => {
                tracing::error!(error = %err, "payment provider failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "payment_gateway_error",
                    "The payment system is unavailable, please try again".to_string(),
                )
            }
            AppError::Database(ref err) => {
                tracing::error!(error = %err, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_distinct_statuses() {
        let cases = [
            (AppError::CourtNotFound, StatusCode::NOT_FOUND),
            (AppError::ReservationNotFound, StatusCode::NOT_FOUND),
            (AppError::SlotUnavailable, StatusCode::CONFLICT),
            (AppError::AdminRequired, StatusCode::UNAUTHORIZED),
            (
                AppError::InvalidRequest("start is in the past".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn gateway_failure_is_a_bad_gateway() {
        let error = AppError::Payment(PaymentError::InvalidResponse("no id".to_string()));
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
