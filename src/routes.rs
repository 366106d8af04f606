//! HTTP routing table.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};

use crate::{handlers, middleware, state::AppState};

/// Build the application router.
///
/// Only the full reservation listing sits behind the admin check; every
/// other route is public.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/api/reservations",
            get(handlers::reservations::list_all_reservations),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::admin::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Courts
        .route("/api/courts", get(handlers::courts::list_courts))
        .route("/api/courts/{id}", get(handlers::courts::get_court))
        .route(
            "/api/courts/{id}/available-slots",
            get(handlers::courts::available_slots),
        )
        // Reservations
        .route(
            "/api/reservations",
            post(handlers::reservations::create_reservation),
        )
        .route(
            "/api/reservations/renter/{renter_id}",
            get(handlers::reservations::list_renter_reservations),
        )
        .route(
            "/api/reservations/{id}/cancel",
            patch(handlers::reservations::cancel_reservation),
        )
        .route(
            "/api/reservations/{id}/payment-status",
            get(handlers::reservations::payment_status),
        )
        .merge(admin_routes)
        .with_state(state)
}
