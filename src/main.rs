//! Court Booking Service - Main Application Entry Point
//!
//! REST API for renting sand courts by the hour. Renters pick a free
//! one-hour slot, receive a PIX charge to pay it, and the reservation is
//! confirmed once the payment provider reports it approved.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Payments**: Mercado Pago PIX over reqwest
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Wire repositories, payment client and clock into the booking context
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod clock;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod payments;
mod repositories;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::{
    clock::SystemClock,
    middleware::admin::ADMIN_HEADER,
    payments::mercado_pago::MercadoPagoClient,
    repositories::{CourtRepository, RenterRepository, ReservationRepository},
    state::{AppState, BookingContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let booking = BookingContext {
        courts: Arc::new(CourtRepository::new(pool.clone())),
        renters: Arc::new(RenterRepository::new(pool.clone())),
        reservations: Arc::new(ReservationRepository::new(pool.clone())),
        payments: Arc::new(MercadoPagoClient::from_config(&config)?),
        clock: Arc::new(SystemClock),
        venue_offset: config.venue_offset()?,
        payment_window: config.payment_window(),
    };
    tracing::info!(
        payment_window_minutes = config.payment_window_minutes,
        venue_utc_offset_hours = config.venue_utc_offset_hours,
        "Booking engine ready"
    );

    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&config.frontend_origin)?)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_bytes(ADMIN_HEADER.as_bytes())?,
        ]);

    let app = routes::router(AppState { pool, booking })
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
