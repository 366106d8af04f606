//! Reservation lifecycle - booking, cancellation and payment reconciliation.
//!
//! # State Machine
//!
//! ```text
//! Pending ──approved──▶ Confirmed
//!    │                      │
//!    ├──expired/rejected──▶ Cancelled ◀──cancel──┘
//!    └──cancel────────────▶
//! ```
//!
//! Payment expiry has no timer behind it. It is observed lazily, when
//! availability is computed or a payment status is refreshed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        court::Court,
        renter::Renter,
        reservation::{
            CancelReason, PaymentDetails, PaymentStatusProjection, PixChargeResponse, Reservation,
            ReservationPaymentResponse, ReservationResponse, ReservationState, slot_duration,
        },
        slot::DayWindow,
    },
    payments::{ChargeRequest, ProviderStatus},
    services::{availability_service::has_conflict, pricing},
    state::BookingContext,
};

/// Book a one-hour slot and open its PIX charge.
///
/// # Process
///
/// 1. Resolve court and renter
/// 2. Reject starts that are not in the future
/// 3. Check the court's reservations around the interval for a conflict
/// 4. Price the slot and open a charge expiring after the payment window
/// 5. Store the reservation as `Pending`
///
/// Steps 1-3 never reach the payment provider. If storing fails after
/// the charge was opened, the charge is left orphaned at the provider
/// and a warning is logged with its reference.
///
/// # Errors
///
/// - `CourtNotFound` / `RenterNotFound`: unknown ids
/// - `InvalidRequest`: start is now or in the past
/// - `SlotUnavailable`: the interval overlaps an active reservation
/// - `Payment`: the charge could not be opened (nothing stored)
/// - `Database`: persistence failed
pub async fn book(
    ctx: &BookingContext,
    renter_id: Uuid,
    court_id: Uuid,
    starts_at: DateTime<Utc>,
) -> Result<ReservationPaymentResponse, AppError> {
    let court = ctx
        .courts
        .get(court_id)
        .await?
        .ok_or(AppError::CourtNotFound)?;
    let renter = ctx
        .renters
        .get(renter_id)
        .await?
        .ok_or(AppError::RenterNotFound)?;

    let now = ctx.clock.now();
    let ends_at = starts_at + slot_duration();

    if starts_at <= now {
        return Err(AppError::InvalidRequest(
            "Reservations must start in the future".to_string(),
        ));
    }

    // A late start runs into the next venue day
    let day = DayWindow::containing(starts_at, ctx.venue_offset);
    let mut existing = ctx.reservations.by_court_and_day(court.id, day).await?;
    if ends_at > day.end {
        let next_day = DayWindow::containing(day.end, ctx.venue_offset);
        existing.extend(ctx.reservations.by_court_and_day(court.id, next_day).await?);
    }
    if has_conflict(&existing, starts_at, ends_at, now) {
        return Err(AppError::SlotUnavailable);
    }

    let total_price = pricing::total_price(court.hourly_rate, starts_at, ends_at);
    let id = Uuid::new_v4();

    let charge = ctx
        .payments
        .create_charge(ChargeRequest {
            amount: total_price,
            description: charge_description(ctx, &court, starts_at),
            payer_email: renter.email.clone(),
            payer_first_name: renter.name.clone(),
            payer_last_name: renter.last_name.clone(),
            expires_at: now + ctx.payment_window,
            idempotency_key: id.to_string(),
        })
        .await
        .inspect_err(|e| {
            tracing::warn!(court_id = %court.id, error = %e, "could not open PIX charge");
        })?;

    let reservation = Reservation {
        id,
        renter_id: renter.id,
        court_id: court.id,
        starts_at,
        ends_at,
        total_price,
        state: ReservationState::Pending,
        payment: Some(PaymentDetails::from(charge)),
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = ctx.reservations.add(&reservation, now).await {
        if let Some(payment) = &reservation.payment {
            tracing::warn!(
                reservation_id = %reservation.id,
                payment_id = %payment.reference,
                error = %e,
                "reservation not stored, PIX charge left without a reservation"
            );
        }
        return Err(e);
    }

    tracing::info!(
        reservation_id = %reservation.id,
        court_id = %court.id,
        renter_id = %renter.id,
        starts_at = %reservation.starts_at,
        total_price = %reservation.total_price,
        "reservation booked, awaiting payment"
    );

    let pix = reservation.payment.as_ref().map(PixChargeResponse::from);
    Ok(ReservationPaymentResponse {
        reservation: ReservationResponse::new(
            &reservation,
            Some((renter.name.as_str(), renter.last_name.as_str())),
            Some(court.name.as_str()),
        ),
        payment_id: pix.as_ref().map(|p| p.payment_id.clone()),
        pix,
    })
}

fn charge_description(ctx: &BookingContext, court: &Court, starts_at: DateTime<Utc>) -> String {
    format!(
        "Court booking {} - {}",
        court.name,
        starts_at
            .with_timezone(&ctx.venue_offset)
            .format("%d/%m/%Y %H:%M")
    )
}

/// Cancel a reservation. Cancelling a cancelled reservation succeeds
/// without touching it.
///
/// A transition committed by another request between the read and the
/// write is re-read and cancelled from its new state.
///
/// # Errors
///
/// - `ReservationNotFound`: unknown id
/// - `Database`: persistence failed
pub async fn cancel(ctx: &BookingContext, reservation_id: Uuid) -> Result<(), AppError> {
    loop {
        let mut reservation = load(ctx, reservation_id).await?;
        let from = reservation.state;

        if !reservation.cancel(CancelReason::Requested, ctx.clock.now()) {
            return Ok(());
        }

        // States only move forward, so the retry ends
        if ctx.reservations.update(&reservation, &from).await? {
            tracing::info!(reservation_id = %reservation.id, "reservation cancelled");
            return Ok(());
        }
    }
}

/// Reconcile a reservation with the payment provider.
///
/// Only `Pending` reservations are reconciled:
/// - payment window closed: cancelled as expired, no provider call
/// - provider says approved: confirmed, paid at the provider's approval
///   time (or now)
/// - provider says rejected, cancelled or expired: cancelled
/// - anything else: the raw provider status is recorded
///
/// `Confirmed` and `Cancelled` reservations are reported as stored; a
/// confirmed one reports its last update as the payment time. If another
/// request moved the reservation while the provider was being asked, the
/// stored reservation is reported instead.
///
/// # Errors
///
/// - `ReservationNotFound`: unknown id
/// - `Payment`: the provider could not be queried (nothing changed)
/// - `Database`: persistence failed
pub async fn refresh_payment_status(
    ctx: &BookingContext,
    reservation_id: Uuid,
) -> Result<PaymentStatusProjection, AppError> {
    let mut reservation = load(ctx, reservation_id).await?;
    let now = ctx.clock.now();
    let mut outcome = Outcome::default();

    if !reservation.state.is_pending() {
        return Ok(project(&reservation, now, &outcome));
    }

    if reservation.payment_window_closed(now) {
        reservation.cancel(CancelReason::PaymentExpired, now);
        reservation.record_provider_status(ProviderStatus::Expired.as_str());
        if !save_from_pending(ctx, &reservation).await? {
            return reload_projection(ctx, reservation_id, now).await;
        }
        tracing::info!(reservation_id = %reservation.id, "unpaid reservation expired");
    } else if let Some(reference) = reservation.payment.as_ref().map(|p| p.reference.clone()) {
        let report = ctx
            .payments
            .query_status(&reference)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    reservation_id = %reservation.id,
                    payment_id = %reference,
                    error = %e,
                    "payment status query failed"
                );
            })?;

        match &report.status {
            ProviderStatus::Approved => {
                let paid_at = report.paid_at.unwrap_or(now);
                reservation.confirm(paid_at, now);
                reservation.record_provider_status(report.status.as_str());
                if !save_from_pending(ctx, &reservation).await? {
                    return reload_projection(ctx, reservation_id, now).await;
                }
                outcome.approved_at = Some(paid_at);
                tracing::info!(
                    reservation_id = %reservation.id,
                    "payment approved, reservation confirmed"
                );
            }
            status if status.is_dead() => {
                let reason = match status {
                    ProviderStatus::Expired => CancelReason::PaymentExpired,
                    _ => CancelReason::PaymentRejected,
                };
                reservation.cancel(reason, now);
                reservation.record_provider_status(status.as_str());
                if !save_from_pending(ctx, &reservation).await? {
                    return reload_projection(ctx, reservation_id, now).await;
                }
                outcome.provider_gave_up = true;
                tracing::info!(
                    reservation_id = %reservation.id,
                    payment_status = status.as_str(),
                    "payment will not complete, reservation cancelled"
                );
            }
            status => {
                let changed = reservation
                    .payment
                    .as_ref()
                    .is_some_and(|p| p.provider_status != status.as_str());
                if changed {
                    reservation.record_provider_status(status.as_str());
                    if !save_from_pending(ctx, &reservation).await? {
                        return reload_projection(ctx, reservation_id, now).await;
                    }
                }
            }
        }
    }

    Ok(project(&reservation, now, &outcome))
}

/// What one refresh learned from the provider.
#[derive(Debug, Default)]
struct Outcome {
    approved_at: Option<DateTime<Utc>>,
    provider_gave_up: bool,
}

async fn load(ctx: &BookingContext, reservation_id: Uuid) -> Result<Reservation, AppError> {
    ctx.reservations
        .by_id(reservation_id)
        .await?
        .ok_or(AppError::ReservationNotFound)
}

async fn save_from_pending(
    ctx: &BookingContext,
    reservation: &Reservation,
) -> Result<bool, AppError> {
    ctx.reservations
        .update(reservation, &ReservationState::Pending)
        .await
}

/// Report the stored reservation after losing a race to another request.
async fn reload_projection(
    ctx: &BookingContext,
    reservation_id: Uuid,
    now: DateTime<Utc>,
) -> Result<PaymentStatusProjection, AppError> {
    let stored = load(ctx, reservation_id).await?;
    tracing::info!(
        reservation_id = %stored.id,
        status = stored.state.label(),
        "reservation changed during refresh, reporting stored state"
    );
    Ok(project(&stored, now, &Outcome::default()))
}

fn project(
    reservation: &Reservation,
    now: DateTime<Utc>,
    outcome: &Outcome,
) -> PaymentStatusProjection {
    let paid_at = match reservation.state {
        ReservationState::Confirmed { .. } => {
            Some(outcome.approved_at.unwrap_or(reservation.updated_at))
        }
        _ => None,
    };

    PaymentStatusProjection {
        reservation_id: reservation.id,
        reservation_status: reservation.state.label().to_string(),
        payment_status: reservation.payment.as_ref().map(|p| p.provider_status.clone()),
        paid: reservation.state.is_confirmed(),
        expired: reservation.payment_window_closed(now) || outcome.provider_gave_up,
        payment_expires_at: reservation.payment.as_ref().map(|p| p.expires_at),
        paid_at,
    }
}

/// Reservations of one renter, earliest first.
pub async fn list_for_renter(
    ctx: &BookingContext,
    renter_id: Uuid,
) -> Result<Vec<ReservationResponse>, AppError> {
    let reservations = ctx.reservations.by_renter(renter_id).await?;
    describe(ctx, &reservations).await
}

/// Every reservation, earliest first.
pub async fn list_all(ctx: &BookingContext) -> Result<Vec<ReservationResponse>, AppError> {
    let reservations = ctx.reservations.all().await?;
    describe(ctx, &reservations).await
}

/// Resolve display names, looking each court and renter up once.
async fn describe(
    ctx: &BookingContext,
    reservations: &[Reservation],
) -> Result<Vec<ReservationResponse>, AppError> {
    let mut courts: HashMap<Uuid, Option<Court>> = HashMap::new();
    let mut renters: HashMap<Uuid, Option<Renter>> = HashMap::new();

    for reservation in reservations {
        if !courts.contains_key(&reservation.court_id) {
            let court = ctx.courts.get(reservation.court_id).await?;
            courts.insert(reservation.court_id, court);
        }
        if !renters.contains_key(&reservation.renter_id) {
            let renter = ctx.renters.get(reservation.renter_id).await?;
            renters.insert(reservation.renter_id, renter);
        }
    }

    Ok(reservations
        .iter()
        .map(|reservation| {
            let renter = renters
                .get(&reservation.renter_id)
                .and_then(Option::as_ref)
                .map(|r| (r.name.as_str(), r.last_name.as_str()));
            let court = courts
                .get(&reservation.court_id)
                .and_then(Option::as_ref)
                .map(|c| c.name.as_str());
            ReservationResponse::new(reservation, renter, court)
        })
        .collect())
}
