//! Postgres-backed reservation store.
//!
//! # Double-booking guard
//!
//! The `reservations_no_overlap` exclusion constraint rejects any row
//! whose `[starts_at, ends_at)` range intersects another non-cancelled row
//! of the same court. [`ReservationRepository::add`] releases lapsed
//! pending holds inside the same transaction before inserting, so an
//! unpaid, expired hold never blocks a new booking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ReservationStore;
use crate::{
    db::{self, DbPool},
    error::AppError,
    models::{
        reservation::{CancelReason, PaymentDetails, Reservation, ReservationState},
        slot::DayWindow,
    },
};

/// Represents a reservation record from the database.
///
/// # Database Table
///
/// Maps to the `reservations` table. Payment columns are NULL until a
/// charge has been attached.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    renter_id: Uuid,
    court_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    total_price: Decimal,

    /// "pending", "confirmed" or "cancelled"
    status: String,
    cancel_reason: Option<String>,
    paid_at: Option<DateTime<Utc>>,

    payment_id: Option<String>,
    payment_status: Option<String>,
    payment_expires_at: Option<DateTime<Utc>>,
    pix_qr_code: Option<String>,
    pix_qr_code_base64: Option<String>,
    pix_ticket_url: Option<String>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = sqlx::Error;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let state = match row.status.as_str() {
            "pending" => ReservationState::Pending,
            // Rows confirmed before paid_at existed use their last update
            "confirmed" => ReservationState::Confirmed {
                paid_at: row.paid_at.unwrap_or(row.updated_at),
            },
            "cancelled" => ReservationState::Cancelled {
                reason: row
                    .cancel_reason
                    .as_deref()
                    .and_then(CancelReason::parse)
                    .unwrap_or(CancelReason::Requested),
            },
            other => {
                return Err(sqlx::Error::Decode(
                    format!("unknown reservation status '{other}'").into(),
                ));
            }
        };

        let payment = match (row.payment_id, row.payment_expires_at) {
            (Some(reference), Some(expires_at)) => Some(PaymentDetails {
                reference,
                provider_status: row.payment_status.unwrap_or_default(),
                expires_at,
                qr_code: row.pix_qr_code.unwrap_or_default(),
                qr_code_base64: row.pix_qr_code_base64.unwrap_or_default(),
                ticket_url: row.pix_ticket_url.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Reservation {
            id: row.id,
            renter_id: row.renter_id,
            court_id: row.court_id,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            total_price: row.total_price,
            state,
            payment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column values derived from a lifecycle state.
fn state_columns(
    state: &ReservationState,
) -> (&'static str, Option<&'static str>, Option<DateTime<Utc>>) {
    match state {
        ReservationState::Pending => (state.label(), None, None),
        ReservationState::Confirmed { paid_at } => (state.label(), None, Some(*paid_at)),
        ReservationState::Cancelled { reason } => (state.label(), Some(reason.as_str()), None),
    }
}

fn into_reservations(rows: Vec<ReservationRow>) -> Result<Vec<Reservation>, AppError> {
    rows.into_iter()
        .map(|row| Reservation::try_from(row).map_err(AppError::from))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: DbPool,
}

impl ReservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn by_id(&self, reservation_id: Uuid) -> Result<Option<Reservation>, AppError> {
        let row = sqlx::query_as::<_, ReservationRow>("SELECT * FROM reservations WHERE id = $1")
            .bind(reservation_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Reservation::try_from).transpose()?)
    }

    async fn by_renter(&self, renter_id: Uuid) -> Result<Vec<Reservation>, AppError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE renter_id = $1 ORDER BY starts_at ASC",
        )
        .bind(renter_id)
        .fetch_all(&self.pool)
        .await?;

        into_reservations(rows)
    }

    async fn by_court_and_day(
        &self,
        court_id: Uuid,
        day: DayWindow,
    ) -> Result<Vec<Reservation>, AppError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT * FROM reservations
            WHERE court_id = $1
              AND starts_at < $3
              AND $2 < ends_at
            ORDER BY starts_at ASC
            "#,
        )
        .bind(court_id)
        .bind(day.start)
        .bind(day.end)
        .fetch_all(&self.pool)
        .await?;

        into_reservations(rows)
    }

    async fn all(&self) -> Result<Vec<Reservation>, AppError> {
        let rows =
            sqlx::query_as::<_, ReservationRow>("SELECT * FROM reservations ORDER BY starts_at ASC")
                .fetch_all(&self.pool)
                .await?;

        into_reservations(rows)
    }

    async fn add(&self, reservation: &Reservation, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Release unpaid holds whose charge expired and that sit on the new interval
        let released = sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'cancelled',
                cancel_reason = 'payment_expired',
                payment_status = 'expired',
                updated_at = GREATEST($4, created_at)
            WHERE court_id = $1
              AND status = 'pending'
              AND payment_expires_at <= $4
              AND starts_at < $3
              AND $2 < ends_at
            "#,
        )
        .bind(reservation.court_id)
        .bind(reservation.starts_at)
        .bind(reservation.ends_at)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if released > 0 {
            tracing::info!(
                court_id = %reservation.court_id,
                released,
                "released lapsed payment holds"
            );
        }

        let (status, cancel_reason, paid_at) = state_columns(&reservation.state);
        let payment = reservation.payment.as_ref();

        let inserted = sqlx::query(
            r#"
            INSERT INTO reservations (
                id, renter_id, court_id, starts_at, ends_at, total_price,
                status, cancel_reason, paid_at,
                payment_id, payment_status, payment_expires_at,
                pix_qr_code, pix_qr_code_base64, pix_ticket_url,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.renter_id)
        .bind(reservation.court_id)
        .bind(reservation.starts_at)
        .bind(reservation.ends_at)
        .bind(reservation.total_price)
        .bind(status)
        .bind(cancel_reason)
        .bind(paid_at)
        .bind(payment.map(|p| p.reference.as_str()))
        .bind(payment.map(|p| p.provider_status.as_str()))
        .bind(payment.map(|p| p.expires_at))
        .bind(payment.map(|p| p.qr_code.as_str()))
        .bind(payment.map(|p| p.qr_code_base64.as_str()))
        .bind(payment.map(|p| p.ticket_url.as_str()))
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if db::is_exclusion_violation(&e) => {
                tx.rollback().await?;
                return Err(AppError::SlotUnavailable);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(
        &self,
        reservation: &Reservation,
        from: &ReservationState,
    ) -> Result<bool, AppError> {
        let (status, cancel_reason, paid_at) = state_columns(&reservation.state);

        // Guarded on the status the caller read, so a stale copy never
        // overwrites a transition committed in between
        let updated = sqlx::query(
            r#"
            UPDATE reservations
            SET status = $2,
                cancel_reason = $3,
                paid_at = $4,
                payment_status = $5,
                updated_at = $6
            WHERE id = $1
              AND status = $7
            "#,
        )
        .bind(reservation.id)
        .bind(status)
        .bind(cancel_reason)
        .bind(paid_at)
        .bind(
            reservation
                .payment
                .as_ref()
                .map(|p| p.provider_status.as_str()),
        )
        .bind(reservation.updated_at)
        .bind(from.label())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            tracing::debug!(
                reservation_id = %reservation.id,
                expected_status = from.label(),
                "reservation changed before update, nothing written"
            );
        }

        Ok(updated > 0)
    }
}
