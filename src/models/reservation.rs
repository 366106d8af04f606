//! Reservation data models and API request/response types.
//!
//! This module defines:
//! - `Reservation`: the booking of one court interval by one renter
//! - `ReservationState`: the Pending → Confirmed / Cancelled lifecycle
//! - `PaymentDetails`: PIX charge metadata attached at booking time
//! - Request and response bodies for the reservation endpoints

use chrono::{DateTime, Duration, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of every bookable slot.
pub fn slot_duration() -> Duration {
    Duration::hours(1)
}

/// Half-open interval overlap test: `[a_start, a_end)` vs `[b_start, b_end)`.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Why a reservation ended up cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The renter or an operator cancelled it
    Requested,
    /// The PIX charge was not paid before its expiry
    PaymentExpired,
    /// The provider reported the charge as rejected or cancelled
    PaymentRejected,
}

impl CancelReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CancelReason::Requested => "requested",
            CancelReason::PaymentExpired => "payment_expired",
            CancelReason::PaymentRejected => "payment_rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "requested" => Some(CancelReason::Requested),
            "payment_expired" => Some(CancelReason::PaymentExpired),
            "payment_rejected" => Some(CancelReason::PaymentRejected),
            _ => None,
        }
    }
}

/// Lifecycle state of a reservation.
///
/// Moves only forward: `Pending` → `Confirmed`, or any non-cancelled
/// state → `Cancelled`. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    /// Waiting for the PIX charge to be paid
    Pending,
    /// Payment approved by the provider
    Confirmed { paid_at: DateTime<Utc> },
    /// Released; no longer blocks its interval
    Cancelled { reason: CancelReason },
}

impl ReservationState {
    /// Value stored in the `status` column and shown to clients.
    pub fn label(&self) -> &'static str {
        match self {
            ReservationState::Pending => "pending",
            ReservationState::Confirmed { .. } => "confirmed",
            ReservationState::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ReservationState::Pending)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, ReservationState::Confirmed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReservationState::Cancelled { .. })
    }
}

/// PIX charge metadata returned by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Provider-side payment identifier
    pub reference: String,

    /// Last status string reported by the provider (e.g. "pending", "approved")
    pub provider_status: String,

    /// Instant after which the charge can no longer be paid
    pub expires_at: DateTime<Utc>,

    /// "Copia e cola" PIX payload
    pub qr_code: String,

    /// PNG of the QR code, base64 encoded
    pub qr_code_base64: String,

    /// Hosted payment page
    pub ticket_url: String,
}

/// A court booking.
///
/// Holds only foreign keys to the renter and court; names are resolved
/// through the lookups when building views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub renter_id: Uuid,
    pub court_id: Uuid,

    /// Always stored in UTC
    pub starts_at: DateTime<Utc>,

    /// Always `starts_at + slot_duration()`
    pub ends_at: DateTime<Utc>,

    pub total_price: Decimal,
    pub state: ReservationState,
    pub payment: Option<PaymentDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether the payment window has closed as of `now`.
    pub fn payment_window_closed(&self, now: DateTime<Utc>) -> bool {
        self.payment
            .as_ref()
            .is_some_and(|payment| payment.expires_at <= now)
    }

    /// A pending reservation whose charge expired unpaid.
    ///
    /// Such a hold is treated as released even before the state flips
    /// to `Cancelled`.
    pub fn is_lapsed_hold(&self, now: DateTime<Utc>) -> bool {
        self.state.is_pending() && self.payment_window_closed(now)
    }

    /// Whether this reservation still occupies its interval as of `now`.
    pub fn is_blocking(&self, now: DateTime<Utc>) -> bool {
        !self.state.is_cancelled() && !self.is_lapsed_hold(now)
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.starts_at, self.ends_at, start, end)
    }

    /// Move to `Cancelled`. Returns `false` if already cancelled.
    pub fn cancel(&mut self, reason: CancelReason, now: DateTime<Utc>) -> bool {
        if self.state.is_cancelled() {
            return false;
        }
        self.state = ReservationState::Cancelled { reason };
        self.touch(now);
        true
    }

    /// Move `Pending` to `Confirmed`. Returns `false` from any other state.
    pub fn confirm(&mut self, paid_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if !self.state.is_pending() {
            return false;
        }
        self.state = ReservationState::Confirmed { paid_at };
        self.touch(now);
        true
    }

    /// Record the provider's latest status string.
    pub fn record_provider_status(&mut self, status: &str) {
        if let Some(payment) = self.payment.as_mut() {
            payment.provider_status = status.to_string();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// Request body for booking a slot.
///
/// # JSON Example
///
/// ```json
/// {
///   "renter_id": "550e8400-e29b-41d4-a716-446655440000",
///   "court_id": "660e8400-e29b-41d4-a716-446655440001",
///   "starts_at": "2025-11-02T10:00:00-03:00"
/// }
/// ```
///
/// `starts_at` may carry any offset; it is normalised to UTC.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub renter_id: Uuid,
    pub court_id: Uuid,
    pub starts_at: DateTime<FixedOffset>,
}

/// Reservation view returned to clients.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "renter_id": "550e8400-e29b-41d4-a716-446655440000",
///   "renter_name": "Ana",
///   "renter_last_name": "Souza",
///   "court_id": "660e8400-e29b-41d4-a716-446655440001",
///   "court_name": "Court A",
///   "starts_at": "2025-11-02T13:00:00Z",
///   "ends_at": "2025-11-02T14:00:00Z",
///   "total_price": 100.0,
///   "status": "pending",
///   "payment_status": "pending",
///   "payment_expires_at": "2025-11-01T12:10:00Z",
///   "pix_ticket_url": "https://www.mercadopago.com.br/payments/123/ticket"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub renter_id: Uuid,
    pub renter_name: String,
    pub renter_last_name: String,
    pub court_id: Uuid,
    pub court_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub total_price: Decimal,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<CancelReason>,
    pub payment_status: Option<String>,
    pub payment_expires_at: Option<DateTime<Utc>>,
    pub pix_ticket_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationResponse {
    /// Build a view from a reservation and the display names of its references.
    ///
    /// Missing names (deleted renter or court) are rendered as empty strings.
    pub fn new(
        reservation: &Reservation,
        renter_name: Option<(&str, &str)>,
        court_name: Option<&str>,
    ) -> Self {
        let (name, last_name) = renter_name.unwrap_or_default();
        let cancel_reason = match reservation.state {
            ReservationState::Cancelled { reason } => Some(reason),
            _ => None,
        };

        Self {
            id: reservation.id,
            renter_id: reservation.renter_id,
            renter_name: name.to_string(),
            renter_last_name: last_name.to_string(),
            court_id: reservation.court_id,
            court_name: court_name.unwrap_or_default().to_string(),
            starts_at: reservation.starts_at,
            ends_at: reservation.ends_at,
            total_price: reservation.total_price,
            status: reservation.state.label().to_string(),
            cancel_reason,
            payment_status: reservation
                .payment
                .as_ref()
                .map(|p| p.provider_status.clone()),
            payment_expires_at: reservation.payment.as_ref().map(|p| p.expires_at),
            pix_ticket_url: reservation.payment.as_ref().map(|p| p.ticket_url.clone()),
            created_at: reservation.created_at,
            updated_at: reservation.updated_at,
        }
    }
}

/// PIX instructions handed to the renter right after booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixChargeResponse {
    pub payment_id: String,
    pub qr_code: String,
    pub qr_code_base64: String,
    pub ticket_url: String,
    pub expires_at: DateTime<Utc>,
    pub status: String,
}

impl From<&PaymentDetails> for PixChargeResponse {
    fn from(payment: &PaymentDetails) -> Self {
        Self {
            payment_id: payment.reference.clone(),
            qr_code: payment.qr_code.clone(),
            qr_code_base64: payment.qr_code_base64.clone(),
            ticket_url: payment.ticket_url.clone(),
            expires_at: payment.expires_at,
            status: payment.provider_status.clone(),
        }
    }
}

/// Response of a successful booking: the reservation plus how to pay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationPaymentResponse {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub payment_id: Option<String>,
    pub pix: Option<PixChargeResponse>,
}

/// Result of reconciling a reservation with the payment provider.
///
/// # JSON Example
///
/// ```json
/// {
///   "reservation_id": "770e8400-e29b-41d4-a716-446655440002",
///   "reservation_status": "confirmed",
///   "payment_status": "approved",
///   "paid": true,
///   "expired": false,
///   "payment_expires_at": "2025-11-01T12:10:00Z",
///   "paid_at": "2025-11-01T12:04:31Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusProjection {
    pub reservation_id: Uuid,
    pub reservation_status: String,
    pub payment_status: Option<String>,
    pub paid: bool,
    /// Payment window closed, or the provider gave up during this refresh.
    /// Holds for paid reservations too.
    pub expired: bool,
    pub payment_expires_at: Option<DateTime<Utc>>,
    /// Approval time when confirmed by this refresh, otherwise the stored
    /// `updated_at` of a confirmed reservation.
    pub paid_at: Option<DateTime<Utc>>,
}
