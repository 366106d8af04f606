//! Payment provider integration.
//!
//! The booking engine only knows the [`PaymentGateway`] capability:
//! create a PIX charge, then ask for its status. [`mercado_pago`] is the
//! production implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::reservation::PaymentDetails;

pub mod mercado_pago;

/// Errors raised while talking to the payment provider.
///
/// None of them leave local state modified, so callers may retry.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Network failure, timeout or TLS error
    #[error("request to payment provider failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("payment provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// Provider answered 2xx but the body was not what we expected
    #[error("unexpected payment provider response: {0}")]
    InvalidResponse(String),

    /// Client could not be built from the configured values
    #[error("payment client misconfigured: {0}")]
    Configuration(String),
}

/// Everything needed to open a PIX charge.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub description: String,
    pub payer_email: String,
    pub payer_first_name: String,
    pub payer_last_name: String,
    pub expires_at: DateTime<Utc>,

    /// Sent to the provider so a retried request cannot open a second charge
    pub idempotency_key: String,
}

/// A charge opened at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub reference: String,
    pub status: String,
    pub qr_code: String,
    pub qr_code_base64: String,
    pub ticket_url: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Charge> for PaymentDetails {
    fn from(charge: Charge) -> Self {
        Self {
            reference: charge.reference,
            provider_status: charge.status,
            expires_at: charge.expires_at,
            qr_code: charge.qr_code,
            qr_code_base64: charge.qr_code_base64,
            ticket_url: charge.ticket_url,
        }
    }
}

/// Payment status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Expired,
    /// Anything else (`in_process`, `authorized`, ...), kept verbatim
    Other(String),
}

impl ProviderStatus {
    /// Parse a provider status string, ignoring ASCII case.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pending" => ProviderStatus::Pending,
            "approved" => ProviderStatus::Approved,
            "rejected" => ProviderStatus::Rejected,
            "cancelled" => ProviderStatus::Cancelled,
            "expired" => ProviderStatus::Expired,
            _ => ProviderStatus::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderStatus::Pending => "pending",
            ProviderStatus::Approved => "approved",
            ProviderStatus::Rejected => "rejected",
            ProviderStatus::Cancelled => "cancelled",
            ProviderStatus::Expired => "expired",
            ProviderStatus::Other(raw) => raw,
        }
    }

    /// The charge can never be paid anymore.
    pub fn is_dead(&self) -> bool {
        matches!(
            self,
            ProviderStatus::Rejected | ProviderStatus::Cancelled | ProviderStatus::Expired
        )
    }
}

/// Answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusReport {
    pub status: ProviderStatus,

    /// Only set for approved payments, when the provider sends it
    pub paid_at: Option<DateTime<Utc>>,
}

/// Capability to charge renters through PIX.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a charge. Fails without side effects on our side.
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError>;

    /// Current status of a previously created charge.
    async fn query_status(&self, reference: &str) -> Result<PaymentStatusReport, PaymentError>;
}
