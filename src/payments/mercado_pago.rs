//! Mercado Pago PIX client.
//!
//! Talks to the `v1/payments` API:
//! - `POST v1/payments` opens a PIX charge and returns the QR code
//! - `GET v1/payments/{id}` reports its status
//!
//! # Headers Sent
//!
//! - `Authorization: Bearer <access token>`
//! - `User-Agent: CourtBooking/1.0`
//! - `X-Idempotency-Key: <reservation id>` (charge creation only)

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{
    Charge, ChargeRequest, PaymentError, PaymentGateway, PaymentStatusReport, ProviderStatus,
};
use crate::config::Config;

const USER_AGENT: &str = "CourtBooking/1.0";

/// JSON body of `POST v1/payments`.
#[derive(Debug, Serialize)]
struct PixPaymentRequest<'a> {
    transaction_amount: Decimal,
    description: &'a str,
    payment_method_id: &'static str,
    date_of_expiration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
    payer: PayerInfo<'a>,
}

#[derive(Debug, Serialize)]
struct PayerInfo<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

/// HTTP client for the Mercado Pago payments API.
#[derive(Debug, Clone)]
pub struct MercadoPagoClient {
    http: reqwest::Client,
    base_url: Url,
    notification_url: Option<String>,
}

impl MercadoPagoClient {
    /// Build a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, the token cannot be
    /// used as a header value, or the HTTP client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, PaymentError> {
        let mut base = config.mercado_pago_base_url.trim().to_string();
        // Url::join drops the last path segment unless it ends with '/'
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| PaymentError::Configuration(format!("invalid base URL: {e}")))?;

        let mut headers = HeaderMap::new();
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.mercado_pago_access_token.trim()))
                .map_err(|e| PaymentError::Configuration(format!("invalid access token: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.payment_timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            notification_url: config
                .mercado_pago_notification_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
        })
    }

    fn payments_url(&self, reference: Option<&str>) -> Result<Url, PaymentError> {
        let mut url = self
            .base_url
            .join("v1/payments")
            .map_err(|e| PaymentError::Configuration(format!("invalid payments URL: {e}")))?;
        if let Some(reference) = reference {
            url.path_segments_mut()
                .map_err(|()| PaymentError::Configuration("base URL cannot be a base".to_string()))?
                .push(reference);
        }
        Ok(url)
    }

    /// Read the body and turn non-2xx answers into `PaymentError::Provider`.
    async fn read_json(response: reqwest::Response) -> Result<Value, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "payment provider rejected request");
            return Err(PaymentError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| PaymentError::InvalidResponse(format!("body is not JSON: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError> {
        let body = PixPaymentRequest {
            transaction_amount: request
                .amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            description: &request.description,
            payment_method_id: "pix",
            date_of_expiration: request
                .expires_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            notification_url: self.notification_url.as_deref(),
            payer: PayerInfo {
                email: &request.payer_email,
                first_name: &request.payer_first_name,
                last_name: &request.payer_last_name,
            },
        };

        let response = self
            .http
            .post(self.payments_url(None)?)
            .header("X-Idempotency-Key", &request.idempotency_key)
            .json(&body)
            .send()
            .await?;

        let json = Self::read_json(response).await?;
        let charge = parse_charge(&json, request.expires_at)?;

        tracing::info!(
            payment_id = %charge.reference,
            status = %charge.status,
            "PIX charge created"
        );
        Ok(charge)
    }

    async fn query_status(&self, reference: &str) -> Result<PaymentStatusReport, PaymentError> {
        let response = self
            .http
            .get(self.payments_url(Some(reference))?)
            .send()
            .await?;

        let json = Self::read_json(response).await?;
        Ok(parse_status(&json))
    }
}

/// Extract a charge from a `POST v1/payments` response body.
///
/// Expiry comes from `transaction_data.expiration_date`, then the root
/// `date_of_expiration`, then the expiry we asked for.
fn parse_charge(json: &Value, requested_expiry: DateTime<Utc>) -> Result<Charge, PaymentError> {
    let reference = match json.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => {
            return Err(PaymentError::InvalidResponse(
                "payment id missing".to_string(),
            ));
        }
    };

    let transaction_data = json
        .get("point_of_interaction")
        .and_then(|poi| poi.get("transaction_data"))
        .ok_or_else(|| {
            PaymentError::InvalidResponse(
                "point_of_interaction.transaction_data missing".to_string(),
            )
        })?;

    let text = |value: &Value, key: &str| -> String {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let expires_at = parse_timestamp(transaction_data.get("expiration_date"))
        .or_else(|| parse_timestamp(json.get("date_of_expiration")))
        .unwrap_or(requested_expiry);

    Ok(Charge {
        reference,
        status: json
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        qr_code: text(transaction_data, "qr_code"),
        qr_code_base64: text(transaction_data, "qr_code_base64"),
        ticket_url: text(transaction_data, "ticket_url"),
        expires_at,
    })
}

/// Extract status and approval time from a `GET v1/payments/{id}` body.
fn parse_status(json: &Value) -> PaymentStatusReport {
    let status = ProviderStatus::parse(
        json.get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown"),
    );

    let paid_at = match status {
        ProviderStatus::Approved => parse_timestamp(json.get("date_approved")),
        _ => None,
    };

    PaymentStatusReport { status, paid_at }
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
