//! In-memory doubles for service and router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    clock::Clock,
    db::DbPool,
    error::AppError,
    models::{
        court::Court,
        renter::{ADMIN_ROLE, Renter},
        reservation::{CancelReason, PaymentDetails, Reservation, ReservationState, slot_duration},
        slot::DayWindow,
    },
    payments::{
        Charge, ChargeRequest, PaymentError, PaymentGateway, PaymentStatusReport, ProviderStatus,
    },
    repositories::{CourtLookup, RenterLookup, ReservationStore},
    state::{AppState, BookingContext},
};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct InMemoryCourts {
    courts: Mutex<Vec<Court>>,
}

impl InMemoryCourts {
    pub fn insert(&self, court: Court) {
        self.courts.lock().unwrap().push(court);
    }
}

#[async_trait]
impl CourtLookup for InMemoryCourts {
    async fn get(&self, court_id: Uuid) -> Result<Option<Court>, AppError> {
        Ok(self
            .courts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == court_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Court>, AppError> {
        let mut courts = self.courts.lock().unwrap().clone();
        courts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(courts)
    }
}

#[derive(Default)]
pub struct InMemoryRenters {
    renters: Mutex<Vec<Renter>>,
}

impl InMemoryRenters {
    pub fn insert(&self, renter: Renter) {
        self.renters.lock().unwrap().push(renter);
    }
}

#[async_trait]
impl RenterLookup for InMemoryRenters {
    async fn get(&self, renter_id: Uuid) -> Result<Option<Renter>, AppError> {
        Ok(self
            .renters
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == renter_id)
            .cloned())
    }
}

/// Reservation store applying the same release-then-exclude rule and the
/// same guarded updates as the Postgres repository.
#[derive(Default)]
pub struct InMemoryReservations {
    rows: Mutex<Vec<Reservation>>,
}

impl InMemoryReservations {
    pub fn get(&self, reservation_id: Uuid) -> Option<Reservation> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == reservation_id)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<Reservation> {
        self.rows.lock().unwrap().clone()
    }

    fn sorted(mut rows: Vec<Reservation>) -> Vec<Reservation> {
        rows.sort_by_key(|r| r.starts_at);
        rows
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservations {
    async fn by_id(&self, reservation_id: Uuid) -> Result<Option<Reservation>, AppError> {
        Ok(self.get(reservation_id))
    }

    async fn by_renter(&self, renter_id: Uuid) -> Result<Vec<Reservation>, AppError> {
        let rows = self
            .snapshot()
            .into_iter()
            .filter(|r| r.renter_id == renter_id)
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn by_court_and_day(
        &self,
        court_id: Uuid,
        day: DayWindow,
    ) -> Result<Vec<Reservation>, AppError> {
        let rows = self
            .snapshot()
            .into_iter()
            .filter(|r| r.court_id == court_id && r.overlaps(day.start, day.end))
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn all(&self) -> Result<Vec<Reservation>, AppError> {
        Ok(Self::sorted(self.snapshot()))
    }

    async fn add(&self, reservation: &Reservation, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let on_interval = |r: &Reservation| {
            r.court_id == reservation.court_id
                && r.overlaps(reservation.starts_at, reservation.ends_at)
        };

        // Rejected inserts leave every row as it was
        if rows.iter().any(|r| on_interval(r) && r.is_blocking(now)) {
            return Err(AppError::SlotUnavailable);
        }

        for row in rows
            .iter_mut()
            .filter(|r| on_interval(r) && r.is_lapsed_hold(now))
        {
            row.cancel(CancelReason::PaymentExpired, now);
            row.record_provider_status(ProviderStatus::Expired.as_str());
        }

        rows.push(reservation.clone());
        Ok(())
    }

    async fn update(
        &self,
        reservation: &Reservation,
        from: &ReservationState,
    ) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        match rows
            .iter_mut()
            .find(|r| r.id == reservation.id && r.state.label() == from.label())
        {
            Some(row) => {
                *row = reservation.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
struct GatewayScript {
    charges: Vec<ChargeRequest>,
    queries: Vec<String>,
    report: Option<PaymentStatusReport>,
    fail_charges: bool,
    fail_queries: bool,
}

/// Payment gateway answering from a script and recording every call.
#[derive(Default)]
pub struct StubGateway {
    script: Mutex<GatewayScript>,
}

impl StubGateway {
    pub fn charge_requests(&self) -> Vec<ChargeRequest> {
        self.script.lock().unwrap().charges.clone()
    }

    pub fn status_queries(&self) -> Vec<String> {
        self.script.lock().unwrap().queries.clone()
    }

    /// Status returned by subsequent queries. Defaults to pending.
    pub fn report(&self, status: ProviderStatus, paid_at: Option<DateTime<Utc>>) {
        self.script.lock().unwrap().report = Some(PaymentStatusReport { status, paid_at });
    }

    pub fn fail_charges(&self) {
        self.script.lock().unwrap().fail_charges = true;
    }

    pub fn fail_status_queries(&self) {
        self.script.lock().unwrap().fail_queries = true;
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge, PaymentError> {
        let mut script = self.script.lock().unwrap();
        if script.fail_charges {
            return Err(PaymentError::Provider {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        script.charges.push(request.clone());
        let reference = (1000 + script.charges.len()).to_string();
        Ok(Charge {
            qr_code: format!("00020126580014br.gov.bcb.pix{reference}"),
            qr_code_base64: "iVBORw0KGgoAAAANSUhEUg==".to_string(),
            ticket_url: format!("https://pay.example/{reference}/ticket"),
            reference,
            status: "pending".to_string(),
            expires_at: request.expires_at,
        })
    }

    async fn query_status(&self, reference: &str) -> Result<PaymentStatusReport, PaymentError> {
        let mut script = self.script.lock().unwrap();
        script.queries.push(reference.to_string());
        if script.fail_queries {
            return Err(PaymentError::InvalidResponse("status missing".to_string()));
        }
        Ok(script.report.clone().unwrap_or(PaymentStatusReport {
            status: ProviderStatus::Pending,
            paid_at: None,
        }))
    }
}

/// One court ("Court A", 100.00/h, 08-20), one renter and a clock pinned
/// at 09:00 venue time on 2025-11-01.
pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub courts: Arc<InMemoryCourts>,
    pub renters: Arc<InMemoryRenters>,
    pub store: Arc<InMemoryReservations>,
    pub gateway: Arc<StubGateway>,
    pub court: Court,
    pub renter: Renter,
    pub ctx: BookingContext,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap(),
        ));
        let courts = Arc::new(InMemoryCourts::default());
        let renters = Arc::new(InMemoryRenters::default());
        let store = Arc::new(InMemoryReservations::default());
        let gateway = Arc::new(StubGateway::default());

        let court = Court {
            id: Uuid::new_v4(),
            name: "Court A".to_string(),
            primary_sport: "Beach volleyball".to_string(),
            hourly_rate: Decimal::new(10000, 2),
            opening_hour: 8,
            closing_hour: 20,
            image_url: None,
            created_at: clock.now() - Duration::days(30),
        };
        courts.insert(court.clone());

        let renter = renter("Ana", "Souza", "ana@example.com", "customer");
        renters.insert(renter.clone());

        let ctx = BookingContext {
            courts: courts.clone(),
            renters: renters.clone(),
            reservations: store.clone(),
            payments: gateway.clone(),
            clock: clock.clone(),
            venue_offset: FixedOffset::west_opt(3 * 3600).unwrap(),
            payment_window: Duration::minutes(10),
        };

        Self {
            clock,
            courts,
            renters,
            store,
            gateway,
            court,
            renter,
            ctx,
        }
    }

    /// The venue-local date after the pinned "today".
    pub fn tomorrow(&self) -> NaiveDate {
        self.clock
            .now()
            .with_timezone(&self.ctx.venue_offset)
            .date_naive()
            .succ_opt()
            .unwrap()
    }

    pub fn add_renter(&self, name: &str, last_name: &str, email: &str) -> Renter {
        let renter = renter(name, last_name, email, "customer");
        self.renters.insert(renter.clone());
        renter
    }

    pub fn add_admin(&self) -> Renter {
        let admin = renter("Carla", "Admin", "admin@example.com", ADMIN_ROLE);
        self.renters.insert(admin.clone());
        admin
    }

    /// A pending reservation of the fixture court and renter, not stored,
    /// whose charge expires at the end of the payment window.
    pub fn reservation_at(&self, starts_at: DateTime<Utc>) -> Reservation {
        let now = self.clock.now();
        Reservation {
            id: Uuid::new_v4(),
            renter_id: self.renter.id,
            court_id: self.court.id,
            starts_at,
            ends_at: starts_at + slot_duration(),
            total_price: self.court.hourly_rate,
            state: ReservationState::Pending,
            payment: Some(PaymentDetails {
                reference: "42".to_string(),
                provider_status: "pending".to_string(),
                expires_at: now + self.ctx.payment_window,
                qr_code: "000201".to_string(),
                qr_code_base64: String::new(),
                ticket_url: "https://pay.example/42/ticket".to_string(),
            }),
            created_at: now,
            updated_at: now,
        }
    }

    /// Application state over the in-memory doubles.
    ///
    /// The pool never connects unless a handler touches it.
    pub fn app_state(&self) -> AppState {
        AppState {
            pool: lazy_pool(),
            booking: self.ctx.clone(),
        }
    }
}

/// `hour:00` venue time on the fixture's tomorrow.
pub fn tomorrow_at(fx: &Fixture, hour: u32) -> DateTime<Utc> {
    DayWindow::for_local_date(fx.tomorrow(), fx.ctx.venue_offset).at_hour(hour)
}

fn renter(name: &str, last_name: &str, email: &str, role: &str) -> Renter {
    Renter {
        id: Uuid::new_v4(),
        name: name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        role: role.to_string(),
    }
}

fn lazy_pool() -> DbPool {
    sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/court_booking_test")
        .unwrap()
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn rejected_add_leaves_lapsed_holds_untouched() {
        let fx = Fixture::new();
        let ten = tomorrow_at(&fx, 10);
        let lapsed = fx.reservation_at(ten - Duration::minutes(30));
        fx.store.add(&lapsed, fx.clock.now()).await.unwrap();
        fx.clock.advance(Duration::minutes(10));
        let active = fx.reservation_at(ten + Duration::minutes(30));
        fx.store.add(&active, fx.clock.now()).await.unwrap();

        let result = fx.store.add(&fx.reservation_at(ten), fx.clock.now()).await;

        assert!(matches!(result, Err(AppError::SlotUnavailable)));
        assert_eq!(fx.store.get(lapsed.id).unwrap(), lapsed);
        assert_eq!(fx.store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn update_only_applies_from_the_expected_state() {
        let fx = Fixture::new();
        let reservation = fx.reservation_at(tomorrow_at(&fx, 10));
        fx.store.add(&reservation, fx.clock.now()).await.unwrap();
        let mut confirmed = reservation.clone();
        confirmed.confirm(fx.clock.now(), fx.clock.now());

        let from_cancelled = fx
            .store
            .update(&confirmed, &ReservationState::Cancelled {
                reason: CancelReason::Requested,
            })
            .await
            .unwrap();
        assert!(!from_cancelled);
        assert_eq!(fx.store.get(reservation.id).unwrap(), reservation);

        let from_pending = fx
            .store
            .update(&confirmed, &ReservationState::Pending)
            .await
            .unwrap();
        assert!(from_pending);
        assert_eq!(fx.store.get(reservation.id).unwrap(), confirmed);

        let missing = fx.reservation_at(tomorrow_at(&fx, 12));
        assert!(!fx.store.update(&missing, &ReservationState::Pending).await.unwrap());
    }
}
