#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentBookingService, AppointmentError, AppointmentNotice, AppointmentStore, BookAppointmentRequest, InMemoryAppointmentStore, Notifier, RosterFilter,
};
use shared_config::SchedulingConfig;
use shared_utils::test_utils::{date, init_test_tracing, time};
use specialist_cell::{AvailabilityWindow, InMemorySpecialistStore, Specialist, SpecialistStore, Specialty};

/// Keeps every notice it is handed. Can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<AppointmentNotice>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &AppointmentNotice) -> anyhow::Result<()> {
        self.notices.lock().await.push(notice.clone());
        if self.fail {
            anyhow::bail!("mail server unreachable");
        }
        Ok(())
    }
}

type WritePredicate = Box<dyn Fn(&Appointment) -> bool + Send + Sync>;

/// In-memory store whose conditional writes stall for a while when the
/// incoming row matches, leaving room for another request to get in first.
pub struct StallingStore {
    inner: Arc<InMemoryAppointmentStore>,
    stall: Duration,
    matches: WritePredicate,
}

#[async_trait]
impl AppointmentStore for StallingStore {
    async fn appointments_for(
        &self,
        specialist_id: Uuid,
        date: NaiveDate,
        filter: RosterFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.inner.appointments_for(specialist_id, date, filter).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        self.inner.get(id).await
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        self.inner.insert(appointment).await
    }

    async fn update_if_unchanged(
        &self,
        appointment: Appointment,
        seen: &Appointment,
    ) -> Result<Option<Appointment>, AppointmentError> {
        if (self.matches)(&appointment) {
            tokio::time::sleep(self.stall).await;
        }
        self.inner.update_if_unchanged(appointment, seen).await
    }

    async fn list_for_specialist(&self, specialist_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        self.inner.list_for_specialist(specialist_id, filter).await
    }

    async fn list_for_client(&self, user_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        self.inner.list_for_client(user_id, filter).await
    }

    async fn delete_for_specialist(&self, specialist_id: Uuid) -> Result<usize, AppointmentError> {
        self.inner.delete_for_specialist(specialist_id).await
    }
}

pub struct Harness {
    pub service: AppointmentBookingService,
    pub specialists: Arc<InMemorySpecialistStore>,
    pub appointments: Arc<InMemoryAppointmentStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(SchedulingConfig::default(), RecordingNotifier::default())
    }

    pub fn with(scheduling: SchedulingConfig, notifier: RecordingNotifier) -> Self {
        init_test_tracing();
        let specialists = Arc::new(InMemorySpecialistStore::new());
        let appointments = Arc::new(InMemoryAppointmentStore::new());
        let notifier = Arc::new(notifier);

        let service = AppointmentBookingService::new(
            specialists.clone(),
            appointments.clone(),
            notifier.clone(),
            scheduling,
        );

        Self { service, specialists, appointments, notifier }
    }

    /// Writes of rows matching `matches` stall for 100ms before landing.
    pub fn with_stalled_writes(matches: impl Fn(&Appointment) -> bool + Send + Sync + 'static) -> Self {
        init_test_tracing();
        let specialists = Arc::new(InMemorySpecialistStore::new());
        let appointments = Arc::new(InMemoryAppointmentStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let stalling = Arc::new(StallingStore {
            inner: appointments.clone(),
            stall: Duration::from_millis(100),
            matches: Box::new(matches),
        });
        let service = AppointmentBookingService::new(
            specialists.clone(),
            stalling,
            notifier.clone(),
            SchedulingConfig::default(),
        );

        Self { service, specialists, appointments, notifier }
    }

    /// A specialist working 09:00 to 17:00.
    pub async fn specialist(&self) -> Specialist {
        self.specialist_with_hours(time(9, 0), time(17, 0)).await
    }

    pub async fn specialist_with_hours(&self, start: NaiveTime, end: NaiveTime) -> Specialist {
        let now = Utc::now();
        let specialist = Specialist {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Sam Taylor".to_string(),
            specialty: Specialty::TattooArtist,
            email: "sam@studio.test".to_string(),
            phone_number: Some("07700900123".to_string()),
            availability: AvailabilityWindow::new(start, end).unwrap(),
            is_active: true,
            session_price_pence: 5000,
            created_at: now,
            updated_at: now,
        };
        self.specialists.insert(specialist).await.unwrap()
    }

    pub async fn notices(&self) -> Vec<AppointmentNotice> {
        self.notifier.notices.lock().await.clone()
    }
}

pub fn booking_date() -> NaiveDate {
    date(2025, 6, 20)
}

pub fn book_request(specialist_id: Uuid, start: NaiveTime, duration_minutes: i64) -> BookAppointmentRequest {
    BookAppointmentRequest {
        user_id: Uuid::new_v4(),
        specialist_id,
        date: booking_date(),
        start_time: start,
        duration_minutes,
    }
}
