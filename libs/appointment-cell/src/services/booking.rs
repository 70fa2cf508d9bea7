// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig};
use shared_database::supabase::SupabaseClient;
use specialist_cell::{Specialist, SpecialistSearchFilters, SpecialistStore, Specialty, SupabaseSpecialistStore};

use crate::error::{AppointmentError, SchedulingError};
use crate::models::{
    AmendAppointmentRequest, Appointment, AppointmentSlot, AppointmentStatus,
    BookAppointmentRequest, PriceQuote,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::consistency::SchedulingLocks;
use crate::services::gate::SchedulingGate;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::notification::{AppointmentNotice, LoggingNotifier, Notifier};
use crate::services::pricing::PricingService;
use crate::store::{AppointmentStore, RosterFilter, SupabaseAppointmentStore};

/// Conditional write attempts before a workflow gives up on a row.
const MAX_WRITE_ATTEMPTS: usize = 3;

pub struct AppointmentBookingService {
    specialists: Arc<dyn SpecialistStore>,
    appointments: Arc<dyn AppointmentStore>,
    gate: SchedulingGate,
    locks: Arc<SchedulingLocks>,
    lifecycle_service: AppointmentLifecycleService,
    pricing_service: PricingService,
    notifier: Arc<dyn Notifier>,
    scheduling: SchedulingConfig,
}

impl AppointmentBookingService {
    pub fn new(
        specialists: Arc<dyn SpecialistStore>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
        scheduling: SchedulingConfig,
    ) -> Self {
        let locks = Arc::new(SchedulingLocks::with_timeout_seconds(scheduling.lock_timeout_seconds));
        let gate = SchedulingGate::new(ConflictDetectionService::new(Arc::clone(&appointments)));

        Self {
            specialists,
            appointments,
            gate,
            locks,
            lifecycle_service: AppointmentLifecycleService::new(),
            pricing_service: PricingService::new(),
            notifier,
            scheduling,
        }
    }

    /// Supabase-backed service using the service token, logging notices.
    pub fn from_config(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let token = config.supabase_service_token.clone();

        Self::new(
            Arc::new(SupabaseSpecialistStore::new(Arc::clone(&supabase), token.clone())),
            Arc::new(SupabaseAppointmentStore::new(supabase, token)),
            Arc::new(LoggingNotifier::new(config.notifications.clone())),
            config.scheduling.clone(),
        )
    }

    /// Share one lock registry between services writing to the same diaries.
    pub fn with_locks(mut self, locks: Arc<SchedulingLocks>) -> Self {
        self.locks = locks;
        self
    }

    // ==============================================================================
    // BOOKING WORKFLOWS
    // ==============================================================================

    /// Create a PENDING appointment if the slot passes the gate.
    #[instrument(skip(self, request), fields(specialist_id = %request.specialist_id, user_id = %request.user_id))]
    pub async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        let slot = self.build_slot(request.date, request.start_time, request.duration_minutes)?;
        let specialist = self.load_bookable_specialist(request.specialist_id).await?;

        let _guard = self.locks.acquire(specialist.id, slot.date).await?;
        self.gate.check(&specialist, &slot, None).await?;

        let appointment = self
            .appointments
            .insert(Appointment::new_pending(request.user_id, specialist.id, slot))
            .await?;

        info!("Appointment {} booked with specialist {} ({})", appointment.id, specialist.id, appointment);
        Ok(appointment)
    }

    /// Move an appointment to a new date, time or length with the same specialist.
    #[instrument(skip(self, request), fields(acting_user_id = %request.acting_user_id))]
    pub async fn amend_appointment(
        &self,
        appointment_id: Uuid,
        request: AmendAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let slot = self.build_slot(request.date, request.start_time, request.duration_minutes)?;
        let current = self.get_appointment(appointment_id).await?;
        self.lifecycle_service.validate_amendable(current.status)?;
        let specialist = self.load_specialist(current.specialist_id).await?;

        // Only the target date gets more crowded, so only its diary is locked.
        let _guard = self.locks.acquire(specialist.id, slot.date).await?;

        for _ in 0..MAX_WRITE_ATTEMPTS {
            // Cancel and confirm do not take the diary lock, so re-read and
            // write conditionally on the row seen here.
            let seen = self.get_appointment(appointment_id).await?;
            self.lifecycle_service.validate_amendable(seen.status)?;
            self.gate.check(&specialist, &slot, Some(seen.id)).await?;

            let mut appointment = seen.clone();
            appointment.date = slot.date;
            appointment.start_time = slot.start_time;
            appointment.duration = slot.duration;
            appointment.updated_at = Utc::now();

            if let Some(appointment) = self.appointments.update_if_unchanged(appointment, &seen).await? {
                info!("Appointment {} amended to {}", appointment.id, appointment);
                self.send_notice(AppointmentNotice::amended(&appointment, &specialist, request.acting_user_id)).await;
                return Ok(appointment);
            }
            debug!("Appointment {} changed during amendment, re-reading", appointment_id);
        }

        Err(Self::write_contention(appointment_id))
    }

    /// Free the slot. The client is told whoever cancelled.
    #[instrument(skip(self))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.transition(appointment_id, AppointmentStatus::Cancelled).await?;
        info!("Appointment {} cancelled by {}", appointment.id, acting_user_id);

        match self.specialists.get(appointment.specialist_id).await {
            Ok(Some(specialist)) => {
                self.send_notice(AppointmentNotice::cancelled(&appointment, &specialist)).await;
            }
            Ok(None) => warn!("Specialist {} missing, no cancellation notice sent", appointment.specialist_id),
            Err(e) => warn!("Could not load specialist for cancellation notice: {}", e),
        }

        Ok(appointment)
    }

    /// Called once payment for the booking has gone through.
    pub async fn confirm_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self.transition(appointment_id, AppointmentStatus::Confirmed).await?;
        info!("Appointment {} confirmed", appointment.id);
        Ok(appointment)
    }

    /// Run the gate without writing anything. Pass the appointment id when
    /// pre-validating an amendment.
    pub async fn check_slot(
        &self,
        specialist_id: Uuid,
        slot: &AppointmentSlot,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        self.validate_duration(slot)?;
        let specialist = self.load_specialist(specialist_id).await?;
        self.gate.check(&specialist, slot, exclude_appointment_id).await
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);
        self.appointments.get(appointment_id).await?.ok_or(AppointmentError::NotFound)
    }

    /// Every appointment with the specialist, cancelled ones included.
    pub async fn list_specialist_appointments(&self, specialist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.appointments.list_for_specialist(specialist_id, RosterFilter::all()).await
    }

    pub async fn list_client_appointments(&self, user_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.appointments.list_for_client(user_id, RosterFilter::all()).await
    }

    /// Appointments with every specialist of one specialty, inactive
    /// specialists included, ordered by date and start time.
    pub async fn list_specialty_appointments(&self, specialty: Specialty) -> Result<Vec<Appointment>, AppointmentError> {
        let filters = SpecialistSearchFilters { specialty: Some(specialty), ..Default::default() };
        let specialists = self.specialists.list(&filters).await?;

        let mut appointments = Vec::new();
        for specialist in &specialists {
            appointments.extend(self.appointments.list_for_specialist(specialist.id, RosterFilter::all()).await?);
        }
        appointments.sort_by(|a, b| (a.date, a.start_time, a.id).cmp(&(b.date, b.start_time, b.id)));

        debug!("{} appointments across {} {} specialists", appointments.len(), specialists.len(), specialty);
        Ok(appointments)
    }

    /// What the payment step should charge for this appointment.
    pub async fn quote_appointment(&self, appointment_id: Uuid) -> Result<PriceQuote, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;
        if !appointment.is_active() {
            return Err(AppointmentError::InvalidInput(format!(
                "Appointment {} is cancelled and cannot be paid for", appointment_id
            )));
        }
        let specialist = self.load_specialist(appointment.specialist_id).await?;
        Ok(self.pricing_service.quote(&appointment, &specialist))
    }

    /// Delete a specialist together with all of their appointments.
    #[instrument(skip(self))]
    pub async fn remove_specialist(&self, specialist_id: Uuid) -> Result<usize, AppointmentError> {
        self.load_specialist(specialist_id).await?;

        let removed = self.appointments.delete_for_specialist(specialist_id).await?;
        if !self.specialists.delete(specialist_id).await? {
            return Err(AppointmentError::SpecialistNotFound);
        }

        warn!("Specialist {} removed along with {} appointments", specialist_id, removed);
        Ok(removed)
    }

    // ==============================================================================
    // HELPERS
    // ==============================================================================

    fn build_slot(&self, date: NaiveDate, start_time: NaiveTime, duration_minutes: i64) -> Result<AppointmentSlot, AppointmentError> {
        let slot = AppointmentSlot::new(date, start_time, duration_minutes)?;
        self.validate_duration(&slot)?;
        Ok(slot)
    }

    fn validate_duration(&self, slot: &AppointmentSlot) -> Result<(), SchedulingError> {
        if !self.scheduling.is_duration_allowed(slot.duration.minutes()) {
            return Err(SchedulingError::InvalidInterval(format!(
                "{} is not an available appointment length", slot.duration
            )));
        }
        Ok(())
    }

    async fn load_specialist(&self, specialist_id: Uuid) -> Result<Specialist, AppointmentError> {
        self.specialists
            .get(specialist_id)
            .await?
            .ok_or(AppointmentError::SpecialistNotFound)
    }

    async fn load_bookable_specialist(&self, specialist_id: Uuid) -> Result<Specialist, AppointmentError> {
        let specialist = self.load_specialist(specialist_id).await?;
        if !specialist.is_active {
            return Err(AppointmentError::SpecialistInactive);
        }
        Ok(specialist)
    }

    /// Status change written only if nobody else wrote the row in between.
    async fn transition(&self, appointment_id: Uuid, new_status: AppointmentStatus) -> Result<Appointment, AppointmentError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let seen = self.get_appointment(appointment_id).await?;
            self.lifecycle_service.validate_status_transition(seen.status, new_status)?;

            let mut appointment = seen.clone();
            appointment.status = new_status;
            appointment.updated_at = Utc::now();
            if let Some(appointment) = self.appointments.update_if_unchanged(appointment, &seen).await? {
                return Ok(appointment);
            }
            debug!("Appointment {} changed before it could become {}, re-reading", appointment_id, new_status);
        }

        Err(Self::write_contention(appointment_id))
    }

    fn write_contention(appointment_id: Uuid) -> AppointmentError {
        warn!("Gave up writing appointment {} after {} conflicting updates", appointment_id, MAX_WRITE_ATTEMPTS);
        AppointmentError::DatabaseError(format!(
            "Appointment {} kept changing while being updated", appointment_id
        ))
    }

    async fn send_notice(&self, notice: AppointmentNotice) {
        if let Err(e) = self.notifier.notify(&notice).await {
            warn!(
                "Failed to send '{}' notice for appointment {}: {}",
                notice.subject(),
                notice.appointment.id,
                e
            );
        }
    }
}
