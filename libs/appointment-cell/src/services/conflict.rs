// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppointmentError, SchedulingError};
use crate::models::{Appointment, AppointmentSlot, ConflictCheckResponse};
use crate::store::{AppointmentStore, RosterFilter};

/// Every appointment in `roster` that would clash with `slot`, earliest first.
///
/// The roster is re-filtered here, so a caller may pass a wider set than the
/// specialist's active bookings for the slot's date.
pub fn find_conflicts<'a>(
    specialist_id: Uuid,
    slot: &AppointmentSlot,
    roster: &'a [Appointment],
    exclude_appointment_id: Option<Uuid>,
) -> Vec<&'a Appointment> {
    let filter = RosterFilter::active().excluding(exclude_appointment_id);
    let candidate = slot.interval();

    let mut conflicts: Vec<&Appointment> = roster
        .iter()
        .filter(|existing| existing.specialist_id == specialist_id && existing.date == slot.date)
        .filter(|existing| filter.admits(existing))
        .filter(|existing| existing.interval().overlaps(&candidate))
        .collect();
    conflicts.sort_by_key(|existing| (existing.start_time, existing.id));
    conflicts
}

/// Reject `slot` if it overlaps any active appointment with the same specialist
/// on the same date. The reported conflict is the earliest one.
pub fn validate_no_overlap(
    specialist_id: Uuid,
    slot: &AppointmentSlot,
    roster: &[Appointment],
    exclude_appointment_id: Option<Uuid>,
) -> Result<(), SchedulingError> {
    match find_conflicts(specialist_id, slot, roster, exclude_appointment_id).first() {
        Some(conflicting) => {
            debug!(
                "Slot {} {} clashes with appointment {} ({})",
                slot.date, slot.start_time, conflicting.id, conflicting
            );
            Err(SchedulingError::SlotTaken { conflicting: Box::new((*conflicting).clone()) })
        }
        None => Ok(()),
    }
}

pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// The specialist's active appointments on the slot's date.
    pub async fn roster(
        &self,
        specialist_id: Uuid,
        slot: &AppointmentSlot,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.store
            .appointments_for(specialist_id, slot.date, RosterFilter::active().excluding(exclude_appointment_id))
            .await
    }

    pub async fn check_conflicts(
        &self,
        specialist_id: Uuid,
        slot: &AppointmentSlot,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let roster = self.roster(specialist_id, slot, exclude_appointment_id).await?;
        let conflicting_appointments: Vec<Appointment> =
            find_conflicts(specialist_id, slot, &roster, exclude_appointment_id)
                .into_iter()
                .cloned()
                .collect();

        let has_conflict = !conflicting_appointments.is_empty();
        if has_conflict {
            warn!(
                "Conflict detected for specialist {} - {} conflicting appointments",
                specialist_id,
                conflicting_appointments.len()
            );
        }

        Ok(ConflictCheckResponse {
            has_conflict,
            conflicting_appointments,
        })
    }
}
