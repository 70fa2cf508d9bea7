// libs/appointment-cell/src/services/gate.rs
use tracing::{debug, instrument};
use uuid::Uuid;

use specialist_cell::Specialist;

use crate::error::{AppointmentError, SchedulingRejection};
use crate::models::{Appointment, AppointmentSlot};
use crate::services::availability::validate_slot_within_availability;
use crate::services::conflict::{validate_no_overlap, ConflictDetectionService};

/// The single check every create and amend goes through. Both rules are always
/// evaluated so the caller can report everything wrong with the slot at once.
pub struct SchedulingGate {
    conflicts: ConflictDetectionService,
}

impl SchedulingGate {
    pub fn new(conflicts: ConflictDetectionService) -> Self {
        Self { conflicts }
    }

    /// Pure evaluation against an already-loaded roster.
    pub fn evaluate(
        specialist: &Specialist,
        slot: &AppointmentSlot,
        roster: &[Appointment],
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), SchedulingRejection> {
        let violations: Vec<_> = [
            validate_slot_within_availability(slot, specialist),
            validate_no_overlap(specialist.id, slot, roster, exclude_appointment_id),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        match SchedulingRejection::from_violations(violations) {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }

    /// Load the roster for the slot's date and evaluate. Callers that persist
    /// the result must hold the scheduling lock for `(specialist, date)`.
    #[instrument(skip(self, specialist), fields(specialist_id = %specialist.id))]
    pub async fn check(
        &self,
        specialist: &Specialist,
        slot: &AppointmentSlot,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        let roster = self.conflicts.roster(specialist.id, slot, exclude_appointment_id).await?;
        debug!("Evaluating slot against {} existing appointments", roster.len());
        Self::evaluate(specialist, slot, &roster, exclude_appointment_id)?;
        Ok(())
    }

    pub fn conflicts(&self) -> &ConflictDetectionService {
        &self.conflicts
    }
}
