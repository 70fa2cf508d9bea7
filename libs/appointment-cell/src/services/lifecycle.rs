// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::error::AppointmentError;
use crate::models::AppointmentStatus;

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => vec![AppointmentStatus::Cancelled],
            // Terminal
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Only appointments still holding their slot can be moved.
    pub fn validate_amendable(&self, current_status: AppointmentStatus) -> Result<(), AppointmentError> {
        match current_status {
            AppointmentStatus::Cancelled => Err(AppointmentError::NotAmendable { status: current_status }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_valid_transitions() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Confirmed).is_ok());
        assert!(lifecycle.validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Cancelled).is_ok());
        assert!(lifecycle.validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Cancelled).is_ok());
    }

    #[test]
    fn test_cancelled_is_terminal() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Cancelled, AppointmentStatus::Confirmed),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Pending),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
        assert_matches!(
            lifecycle.validate_amendable(AppointmentStatus::Cancelled),
            Err(AppointmentError::NotAmendable { status: AppointmentStatus::Cancelled })
        );
        assert!(lifecycle.validate_amendable(AppointmentStatus::Confirmed).is_ok());
    }
}
