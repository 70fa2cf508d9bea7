// libs/appointment-cell/src/error.rs
use std::fmt;

use chrono::NaiveTime;
use thiserror::Error;

use shared_models::error::AppError;
use specialist_cell::SpecialistError;

use crate::models::{Appointment, AppointmentStatus};

// ==============================================================================
// SCHEDULING VIOLATIONS
// ==============================================================================

/// One reason a candidate slot cannot be booked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingError {
    #[error("Appointment must be within the specialist's available hours: {} to {}.", hhmm(.window_start), hhmm(.window_end))]
    OutOfHours { window_start: NaiveTime, window_end: NaiveTime },

    #[error("This time slot is already booked.")]
    SlotTaken { conflicting: Box<Appointment> },

    #[error("Invalid appointment interval: {0}")]
    InvalidInterval(String),
}

fn hhmm(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

impl SchedulingError {
    /// Form field a client would correct.
    pub fn field(&self) -> &'static str {
        match self {
            SchedulingError::OutOfHours { .. } | SchedulingError::SlotTaken { .. } => "start_time",
            SchedulingError::InvalidInterval(_) => "duration",
        }
    }
}

/// Everything wrong with a candidate slot, in check order: availability first, then overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingRejection {
    violations: Vec<SchedulingError>,
}

impl SchedulingRejection {
    /// `None` when there is nothing to reject.
    pub fn from_violations(violations: Vec<SchedulingError>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[SchedulingError] {
        &self.violations
    }

    pub fn first(&self) -> &SchedulingError {
        &self.violations[0]
    }

    pub fn is_out_of_hours(&self) -> bool {
        self.violations.iter().any(|v| matches!(v, SchedulingError::OutOfHours { .. }))
    }

    pub fn conflicting_appointment(&self) -> Option<&Appointment> {
        self.violations.iter().find_map(|v| match v {
            SchedulingError::SlotTaken { conflicting } => Some(conflicting.as_ref()),
            _ => None,
        })
    }
}

impl From<SchedulingError> for SchedulingRejection {
    fn from(err: SchedulingError) -> Self {
        Self { violations: vec![err] }
    }
}

impl fmt::Display for SchedulingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for SchedulingRejection {}

// ==============================================================================
// WORKFLOW ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Specialist not found")]
    SpecialistNotFound,

    #[error("Specialist is not taking bookings")]
    SpecialistInactive,

    #[error("{0}")]
    Rejected(SchedulingRejection),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("A {status} appointment cannot be amended")]
    NotAmendable { status: AppointmentStatus },

    #[error("Timed out waiting to update the specialist's diary")]
    LockTimeout,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppointmentError {
    pub fn rejection(&self) -> Option<&SchedulingRejection> {
        match self {
            AppointmentError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

impl From<SchedulingRejection> for AppointmentError {
    fn from(rejection: SchedulingRejection) -> Self {
        AppointmentError::Rejected(rejection)
    }
}

impl From<SchedulingError> for AppointmentError {
    fn from(err: SchedulingError) -> Self {
        AppointmentError::Rejected(err.into())
    }
}

impl From<SpecialistError> for AppointmentError {
    fn from(err: SpecialistError) -> Self {
        match err {
            SpecialistError::NotFound => AppointmentError::SpecialistNotFound,
            SpecialistError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            other => AppointmentError::InvalidInput(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::SpecialistNotFound => AppError::NotFound("Specialist not found".to_string()),
            AppointmentError::SpecialistInactive => AppError::validation("specialist_id", err.to_string()),
            AppointmentError::Rejected(rejection) => {
                let first = rejection.first();
                match first {
                    SchedulingError::SlotTaken { .. } => AppError::conflict(first.field(), rejection.to_string()),
                    _ => AppError::validation(first.field(), rejection.to_string()),
                }
            }
            AppointmentError::InvalidInput(msg) => AppError::BadRequest(msg),
            AppointmentError::InvalidStatusTransition { .. } | AppointmentError::NotAmendable { .. } => {
                AppError::Conflict { field: Some("status".to_string()), message: err.to_string() }
            }
            AppointmentError::LockTimeout => AppError::Unavailable(err.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
