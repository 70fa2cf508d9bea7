// libs/appointment-cell/src/services/availability.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use specialist_cell::Specialist;

use crate::error::SchedulingError;
use crate::models::{AppointmentDuration, AppointmentSlot};

/// Check that `[start, start + duration)` on `date` lies inside the specialist's
/// daily window. Ending exactly when the window closes is fine; running past
/// midnight never is, since windows cannot wrap.
pub fn validate_within_availability(
    date: NaiveDate,
    start_time: NaiveTime,
    duration: AppointmentDuration,
    specialist: &Specialist,
) -> Result<(), SchedulingError> {
    let slot = AppointmentSlot { date, start_time, duration };
    validate_slot_within_availability(&slot, specialist)
}

pub fn validate_slot_within_availability(
    slot: &AppointmentSlot,
    specialist: &Specialist,
) -> Result<(), SchedulingError> {
    let (window_start, window_end) = specialist.availability.bounds_on(slot.date);
    let interval = slot.interval();

    if interval.start < window_start || interval.end > window_end {
        debug!(
            "Slot {} {} ({}) falls outside {} for specialist {}",
            slot.date, slot.start_time, slot.duration, specialist.availability, specialist.id
        );
        return Err(SchedulingError::OutOfHours {
            window_start: specialist.availability_start(),
            window_end: specialist.availability_end(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use specialist_cell::{AvailabilityWindow, Specialty};
    use uuid::Uuid;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn specialist(start: NaiveTime, end: NaiveTime) -> Specialist {
        Specialist {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Robin".to_string(),
            specialty: Specialty::Hairdresser,
            email: "robin@studio.test".to_string(),
            phone_number: None,
            availability: AvailabilityWindow::new(start, end).unwrap(),
            is_active: true,
            session_price_pence: 5000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn minutes(m: i64) -> AppointmentDuration {
        AppointmentDuration::from_minutes(m).unwrap()
    }

    #[test]
    fn test_window_boundaries_are_inclusive_of_start_and_end() {
        let s = specialist(t(9, 0), t(17, 0));
        assert!(validate_within_availability(day(), t(9, 0), minutes(60), &s).is_ok());
        assert!(validate_within_availability(day(), t(16, 0), minutes(60), &s).is_ok());
        assert!(validate_within_availability(day(), t(9, 0), minutes(480), &s).is_ok());
    }

    #[test]
    fn test_overrunning_the_window_is_out_of_hours() {
        let s = specialist(t(9, 0), t(17, 0));
        let err = validate_within_availability(day(), t(16, 30), minutes(60), &s).unwrap_err();
        assert_eq!(err, SchedulingError::OutOfHours { window_start: t(9, 0), window_end: t(17, 0) });
        assert!(validate_within_availability(day(), t(8, 59), minutes(30), &s).is_err());
        assert!(validate_within_availability(day(), t(17, 0), minutes(30), &s).is_err());
    }

    #[test]
    fn test_slot_crossing_midnight_is_rejected() {
        let s = specialist(t(18, 0), t(23, 59));
        assert!(validate_within_availability(day(), t(23, 30), minutes(60), &s).is_err());
    }
}
