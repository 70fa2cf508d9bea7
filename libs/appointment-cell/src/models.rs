// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchedulingError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    /// The client who requested the booking.
    pub user_id: Uuid,
    pub specialist_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(rename = "duration_minutes")]
    pub duration: AppointmentDuration,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// A freshly requested booking. Callers run the scheduling gate before storing it.
    pub fn new_pending(user_id: Uuid, specialist_id: Uuid, slot: AppointmentSlot) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            specialist_id,
            date: slot.date,
            start_time: slot.start_time,
            duration: slot.duration,
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn slot(&self) -> AppointmentSlot {
        AppointmentSlot {
            date: self.date,
            start_time: self.start_time,
            duration: self.duration,
        }
    }

    /// `[start, start + duration)`, computed on demand.
    pub fn interval(&self) -> TimeInterval {
        self.slot().interval()
    }

    /// Wall-clock end time.
    pub fn end_time(&self) -> NaiveTime {
        self.interval().end.time()
    }

    /// Cancelled appointments no longer occupy their slot.
    pub fn is_active(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} to {} ({})",
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time().format("%H:%M"),
            self.status
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[serde(alias = "Pending", alias = "pending")]
    Pending,
    #[serde(alias = "Confirmed", alias = "confirmed")]
    Confirmed,
    #[serde(alias = "Cancelled", alias = "cancelled")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Every spelling a stored row may carry for this status.
    pub fn stored_spellings(&self) -> [&'static str; 3] {
        match self {
            AppointmentStatus::Pending => ["PENDING", "Pending", "pending"],
            AppointmentStatus::Confirmed => ["CONFIRMED", "Confirmed", "confirmed"],
            AppointmentStatus::Cancelled => ["CANCELLED", "Cancelled", "cancelled"],
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==============================================================================
// INTERVAL MODELS
// ==============================================================================

/// Length of an appointment in whole minutes. Always positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub struct AppointmentDuration(u32);

impl AppointmentDuration {
    pub const DEFAULT: AppointmentDuration = AppointmentDuration(60);

    pub fn from_minutes(minutes: i64) -> Result<Self, SchedulingError> {
        if minutes <= 0 {
            return Err(SchedulingError::InvalidInterval(format!(
                "duration must be a positive number of minutes (got {})", minutes
            )));
        }
        // A booking can never be longer than a day.
        if minutes > 24 * 60 {
            return Err(SchedulingError::InvalidInterval(format!(
                "duration of {} minutes is longer than a day", minutes
            )));
        }
        Ok(Self(minutes as u32))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl Default for AppointmentDuration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for AppointmentDuration {
    type Error = SchedulingError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<AppointmentDuration> for i64 {
    fn from(duration: AppointmentDuration) -> Self {
        i64::from(duration.0)
    }
}

impl fmt::Display for AppointmentDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0 / 60, self.0 % 60) {
            (0, minutes) => write!(f, "{} mins", minutes),
            (1, 0) => write!(f, "1 hour"),
            (hours, 0) => write!(f, "{} hours", hours),
            (hours, minutes) => write!(f, "{}h {}m", hours, minutes),
        }
    }
}

/// A candidate appointment: where it would sit in the specialist's diary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(rename = "duration_minutes")]
    pub duration: AppointmentDuration,
}

impl AppointmentSlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, duration_minutes: i64) -> Result<Self, SchedulingError> {
        Ok(Self {
            date,
            start_time,
            duration: AppointmentDuration::from_minutes(duration_minutes)?,
        })
    }

    pub fn interval(&self) -> TimeInterval {
        let start = self.date.and_time(self.start_time);
        TimeInterval::new(start, start + self.duration.as_duration())
    }
}

/// Half-open `[start, end)` span of wall-clock time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start < end, "interval must not be empty");
        Self { start, end }
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlap_minutes(&self, other: &TimeInterval) -> i64 {
        if !self.overlaps(other) {
            return 0;
        }
        (self.end.min(other.end) - self.start.max(other.start)).num_minutes()
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub user_id: Uuid,
    pub specialist_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
}

/// New date/time/duration for an existing appointment. The specialist cannot change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendAppointmentRequest {
    pub acting_user_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

/// What the payment step needs to charge for a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceQuote {
    pub appointment_id: Uuid,
    pub amount_pence: i64,
    pub currency: String,
    pub description: String,
}

impl PriceQuote {
    pub fn display_amount(&self) -> String {
        format!("£{}.{:02}", self.amount_pence / 100, self.amount_pence % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn interval(start: NaiveTime, minutes: i64) -> TimeInterval {
        AppointmentSlot::new(date(), start, minutes).unwrap().interval()
    }

    #[test]
    fn test_duration_must_be_positive() {
        assert!(AppointmentDuration::from_minutes(0).is_err());
        assert!(AppointmentDuration::from_minutes(-30).is_err());
        assert_eq!(AppointmentDuration::from_minutes(45).unwrap().minutes(), 45);
        assert_eq!(AppointmentDuration::default().to_string(), "1 hour");
        assert_eq!(AppointmentDuration::from_minutes(30).unwrap().to_string(), "30 mins");
        assert_eq!(AppointmentDuration::from_minutes(90).unwrap().to_string(), "1h 30m");
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = interval(t(9, 0), 60);
        let b = interval(t(10, 0), 60);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert_eq!(a.overlap_minutes(&b), 0);
    }

    #[test]
    fn test_partial_overlap() {
        let a = interval(t(10, 0), 60);
        let b = interval(t(10, 30), 60);
        assert!(a.overlaps(&b));
        assert_eq!(a.overlap_minutes(&b), 30);
    }

    #[test]
    fn test_nested_interval_is_contained() {
        let outer = interval(t(9, 0), 8 * 60);
        assert!(outer.contains(&interval(t(9, 0), 60)));
        assert!(outer.contains(&interval(t(16, 0), 60)));
        assert!(!outer.contains(&interval(t(16, 30), 60)));
    }

    #[test]
    fn test_late_slot_runs_into_next_day() {
        let slot = AppointmentSlot::new(date(), t(23, 30), 60).unwrap();
        let interval = slot.interval();
        assert_eq!(interval.end.date(), date().succ_opt().unwrap());
        assert_eq!(interval.end.time(), t(0, 30));
    }

    #[test]
    fn test_appointment_row_round_trip_and_legacy_status() {
        let row = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "user_id": "550e8400-e29b-41d4-a716-446655440001",
            "specialist_id": "550e8400-e29b-41d4-a716-446655440002",
            "date": "2025-06-20",
            "start_time": "10:00:00",
            "duration_minutes": 60,
            "status": "Cancelled",
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-01T10:00:00Z"
        });

        let appointment: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Cancelled);
        assert!(!appointment.is_active());
        assert_eq!(appointment.end_time(), t(11, 0));

        let back = serde_json::to_value(&appointment).unwrap();
        assert_eq!(back["status"], "CANCELLED");
        assert_eq!(back["duration_minutes"], 60);
    }

    #[test]
    fn test_zero_duration_row_is_rejected() {
        let row = json!({
            "date": "2025-06-20",
            "start_time": "10:00:00",
            "duration_minutes": 0
        });
        assert!(serde_json::from_value::<AppointmentSlot>(row).is_err());
    }

    #[test]
    fn test_price_quote_display() {
        let quote = PriceQuote {
            appointment_id: Uuid::new_v4(),
            amount_pence: 5050,
            currency: "gbp".to_string(),
            description: String::new(),
        };
        assert_eq!(quote.display_amount(), "£50.50");
    }
}
