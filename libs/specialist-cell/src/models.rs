// libs/specialist-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

pub const DEFAULT_SESSION_PRICE_PENCE: i64 = 5000;

// ==============================================================================
// SPECIALIST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Specialist {
    pub id: Uuid,
    /// Account that manages this specialist's diary.
    pub user_id: Uuid,
    pub name: String,
    pub specialty: Specialty,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub availability: AvailabilityWindow,
    pub is_active: bool,
    pub session_price_pence: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Specialist {
    pub fn availability_start(&self) -> NaiveTime {
        self.availability.start()
    }

    pub fn availability_end(&self) -> NaiveTime {
        self.availability.end()
    }
}

impl fmt::Display for Specialist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.specialty.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    #[serde(alias = "Beauticians", alias = "beauticians")]
    Beautician,

    #[serde(alias = "Hairdressers", alias = "barbers", alias = "barber")]
    Hairdresser,

    #[serde(alias = "Tattoo Artists")]
    TattooArtist,

    #[serde(alias = "Nail Technicians")]
    NailTechnician,

    #[serde(alias = "Dog Groomers")]
    DogGroomer,

    #[serde(alias = "Aesthetic Practitioners")]
    AestheticPractitioner,

    #[serde(alias = "Sports Therapists")]
    SportsTherapist,

    #[serde(alias = "Physiotherapists")]
    Physiotherapist,

    #[serde(alias = "Chiropractors")]
    Chiropractor,

    #[serde(alias = "Semi-Permanent Makeup Artists")]
    SemiPermanentMakeup,
}

impl Specialty {
    pub const ALL: [Specialty; 10] = [
        Specialty::Beautician,
        Specialty::Hairdresser,
        Specialty::TattooArtist,
        Specialty::NailTechnician,
        Specialty::DogGroomer,
        Specialty::AestheticPractitioner,
        Specialty::SportsTherapist,
        Specialty::Physiotherapist,
        Specialty::Chiropractor,
        Specialty::SemiPermanentMakeup,
    ];

    /// Storage key, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Beautician => "beautician",
            Specialty::Hairdresser => "hairdresser",
            Specialty::TattooArtist => "tattoo_artist",
            Specialty::NailTechnician => "nail_technician",
            Specialty::DogGroomer => "dog_groomer",
            Specialty::AestheticPractitioner => "aesthetic_practitioner",
            Specialty::SportsTherapist => "sports_therapist",
            Specialty::Physiotherapist => "physiotherapist",
            Specialty::Chiropractor => "chiropractor",
            Specialty::SemiPermanentMakeup => "semi_permanent_makeup",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Specialty::Beautician => "Beautician",
            Specialty::Hairdresser => "Hairdresser",
            Specialty::TattooArtist => "Tattoo Artist",
            Specialty::NailTechnician => "Nail Technician",
            Specialty::DogGroomer => "Dog Groomer",
            Specialty::AestheticPractitioner => "Aesthetic Practitioner",
            Specialty::SportsTherapist => "Sports Therapist",
            Specialty::Physiotherapist => "Physiotherapist",
            Specialty::Chiropractor => "Chiropractor",
            Specialty::SemiPermanentMakeup => "Semi-Permanent Makeup Artist",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==============================================================================
// AVAILABILITY WINDOW
// ==============================================================================

/// Daily `[start, end)` time-of-day range. No date component: the same window
/// applies every day. Windows that wrap midnight cannot be constructed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawAvailabilityWindow")]
pub struct AvailabilityWindow {
    #[serde(rename = "availability_start")]
    start: NaiveTime,
    #[serde(rename = "availability_end")]
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawAvailabilityWindow {
    availability_start: NaiveTime,
    availability_end: NaiveTime,
}

impl TryFrom<RawAvailabilityWindow> for AvailabilityWindow {
    type Error = SpecialistError;

    fn try_from(raw: RawAvailabilityWindow) -> Result<Self, Self::Error> {
        AvailabilityWindow::new(raw.availability_start, raw.availability_end)
    }
}

impl AvailabilityWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SpecialistError> {
        if start >= end {
            return Err(SpecialistError::InvalidAvailabilityWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// The window anchored to a calendar date. Per-date overrides (holidays,
    /// one-off hours) would be resolved here.
    pub fn bounds_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.start), date.and_time(self.end))
    }

    pub fn length_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for AvailabilityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecialistRequest {
    pub user_id: Uuid,
    pub name: String,
    pub specialty: Specialty,
    pub email: String,
    pub phone_number: Option<String>,
    pub availability_start: NaiveTime,
    pub availability_end: NaiveTime,
    pub is_active: Option<bool>,
    pub session_price_pence: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSpecialistRequest {
    pub name: Option<String>,
    pub specialty: Option<Specialty>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub availability_start: Option<NaiveTime>,
    pub availability_end: Option<NaiveTime>,
    pub is_active: Option<bool>,
    pub session_price_pence: Option<i64>,
}

impl UpdateSpecialistRequest {
    pub fn changes_availability(&self) -> bool {
        self.availability_start.is_some() || self.availability_end.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecialistSearchFilters {
    pub specialty: Option<Specialty>,
    pub active_only: bool,
    /// Only specialists whose window covers this time of day.
    pub available_at: Option<NaiveTime>,
}

impl SpecialistSearchFilters {
    pub fn matches(&self, specialist: &Specialist) -> bool {
        if self.active_only && !specialist.is_active {
            return false;
        }
        if let Some(specialty) = self.specialty {
            if specialist.specialty != specialty {
                return false;
            }
        }
        if let Some(time) = self.available_at {
            let window = specialist.availability;
            if time < window.start() || time >= window.end() {
                return false;
            }
        }
        true
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecialistError {
    #[error("Specialist not found")]
    NotFound,

    #[error("Availability must start before it ends (got {start} to {end})")]
    InvalidAvailabilityWindow { start: NaiveTime, end: NaiveTime },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SpecialistError> for AppError {
    fn from(err: SpecialistError) -> Self {
        match err {
            SpecialistError::NotFound => AppError::NotFound("Specialist not found".to_string()),
            SpecialistError::InvalidAvailabilityWindow { .. } => {
                AppError::validation("availability_end", err.to_string())
            }
            SpecialistError::ValidationError(msg) => AppError::ValidationError { field: None, message: msg },
            SpecialistError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
