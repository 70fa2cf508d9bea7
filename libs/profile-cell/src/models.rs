// libs/profile-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use specialist_cell::Specialty;

/// Per-account settings. Exactly one per user, created on first write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub specialty: Option<Specialty>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            specialty: None,
            phone_number: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to overwrite. `None` leaves the stored value alone; an empty phone
/// number clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub specialty: Option<Specialty>,
    pub phone_number: Option<String>,
}

impl ProfileChanges {
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(specialty) = self.specialty {
            profile.specialty = Some(specialty);
        }
        if let Some(phone) = &self.phone_number {
            let phone = phone.trim();
            profile.phone_number = (!phone.is_empty()).then(|| phone.to_string());
        }
        profile.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpsert {
    pub profile: UserProfile,
    /// True when this call created the profile.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::ValidationError(msg) => AppError::validation("phone_number", msg),
            ProfileError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
