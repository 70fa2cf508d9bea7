// libs/specialist-cell/src/services/specialist.rs
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    AvailabilityWindow, CreateSpecialistRequest, Specialist, SpecialistError,
    SpecialistSearchFilters, UpdateSpecialistRequest, DEFAULT_SESSION_PRICE_PENCE,
};
use crate::store::SpecialistStore;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const MIN_PHONE_LENGTH: usize = 11;
const MAX_PHONE_LENGTH: usize = 15;
const MAX_NAME_LENGTH: usize = 100;

pub struct SpecialistService {
    store: Arc<dyn SpecialistStore>,
    email_pattern: Option<Regex>,
}

impl SpecialistService {
    pub fn new(store: Arc<dyn SpecialistStore>) -> Self {
        Self {
            store,
            email_pattern: Regex::new(EMAIL_PATTERN).ok(),
        }
    }

    /// Register a specialist. The availability window must start before it ends.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_specialist(&self, request: CreateSpecialistRequest) -> Result<Specialist, SpecialistError> {
        let availability = AvailabilityWindow::new(request.availability_start, request.availability_end)?;
        self.validate_name(&request.name)?;
        self.validate_email(&request.email)?;
        self.validate_phone(request.phone_number.as_deref())?;

        let session_price_pence = request.session_price_pence.unwrap_or(DEFAULT_SESSION_PRICE_PENCE);
        self.validate_price(session_price_pence)?;

        let now = Utc::now();
        let specialist = Specialist {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            name: request.name.trim().to_string(),
            specialty: request.specialty,
            email: request.email.trim().to_string(),
            phone_number: request.phone_number.map(|phone| phone.trim().to_string()),
            availability,
            is_active: request.is_active.unwrap_or(true),
            session_price_pence,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert(specialist).await?;
        info!("Specialist {} created ({}, available {})", created.id, created.specialty, created.availability);
        Ok(created)
    }

    pub async fn get_specialist(&self, specialist_id: Uuid) -> Result<Specialist, SpecialistError> {
        debug!("Fetching specialist {}", specialist_id);
        self.store.get(specialist_id).await?.ok_or(SpecialistError::NotFound)
    }

    pub async fn list_specialists(&self, filters: &SpecialistSearchFilters) -> Result<Vec<Specialist>, SpecialistError> {
        self.store.list(filters).await
    }

    /// Apply a partial update. A changed window is validated against whichever
    /// bound is not being changed.
    #[instrument(skip(self, request))]
    pub async fn update_specialist(
        &self,
        specialist_id: Uuid,
        request: UpdateSpecialistRequest,
    ) -> Result<Specialist, SpecialistError> {
        let mut specialist = self.get_specialist(specialist_id).await?;

        if request.changes_availability() {
            let start = request.availability_start.unwrap_or(specialist.availability.start());
            let end = request.availability_end.unwrap_or(specialist.availability.end());
            specialist.availability = AvailabilityWindow::new(start, end)?;
            // Existing bookings outside the new window are left alone; only new
            // bookings and amendments are checked against it.
            warn!("Availability of specialist {} changed to {}", specialist_id, specialist.availability);
        }

        if let Some(name) = request.name {
            self.validate_name(&name)?;
            specialist.name = name.trim().to_string();
        }
        if let Some(specialty) = request.specialty {
            specialist.specialty = specialty;
        }
        if let Some(email) = request.email {
            self.validate_email(&email)?;
            specialist.email = email.trim().to_string();
        }
        if let Some(phone) = request.phone_number {
            self.validate_phone(Some(&phone))?;
            specialist.phone_number = Some(phone.trim().to_string());
        }
        if let Some(is_active) = request.is_active {
            specialist.is_active = is_active;
        }
        if let Some(price) = request.session_price_pence {
            self.validate_price(price)?;
            specialist.session_price_pence = price;
        }

        specialist.updated_at = Utc::now();
        self.store.update(specialist).await
    }

    pub async fn set_active(&self, specialist_id: Uuid, is_active: bool) -> Result<Specialist, SpecialistError> {
        info!("Setting specialist {} active={}", specialist_id, is_active);
        self.update_specialist(
            specialist_id,
            UpdateSpecialistRequest { is_active: Some(is_active), ..Default::default() },
        ).await
    }

    // ==============================================================================
    // VALIDATION HELPERS
    // ==============================================================================

    fn validate_name(&self, name: &str) -> Result<(), SpecialistError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SpecialistError::ValidationError("Name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(SpecialistError::ValidationError(format!(
                "Name cannot be longer than {} characters", MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), SpecialistError> {
        let email = email.trim();
        let valid = match &self.email_pattern {
            Some(pattern) => pattern.is_match(email),
            None => email.contains('@'),
        };
        if !valid || email.len() > 254 {
            return Err(SpecialistError::ValidationError(format!("Invalid email address: {}", email)));
        }
        Ok(())
    }

    fn validate_phone(&self, phone: Option<&str>) -> Result<(), SpecialistError> {
        let Some(phone) = phone.map(str::trim).filter(|phone| !phone.is_empty()) else {
            return Ok(());
        };
        if phone.len() < MIN_PHONE_LENGTH {
            return Err(SpecialistError::ValidationError(format!(
                "Phone number must be at least {} characters long", MIN_PHONE_LENGTH
            )));
        }
        if phone.len() > MAX_PHONE_LENGTH {
            return Err(SpecialistError::ValidationError(format!(
                "Phone number cannot be longer than {} characters", MAX_PHONE_LENGTH
            )));
        }
        Ok(())
    }

    fn validate_price(&self, price_pence: i64) -> Result<(), SpecialistError> {
        if price_pence < 0 {
            return Err(SpecialistError::ValidationError("Session price cannot be negative".to_string()));
        }
        Ok(())
    }
}
