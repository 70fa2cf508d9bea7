// libs/appointment-cell/src/store.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::{return_representation, SupabaseClient};

use crate::error::AppointmentError;
use crate::models::{Appointment, AppointmentStatus};

/// Which existing appointments count as the roster of a specialist's day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterFilter {
    /// Skip this appointment, typically the one being amended.
    pub exclude_id: Option<Uuid>,
    pub include_cancelled: bool,
}

impl RosterFilter {
    /// Appointments that still occupy their slot.
    pub fn active() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { exclude_id: None, include_cancelled: true }
    }

    pub fn excluding(self, appointment_id: Option<Uuid>) -> Self {
        Self { exclude_id: appointment_id, ..self }
    }

    pub fn admits(&self, appointment: &Appointment) -> bool {
        if self.exclude_id == Some(appointment.id) {
            return false;
        }
        self.include_cancelled || appointment.is_active()
    }
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// A specialist's appointments on one date, ordered by start time.
    async fn appointments_for(
        &self,
        specialist_id: Uuid,
        date: NaiveDate,
        filter: RosterFilter,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    /// Replaces the stored row only if its status and `updated_at` still match
    /// `seen`. Returns `None` when the row is gone or has been written since.
    async fn update_if_unchanged(
        &self,
        appointment: Appointment,
        seen: &Appointment,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Ordered by date, then start time.
    async fn list_for_specialist(&self, specialist_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError>;

    /// Ordered by date, then start time.
    async fn list_for_client(&self, user_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError>;

    /// Removes every appointment with the specialist. Returns how many went.
    async fn delete_for_specialist(&self, specialist_id: Uuid) -> Result<usize, AppointmentError>;
}

fn sort_chronologically(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        (a.date, a.start_time, a.id).cmp(&(b.date, b.start_time, b.id))
    });
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, filter: RosterFilter, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|appointment| predicate(appointment) && filter.admits(appointment))
            .cloned()
            .collect();
        sort_chronologically(&mut matching);
        matching
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn appointments_for(
        &self,
        specialist_id: Uuid,
        date: NaiveDate,
        filter: RosterFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(filter, |a| a.specialist_id == specialist_id && a.date == date).await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(AppointmentError::DatabaseError(format!(
                "Appointment {} already exists", appointment.id
            )));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_if_unchanged(
        &self,
        appointment: Appointment,
        seen: &Appointment,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(&appointment.id) {
            Some(existing) if existing.status == seen.status && existing.updated_at == seen.updated_at => {
                *existing = appointment.clone();
                Ok(Some(appointment))
            }
            _ => Ok(None),
        }
    }

    async fn list_for_specialist(&self, specialist_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(filter, |a| a.specialist_id == specialist_id).await)
    }

    async fn list_for_client(&self, user_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.collect(filter, |a| a.user_id == user_id).await)
    }

    async fn delete_for_specialist(&self, specialist_id: Uuid) -> Result<usize, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let before = appointments.len();
        appointments.retain(|_, appointment| appointment.specialist_id != specialist_id);
        Ok(before - appointments.len())
    }
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: impl Into<String>) -> Self {
        Self {
            supabase,
            auth_token: auth_token.into(),
        }
    }

    async fn fetch(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self.supabase.request_with_headers(
            method,
            path,
            Some(&self.auth_token),
            body,
            Some(return_representation()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    /// Query string for a filtered, chronologically ordered listing.
    fn listing_path(condition: String, filter: RosterFilter) -> String {
        let mut query_parts = vec![condition];
        if let Some(exclude_id) = filter.exclude_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }
        if !filter.include_cancelled {
            query_parts.push(format!("status=neq.{}", AppointmentStatus::Cancelled));
        }
        query_parts.push("order=date.asc,start_time.asc".to_string());
        format!("/rest/v1/appointments?{}", query_parts.join("&"))
    }

    async fn list(&self, path: String, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Listing appointments with {}", path);
        let mut appointments = self.fetch(Method::GET, &path, None).await?;
        // Older rows spell the cancelled status differently and slip past the query filter.
        appointments.retain(|appointment| filter.admits(appointment));
        sort_chronologically(&mut appointments);
        Ok(appointments)
    }

    fn to_row(appointment: &Appointment) -> Result<Value, AppointmentError> {
        serde_json::to_value(appointment)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to serialize appointment: {}", e)))
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn appointments_for(
        &self,
        specialist_id: Uuid,
        date: NaiveDate,
        filter: RosterFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let condition = format!("specialist_id=eq.{}&date=eq.{}", specialist_id, date.format("%Y-%m-%d"));
        self.list(Self::listing_path(condition, filter), filter).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        Ok(self.fetch(Method::GET, &path, None).await?.into_iter().next())
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let row = Self::to_row(&appointment)?;
        self.fetch(Method::POST, "/rest/v1/appointments", Some(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))
    }

    async fn update_if_unchanged(
        &self,
        appointment: Appointment,
        seen: &Appointment,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=in.({})&updated_at=eq.{}",
            appointment.id,
            seen.status.stored_spellings().join(","),
            seen.updated_at.format("%Y-%m-%dT%H:%M:%S%.fZ")
        );
        let row = Self::to_row(&appointment)?;
        Ok(self.fetch(Method::PATCH, &path, Some(row)).await?.into_iter().next())
    }

    async fn list_for_specialist(&self, specialist_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let condition = format!("specialist_id=eq.{}", specialist_id);
        self.list(Self::listing_path(condition, filter), filter).await
    }

    async fn list_for_client(&self, user_id: Uuid, filter: RosterFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let condition = format!("user_id=eq.{}", user_id);
        self.list(Self::listing_path(condition, filter), filter).await
    }

    async fn delete_for_specialist(&self, specialist_id: Uuid) -> Result<usize, AppointmentError> {
        let path = format!("/rest/v1/appointments?specialist_id=eq.{}", specialist_id);
        Ok(self.fetch(Method::DELETE, &path, None).await?.len())
    }
}
