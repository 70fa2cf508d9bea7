use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{Specialist, SpecialistError, SpecialistSearchFilters};

#[async_trait]
pub trait SpecialistStore: Send + Sync {
    async fn insert(&self, specialist: Specialist) -> Result<Specialist, SpecialistError>;

    async fn get(&self, id: Uuid) -> Result<Option<Specialist>, SpecialistError>;

    /// Specialists matching the filters, ordered by name.
    async fn list(&self, filters: &SpecialistSearchFilters) -> Result<Vec<Specialist>, SpecialistError>;

    /// Replaces the stored row. Fails with `NotFound` if it does not exist.
    async fn update(&self, specialist: Specialist) -> Result<Specialist, SpecialistError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, SpecialistError>;
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

#[derive(Default)]
pub struct InMemorySpecialistStore {
    specialists: RwLock<HashMap<Uuid, Specialist>>,
}

impl InMemorySpecialistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpecialistStore for InMemorySpecialistStore {
    async fn insert(&self, specialist: Specialist) -> Result<Specialist, SpecialistError> {
        let mut specialists = self.specialists.write().await;
        if specialists.contains_key(&specialist.id) {
            return Err(SpecialistError::DatabaseError(format!(
                "Specialist {} already exists", specialist.id
            )));
        }
        specialists.insert(specialist.id, specialist.clone());
        Ok(specialist)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Specialist>, SpecialistError> {
        Ok(self.specialists.read().await.get(&id).cloned())
    }

    async fn list(&self, filters: &SpecialistSearchFilters) -> Result<Vec<Specialist>, SpecialistError> {
        let specialists = self.specialists.read().await;
        let mut matching: Vec<Specialist> = specialists
            .values()
            .filter(|specialist| filters.matches(specialist))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn update(&self, specialist: Specialist) -> Result<Specialist, SpecialistError> {
        let mut specialists = self.specialists.write().await;
        match specialists.get_mut(&specialist.id) {
            Some(existing) => {
                *existing = specialist.clone();
                Ok(specialist)
            }
            None => Err(SpecialistError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SpecialistError> {
        Ok(self.specialists.write().await.remove(&id).is_some())
    }
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

pub struct SupabaseSpecialistStore {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseSpecialistStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: impl Into<String>) -> Self {
        Self {
            supabase,
            auth_token: auth_token.into(),
        }
    }

    async fn fetch(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Specialist>, SpecialistError> {
        let result: Vec<Value> = self.supabase.request_with_headers(
            method,
            path,
            Some(&self.auth_token),
            body,
            Some(return_representation()),
        ).await.map_err(|e| SpecialistError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Specialist>, _>>()
            .map_err(|e| SpecialistError::DatabaseError(format!("Failed to parse specialists: {}", e)))
    }

    fn to_row(specialist: &Specialist) -> Result<Value, SpecialistError> {
        serde_json::to_value(specialist)
            .map_err(|e| SpecialistError::DatabaseError(format!("Failed to serialize specialist: {}", e)))
    }
}

#[async_trait]
impl SpecialistStore for SupabaseSpecialistStore {
    async fn insert(&self, specialist: Specialist) -> Result<Specialist, SpecialistError> {
        let row = Self::to_row(&specialist)?;
        self.fetch(Method::POST, "/rest/v1/specialists", Some(row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SpecialistError::DatabaseError("Failed to create specialist".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Specialist>, SpecialistError> {
        let path = format!("/rest/v1/specialists?id=eq.{}", id);
        Ok(self.fetch(Method::GET, &path, None).await?.into_iter().next())
    }

    async fn list(&self, filters: &SpecialistSearchFilters) -> Result<Vec<Specialist>, SpecialistError> {
        let mut query_parts = Vec::new();

        if let Some(specialty) = filters.specialty {
            query_parts.push(format!("specialty=eq.{}", specialty.as_str()));
        }
        if filters.active_only {
            query_parts.push("is_active=eq.true".to_string());
        }
        if let Some(time) = filters.available_at {
            let time = time.format("%H:%M:%S");
            query_parts.push(format!("availability_start=lte.{}", time));
            query_parts.push(format!("availability_end=gt.{}", time));
        }
        query_parts.push("order=name.asc".to_string());

        let path = format!("/rest/v1/specialists?{}", query_parts.join("&"));
        debug!("Listing specialists with {}", path);

        let mut specialists = self.fetch(Method::GET, &path, None).await?;
        specialists.retain(|specialist| filters.matches(specialist));
        Ok(specialists)
    }

    async fn update(&self, specialist: Specialist) -> Result<Specialist, SpecialistError> {
        let path = format!("/rest/v1/specialists?id=eq.{}", specialist.id);
        let row = Self::to_row(&specialist)?;
        self.fetch(Method::PATCH, &path, Some(row))
            .await?
            .into_iter()
            .next()
            .ok_or(SpecialistError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, SpecialistError> {
        let path = format!("/rest/v1/specialists?id=eq.{}", id);
        Ok(!self.fetch(Method::DELETE, &path, None).await?.is_empty())
    }
}
