// libs/profile-cell/src/store.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::{merge_duplicates, SupabaseClient};

use crate::models::{ProfileChanges, ProfileError, ProfileUpsert, UserProfile};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserProfile>, ProfileError>;

    /// Apply `changes` to the user's profile, creating it first if needed.
    async fn upsert(&self, user_id: Uuid, changes: &ProfileChanges) -> Result<ProfileUpsert, ProfileError>;
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserProfile>, ProfileError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, changes: &ProfileChanges) -> Result<ProfileUpsert, ProfileError> {
        let mut profiles = self.profiles.write().await;
        let created = !profiles.contains_key(&user_id);
        let profile = profiles.entry(user_id).or_insert_with(|| UserProfile::empty(user_id));
        changes.apply_to(profile);

        Ok(ProfileUpsert { profile: profile.clone(), created })
    }
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

pub struct SupabaseProfileStore {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseProfileStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: impl Into<String>) -> Self {
        Self {
            supabase,
            auth_token: auth_token.into(),
        }
    }

    fn parse(result: Vec<Value>) -> Result<Option<UserProfile>, ProfileError> {
        result.into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ProfileError::DatabaseError(format!("Failed to parse user profile: {}", e)))
    }
}

#[async_trait]
impl ProfileStore for SupabaseProfileStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserProfile>, ProfileError> {
        debug!("Fetching profile for user {}", user_id);
        let path = format!("/rest/v1/user_profiles?user_id=eq.{}", user_id);

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(&self.auth_token),
            None,
        ).await.map_err(|e| ProfileError::DatabaseError(e.to_string()))?;

        Self::parse(result)
    }

    async fn upsert(&self, user_id: Uuid, changes: &ProfileChanges) -> Result<ProfileUpsert, ProfileError> {
        let existing = self.get(user_id).await?;
        let created = existing.is_none();
        let mut profile = existing.unwrap_or_else(|| UserProfile::empty(user_id));
        changes.apply_to(&mut profile);

        let row = serde_json::to_value(&profile)
            .map_err(|e| ProfileError::DatabaseError(format!("Failed to serialize user profile: {}", e)))?;

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/user_profiles?on_conflict=user_id",
            Some(&self.auth_token),
            Some(row),
            Some(merge_duplicates()),
        ).await.map_err(|e| ProfileError::DatabaseError(e.to_string()))?;

        let profile = Self::parse(result)?
            .ok_or_else(|| ProfileError::DatabaseError("Failed to save user profile".to_string()))?;
        Ok(ProfileUpsert { profile, created })
    }
}
