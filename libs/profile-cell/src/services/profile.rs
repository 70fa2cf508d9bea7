// libs/profile-cell/src/services/profile.rs
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{ProfileChanges, ProfileError, ProfileUpsert, UserProfile};
use crate::store::ProfileStore;

const MIN_PHONE_LENGTH: usize = 11;

pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// `None` until the user first saves their profile.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, ProfileError> {
        debug!("Fetching profile for user {}", user_id);
        self.store.get(user_id).await
    }

    pub async fn upsert_profile(&self, user_id: Uuid, changes: ProfileChanges) -> Result<ProfileUpsert, ProfileError> {
        if let Some(phone) = changes.phone_number.as_deref().map(str::trim) {
            if !phone.is_empty() && phone.len() < MIN_PHONE_LENGTH {
                return Err(ProfileError::ValidationError(format!(
                    "Phone number must be at least {} characters long", MIN_PHONE_LENGTH
                )));
            }
        }

        let upsert = self.store.upsert(user_id, &changes).await?;
        if upsert.created {
            info!("Created profile for user {}", user_id);
        }
        Ok(upsert)
    }
}
