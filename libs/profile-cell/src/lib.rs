pub mod models;
pub mod services;
pub mod store;

pub use models::{ProfileChanges, ProfileError, ProfileUpsert, UserProfile};
pub use services::ProfileService;
pub use store::{InMemoryProfileStore, ProfileStore, SupabaseProfileStore};
