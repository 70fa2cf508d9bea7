pub mod models;
pub mod services;
pub mod store;

pub use models::{
    AvailabilityWindow, CreateSpecialistRequest, Specialist, SpecialistError,
    SpecialistSearchFilters, Specialty, UpdateSpecialistRequest,
};
pub use services::SpecialistService;
pub use store::{InMemorySpecialistStore, SpecialistStore, SupabaseSpecialistStore};
