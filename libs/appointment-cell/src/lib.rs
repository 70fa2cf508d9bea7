pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{AppointmentError, SchedulingError, SchedulingRejection};
pub use models::{
    AmendAppointmentRequest, Appointment, AppointmentDuration, AppointmentSlot, AppointmentStatus,
    BookAppointmentRequest, ConflictCheckResponse, PriceQuote, TimeInterval,
};
pub use services::availability::validate_within_availability;
pub use services::conflict::{find_conflicts, validate_no_overlap};
pub use services::{
    AppointmentBookingService, AppointmentNotice, ConflictDetectionService, LoggingNotifier,
    NoticeKind, Notifier, SchedulingGate, SchedulingLocks,
};
pub use store::{AppointmentStore, InMemoryAppointmentStore, RosterFilter, SupabaseAppointmentStore};
