pub mod availability;
pub mod booking;
pub mod conflict;
pub mod consistency;
pub mod gate;
pub mod lifecycle;
pub mod notification;
pub mod pricing;

pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetectionService;
pub use consistency::SchedulingLocks;
pub use gate::SchedulingGate;
pub use lifecycle::AppointmentLifecycleService;
pub use notification::{AppointmentNotice, LoggingNotifier, NoticeKind, NoticeRecipient, Notifier};
pub use pricing::PricingService;
