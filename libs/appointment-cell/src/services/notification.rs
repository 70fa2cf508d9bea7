// libs/appointment-cell/src/services/notification.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::NotificationConfig;
use specialist_cell::Specialist;

use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    AmendedByClient,
    AmendedBySpecialist,
    Cancelled,
}

impl NoticeKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NoticeKind::AmendedByClient => "An Appointment Has Been Amended by Your Client",
            NoticeKind::AmendedBySpecialist => "Your Appointment Time Has Been Amended",
            NoticeKind::Cancelled => "Your Appointment Has Been Cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeRecipient {
    pub user_id: Uuid,
    /// Known for specialists. Clients are resolved by whoever delivers the notice.
    pub email: Option<String>,
}

/// A message about an appointment change, addressed to the party who did not make it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentNotice {
    pub kind: NoticeKind,
    pub recipient: NoticeRecipient,
    pub appointment: Appointment,
    pub specialist_name: String,
}

impl AppointmentNotice {
    /// When the client moved the booking the specialist hears about it, otherwise the client does.
    pub fn amended(appointment: &Appointment, specialist: &Specialist, acting_user_id: Uuid) -> Self {
        let (kind, recipient) = if acting_user_id == appointment.user_id {
            (
                NoticeKind::AmendedByClient,
                NoticeRecipient { user_id: specialist.user_id, email: Some(specialist.email.clone()) },
            )
        } else {
            (
                NoticeKind::AmendedBySpecialist,
                NoticeRecipient { user_id: appointment.user_id, email: None },
            )
        };

        Self {
            kind,
            recipient,
            appointment: appointment.clone(),
            specialist_name: specialist.name.clone(),
        }
    }

    pub fn cancelled(appointment: &Appointment, specialist: &Specialist) -> Self {
        Self {
            kind: NoticeKind::Cancelled,
            recipient: NoticeRecipient { user_id: appointment.user_id, email: None },
            appointment: appointment.clone(),
            specialist_name: specialist.name.clone(),
        }
    }

    pub fn subject(&self) -> &'static str {
        self.kind.subject()
    }

    pub fn body(&self) -> String {
        match self.kind {
            NoticeKind::Cancelled => format!(
                "Your appointment with {} on {} at {} has been cancelled.",
                self.specialist_name,
                self.appointment.date.format("%Y-%m-%d"),
                self.appointment.start_time.format("%H:%M"),
            ),
            _ => format!(
                "The appointment with {} is now on {} at {} for {}.",
                self.specialist_name,
                self.appointment.date.format("%Y-%m-%d"),
                self.appointment.start_time.format("%H:%M"),
                self.appointment.duration,
            ),
        }
    }
}

/// Delivery of appointment notices. Failures never undo the change that caused them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &AppointmentNotice) -> anyhow::Result<()>;
}

/// Writes notices to the log instead of sending them anywhere.
pub struct LoggingNotifier {
    config: NotificationConfig,
}

impl LoggingNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notice: &AppointmentNotice) -> anyhow::Result<()> {
        if !self.config.enabled {
            debug!("Notifications disabled, dropping '{}' for {}", notice.subject(), notice.recipient.user_id);
            return Ok(());
        }

        info!(
            from = %self.config.sender_address,
            to = %notice.recipient.user_id,
            appointment_id = %notice.appointment.id,
            "{}: {}",
            notice.subject(),
            notice.body()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentSlot;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use specialist_cell::{AvailabilityWindow, Specialty};

    fn fixtures() -> (Appointment, Specialist) {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let specialist = Specialist {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Lee".to_string(),
            specialty: Specialty::DogGroomer,
            email: "lee@studio.test".to_string(),
            phone_number: None,
            availability: AvailabilityWindow::new(t(9), t(17)).unwrap(),
            is_active: true,
            session_price_pence: 5000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let slot = AppointmentSlot::new(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(), t(10), 45).unwrap();
        (Appointment::new_pending(Uuid::new_v4(), specialist.id, slot), specialist)
    }

    #[test]
    fn test_client_amendment_notifies_specialist() {
        let (appointment, specialist) = fixtures();
        let notice = AppointmentNotice::amended(&appointment, &specialist, appointment.user_id);
        assert_eq!(notice.kind, NoticeKind::AmendedByClient);
        assert_eq!(notice.recipient.user_id, specialist.user_id);
        assert_eq!(notice.recipient.email.as_deref(), Some("lee@studio.test"));
    }

    #[test]
    fn test_specialist_amendment_notifies_client() {
        let (appointment, specialist) = fixtures();
        let notice = AppointmentNotice::amended(&appointment, &specialist, specialist.user_id);
        assert_eq!(notice.kind, NoticeKind::AmendedBySpecialist);
        assert_eq!(notice.recipient.user_id, appointment.user_id);
        assert_eq!(notice.subject(), "Your Appointment Time Has Been Amended");
        assert!(notice.body().contains("45 mins"));
    }

    #[tokio::test]
    async fn test_logging_notifier_accepts_notices_when_disabled() {
        let (appointment, specialist) = fixtures();
        let notifier = LoggingNotifier::new(NotificationConfig { enabled: false, ..NotificationConfig::default() });
        assert!(notifier.notify(&AppointmentNotice::cancelled(&appointment, &specialist)).await.is_ok());
    }
}
