use std::sync::Once;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use shared_config::{AppConfig, NotificationConfig, SchedulingConfig};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. Honours `RUST_LOG`, defaults to `warn`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: String,
    pub scheduling: SchedulingConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_token: "test-service-token".to_string(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

impl TestConfig {
    /// Point the config at a mock server.
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_token: self.supabase_service_token.clone(),
            scheduling: self.scheduling.clone(),
            notifications: NotificationConfig {
                sender_address: "bookings@studio.test".to_string(),
                enabled: true,
            },
        }
    }
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Rows shaped the way PostgREST returns them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn specialist_response(
        specialist_id: Uuid,
        user_id: Uuid,
        availability_start: &str,
        availability_end: &str,
    ) -> serde_json::Value {
        json!({
            "id": specialist_id,
            "user_id": user_id,
            "name": "Sam Taylor",
            "specialty": "tattoo_artist",
            "email": "sam@studio.test",
            "phone_number": "07700900123",
            "availability_start": availability_start,
            "availability_end": availability_end,
            "is_active": true,
            "session_price_pence": 5000,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        appointment_id: Uuid,
        user_id: Uuid,
        specialist_id: Uuid,
        date: &str,
        start_time: &str,
        duration_minutes: u32,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "user_id": user_id,
            "specialist_id": specialist_id,
            "date": date,
            "start_time": start_time,
            "duration_minutes": duration_minutes,
            "status": status,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn profile_response(user_id: Uuid, specialty: Option<&str>) -> serde_json::Value {
        json!({
            "user_id": user_id,
            "specialty": specialty,
            "phone_number": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let app_config = TestConfig::default().to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(app_config.is_configured());
    }

    #[test]
    fn test_mock_appointment_row_shape() {
        let row = MockSupabaseResponses::appointment_response(
            Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), "2025-06-20", "10:00:00", 60, "PENDING",
        );
        assert_eq!(row["duration_minutes"], 60);
        assert_eq!(row["status"], "PENDING");
    }
}
