use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_LOCK_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_ALLOWED_DURATIONS: [u32; 5] = [30, 45, 60, 120, 180];
const DEFAULT_NOTIFICATION_SENDER: &str = "bookings@localhost";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: String,
    pub scheduling: SchedulingConfig,
    pub notifications: NotificationConfig,
}

/// Knobs for the booking workflows. The scheduling checks themselves take no configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulingConfig {
    pub lock_timeout_seconds: u64,
    /// Durations a client may pick, in minutes. Empty accepts any positive duration.
    pub allowed_duration_minutes: Vec<u32>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_seconds: DEFAULT_LOCK_TIMEOUT_SECONDS,
            allowed_duration_minutes: DEFAULT_ALLOWED_DURATIONS.to_vec(),
        }
    }
}

impl SchedulingConfig {
    pub fn is_duration_allowed(&self, minutes: u32) -> bool {
        self.allowed_duration_minutes.is_empty() || self.allowed_duration_minutes.contains(&minutes)
    }
}

/// Handed explicitly to whichever notifier needs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    pub sender_address: String,
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sender_address: DEFAULT_NOTIFICATION_SENDER.to_string(),
            enabled: true,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_token: env::var("SUPABASE_SERVICE_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_TOKEN not set, using empty value");
                    String::new()
                }),
            scheduling: SchedulingConfig {
                lock_timeout_seconds: env::var("SCHEDULING_LOCK_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|raw| match raw.trim().parse::<u64>() {
                        Ok(seconds) => Some(seconds),
                        Err(_) => {
                            warn!("SCHEDULING_LOCK_TIMEOUT_SECONDS is not a number: {}", raw);
                            None
                        }
                    })
                    .unwrap_or(DEFAULT_LOCK_TIMEOUT_SECONDS),
                allowed_duration_minutes: env::var("SCHEDULING_ALLOWED_DURATIONS")
                    .map(|raw| parse_duration_list(&raw))
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_DURATIONS.to_vec()),
            },
            notifications: NotificationConfig {
                sender_address: env::var("NOTIFICATION_SENDER")
                    .unwrap_or_else(|_| {
                        warn!("NOTIFICATION_SENDER not set, using default");
                        DEFAULT_NOTIFICATION_SENDER.to_string()
                    }),
                enabled: env::var("NOTIFICATIONS_ENABLED")
                    .map(|raw| !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                    .unwrap_or(true),
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }
}

/// Parses "30, 45,60" into minutes, skipping anything that is not a positive integer.
/// Falls back to the defaults when nothing in a non-blank value parses.
pub fn parse_duration_list(raw: &str) -> Vec<u32> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).filter(|part| !part.is_empty()).collect();
    let durations: Vec<u32> = parts
        .iter()
        .filter_map(|part| match part.parse::<u32>() {
            Ok(0) | Err(_) => {
                warn!("Ignoring invalid duration in SCHEDULING_ALLOWED_DURATIONS: {}", part);
                None
            }
            Ok(minutes) => Some(minutes),
        })
        .collect();

    // An empty list admits any duration; only a blank value may produce one.
    if durations.is_empty() && !parts.is_empty() {
        warn!(
            "SCHEDULING_ALLOWED_DURATIONS has no valid entries, using defaults {:?}",
            DEFAULT_ALLOWED_DURATIONS
        );
        return DEFAULT_ALLOWED_DURATIONS.to_vec();
    }
    durations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_list() {
        assert_eq!(parse_duration_list("30, 45,60"), vec![30, 45, 60]);
        assert_eq!(parse_duration_list("30,abc,0,90"), vec![30, 90]);
        assert!(parse_duration_list("").is_empty());
    }

    #[test]
    fn test_all_invalid_durations_fall_back_to_defaults() {
        assert_eq!(parse_duration_list("abc"), DEFAULT_ALLOWED_DURATIONS.to_vec());
        assert_eq!(parse_duration_list("0, x ,-5"), DEFAULT_ALLOWED_DURATIONS.to_vec());
        assert!(parse_duration_list(" , ").is_empty());
    }

    #[test]
    fn test_default_scheduling_config_matches_booking_choices() {
        let config = SchedulingConfig::default();
        assert!(config.is_duration_allowed(60));
        assert!(config.is_duration_allowed(180));
        assert!(!config.is_duration_allowed(50));
    }

    #[test]
    fn test_empty_allowed_list_accepts_any_duration() {
        let config = SchedulingConfig {
            allowed_duration_minutes: vec![],
            ..SchedulingConfig::default()
        };
        assert!(config.is_duration_allowed(1));
        assert!(config.is_duration_allowed(500));
    }
}
