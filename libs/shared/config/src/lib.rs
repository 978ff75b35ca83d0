use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SLOT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BOOKING_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub slot_request_timeout_secs: u64,
    pub submission_timeout_secs: u64,
    pub booking_window_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_token: None,
            slot_request_timeout_secs: DEFAULT_SLOT_REQUEST_TIMEOUT_SECS,
            submission_timeout_secs: DEFAULT_SUBMISSION_TIMEOUT_SECS,
            booking_window_days: DEFAULT_BOOKING_WINDOW_DAYS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("PET_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PET_API_BASE_URL not set, using empty value");
                    String::new()
                }),
            api_token: env::var("PET_API_TOKEN").ok().filter(|t| !t.is_empty()),
            slot_request_timeout_secs: parse_or_default(
                "SLOT_REQUEST_TIMEOUT_SECS",
                DEFAULT_SLOT_REQUEST_TIMEOUT_SECS,
            ),
            submission_timeout_secs: parse_or_default(
                "SUBMISSION_TIMEOUT_SECS",
                DEFAULT_SUBMISSION_TIMEOUT_SECS,
            ),
            booking_window_days: parse_or_default(
                "BOOKING_WINDOW_DAYS",
                DEFAULT_BOOKING_WINDOW_DAYS,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty() && self.booking_window_days > 0
    }

    pub fn slot_request_timeout(&self) -> Duration {
        Duration::from_secs(self.slot_request_timeout_secs)
    }

    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.booking_window_days, 14);
        assert_eq!(config.slot_request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_configured_with_base_url() {
        let config = AppConfig {
            api_base_url: "http://localhost:8080".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }

    #[test]
    fn test_zero_window_is_not_configured() {
        let config = AppConfig {
            api_base_url: "http://localhost:8080".to_string(),
            booking_window_days: 0,
            ..AppConfig::default()
        };
        assert!(!config.is_configured());
    }
}
