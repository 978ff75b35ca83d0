use chrono::NaiveDate;
use serde_json::json;

use shared_config::AppConfig;

pub const TEST_API_TOKEN: &str = "test-api-token";

pub struct TestConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub booking_window_days: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            api_token: Some(TEST_API_TOKEN.to_string()),
            booking_window_days: 14,
        }
    }
}

impl TestConfig {
    /// Config pointing at a wiremock server.
    pub fn for_mock_server(uri: &str) -> Self {
        Self {
            api_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            api_token: self.api_token.clone(),
            slot_request_timeout_secs: 2,
            submission_timeout_secs: 2,
            booking_window_days: self.booking_window_days,
        }
    }
}

/// Fixed calendar anchor so window arithmetic in tests does not depend on the
/// wall clock.
pub struct TestDates;

impl TestDates {
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 19).expect("valid date")
    }

    pub fn day(offset: i64) -> NaiveDate {
        Self::today() + chrono::Duration::days(offset)
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn slot(time: &str, available: bool) -> serde_json::Value {
        json!({
            "time": time,
            "available": available
        })
    }

    pub fn vet_slot(time: &str, vet_id: &str, vet_name: &str) -> serde_json::Value {
        json!({
            "time": time,
            "available": true,
            "veterinarianId": vet_id,
            "veterinarianName": vet_name
        })
    }

    pub fn availability_response() -> serde_json::Value {
        json!([
            Self::vet_slot("10:00", "v1", "Dr. Kim"),
            Self::vet_slot("09:00", "v1", "Dr. Kim"),
            Self::slot("11:30", false),
            Self::vet_slot("14:00", "v3", "Dr. Park")
        ])
    }

    pub fn booking_response(booking_id: &str) -> serde_json::Value {
        json!({
            "bookingId": booking_id
        })
    }

    pub fn pet_response(pet_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": pet_id,
            "name": name,
            "species": "dog",
            "breed": "Shiba Inu"
        })
    }

    pub fn hospital_response(hospital_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": hospital_id,
            "name": name,
            "address": "12 Harbor Road",
            "phone": "02-555-0100"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
