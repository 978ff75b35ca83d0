// libs/booking-cell/src/services/gateway.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::{ApiError, HospitalId, HospitalSummary, PetId, PetSummary};

use crate::models::{BookingConfirmation, BookingPayload};

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Remote booking creation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingGateway: Send + Sync {
    async fn create_booking(
        &self,
        payload: &BookingPayload,
        idempotency_key: Uuid,
    ) -> Result<BookingConfirmation, ApiError>;
}

/// Read-only pet and hospital lookups used for display.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn pet(&self, pet_id: &PetId) -> Result<PetSummary, ApiError>;

    async fn hospital(&self, hospital_id: &HospitalId) -> Result<HospitalSummary, ApiError>;
}

pub struct HttpBookingGateway {
    client: ApiClient,
    timeout: Duration,
}

impl HttpBookingGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::new(config),
            timeout: config.submission_timeout(),
        }
    }
}

#[async_trait]
impl BookingGateway for HttpBookingGateway {
    async fn create_booking(
        &self,
        payload: &BookingPayload,
        idempotency_key: Uuid,
    ) -> Result<BookingConfirmation, ApiError> {
        let body = serde_json::to_value(payload)?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&idempotency_key.to_string())
            .map_err(|e| ApiError::NotConfigured(format!("invalid idempotency key: {}", e)))?;
        headers.insert(IDEMPOTENCY_KEY_HEADER, key);

        debug!("Posting booking for pet {} at hospital {}", payload.pet_id, payload.hospital_id);

        self.client
            .request_with_headers(Method::POST, "/bookings", Some(body), Some(headers), self.timeout)
            .await
    }
}

pub struct HttpDirectory {
    client: ApiClient,
    timeout: Duration,
}

impl HttpDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::new(config),
            timeout: config.slot_request_timeout(),
        }
    }
}

#[async_trait]
impl DirectorySource for HttpDirectory {
    async fn pet(&self, pet_id: &PetId) -> Result<PetSummary, ApiError> {
        let path = format!("/pets/{}", urlencoding::encode(pet_id.as_str()));
        self.client.request(Method::GET, &path, None, self.timeout).await
    }

    async fn hospital(&self, hospital_id: &HospitalId) -> Result<HospitalSummary, ApiError> {
        let path = format!("/hospitals/{}", urlencoding::encode(hospital_id.as_str()));
        self.client.request(Method::GET, &path, None, self.timeout).await
    }
}
