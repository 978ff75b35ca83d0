// libs/availability-cell/src/services/source.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use shared_api::ApiClient;
use shared_config::AppConfig;
use shared_models::{ApiError, HospitalId};

use crate::models::TimeSlot;

/// Upstream provider of a hospital's slots for one date.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotSource: Send + Sync {
    async fn fetch_slots(
        &self,
        hospital_id: &HospitalId,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, ApiError>;
}

/// Hospitals answer either with a bare list or with `{ "slots": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AvailabilityPayload {
    List(Vec<TimeSlot>),
    Wrapped { slots: Vec<TimeSlot> },
}

pub struct HttpSlotSource {
    client: ApiClient,
    timeout: Duration,
}

impl HttpSlotSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::new(config),
            timeout: config.slot_request_timeout(),
        }
    }
}

#[async_trait]
impl SlotSource for HttpSlotSource {
    async fn fetch_slots(
        &self,
        hospital_id: &HospitalId,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, ApiError> {
        let path = format!(
            "/hospitals/{}/availability?date={}",
            urlencoding::encode(hospital_id.as_str()),
            date.format("%Y-%m-%d")
        );
        debug!("Fetching availability for hospital {} on {}", hospital_id, date);

        let payload: AvailabilityPayload = self
            .client
            .request(Method::GET, &path, None, self.timeout)
            .await?;

        let slots = match payload {
            AvailabilityPayload::List(slots) => slots,
            AvailabilityPayload::Wrapped { slots } => slots,
        };

        debug!("Hospital {} returned {} slots for {}", hospital_id, slots.len(), date);
        Ok(slots)
    }
}
