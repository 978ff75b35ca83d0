// libs/booking-cell/src/services/submission.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::{BookingId, HospitalId};

use crate::error::{SubmissionError, ValidationError, ValidationIssue};
use crate::models::{BookingPayload, StepId, WizardSelection};
use crate::services::gateway::BookingGateway;

/// Builds the booking payload and sends it, never more than one at a time.
pub struct BookingRequestBuilder {
    gateway: Arc<dyn BookingGateway>,
    idempotency_key: Uuid,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the submission ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BookingRequestBuilder {
    pub fn new(gateway: Arc<dyn BookingGateway>, idempotency_key: Uuid) -> Self {
        Self {
            gateway,
            idempotency_key,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn idempotency_key(&self) -> Uuid {
        self.idempotency_key
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Assembles the wire payload. Every required field must be present;
    /// blank symptoms are left out.
    pub fn build(
        hospital_id: &HospitalId,
        selection: &WizardSelection,
    ) -> Result<BookingPayload, ValidationError> {
        let mut issues = Vec::new();
        if selection.pet_id.is_none() {
            issues.push(ValidationIssue::PetNotSelected);
        }
        if selection.service_type.is_none() {
            issues.push(ValidationIssue::ServiceNotSelected);
        }
        if selection.date.is_none() {
            issues.push(ValidationIssue::DateNotSelected);
        }
        if selection.time.is_none() {
            issues.push(ValidationIssue::TimeNotSelected);
        }

        match (
            &selection.pet_id,
            selection.service_type,
            selection.date,
            selection.time,
        ) {
            (Some(pet_id), Some(service_type), Some(date), Some(time)) => {
                let symptoms = selection.symptoms.trim();
                Ok(BookingPayload {
                    hospital_id: hospital_id.clone(),
                    pet_id: pet_id.clone(),
                    date,
                    time,
                    service_type,
                    veterinarian_id: selection.veterinarian_id.clone(),
                    symptoms: (!symptoms.is_empty()).then(|| symptoms.to_string()),
                    notes: selection.notes.clone(),
                })
            }
            _ => Err(ValidationError::new(StepId::Confirm, issues)),
        }
    }

    /// Sends the booking. A call made while another is still running is
    /// refused without touching the network.
    pub async fn submit(&self, payload: &BookingPayload) -> Result<BookingId, SubmissionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Booking submission refused: another submission is in flight");
            return Err(SubmissionError::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        debug!(
            "Creating booking at hospital {} for {} {} (key {})",
            payload.hospital_id,
            payload.date,
            payload.time.format("%H:%M"),
            self.idempotency_key
        );

        let confirmation = self
            .gateway
            .create_booking(payload, self.idempotency_key)
            .await?;

        if confirmation.booking_id.as_str().is_empty() {
            return Err(SubmissionError::InvalidResponse("empty booking id".to_string()));
        }

        info!("Booking confirmed with id {}", confirmation.booking_id);
        Ok(confirmation.booking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingConfirmation, ServiceType};
    use crate::services::gateway::MockBookingGateway;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use shared_models::{ApiError, PetId};

    fn selection() -> WizardSelection {
        WizardSelection {
            pet_id: Some(PetId::from("p1")),
            service_type: Some(ServiceType::Vaccination),
            date: NaiveDate::from_ymd_opt(2026, 1, 20),
            time: NaiveTime::from_hms_opt(10, 0, 0),
            symptoms: "   ".to_string(),
            notes: Some("second dose".to_string()),
            ..WizardSelection::default()
        }
    }

    fn payload() -> BookingPayload {
        BookingRequestBuilder::build(&HospitalId::from("h1"), &selection()).unwrap()
    }

    #[test]
    fn test_build_omits_blank_symptoms() {
        let payload = payload();
        assert_eq!(payload.symptoms, None);
        assert_eq!(payload.notes.as_deref(), Some("second dose"));
        assert_eq!(payload.service_type, ServiceType::Vaccination);
    }

    #[test]
    fn test_build_reports_missing_fields() {
        let mut incomplete = selection();
        incomplete.time = None;
        incomplete.pet_id = None;

        let err = BookingRequestBuilder::build(&HospitalId::from("h1"), &incomplete).unwrap_err();
        assert!(err.has(&ValidationIssue::TimeNotSelected));
        assert!(err.has(&ValidationIssue::PetNotSelected));
    }

    #[tokio::test]
    async fn test_submit_passes_idempotency_key() {
        let key = Uuid::new_v4();
        let mut gateway = MockBookingGateway::new();
        gateway
            .expect_create_booking()
            .withf(move |_, k| *k == key)
            .times(1)
            .returning(|_, _| {
                Ok(BookingConfirmation {
                    booking_id: BookingId::from("b-100"),
                })
            });

        let builder = BookingRequestBuilder::new(Arc::new(gateway), key);
        let booking_id = builder.submit(&payload()).await.unwrap();

        assert_eq!(booking_id.as_str(), "b-100");
        assert!(!builder.is_in_flight());
    }

    #[tokio::test]
    async fn test_submit_failure_releases_flag() {
        let mut gateway = MockBookingGateway::new();
        gateway
            .expect_create_booking()
            .times(1)
            .returning(|_, _| Err(ApiError::Status { status: 409, message: "taken".into() }));

        let builder = BookingRequestBuilder::new(Arc::new(gateway), Uuid::new_v4());
        let result = builder.submit(&payload()).await;

        assert_matches!(result, Err(SubmissionError::Rejected { status: 409, .. }));
        assert!(!builder.is_in_flight());
    }

    #[tokio::test]
    async fn test_empty_booking_id_is_invalid() {
        let mut gateway = MockBookingGateway::new();
        gateway.expect_create_booking().returning(|_, _| {
            Ok(BookingConfirmation {
                booking_id: BookingId::from(""),
            })
        });

        let builder = BookingRequestBuilder::new(Arc::new(gateway), Uuid::new_v4());
        assert_matches!(
            builder.submit(&payload()).await,
            Err(SubmissionError::InvalidResponse(_))
        );
    }

    /// Gateway whose call never completes.
    struct StalledGateway;

    #[async_trait::async_trait]
    impl BookingGateway for StalledGateway {
        async fn create_booking(
            &self,
            _payload: &BookingPayload,
            _idempotency_key: Uuid,
        ) -> Result<BookingConfirmation, ApiError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_second_submit_refused_while_first_pending() {
        let builder = BookingRequestBuilder::new(Arc::new(StalledGateway), Uuid::new_v4());
        let payload = payload();

        let mut first = tokio_test::task::spawn(builder.submit(&payload));
        tokio_test::assert_pending!(first.poll());
        assert!(builder.is_in_flight());

        assert_matches!(builder.submit(&payload).await, Err(SubmissionError::AlreadyInFlight));

        // Dropping the stalled call releases the flag.
        drop(first);
        assert!(!builder.is_in_flight());
    }
}
