use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveTime;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::{
    BookingConfirmation, BookingGateway, BookingPayload, BookingRequestBuilder,
    HttpBookingGateway, ServiceType, SubmissionError, WizardSelection,
};
use shared_models::{ApiError, BookingId, HospitalId, PetId};
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestDates, TEST_API_TOKEN};

/// Gateway that answers after a short delay and counts calls.
struct SlowGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl BookingGateway for SlowGateway {
    async fn create_booking(
        &self,
        _payload: &BookingPayload,
        _idempotency_key: Uuid,
    ) -> Result<BookingConfirmation, ApiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(BookingConfirmation {
            booking_id: BookingId::from(format!("b-{}", call)),
        })
    }
}

fn payload() -> BookingPayload {
    let selection = WizardSelection {
        pet_id: Some(PetId::from("p1")),
        service_type: Some(ServiceType::General),
        date: Some(TestDates::day(1)),
        time: NaiveTime::from_hms_opt(9, 0, 0),
        symptoms: "coughing at night".to_string(),
        ..WizardSelection::default()
    };
    BookingRequestBuilder::build(&HospitalId::from("h1"), &selection).unwrap()
}

#[tokio::test]
async fn test_concurrent_submit_reaches_gateway_once() {
    let gateway = Arc::new(SlowGateway {
        calls: AtomicUsize::new(0),
    });
    let builder = BookingRequestBuilder::new(gateway.clone(), Uuid::new_v4());
    let payload = payload();

    let (first, second) = futures::join!(builder.submit(&payload), builder.submit(&payload));

    assert_eq!(first.unwrap(), BookingId::from("b-1"));
    assert_matches!(second, Err(SubmissionError::AlreadyInFlight));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

    // The flag is released once the first call completes.
    assert_eq!(builder.submit(&payload).await.unwrap(), BookingId::from("b-2"));
}

#[tokio::test]
async fn test_http_gateway_posts_payload_with_idempotency_key() {
    let mock_server = MockServer::start().await;
    let key = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .and(header("idempotency-key", key.to_string().as_str()))
        .and(header("authorization", format!("Bearer {}", TEST_API_TOKEN).as_str()))
        .and(body_json(json!({
            "hospitalId": "h1",
            "petId": "p1",
            "date": "2026-01-20",
            "time": "09:00",
            "serviceType": "general",
            "symptoms": "coughing at night"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockApiResponses::booking_response("b-77")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    let builder = BookingRequestBuilder::new(Arc::new(HttpBookingGateway::new(&config)), key);

    let booking_id = builder.submit(&payload()).await.unwrap();

    assert_eq!(booking_id.as_str(), "b-77");
}

#[tokio::test]
async fn test_http_gateway_maps_rejection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bookings"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(MockApiResponses::error_response("Slot already taken", "SLOT_TAKEN")),
        )
        .mount(&mock_server)
        .await;

    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    let builder = BookingRequestBuilder::new(Arc::new(HttpBookingGateway::new(&config)), Uuid::new_v4());

    let result = builder.submit(&payload()).await;

    assert_matches!(
        result,
        Err(SubmissionError::Rejected { status: 409, message }) if message == "Slot already taken"
    );
    assert!(!builder.is_in_flight());
}
