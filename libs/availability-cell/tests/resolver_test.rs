use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::NaiveTime;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::{
    BookingWindow, DegradedCause, HttpSlotSource, SlotQuerySequencer, SlotResolution,
    SlotResolver, SlotSource,
};
use shared_models::{HospitalId, VeterinarianId};
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestDates};

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn resolver_for(mock_server: &MockServer) -> SlotResolver {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    let source: Arc<dyn SlotSource> = Arc::new(HttpSlotSource::new(&config));
    SlotResolver::new(source, BookingWindow::new(TestDates::today(), 14))
}

#[tokio::test]
async fn test_resolve_live_slots_sorted_and_deduplicated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .and(query_param("date", "2026-01-20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::vet_slot("10:00", "v1", "Dr. Kim"),
            MockApiResponses::vet_slot("09:00", "v1", "Dr. Kim"),
            MockApiResponses::slot("10:00", false),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(1), None)
        .await
        .unwrap();

    assert_matches!(resolution, SlotResolution::Live(_));
    let slots = resolution.slots();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].time, t(9, 0));
    assert_eq!(slots[1].time, t(10, 0));
    // Last duplicate wins.
    assert!(!slots[1].available);
    assert!(!resolution.offers(t(10, 0)));
    assert!(resolution.offers(t(9, 0)));
}

#[tokio::test]
async fn test_resolve_filters_by_veterinarian() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockApiResponses::availability_response()),
        )
        .mount(&mock_server)
        .await;

    let vet = VeterinarianId::from("v3");
    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(1), Some(&vet))
        .await
        .unwrap();

    assert!(!resolution.is_degraded());
    assert_eq!(resolution.slots().len(), 1);
    assert_eq!(resolution.slots()[0].veterinarian_name.as_deref(), Some("Dr. Park"));
}

#[tokio::test]
async fn test_resolve_unknown_veterinarian_yields_empty_live_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockApiResponses::availability_response()),
        )
        .mount(&mock_server)
        .await;

    let vet = VeterinarianId::from("v2");
    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(1), Some(&vet))
        .await
        .unwrap();

    // A genuine "no slots" outcome, not a degraded one.
    assert_matches!(resolution, SlotResolution::Live(ref slots) if slots.is_empty());
}

#[tokio::test]
async fn test_resolve_accepts_wrapped_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "slots": [MockApiResponses::slot("16:30", true)]
        })))
        .mount(&mock_server)
        .await;

    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(2), None)
        .await
        .unwrap();

    assert_eq!(resolution.slots().len(), 1);
    assert_eq!(resolution.slots()[0].time, t(16, 30));
}

#[tokio::test]
async fn test_resolve_empty_upstream_is_degraded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(1), None)
        .await
        .unwrap();

    assert_matches!(resolution.degraded_cause(), Some(DegradedCause::EmptyUpstream));
    assert!(resolution.offers(t(9, 0)));
}

#[tokio::test]
async fn test_resolve_server_error_is_degraded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(MockApiResponses::error_response("maintenance", "UNAVAILABLE")),
        )
        .mount(&mock_server)
        .await;

    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(1), None)
        .await
        .unwrap();

    assert_matches!(
        resolution.degraded_cause(),
        Some(DegradedCause::Unreachable(reason)) if reason.contains("maintenance")
    );
    let times: Vec<_> = resolution.slots().iter().map(|s| s.time).collect();
    assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn test_resolve_timeout_is_degraded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("h1"), TestDates::day(1), None)
        .await
        .unwrap();

    assert_matches!(resolution.degraded_cause(), Some(DegradedCause::Unreachable(_)));
}

#[tokio::test]
async fn test_hospital_id_is_path_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/seoul%20central/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::slot("11:00", true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolution = resolver_for(&mock_server)
        .resolve(&HospitalId::from("seoul central"), TestDates::day(3), None)
        .await
        .unwrap();

    assert!(!resolution.is_degraded());
}

#[tokio::test]
async fn test_superseded_query_still_resolves_but_is_not_current() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .and(query_param("date", "2026-01-20"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockApiResponses::slot("09:00", true)]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hospitals/h1/availability"))
        .and(query_param("date", "2026-01-21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::slot("15:00", true)
        ])))
        .mount(&mock_server)
        .await;

    let resolver = resolver_for(&mock_server);
    let mut sequencer = SlotQuerySequencer::new();
    let first = sequencer.issue(HospitalId::from("h1"), TestDates::day(1), None);
    let second = sequencer.issue(HospitalId::from("h1"), TestDates::day(2), None);

    let (first_result, second_result) = futures::join!(
        resolver.resolve_query(&first),
        resolver.resolve_query(&second)
    );

    assert!(first_result.is_ok() && second_result.is_ok());
    assert!(!sequencer.is_current(first.sequence));
    assert!(sequencer.is_current(second.sequence));
    assert!(second_result.unwrap().offers(t(15, 0)));
}
