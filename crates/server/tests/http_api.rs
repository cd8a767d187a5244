//! Integration tests for the HTTP routes, driven through `oneshot`.

mod common;

use axum::http::StatusCode;
use cardio_core::reading::{Reading, VitalType};
use cardio_server::build_router;
use common::{body_json, get, test_state};

// ---------------------------------------------------------------------------
// Test: GET /health reports counts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_counts() {
    let state = test_state();
    state.store.append(Reading::new(2, VitalType::HeartRate, 70.0, 1));
    let _sub = state.hub.subscribe().await;

    let response = get(build_router(state), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["patients"], 1);
    assert_eq!(json["subscribers"], 1);
}

// ---------------------------------------------------------------------------
// Test: patient list and range queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn patients_are_listed_sorted() {
    let state = test_state();
    for id in [3, 1, 2] {
        state.store.append(Reading::new(id, VitalType::Ecg, 0.1, 10));
    }

    let json = body_json(get(build_router(state), "/api/v1/patients").await).await;
    assert_eq!(json, serde_json::json!([1, 2, 3]));
}

#[tokio::test]
async fn readings_range_is_inclusive() {
    let state = test_state();
    for ts in [100, 200, 300, 400] {
        state
            .store
            .append(Reading::new(1, VitalType::Saturation, 97.0, ts));
    }

    let response = get(build_router(state), "/api/v1/patients/1/readings?start=200&end=300").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let timestamps: Vec<i64> = json
        .as_array()
        .expect("array body")
        .iter()
        .map(|r| r["timestamp"].as_i64().expect("timestamp"))
        .collect();
    assert_eq!(timestamps, vec![200, 300]);
    assert_eq!(json[0]["type"], "Saturation");
}

#[tokio::test]
async fn readings_default_to_the_full_range() {
    let state = test_state();
    state.store.append(Reading::new(1, VitalType::HeartRate, 60.0, 5));
    state
        .store
        .append(Reading::new(1, VitalType::HeartRate, 61.0, i64::MAX));

    let json = body_json(get(build_router(state), "/api/v1/patients/1/readings").await).await;
    assert_eq!(json.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn unknown_patient_readings_are_empty() {
    let response = get(build_router(test_state()), "/api/v1/patients/99/readings").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn inverted_range_is_a_bad_request() {
    let response = get(
        build_router(test_state()),
        "/api/v1/patients/1/readings?start=10&end=5",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: injected-alert registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alert_snapshot_lists_every_registered_patient() {
    let state = test_state();
    state.registry.mark_triggered(2, 500).expect("registered");

    let json = body_json(get(build_router(state), "/api/v1/alerts").await).await;
    let states = json.as_array().expect("array body");
    assert_eq!(states.len(), 3);
    assert_eq!(states[1]["patient_id"], 2);
    assert_eq!(states[1]["active"], true);
    assert_eq!(states[1]["updated"], true);
    assert_eq!(states[0]["active"], false);
}

#[tokio::test]
async fn unknown_patient_alert_is_not_found() {
    let response = get(build_router(test_state()), "/api/v1/alerts/42").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Patient 42 not found");
}

// ---------------------------------------------------------------------------
// Test: unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(build_router(test_state()), "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
