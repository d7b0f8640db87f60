#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use fleet_tco::api::{AppState, router};
use fleet_tco::model::ScenarioType;
use fleet_tco::{TcoEngine, calculate_tco};
use tower::util::ServiceExt;

fn json_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn api_result_matches_library_result() {
    let input = common::texas(ScenarioType::SelfManagedEv);
    let expected = calculate_tco(&input).unwrap();

    let app = router(Arc::new(AppState::new(TcoEngine::default())));
    let resp = app
        .oneshot(json_request("/tco", serde_json::to_string(&input).unwrap()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let net = json["total_net_tco"].as_f64().unwrap();
    assert!((net - expected.total_net_tco).abs() < 1e-3);
    assert_eq!(json["evidence_strength"], "MEDIUM");
}

#[tokio::test]
async fn stress_suite_over_http() {
    let input = common::texas(ScenarioType::MobileCharging);
    let app = router(Arc::new(AppState::new(TcoEngine::default())));
    let resp = app
        .oneshot(json_request("/stress", serde_json::to_string(&input).unwrap()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"].as_array().map(Vec::len), Some(6));
    assert!(json["risk_level"].is_string());
}
