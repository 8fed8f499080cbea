//! HTTP API tests, driven through the router without binding a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sc_screen::web::server::{api_routes, AppState};
use sc_screen::ScreeningConfig;

fn app() -> Router {
    let config = ScreeningConfig::load_embedded().unwrap();
    api_routes(Arc::new(AppState::new(config).unwrap()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn eligible() -> Value {
    json!({
        "gse": "GSE123456",
        "organism": "Homo sapiens",
        "gse_title": "RNA-seq of brain tissue",
        "disease": "normal",
        "library_strategy": "10x scRNA-seq"
    })
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_config_describes_vocabulary() {
    let (status, body) = get(app(), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "sc-eqtl-default");
    assert_eq!(body["fingerprint"].as_str().unwrap().len(), 32);
    assert_eq!(body["max_request_records"], 10_000);
    assert!(body["weights"].is_object());
}

#[tokio::test]
async fn test_screen_batch() {
    let request = json!({
        "records": [
            eligible(),
            {"gse": "GSE2", "organism": "Homo sapiens", "gse_title": "HeLa cells RNA-seq"}
        ]
    });
    let (status, body) = post_json(app(), "/api/screen", &request).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["mandatory_passed"], true);
    assert_eq!(results[0]["record_id"], "GSE123456");
    assert_eq!(results[1]["mandatory_passed"], false);
    assert_eq!(results[1]["grade"], "E");

    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["summary"]["retained"], 1);
}

#[tokio::test]
async fn test_screen_full_audit_evaluates_every_criterion() {
    let request = json!({
        "records": [{"accession": "SRX999"}],
        "full_audit": true
    });
    let (status, body) = post_json(app(), "/api/screen", &request).await;
    assert_eq!(status, StatusCode::OK);

    let result = &body["results"][0];
    assert_eq!(result["mode"], "full_audit");
    assert_eq!(result["reasons"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_screen_empty_batch() {
    let (status, body) = post_json(app(), "/api/screen", &json!({"records": []})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total"], 0);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_profile_table() {
    let request = json!({
        "table": "geo_series",
        "columns": [
            {"name": "organism_ch1", "samples": ["Homo sapiens"]},
            {"name": "misc", "samples": ["a", "b"]}
        ]
    });
    let (status, body) = post_json(app(), "/api/profile", &request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table"], "geo_series");
    assert_eq!(body["ranking"], json!(["organism_ch1"]));
    assert_eq!(body["profiles"][0]["category"], "species");
    assert_eq!(body["profiles"][1]["category"], "other");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = get(app(), "/api/nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
