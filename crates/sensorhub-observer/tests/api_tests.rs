//! Integration tests for the observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, with an in-memory reading store standing in for
//! PostgreSQL.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use sensorhub_ingest::{BroadcastHub, ReadingStore, StoreError, clamp_limit};
use sensorhub_observer::build_router;
use sensorhub_observer::state::AppState;
use sensorhub_types::{Reading, ReadingId, StoredReading};
use serde_json::Value;
use tower::ServiceExt;

// =========================================================================
// In-memory store
// =========================================================================

#[derive(Default)]
struct MemoryStore {
    rows: Mutex<Vec<StoredReading>>,
    last_limit: AtomicUsize,
    unavailable: AtomicBool,
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn append(&self, reading: Reading) -> Result<StoredReading, StoreError> {
        let stored = StoredReading::new(ReadingId::new(), reading);
        self.rows.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredReading>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(String::from("backend down")));
        }
        let limit = clamp_limit(limit);
        self.last_limit.store(limit, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        let start = rows.len().saturating_sub(limit);
        Ok(rows[start..].to_vec())
    }
}

fn stored(temperature: f64, second: u32) -> StoredReading {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap();
    StoredReading::new(
        ReadingId::new(),
        Reading {
            temperature: Some(temperature),
            humidity: Some(40.0),
            observed_at: at,
            topic: String::from("home/sensor1/data"),
            received_at: at,
            raw_fallback: None,
        },
    )
}

fn make_state(readings: Vec<StoredReading>) -> (Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    *store.rows.lock().unwrap() = readings;
    let state = Arc::new(AppState::new(
        BroadcastHub::new(),
        Arc::clone(&store) as Arc<dyn ReadingStore>,
    ));
    (state, store)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (state, _) = make_state(Vec::new());
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn index_returns_html_status_page() {
    let (state, _) = make_state(Vec::new());
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("sensorhub"));
    assert!(html.contains("/api/readings"));
}

#[tokio::test]
async fn readings_are_returned_oldest_first() {
    let (state, _) = make_state(vec![stored(1.0, 1), stored(2.0, 2), stored(3.0, 3)]);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/readings").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let temps: Vec<f64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["temperature"].as_f64().unwrap())
        .collect();
    assert_eq!(temps, vec![1.0, 2.0, 3.0]);

    // Wire format is camelCase.
    assert!(json[0].get("receivedAt").is_some());
    assert!(json[0].get("id").is_some());
}

#[tokio::test]
async fn missing_limit_defaults_to_fifty() {
    let (state, store) = make_state(vec![stored(1.0, 1)]);
    let router = build_router(state);

    let _ = router
        .oneshot(Request::get("/api/readings").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(store.last_limit.load(Ordering::SeqCst), 50);
}

#[tokio::test]
async fn oversized_limit_is_clamped() {
    let (state, store) = make_state(Vec::new());
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/readings?limit=5000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.last_limit.load(Ordering::SeqCst), 1000);
}

#[tokio::test]
async fn limit_constrains_result_size() {
    let (state, _) = make_state(vec![stored(1.0, 1), stored(2.0, 2), stored(3.0, 3)]);
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/readings?limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    let temps: Vec<f64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["temperature"].as_f64().unwrap())
        .collect();
    // The two most recent, still oldest first.
    assert_eq!(temps, vec![2.0, 3.0]);
}

#[tokio::test]
async fn non_numeric_limit_is_a_bad_request() {
    let (state, _) = make_state(Vec::new());
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/readings?limit=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_outage_is_a_retryable_503() {
    let (state, store) = make_state(Vec::new());
    store.unavailable.store(true, Ordering::SeqCst);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/readings").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 503);
    assert!(json["error"].as_str().unwrap().contains("backend down"));
}

#[tokio::test]
async fn raw_fallback_readings_are_served_verbatim() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
    let degraded = StoredReading::new(
        ReadingId::new(),
        Reading {
            temperature: None,
            humidity: None,
            observed_at: at,
            topic: String::from("home/sensor1/data"),
            received_at: at,
            raw_fallback: Some(String::from("not-json")),
        },
    );
    let (state, _) = make_state(vec![degraded]);
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/readings").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json[0]["rawFallback"], "not-json");
    assert!(json[0]["temperature"].is_null());
}
