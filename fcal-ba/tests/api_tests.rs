//! HTTP API integration tests
//!
//! Drive the router directly with tower's oneshot; no listener is bound.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fcal_ba::{build_router, AppState};
use helpers::{harness, ScriptedOracle, TestHarness};
use tower::ServiceExt;

async fn app(h: &TestHarness) -> axum::Router {
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    let state = AppState::new(h.db.clone(), h.event_bus.clone(), scheduler);
    build_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_module_and_status() {
    let h = harness().await;
    let app = app(&h).await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "fcal-ba");
    assert_eq!(json["scheduler_running"], false);
}

/// The progress surface is safe before any pass has ever run and returns
/// the idle defaults.
#[tokio::test]
async fn progress_returns_idle_defaults_before_any_pass() {
    let h = harness().await;
    let app = app(&h).await;

    let response = app
        .oneshot(
            Request::get("/automation/progress")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "idle");
    assert_eq!(json["message"], "Ready for processing");
    assert_eq!(json["current_row"], 0);
    assert_eq!(json["total_rows"], 0);
    assert_eq!(json["progress_percent"], 0.0);
}

/// Manual trigger with a parameter body runs a forced pass and echoes the
/// applied parameters.
#[tokio::test]
async fn trigger_runs_forced_pass_with_params() {
    let h = harness().await;
    h.queue_file("api.csv", "from,to\nJFK,LAX\n");
    let app = app(&h).await;

    let response = app
        .oneshot(
            Request::post("/automation/trigger")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"batch_params":{"passengers":3,"cabin_class":"business","round_trip":true}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["batch_params"]["passengers"], 3);
    assert_eq!(json["batch_params"]["cabin_class"], "business");
    assert_eq!(json["result"]["status"], "completed");
    assert_eq!(json["result"]["files"].as_array().unwrap().len(), 1);

    // File was routed out of the pending directory
    assert!(helpers::csv_names(&h.dirs.scheduled).is_empty());
}

/// Trigger with no body falls back to the default parameters.
#[tokio::test]
async fn trigger_without_body_uses_defaults() {
    let h = harness().await;
    let app = app(&h).await;

    let response = app
        .oneshot(
            Request::post("/automation/trigger")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["batch_params"]["passengers"], 1);
    assert_eq!(json["batch_params"]["cabin_class"], "economy");
    assert_eq!(json["batch_params"]["round_trip"], false);
}

#[tokio::test]
async fn queue_lists_pending_files() {
    let h = harness().await;
    h.queue_file("waiting.csv", "from,to\nJFK,LAX\n");
    let app = app(&h).await;

    let response = app
        .oneshot(
            Request::get("/automation/queue")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["files"][0]["filename"], "waiting.csv");
    assert!(json["files"][0]["size_kb"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn cache_clear_roundtrip() {
    let h = harness().await;
    let app = app(&h).await;

    let response = app
        .clone()
        .oneshot(
            Request::get("/automation/cache")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["cache_size"], 0);

    let response = app
        .oneshot(
            Request::post("/automation/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["cleared"], 0);
}

#[tokio::test]
async fn results_lists_persisted_calculations() {
    let h = harness().await;
    h.queue_file("rows.csv", "from,to\nJFK,LAX\nLHR,CDG\n");
    let scheduler = h.scheduler(ScriptedOracle::succeeding());
    scheduler.process_pending_files(false).await;

    let state = AppState::new(h.db.clone(), h.event_bus.clone(), scheduler);
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::get("/automation/results?limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0]["flight_info"]
        .as_str()
        .unwrap()
        .contains("\u{2022} Economy"));
}
