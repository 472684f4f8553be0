//! Integration tests for the tender-server API
//!
//! Each test runs against a scratch database under a TempDir root, with
//! the default templates written so report generation works end to end.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tender_common::config::DataPaths;
use tender_common::db;
use tender_server::{build_router, AppState};
use tower::util::ServiceExt; // for `oneshot`

async fn setup() -> (Router, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let paths = DataPaths::new(dir.path().to_path_buf());
    paths.ensure_directories().expect("create data dirs");
    tender_server::reports::ensure_default_templates(&paths.templates_dir())
        .expect("write default templates");

    let pool = db::init_database(&paths.database_path())
        .await
        .expect("init scratch database");

    let state = AppState::new(pool, paths, Duration::from_secs(60), 25);
    (build_router(state), dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON body")
}

/// A date safely inside the validator's reasonableness window
fn sample_date() -> chrono::NaiveDate {
    chrono::Local::now().date_naive() - chrono::Duration::days(7)
}

fn sample_tender() -> Value {
    json!({
        "nit_number": "27/2024-25",
        "work_name": "Construction of approach road to bridge at km 14",
        "estimated_cost": 100000.0,
        "earnest_money": 2000.0,
        "time_of_completion_months": 6,
        "ee_name": "R. Sharma",
        "tender_date": sample_date().format("%d-%m-%Y").to_string()
    })
}

async fn create_sample_tender(app: &Router) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/tenders", sample_tender()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response.into_body()).await;
    body["tender"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _dir) = setup().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tender-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn tender_create_normalizes_date_and_lists() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/tenders/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["tender"]["nit_number"], "27/2024-25");
    assert_eq!(body["tender"]["status"], "draft");
    // Input was DD-MM-YYYY; stored form is ISO
    assert_eq!(
        body["tender"]["tender_date"],
        sample_date().format("%Y-%m-%d").to_string()
    );

    let response = app.oneshot(get("/api/tenders")).await.unwrap();
    let body = body_json(response.into_body()).await;
    assert_eq!(body["tenders"].as_array().unwrap().len(), 1);
    assert_eq!(body["tenders"][0]["bid_count"], 0);
}

#[tokio::test]
async fn invalid_tender_is_rejected_without_persisting() {
    let (app, _dir) = setup().await;

    let mut bad = sample_tender();
    bad["nit_number"] = json!("not a nit");
    bad["work_name"] = json!("short");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/tenders", bad))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response.into_body()).await;
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|e| e.as_str().unwrap().contains("NIT Number")));
    assert!(details.iter().any(|e| e.as_str().unwrap().contains("Work Name")));

    let response = app.oneshot(get("/api/tenders")).await.unwrap();
    let body = body_json(response.into_body()).await;
    assert!(body["tenders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_tender_returns_not_found() {
    let (app, _dir) = setup().await;
    let response = app.oneshot(get("/api/tenders/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_transitions_follow_the_chain() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;
    let uri = format!("/api/tenders/{}/status", id);

    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({"status": "open"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["tender"]["status"], "open");

    // Skipping closed -> awarded directly from open is illegal
    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({"status": "awarded"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Re-asserting the current status is a no-op
    let response = app
        .oneshot(json_request("POST", &uri, json!({"status": "open"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bids_are_ranked_lowest_first() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let bids = json!({
        "bids": [
            {"bidder_name": "Alpha Builders", "amount": 105000.0},
            {"bidder_name": "Beta Constructions", "amount": 95000.0},
            {"bidder_name": "Gamma Infra", "amount": 110000.0}
        ]
    });
    let response = app
        .clone()
        .oneshot(json_request("PUT", &format!("/api/tenders/{}/bids", id), bids))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    let ranked = body["bids"].as_array().unwrap();
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0]["bidder_name"], "Beta Constructions");
    assert_eq!(ranked[0]["rank"], 1);
    assert_eq!(ranked[0]["is_lowest"], true);
    assert_eq!(ranked[0]["percent_display"], "5.00 BELOW");
    assert_eq!(ranked[1]["bidder_name"], "Alpha Builders");
    assert_eq!(ranked[1]["rank"], 2);
    assert_eq!(ranked[2]["bidder_name"], "Gamma Infra");
    assert_eq!(ranked[2]["rank"], 3);
}

#[tokio::test]
async fn duplicate_bidders_are_rejected() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let bids = json!({
        "bids": [
            {"bidder_name": "Alpha Builders", "percentage": 5.0},
            {"bidder_name": "alpha builders", "percentage": -2.0}
        ]
    });
    let response = app
        .oneshot(json_request("PUT", &format!("/api/tenders/{}/bids", id), bids))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response.into_body()).await;
    let details = body["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|e| e.as_str().unwrap().contains("Duplicate bidder names")));
}

#[tokio::test]
async fn comparison_reports_savings_and_recommendation() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let bids = json!({
        "bids": [
            {"bidder_name": "Alpha Builders", "amount": 105000.0},
            {"bidder_name": "Beta Constructions", "amount": 95000.0},
            {"bidder_name": "Gamma Infra", "amount": 110000.0}
        ]
    });
    app.clone()
        .oneshot(json_request("PUT", &format!("/api/tenders/{}/bids", id), bids))
        .await
        .unwrap();

    let response = app
        .oneshot(get(&format!("/api/tenders/{}/comparison", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    assert_eq!(body["analysis"]["lowest_bid"], 95000.0);
    assert_eq!(body["analysis"]["total_bidders"], 3);
    assert_eq!(body["analysis"]["is_saving"], true);
    assert_eq!(body["analysis"]["competition_level"], "High");
    assert!(body["recommendation"]
        .as_str()
        .unwrap()
        .contains("Beta Constructions"));
}

#[tokio::test]
async fn comparison_without_bids_is_rejected() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let response = app
        .oneshot(get(&format!("/api/tenders/{}/comparison", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bidder_directory_round_trip() {
    let (app, _dir) = setup().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/bidders",
            json!({"name": "Sharma Constructions", "contact": "9876543210", "rating": 4}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response.into_body()).await;
    let id = body["bidder"]["id"].as_i64().unwrap();

    let response = app.clone().oneshot(get("/api/bidders/recent")).await.unwrap();
    let body = body_json(response.into_body()).await;
    assert_eq!(body["bidders"][0]["name"], "Sharma Constructions");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/bidders/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/api/bidders")).await.unwrap();
    let body = body_json(response.into_body()).await;
    assert!(body["bidders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn bidder_rating_out_of_range_is_rejected() {
    let (app, _dir) = setup().await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/bidders",
            json!({"name": "Sharma Constructions", "rating": 9}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_renders_tex_with_no_unresolved_placeholders() {
    let (app, dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let bids = json!({
        "bids": [
            {"bidder_name": "Alpha Builders", "amount": 105000.0},
            {"bidder_name": "Beta Constructions", "amount": 95000.0}
        ]
    });
    app.clone()
        .oneshot(json_request("PUT", &format!("/api/tenders/{}/bids", id), bids))
        .await
        .unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/tenders/{}/reports", id),
            json!({"document": "comparative_statement"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response.into_body()).await;
    let path = body["report"]["path"].as_str().unwrap();
    assert!(path.starts_with(dir.path().to_str().unwrap()));

    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("27/2024-25"));
    assert!(content.contains("Beta Constructions"));
    assert!(content.contains("5.00 BELOW"));
    assert!(!content.contains("{{"), "unresolved placeholders in output");
}

#[tokio::test]
async fn report_for_unknown_document_type_is_rejected() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/tenders/{}/reports", id),
            json!({"document": "award_certificate"}),
        ))
        .await
        .unwrap();
    // Unknown enum variant fails JSON deserialization
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_rejects_unsupported_file_type() {
    let (app, _dir) = setup().await;

    let boundary = "test-boundary";
    let body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\ncontent-type: text/plain\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_are_cached_between_calls() {
    let (app, _dir) = setup().await;

    let response = app.clone().oneshot(get("/api/stats")).await.unwrap();
    let body = body_json(response.into_body()).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["stats"]["total_unique_bidders"], 0);

    let response = app.oneshot(get("/api/stats")).await.unwrap();
    let body = body_json(response.into_body()).await;
    assert_eq!(body["cached"], true);
}

#[tokio::test]
async fn storing_bids_updates_bidder_profiles() {
    let (app, _dir) = setup().await;
    let id = create_sample_tender(&app).await;

    let bids = json!({
        "bids": [
            {"bidder_name": "Alpha Builders", "percentage": 5.0, "contact": "9876543210"}
        ]
    });
    app.clone()
        .oneshot(json_request("PUT", &format!("/api/tenders/{}/bids", id), bids))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/bidders")).await.unwrap();
    let body = body_json(response.into_body()).await;
    let bidders = body["bidders"].as_array().unwrap();
    assert_eq!(bidders.len(), 1);
    assert_eq!(bidders[0]["name"], "Alpha Builders");
    assert_eq!(bidders[0]["usage_count"], 1);
}
