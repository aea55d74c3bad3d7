//! API integration tests for geotag-server.
//!
//! These drive the full router against an in-memory Drive backend, covering
//! folder listing, thumbnail delivery and the JSON error contract.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use geotag_core::drive::{geotagged_file, untagged_file};
use geotag_core::{MockDrive, StaticCredentials};
use geotag_server::{create_router, create_router_with_config, AppState, Config};
use serde_json::Value;
use tower::ServiceExt;

/// Build the test router around a mock Drive, keeping a handle for call counts
fn create_test_app(drive: MockDrive) -> (Router, Arc<MockDrive>, AppState) {
    let drive = Arc::new(drive);
    let state = AppState::new(
        drive.clone(),
        Arc::new(StaticCredentials::default()),
        Config::default().thumbnail_cache_control(),
    );
    (create_router(state.clone()), drive, state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let (app, _, _) = create_test_app(MockDrive::new());

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "geotag-server");
    assert!(json["version"].is_string());
    assert_eq!(json["cached_links"], 0);
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok() {
    let (app, _, _) = create_test_app(MockDrive::new());

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ready"], true);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _, _) = create_test_app(MockDrive::new());

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert!(json["paths"]["/api/images"].is_object());
    assert!(json["paths"]["/api/thumbnail/{file_id}"].is_object());
}

// ============================================================================
// Folder Listing Tests
// ============================================================================

#[tokio::test]
async fn test_images_lists_geotagged_files_across_pages() {
    let drive = MockDrive::new().with_pages(vec![
        vec![
            geotagged_file("F1", 38.33, -108.98, Some(2010.5)),
            untagged_file("F2"),
        ],
        vec![geotagged_file("F3", 38.34, -108.97, None)],
    ]);
    let (app, drive, _) = create_test_app(drive);

    let response = app.oneshot(get("/api/images?folder_id=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["count"], 2);

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["id"], "F1");
    assert_eq!(images[0]["lat"], 38.33);
    assert_eq!(images[0]["lon"], -108.98);
    assert_eq!(images[0]["altitude"], 2010.5);
    assert_eq!(images[0]["thumbnailLink"], "https://thumbs.test/F1");
    assert_eq!(images[1]["id"], "F3");
    assert!(images[1]["altitude"].is_null());

    assert_eq!(drive.list_calls(), 2);
}

#[tokio::test]
async fn test_images_populates_thumbnail_cache() {
    let drive = MockDrive::new().with_pages(vec![vec![
        geotagged_file("F1", 1.0, 2.0, None),
        geotagged_file("F2", 3.0, 4.0, None),
    ]]);
    let (app, _, state) = create_test_app(drive);

    let response = app.oneshot(get("/api/images?folder_id=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(state.cache.len(), 2);
    assert_eq!(state.cache.get("F2").as_deref(), Some("https://thumbs.test/F2"));
}

#[tokio::test]
async fn test_images_empty_folder() {
    let (app, _, _) = create_test_app(MockDrive::new());

    let response = app.oneshot(get("/api/images?folder_id=empty")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["images"], serde_json::json!([]));
}

#[tokio::test]
async fn test_images_missing_folder_id_is_bad_request() {
    for uri in ["/api/images", "/api/images?folder_id=", "/api/images?folder_id=%20"] {
        let (app, drive, _) = create_test_app(MockDrive::new());

        let response = app.oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");

        let json = json_body(response).await;
        assert_eq!(json["code"], "INVALID_INPUT");
        assert_eq!(drive.list_calls(), 0);
    }
}

#[tokio::test]
async fn test_images_listing_failure_is_bad_gateway() {
    let (app, _, state) = create_test_app(MockDrive::new().with_listing_failure());

    let response = app.oneshot(get("/api/images?folder_id=abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["code"], "DRIVE_ERROR");
    assert_eq!(json["error"], "Drive request failed");
    assert!(state.cache.is_empty());
}

// ============================================================================
// Thumbnail Tests
// ============================================================================

#[tokio::test]
async fn test_thumbnail_after_listing_uses_cached_link() {
    let drive = MockDrive::new()
        .with_pages(vec![vec![geotagged_file("F1", 38.33, -108.98, None)]])
        .with_link_response(
            "https://thumbs.test/F1",
            StatusCode::OK,
            b"tiny-jpeg".to_vec(),
            Some("image/jpeg"),
        );
    let (app, drive, _) = create_test_app(drive);

    let response = app
        .clone()
        .oneshot(get("/api/images?folder_id=abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/thumbnail/F1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=3600"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"tiny-jpeg");
    assert_eq!(drive.metadata_calls(), 0);
    assert_eq!(drive.download_calls(), 0);
}

#[tokio::test]
async fn test_thumbnail_without_listing_looks_up_link() {
    let drive = MockDrive::new()
        .with_metadata_link("F7", "https://thumbs.test/F7")
        .with_link_response(
            "https://thumbs.test/F7",
            StatusCode::OK,
            b"png-bytes".to_vec(),
            Some("image/png"),
        );
    let (app, drive, _) = create_test_app(drive);

    let response = app.oneshot(get("/api/thumbnail/F7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(drive.metadata_calls(), 1);
}

#[tokio::test]
async fn test_thumbnail_download_failure_is_bad_gateway() {
    let (app, drive, _) = create_test_app(MockDrive::new());

    let response = app.oneshot(get("/api/thumbnail/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["code"], "DRIVE_ERROR");
    assert_eq!(drive.download_calls(), 1);
}

#[tokio::test]
async fn test_thumbnail_refresh_failure_is_service_unavailable() {
    let drive = Arc::new(
        MockDrive::new()
            .with_metadata_link("F1", "https://thumbs.test/F1")
            .with_link_response("https://thumbs.test/F1", StatusCode::OK, b"x".to_vec(), None),
    );
    let credentials = Arc::new(StaticCredentials::expired("stale"));
    credentials.fail_refresh(true);
    let state = AppState::new(drive.clone(), credentials, "public, max-age=3600");
    let app = create_router(state);

    let response = app.oneshot(get("/api/thumbnail/F1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["code"], "CREDENTIALS_UNAVAILABLE");
    assert_eq!(drive.link_calls(), 0);
}

#[tokio::test]
async fn test_thumbnail_cache_control_is_configurable() {
    let drive = Arc::new(
        MockDrive::new()
            .with_metadata_link("F1", "https://thumbs.test/F1")
            .with_link_response("https://thumbs.test/F1", StatusCode::OK, b"x".to_vec(), None),
    );
    let config = Config {
        thumbnail_max_age_secs: 60,
        ..Default::default()
    };
    let state = AppState::new(
        drive,
        Arc::new(StaticCredentials::default()),
        config.thumbnail_cache_control(),
    );
    let app = create_router_with_config(state, &config);

    let response = app.oneshot(get("/api/thumbnail/F1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=60");
    // No declared type on the link response
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
}
