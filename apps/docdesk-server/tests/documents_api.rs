mod common;

use std::sync::Arc;

use axum::http::{header, StatusCode};

use docdesk_server::config::Config;
use docdesk_server::store::Partition;
use docdesk_server::view::Capabilities;

use common::{body_bytes, body_json, sample_pdf, seeded_store, GatedStore, TestApp};

#[tokio::test]
async fn test_open_finished_document() {
    let app = TestApp::new();

    let response = app.get("/api/v1/documents/doc123").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["loading"], false);
    assert_eq!(json["pageCount"], 3);
    assert_eq!(json["record"]["partition"], "finished");
    assert_eq!(json["record"]["fileName"], "Request_Form.pdf");
    assert_eq!(json["record"]["displayName"], "Request_Form.pdf");
    assert!(json["record"].get("fileContent").is_none());
    assert_eq!(json["requestedBy"], "Dana Reyes");
    assert_eq!(json["capabilities"]["canDelete"], true);

    let pages = json["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0]["number"], 1);
    assert_eq!(pages[0]["width"], 612.0);
    assert_eq!(pages[2]["href"], "/api/v1/documents/doc123/pages/3");

    // Finished hit short-circuits: resolve probe plus fetch
    let stats = app.state.store().stats();
    assert_eq!(stats.finished_reads, 2);
    assert_eq!(stats.processing_reads, 0);
}

#[tokio::test]
async fn test_open_missing_document() {
    let app = TestApp::new();

    let response = app.get("/api/v1/documents/doc999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["status"], "notFound");
    assert_eq!(json["message"], "Document not found.");
    assert_eq!(json["pageCount"], 0);
    assert!(json["record"].is_null());
    assert_eq!(app.state.store().stats().reads(), 2);
}

#[tokio::test]
async fn test_processing_document_without_name() {
    let app = TestApp::new();

    let json = body_json(app.get("/api/v1/documents/req7").await).await;

    assert_eq!(json["record"]["partition"], "processing");
    assert!(json["record"]["fileName"].is_null());
    assert_eq!(json["record"]["displayName"], "Unknown Document");
}

#[tokio::test]
async fn test_eager_open_warms_page_cache() {
    let app = TestApp::new();

    let response = app.get("/api/v1/documents/doc123?eager=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.engine().page_cache().stats().used, 3);
}

#[tokio::test]
async fn test_render_page() {
    let app = TestApp::new();
    app.get("/api/v1/documents/doc123").await;

    let first = app.get("/api/v1/documents/doc123/pages/2").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(first.headers()["x-page-number"], "2");
    assert_eq!(first.headers()["x-page-count"], "3");
    assert_eq!(first.headers()["x-page-width"], "612");
    let etag = first.headers()[header::ETAG].clone();
    let first_bytes = body_bytes(first).await;
    assert!(first_bytes.starts_with(b"%PDF-"));

    // A standalone page keeping the size it inherited from the page tree
    let single = lopdf::Document::load_mem(&first_bytes).unwrap();
    let pages = single.get_pages();
    assert_eq!(pages.len(), 1);
    let page = single.get_dictionary(pages[&1]).unwrap();
    assert!(page.get(b"MediaBox").is_ok());

    // Idempotent
    let second = app.get("/api/v1/documents/doc123/pages/2").await;
    assert_eq!(second.headers()[header::ETAG], etag);
    assert_eq!(body_bytes(second).await, first_bytes);
}

#[tokio::test]
async fn test_superseded_open_is_conflict() {
    let memory = seeded_store();
    let store = Arc::new(GatedStore::new(memory.clone(), "doc123"));
    let app = TestApp::with_store(Config::default(), memory, store.clone());

    let slow = app.spawn_get("/api/v1/documents/doc123");
    store.entered.notified().await;

    let fresh = app.get("/api/v1/documents/req7").await;
    assert_eq!(fresh.status(), StatusCode::OK);

    store.release.notify_one();
    let response = slow.await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "conflict");

    // The view still holds the newer document: download reads nothing
    let before = app.state.store().stats();
    let download = app.get("/api/v1/documents/req7/download").await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(app.state.store().stats(), before);
}

#[tokio::test]
async fn test_render_page_out_of_range() {
    let app = TestApp::new();

    assert_eq!(
        app.get("/api/v1/documents/doc123/pages/4").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/api/v1/documents/doc123/pages/0").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_download_uses_loaded_content() {
    let app = TestApp::new();
    app.get("/api/v1/documents/doc123").await;
    let before = app.state.store().stats();

    let response = app.get("/api/v1/documents/doc123/download").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.state.store().stats(), before);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"Request_Form.pdf\""));
    assert_eq!(body_bytes(response).await, sample_pdf(3));
}

#[tokio::test]
async fn test_download_without_prior_open() {
    let app = TestApp::new();

    let response = app.get("/api/v1/documents/req7/download").await;

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.contains("filename=\"req7.pdf\""));
}

#[tokio::test]
async fn test_delete_processing_redirects_home() {
    let app = TestApp::new();
    app.get("/api/v1/documents/req7").await;

    let response = app.delete("/api/v1/documents/req7").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(!app.memory.contains(Partition::Processing, "req7"));
    assert_eq!(app.state.store().stats().deletes, 1);

    let reopened = app.get("/api/v1/documents/req7").await;
    assert_eq!(reopened.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_finished_is_unsupported() {
    let app = TestApp::new();

    let response = app.delete("/api/v1/documents/doc123").await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "unsupported");
    assert!(app.memory.contains(Partition::Finished, "doc123"));
    assert_eq!(app.state.store().stats().deletes, 0);
}

#[tokio::test]
async fn test_delete_missing_document() {
    let app = TestApp::new();

    let response = app.delete("/api/v1/documents/doc999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.state.store().stats().deletes, 0);
}

#[tokio::test]
async fn test_disabled_actions_are_forbidden() {
    let mut config = Config::default();
    config.view.capabilities = Capabilities::VIEW_ONLY;
    let app = TestApp::with_config(config);

    assert_eq!(
        app.delete("/api/v1/documents/req7").await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/api/v1/documents/req7/download").await.status(),
        StatusCode::FORBIDDEN
    );
    assert!(app.memory.contains(Partition::Processing, "req7"));

    let json = body_json(app.get("/api/v1/documents/req7").await).await;
    assert_eq!(json["capabilities"]["canDelete"], false);
}

#[tokio::test]
async fn test_custom_home_route() {
    let mut config = Config::default();
    config.view.home_route = "/requests".to_string();
    let app = TestApp::with_config(config);

    let response = app.delete("/api/v1/documents/req7").await;

    assert_eq!(response.headers()[header::LOCATION], "/requests");
    assert_eq!(app.get("/requests").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let app = TestApp::new();
    let long_id = "x".repeat(300);

    let response = app.get(&format!("/api/v1/documents/{}", long_id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/v1/documents/a%5Cb").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = TestApp::new();
    app.get("/api/v1/documents/doc123").await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["store"]["backend"], "memory");
    assert_eq!(json["store"]["finishedReads"], 2);
    assert_eq!(json["views"], 1);
}
