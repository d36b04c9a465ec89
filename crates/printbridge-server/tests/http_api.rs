// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integration tests for the HTTP API, driven through the axum router with a
// scripted render host.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt; // for .collect().await
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use printbridge_core::AppConfig;
use printbridge_host::{LoadScript, PrintOutcome, ScriptedHost};
use printbridge_server::{AppServices, router};

const BOUNDARY: &str = "printbridge-test-boundary";

struct TestApp {
    _dir: tempfile::TempDir,
    host: ScriptedHost,
    services: AppServices,
}

impl TestApp {
    fn new(host: ScriptedHost) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            settle_delay_ms: 10,
            cleanup_grace_ms: 50,
            ..AppConfig::default()
        };
        let services = AppServices::init(dir.path(), config, Arc::new(host.clone())).unwrap();
        Self {
            _dir: dir,
            host,
            services,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(self.services.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn upload(&self, filename: &str, content: &[u8]) -> (StatusCode, Value) {
        self.send(multipart_request("file", Some(filename), content))
            .await
    }

    async fn print(&self, body: Value) -> (StatusCode, Value) {
        self.send(json_request("/print_single", body)).await
    }
}

fn multipart_request(field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn upload_then_print_invoice() {
    let app = TestApp::new(ScriptedHost::new().with_printers(["HP-LaserJet"]));

    let (status, body) = app.upload("invoice.pdf", b"%PDF-1.4 invoice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "filename": "invoice.pdf",
            "message": "File uploaded successfully"
        })
    );

    let (status, body) = app
        .print(json!({ "filename": "invoice.pdf", "printer": "HP-LaserJet", "copies": 1 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Printing started" }));

    let prints = app.host.prints();
    assert_eq!(prints.len(), 1);
    assert_eq!(prints[0].request.target_printer, "HP-LaserJet");
    assert_eq!(prints[0].content, b"%PDF-1.4 invoice");

    assert_eq!(app.services.status().surfaces.created, 1);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let surfaces = app.services.status().surfaces;
    assert_eq!(surfaces.destroyed, 1);
    assert_eq!(surfaces.live, 0);
}

#[tokio::test]
async fn missing_file_is_404_without_a_surface() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app
        .print(json!({ "filename": "missing.pdf", "printer": "HP-LaserJet", "copies": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "File not found" }));
    assert_eq!(app.host.opened(), 0);
}

#[tokio::test]
async fn printer_offline_is_reported_with_200() {
    let app = TestApp::new(
        ScriptedHost::new().with_print(PrintOutcome::Failed(Some("printer offline".into()))),
    );
    app.upload("invoice.pdf", b"%PDF").await;
    let (status, body) = app
        .print(json!({ "filename": "invoice.pdf", "printer": "HP-LaserJet" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Printing failed: printer offline" })
    );
}

#[tokio::test]
async fn load_failure_is_500() {
    let app = TestApp::new(ScriptedHost::new().with_load(LoadScript::Fail {
        code: -3,
        description: "ERR_ABORTED".into(),
    }));
    app.upload("invoice.pdf", b"%PDF").await;
    let (status, body) = app
        .print(json!({ "filename": "invoice.pdf", "printer": "HP-LaserJet" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Failed to load file: ERR_ABORTED" })
    );
}

#[tokio::test]
async fn copies_accepts_numeric_strings_and_defaults_to_one() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("label.pdf", b"%PDF").await;

    app.print(json!({ "filename": "label.pdf", "printer": "Zebra", "copies": "3" }))
        .await;
    app.print(json!({ "filename": "label.pdf", "printer": "Zebra", "copies": "lots" }))
        .await;
    app.print(json!({ "filename": "label.pdf", "printer": "Zebra" }))
        .await;

    let copies: Vec<u32> = app
        .host
        .prints()
        .iter()
        .map(|p| p.request.copies.get())
        .collect();
    assert_eq!(copies, vec![3, 1, 1]);
}

#[tokio::test]
async fn second_upload_with_same_name_wins() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("invoice.pdf", b"first").await;
    app.upload("invoice.pdf", b"second").await;

    let (_, body) = app.send(get("/api/files")).await;
    assert_eq!(body["files"].as_array().unwrap().len(), 1);

    app.print(json!({ "filename": "invoice.pdf", "printer": "HP" }))
        .await;
    assert_eq!(app.host.prints()[0].content, b"second");
}

#[tokio::test]
async fn upload_without_file_field_is_400() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app
        .send(multipart_request("comment", None, b"hello"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "No file uploaded" }));
}

#[tokio::test]
async fn upload_with_path_in_name_is_rejected() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app.upload("../escape.pdf", b"x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn printers_listed_from_host() {
    let app = TestApp::new(ScriptedHost::new().with_printers(["HP-LaserJet", "Zebra"]));
    let (status, body) = app.send(get("/api/printers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "printers": ["HP-LaserJet", "Zebra"] })
    );
}

#[tokio::test]
async fn catalog_unavailable_is_500() {
    let app = TestApp::new(ScriptedHost::new().with_catalog_unavailable());
    let (status, body) = app.send(get("/api/printers")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn heartbeat_reports_service() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app.send(get("/heartbeat")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "PrintBridge");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn root_is_plain_text() {
    let app = TestApp::new(ScriptedHost::new());
    let response = router(app.services.clone())
        .oneshot(get("/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"PrintBridge Printer Service is Running");
}

#[tokio::test]
async fn delete_file_then_404() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("old.pdf", b"x").await;

    let (status, body) = app
        .send(json_request("/delete_file", json!({ "filename": "old.pdf" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, _) = app
        .send(json_request("/delete_file", json!({ "filename": "old.pdf" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn jobs_are_listed_newest_first() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("a.pdf", b"a").await;
    app.upload("b.pdf", b"b").await;
    app.print(json!({ "filename": "a.pdf", "printer": "HP" })).await;
    app.print(json!({ "filename": "b.pdf", "printer": "HP" })).await;

    let (status, body) = app.send(get("/api/jobs")).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["filename"], "b.pdf");
    assert_eq!(jobs[0]["status"], "succeeded");
    assert_eq!(jobs[1]["filename"], "a.pdf");
}

#[tokio::test]
async fn status_reports_surface_counts() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app.send(get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["port"], 5000);
    assert_eq!(
        body["surfaces"],
        json!({ "created": 0, "destroyed": 0, "live": 0 })
    );
}

#[tokio::test]
async fn non_string_printer_is_taken_as_text() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("invoice.pdf", b"%PDF").await;
    let (status, body) = app
        .print(json!({ "filename": "invoice.pdf", "printer": 42 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Printing started" }));
    assert_eq!(app.host.prints()[0].request.target_printer, "42");
}

#[tokio::test]
async fn null_filename_is_404_envelope() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app
        .print(json!({ "filename": null, "printer": "HP" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "File not found" }));
}

#[tokio::test]
async fn malformed_json_body_gets_an_envelope() {
    let app = TestApp::new(ScriptedHost::new());
    for uri in ["/print_single", "/print_all", "/delete_file"] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], json!(false), "{uri}");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()), "{uri}");
    }
}

#[tokio::test]
async fn non_object_body_gets_an_envelope() {
    let app = TestApp::new(ScriptedHost::new());
    let (status, body) = app.print(json!(["invoice.pdf"])).await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn print_all_prints_every_stored_file() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("a.pdf", b"a").await;
    app.upload("b.pdf", b"b").await;

    let (status, body) = app
        .send(json_request("/print_all", json!({ "printer": "HP", "copies": "2" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["printed_count"], 2);
    assert_eq!(body["failed_count"], 0);

    let prints = app.host.prints();
    assert_eq!(prints.len(), 2);
    assert!(prints.iter().all(|p| p.request.copies.get() == 2));
    let mut contents: Vec<_> = prints.iter().map(|p| p.content.clone()).collect();
    contents.sort();
    assert_eq!(contents, vec![b"a".to_vec(), b"b".to_vec()]);
}

#[tokio::test]
async fn print_all_reports_failures() {
    let app = TestApp::new(
        ScriptedHost::new().with_print(PrintOutcome::Failed(Some("printer offline".into()))),
    );
    app.upload("a.pdf", b"a").await;

    let (status, body) = app
        .send(json_request("/print_all", json!({ "printer": "HP" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["printed_count"], 0);
    assert_eq!(body["failed_count"], 1);
    assert_eq!(body["failed_files"], json!(["a.pdf"]));
}

#[tokio::test]
async fn print_all_with_nothing_stored() {
    let app = TestApp::new(ScriptedHost::new());
    let (_, body) = app
        .send(json_request("/print_all", json!({ "printer": "HP" })))
        .await;
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "No files to print",
            "printed_count": 0,
            "failed_count": 0,
            "failed_files": []
        })
    );
}

#[tokio::test]
async fn preview_serves_stored_bytes_with_content_type() {
    let app = TestApp::new(ScriptedHost::new());
    app.upload("invoice.pdf", b"%PDF-1.4 preview").await;

    let response = router(app.services.clone())
        .oneshot(get("/preview/invoice.pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"%PDF-1.4 preview");

    let (status, body) = app.send(get("/preview/missing.pdf")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "File not found" }));
}
