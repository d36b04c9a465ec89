// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes. Every route answers with a JSON envelope carrying `success`
// and, on failure, a human-readable `message`.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use printbridge_core::error::{ErrorKind, PrintBridgeError};
use printbridge_core::types::{Copies, JobResult};

use crate::services::AppServices;

/// Build the router with every endpoint, CORS and request tracing.
pub fn router(services: AppServices) -> Router {
    let body_limit = services.config().max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/heartbeat", get(heartbeat))
        .route("/api/printers", get(list_printers))
        .route("/api/files", get(list_files))
        .route("/api/jobs", get(list_jobs))
        .route("/api/status", get(status))
        .route("/upload", post(upload))
        .route("/print_single", post(print_single))
        .route("/print_all", post(print_all))
        .route("/preview/{filename}", get(preview))
        .route("/delete_file", post(delete_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}

/// Failure of a route, rendered as `{ success: false, message }`.
#[derive(Debug)]
pub enum ApiError {
    Service(PrintBridgeError),
    Multipart(MultipartError),
    Json(JsonRejection),
}

impl From<PrintBridgeError> for ApiError {
    fn from(err: PrintBridgeError) -> Self {
        Self::Service(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Json(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Multipart(err) => (err.status(), err.body_text()),
            Self::Json(rejection) => (rejection.status(), rejection.body_text()),
            Self::Service(err) => {
                let status = match (&err, err.kind()) {
                    (PrintBridgeError::FileNotFound(_), _) => StatusCode::NOT_FOUND,
                    (_, ErrorKind::Precondition) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match &err {
                    PrintBridgeError::FileNotFound(_) => "File not found".to_string(),
                    PrintBridgeError::NoFileUploaded => "No file uploaded".to_string(),
                    other => other.to_string(),
                };
                (status, message)
            }
        };
        if status.is_server_error() {
            warn!(status = status.as_u16(), %message, "request failed");
        }
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

async fn index(State(services): State<AppServices>) -> String {
    format!("{} Printer Service is Running", services.config().service_name)
}

async fn heartbeat(State(services): State<AppServices>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "service": services.config().service_name,
    }))
}

async fn list_printers(State(services): State<AppServices>) -> Result<Json<Value>, ApiError> {
    let printers = services.list_printers().await?;
    Ok(Json(json!({ "success": true, "printers": printers })))
}

async fn upload(
    State(services): State<AppServices>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        let stored = services.upload(&filename, &bytes).await?;
        return Ok(Json(json!({
            "success": true,
            "filename": stored.name,
            "message": "File uploaded successfully",
        })));
    }
    Err(PrintBridgeError::NoFileUploaded.into())
}

/// Text of a loosely typed JSON field. Strings are taken as-is, numbers and
/// booleans are stringified, anything else counts as absent.
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct PrintSingleRequest {
    #[serde(default)]
    filename: Option<Value>,
    #[serde(default)]
    printer: Option<Value>,
    /// Number or numeric string; anything else means one copy.
    #[serde(default)]
    copies: Option<Value>,
}

async fn print_single(
    State(services): State<AppServices>,
    payload: Result<Json<PrintSingleRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let filename = scalar_text(request.filename.as_ref());
    let printer = scalar_text(request.printer.as_ref());
    let copies = Copies::from_json(request.copies.as_ref());
    info!(
        file = %filename,
        printer = %printer,
        copies = copies.get(),
        "print request"
    );

    let result = services.print_single(&filename, &printer, copies).await?;
    let status = match result {
        JobResult::LoadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        JobResult::Printed | JobResult::PrintFailed(_) => StatusCode::OK,
    };
    let body = json!({ "success": result.is_success(), "message": result.message() });
    Ok((status, Json(body)).into_response())
}

#[derive(Debug, Deserialize)]
struct PrintAllRequest {
    #[serde(default)]
    printer: Option<Value>,
    #[serde(default)]
    copies: Option<Value>,
}

async fn print_all(
    State(services): State<AppServices>,
    payload: Result<Json<PrintAllRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let printer = scalar_text(request.printer.as_ref());
    let copies = Copies::from_json(request.copies.as_ref());

    let outcome = services.print_all(&printer, copies).await?;
    let (printed, failed) = (outcome.printed.len(), outcome.failed.len());
    let message = match (printed, failed) {
        (0, 0) => "No files to print".to_string(),
        (0, failed) => format!("No files printed, {failed} failed"),
        (printed, 0) => format!("Printed {printed} file(s)"),
        (printed, failed) => format!("Printed {printed} file(s), {failed} failed"),
    };
    Ok(Json(json!({
        "success": printed > 0,
        "message": message,
        "printed_count": printed,
        "failed_count": failed,
        "failed_files": outcome.failed,
    })))
}

async fn preview(
    State(services): State<AppServices>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = services.preview(&filename).await?;
    let mut response = bytes.into_response();
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    Ok(response)
}

async fn list_files(State(services): State<AppServices>) -> Result<Json<Value>, ApiError> {
    let files = services.files().await?;
    Ok(Json(json!({ "success": true, "files": files })))
}

#[derive(Debug, Deserialize)]
struct DeleteFileRequest {
    #[serde(default)]
    filename: Option<Value>,
}

async fn delete_file(
    State(services): State<AppServices>,
    payload: Result<Json<DeleteFileRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    services
        .delete_file(&scalar_text(request.filename.as_ref()))
        .await?;
    Ok(Json(json!({ "success": true, "message": "File deleted successfully" })))
}

async fn list_jobs(State(services): State<AppServices>) -> Json<Value> {
    Json(json!({ "success": true, "jobs": services.jobs() }))
}

async fn status(State(services): State<AppServices>) -> Json<Value> {
    let status = services.status();
    Json(json!({
        "success": true,
        "service": status.service,
        "host": status.host,
        "upload_dir": status.upload_dir,
        "port": status.port,
        "surfaces": status.surfaces,
    }))
}
