//! HTTP Server for the booksync API.
//!
//! Provides REST endpoints for CSV import and payload translation.
//! Submission to the accounting platforms is handled by the console itself;
//! this service only stages documents and builds the wire payloads.
//!
//! # API Endpoints
//!
//! | Method | Path             | Description                           |
//! |--------|------------------|---------------------------------------|
//! | GET    | `/health`        | Health check                          |
//! | POST   | `/api/import`    | Upload CSV for validation and staging |
//! | POST   | `/api/translate` | Build an external payload             |
//! | GET    | `/api/logs`      | SSE stream for real-time logs         |

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, ImportResponse, TranslateRequest};
use crate::import::MissingIdPolicy;
use crate::models::Platform;
use crate::pipeline::{import_bytes, ImportOptions};
use crate::translate::translate;

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/import", post(import_csv))
        .route("/api/translate", post(translate_document))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("booksync server running on http://localhost:{}", port);
    println!("   POST /api/import    - Upload CSV file");
    println!("   POST /api/translate - Build external payload");
    println!("   GET  /api/logs      - SSE log stream");
    println!("   GET  /health        - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "booksync",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "import": "POST /api/import",
            "translate": "POST /api/translate",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Import CSV endpoint.
///
/// Multipart fields: `file` (required), `platform` ("quickbooks"/"xero"),
/// `missingIdPolicy` ("skip"/"report").
async fn import_csv(
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, (StatusCode, Json<Value>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut options = ImportOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, Json(error_response(&format!("Multipart error: {}", e))))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            (
                                StatusCode::BAD_REQUEST,
                                Json(error_response(&format!("Read error: {}", e))),
                            )
                        })?
                        .to_vec(),
                );
            }
            "platform" => {
                let value = field.text().await.unwrap_or_default();
                options.platform = Platform::from_str_opt(&value).ok_or_else(|| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(error_response(&format!("Unknown platform: {}", value))),
                    )
                })?;
            }
            "missingIdPolicy" => {
                let value = field.text().await.unwrap_or_default();
                options.missing_id_policy = match value.as_str() {
                    "skip" => MissingIdPolicy::Skip,
                    "report" => MissingIdPolicy::Report,
                    other => {
                        return Err((
                            StatusCode::BAD_REQUEST,
                            Json(error_response(&format!("Unknown policy: {}", other))),
                        ))
                    }
                };
            }
            _ => {}
        }
    }

    let bytes = file_data
        .ok_or_else(|| (StatusCode::BAD_REQUEST, Json(error_response("No file provided"))))?;

    println!(
        "NEW IMPORT: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    );

    let outcome = import_bytes(&bytes, options).map_err(|e| {
        eprintln!("Import error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&e.to_string())))
    })?;

    Ok(Json(ImportResponse::from(outcome)))
}

/// Translate endpoint: build the external wire payload for one document.
async fn translate_document(
    Json(request): Json<TranslateRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let refs = request.references.as_set();
    let payload = translate(&request.document, &refs).map_err(|e| {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(error_response(&e.to_string())))
    })?;

    let value = serde_json::to_value(&payload).map_err(|e| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&e.to_string())))
    })?;

    Ok(Json(value))
}
