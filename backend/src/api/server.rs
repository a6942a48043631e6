//! HTTP Server for the xteconv API.
//!
//! Provides upload endpoints for both conversion directions.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                              |
//! |--------|---------------|------------------------------------------|
//! | GET    | `/health`     | Health check                             |
//! | POST   | `/api/decode` | Upload XTE files, get rows (JSON/CSV/XLSX) |
//! | POST   | `/api/encode` | Upload a table, get a ZIP of documents   |
//! | GET    | `/api/logs`   | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::DecodeResponse;
use crate::archive::{self, SPREADSHEET_BUNDLE_NAME, TABLE_BUNDLE_NAME};
use crate::cache::DecodeCache;
use crate::config::Settings;
use crate::error::{ServerError, ServerResult};
use crate::table;
use crate::transform::encoder::ArtifactKind;
use crate::transform::pipeline::{decode_batch_cached, encode_bytes, InputFile};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Uploads are whole batches of documents.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub cache: Arc<Mutex<DecodeCache>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let cache = DecodeCache::new(settings.cache_capacity);
        Self {
            settings,
            cache: Arc::new(Mutex::new(cache)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DecodeQuery {
    /// `json` (default), `csv` or `xlsx`
    pub format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EncodeQuery {
    /// `xml` (default) or `xte`
    pub bundle: Option<String>,
}

/// Build the router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/decode", post(decode_files))
        .route("/api/encode", post(encode_table))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let port = settings.port;
    let app = router(AppState::new(settings));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 xteconv server running on http://localhost:{}", port);
    println!("   POST /api/decode - Upload XTE files (?format=json|csv|xlsx)");
    println!("   POST /api/encode - Upload a table (?bundle=xml|xte)");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "xteconv",
        "version": env!("CARGO_PKG_VERSION"),
        "tissVersion": crate::field_map::TISS_VERSION,
        "endpoints": {
            "decode": "POST /api/decode",
            "encode": "POST /api/encode",
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
        // lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Decode uploaded XTE files
async fn decode_files(
    State(state): State<AppState>,
    Query(query): Query<DecodeQuery>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let files = read_files(multipart).await?;
    if files.is_empty() {
        return Err(ServerError::BadRequest("No file provided".to_string()));
    }

    println!("\n{}", "=".repeat(70));
    println!("📄 DECODE: {} file(s)", files.len());
    println!("{}\n", "=".repeat(70));

    let outcome = {
        let mut cache = state
            .cache
            .lock()
            .map_err(|_| ServerError::Internal("decode cache poisoned".to_string()))?;
        decode_batch_cached(&files, &mut cache)
    };

    match query.format.as_deref().unwrap_or("json") {
        "json" => Ok(Json(DecodeResponse::from(outcome)).into_response()),
        "csv" => {
            let bytes = table::write_csv(&outcome.records)
                .map_err(|e| ServerError::Internal(e.to_string()))?;
            Ok(attachment("text/csv; charset=utf-8", TABLE_BUNDLE_NAME, bytes))
        }
        "xlsx" => {
            let bytes = table::write_xlsx(&outcome.records)
                .map_err(|e| ServerError::Internal(e.to_string()))?;
            Ok(attachment(XLSX_CONTENT_TYPE, SPREADSHEET_BUNDLE_NAME, bytes))
        }
        other => Err(ServerError::BadRequest(format!("Unknown format: {}", other))),
    }
}

/// Encode an uploaded table into a ZIP of documents
async fn encode_table(
    State(state): State<AppState>,
    Query(query): Query<EncodeQuery>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let kind: ArtifactKind = query
        .bundle
        .as_deref()
        .unwrap_or("xml")
        .parse()
        .map_err(ServerError::BadRequest)?;

    let file = read_files(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    println!("\n{}", "=".repeat(70));
    println!("📄 ENCODE: {} ({} bytes)", file.name, file.bytes.len());
    println!("{}\n", "=".repeat(70));

    let outcome = encode_bytes(&file.bytes, &state.settings.now())?;
    let zip = archive::bundle(&outcome.artifacts, kind)
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok(attachment("application/zip", archive::bundle_name(kind), zip))
}

/// Collect every uploaded `file` field
async fn read_files(mut multipart: Multipart) -> ServerResult<Vec<InputFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("upload_{}", files.len() + 1));
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;

        files.push(InputFile::new(name, bytes.to_vec()));
    }

    Ok(files)
}

fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}
