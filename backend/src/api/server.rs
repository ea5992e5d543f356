//! HTTP server for the usage dashboard.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | Health check                             |
//! | POST   | `/api/usage`          | Upload a usage CSV (`file`)              |
//! | POST   | `/api/ledger`         | Upload a ledger CSV (`file`, `period`)   |
//! | GET    | `/api/datasets`       | Configured datasets                      |
//! | GET    | `/api/datasets/{id}`  | Retrieve and normalize one dataset       |
//! | GET    | `/api/overview`       | Cross-period ledger overview             |
//! | GET    | `/api/resources`      | School resource table                    |
//! | GET    | `/api/logs`           | SSE stream of pipeline logs              |

use axum::{
    extract::{Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, DatasetResponse, LedgerResponse, UsageResponse};
use crate::catalog::{school_resources, Dataset, DatasetCatalog, SchoolResources};
use crate::error::{PipelineError, RetrievalError, ServerError, ServerResult};
use crate::source::Fetcher;
use crate::transform::{
    load_dataset, load_ledger_overview, process_ledger_bytes, process_usage_bytes,
    OverviewReport, PipelineOptions,
};

/// Period label used when a ledger upload names none
const DEFAULT_PERIOD: &str = "Uploaded";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<DatasetCatalog>,
    pub fetcher: Fetcher,
    pub options: PipelineOptions,
}

impl AppState {
    pub fn new(catalog: DatasetCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            fetcher: Fetcher::new(),
            options: PipelineOptions::default(),
        }
    }
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Retrieval(RetrievalError::UnknownDataset(_))) => {
                StatusCode::NOT_FOUND
            }
            ServerError::Pipeline(PipelineError::Retrieval(_)) => StatusCode::BAD_GATEWAY,
            ServerError::Pipeline(PipelineError::Csv(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Catalog(_)) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        log_error(&message);
        (self.status_code(), Json(error_response(&message))).into_response()
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/usage", post(upload_usage))
        .route("/api/ledger", post(upload_ledger))
        .route("/api/datasets", get(list_datasets))
        .route("/api/datasets/{id}", get(get_dataset))
        .route("/api/overview", get(overview))
        .route("/api/resources", get(resources))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    port: u16,
    catalog: DatasetCatalog,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(catalog));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Usage sheets server running on http://localhost:{}", port);
    println!("   POST /api/usage         - Upload usage CSV");
    println!("   POST /api/ledger        - Upload ledger CSV");
    println!("   GET  /api/datasets      - Configured datasets");
    println!("   GET  /api/logs          - SSE log stream");
    println!("   GET  /health            - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "usage-sheets",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "usage": "POST /api/usage",
            "ledger": "POST /api/ledger",
            "datasets": "GET /api/datasets",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// A multipart CSV upload
struct Upload {
    bytes: Vec<u8>,
    file_name: Option<String>,
    period: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut bytes = None;
    let mut file_name = None;
    let mut period = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            "period" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                period = Some(text.trim().to_string()).filter(|p| !p.is_empty());
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    log_info(format!(
        "Upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    Ok(Upload {
        bytes,
        file_name,
        period,
    })
}

async fn upload_usage(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<UsageResponse>> {
    let upload = read_upload(multipart).await?;
    let result = process_usage_bytes(&upload.bytes, &state.options).map_err(PipelineError::from)?;
    Ok(Json(result.into()))
}

async fn upload_ledger(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Json<LedgerResponse>> {
    let upload = read_upload(multipart).await?;
    let period = upload
        .period
        .or_else(|| {
            upload
                .file_name
                .as_deref()
                .and_then(|name| name.rsplit_once('.').map(|(stem, _)| stem.to_string()))
        })
        .unwrap_or_else(|| DEFAULT_PERIOD.to_string());

    let result = process_ledger_bytes(&upload.bytes, &period, &state.options)
        .map_err(PipelineError::from)?;
    Ok(Json(result.into()))
}

async fn list_datasets(State(state): State<AppState>) -> Json<Vec<Dataset>> {
    Json(state.catalog.list().to_vec())
}

async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<DatasetResponse>> {
    let loaded = load_dataset(&state.catalog, &state.fetcher, &id, &state.options).await?;
    Ok(Json(DatasetResponse::new(loaded.dataset, loaded.output)))
}

async fn overview(State(state): State<AppState>) -> ServerResult<Json<OverviewReport>> {
    let report = load_ledger_overview(&state.catalog, &state.fetcher, &state.options).await?;
    Ok(Json(report))
}

async fn resources() -> Json<Vec<SchoolResources>> {
    Json(school_resources())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, CsvError};

    #[test]
    fn test_retrieval_failures_are_bad_gateway() {
        let err: ServerError = PipelineError::from(RetrievalError::Status {
            url: "https://example.org/sheet.csv".into(),
            status: 500,
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err: ServerError = PipelineError::from(RetrievalError::Transport {
            url: "https://example.org/sheet.csv".into(),
            message: "connection reset".into(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_status_codes() {
        let unknown: ServerError =
            PipelineError::from(RetrievalError::UnknownDataset("x".into())).into();
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

        let csv: ServerError = PipelineError::from(CsvError::EncodingError("bad".into())).into();
        assert_eq!(csv.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let catalog: ServerError =
            PipelineError::from(CatalogError::DuplicateId("x".into())).into();
        assert_eq!(catalog.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ServerError::BadRequest("No file provided".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_into_response() {
        let err: ServerError =
            PipelineError::from(RetrievalError::UnknownDataset("x".into())).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_router_builds() {
        let _ = router(AppState::new(DatasetCatalog::builtin()));
    }
}
