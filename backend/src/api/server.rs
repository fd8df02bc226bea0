//! HTTP trigger for report jobs.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                               |
//! |--------|---------------|-------------------------------------------|
//! | GET    | `/health`     | Health check                              |
//! | GET    | `/api/report` | Run the report job with the server config |
//! | POST   | `/api/report` | Same, with an optional output file name   |
//! | GET    | `/api/logs`   | SSE stream for real-time logs             |

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, ReportRequest, ReportResponse};
use crate::config::ReportConfig;
use crate::error::{ServerError, ServerResult};
use crate::transform::pipeline::run_report_with_config;

type SharedConfig = Arc<ReportConfig>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

pub fn router(config: ReportConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/report", get(report).post(report_with_overrides))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(config))
}

/// Start the HTTP server
pub async fn start_server(config: ReportConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Gridscribe server running on http://localhost:{}", port);
    println!("   GET  /api/report - Generate grid config report");
    println!("   POST /api/report - Same, with an output file name");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "gridscribe",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "report": "GET|POST /api/report",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // lagged receivers skip the dropped entries
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

async fn report(State(config): State<SharedConfig>) -> ServerResult<Json<ReportResponse>> {
    run_report_job(config.as_ref().clone()).await.map(Json)
}

async fn report_with_overrides(
    State(config): State<SharedConfig>,
    body: Bytes,
) -> ServerResult<Json<ReportResponse>> {
    let request: ReportRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ReportRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?
    };

    let output = request.output_path(&config.output)?;
    let config = config.as_ref().clone().with_output(Some(output));
    run_report_job(config).await.map(Json)
}

/// Run one report job on a blocking thread.
pub async fn run_report_job(config: ReportConfig) -> ServerResult<ReportResponse> {
    println!("\n{}", "=".repeat(70));
    log_info(format!("📄 NEW REPORT: {}", config.store.display()));
    println!("{}\n", "=".repeat(70));

    let summary = tokio::task::spawn_blocking(move || run_report_with_config(&config))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(ReportResponse::from(summary))
}
