use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use pixpress_core::{
    AvifEstimate, BatchReport, ConversionOptions, ConversionResult, Converter, ImageJob,
    ImageReport, Operation, SanitizedConfig, StatsSnapshot, SystemInfo,
};

use crate::metrics::encode_metrics;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub path: PathBuf,
    pub operation: Operation,
    #[serde(default)]
    pub options: ConversionOptions,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub path: PathBuf,
    #[serde(default)]
    pub options: ConversionOptions,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_kind: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub jobs: Vec<ImageJob>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/capabilities
///
/// Cached encoder availability for this platform.
pub async fn get_capabilities(State(state): State<Arc<AppState>>) -> Json<SystemInfo> {
    Json(state.resolver().system_info().await)
}

/// POST /api/v1/capabilities/refresh
///
/// Re-probes every encoder and replaces the cached result.
pub async fn refresh_capabilities(State(state): State<Arc<AppState>>) -> Json<SystemInfo> {
    let info = state.resolver().refresh_system_info().await;
    info!(
        platform = %info.platform,
        missing_required = ?info.missing_required,
        "Encoder capabilities refreshed"
    );
    Json(info)
}

/// POST /api/v1/convert
///
/// Runs one operation on one file. Rejected input or options answer 422;
/// encoder failures still answer 200 with `success: false`.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConvertRequest>,
) -> (StatusCode, Json<ConversionResult>) {
    let result = state
        .converter()
        .convert(&body.path, body.operation, &body.options)
        .await;

    let status = match result.error_kind.as_deref() {
        Some("invalid_input") | Some("invalid_options") => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::OK,
    };
    (status, Json(result))
}

/// POST /api/v1/estimate
///
/// Predicted AVIF size without running an encoder.
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<AvifEstimate>, (StatusCode, Json<ErrorResponse>)> {
    state
        .converter()
        .estimate_avif_size(&body.path, &body.options)
        .await
        .map(Json)
        .map_err(|e| {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error_kind: e.kind().to_string(),
                    errors: e.messages(),
                }),
            )
        })
}

/// POST /api/v1/process
///
/// Runs every requested operation on one image.
pub async fn process(
    State(state): State<Arc<AppState>>,
    Json(job): Json<ImageJob>,
) -> Json<ImageReport> {
    Json(state.batch().process_one(job).await)
}

/// POST /api/v1/batch
pub async fn batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchRequest>,
) -> Json<BatchReport> {
    Json(state.batch().process_batch(body.jobs).await)
}

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.batch().stats().snapshot().await)
}

/// GET /metrics
///
/// Prometheus text exposition.
pub async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
