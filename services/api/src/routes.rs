use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use screening_ai::error::AppError;
use screening_ai::workflows::screening::{
    screening_router, CvUpload, IngestReport, JobId, ScoringOracle, ScreeningRepository,
    ScreeningService,
};

use crate::infra::AppState;

/// One CV in a bulk upload, carried as plain text. Binary formats are decoded
/// by the configured extractor behind the same endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CvUploadRequest {
    pub(crate) filename: String,
    pub(crate) content: String,
}

pub(crate) fn with_screening_routes<R, O>(service: Arc<ScreeningService<R, O>>) -> axum::Router
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    screening_router(Arc::clone(&service))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/jobs/:job_id/cvs",
            axum::routing::post(upload_cvs_endpoint::<R, O>).with_state(service),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn upload_cvs_endpoint<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
    Json(uploads): Json<Vec<CvUploadRequest>>,
) -> Result<Json<IngestReport>, AppError>
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    let uploads = uploads
        .into_iter()
        .map(|upload| CvUpload {
            filename: upload.filename,
            bytes: upload.content.into_bytes(),
        })
        .collect();

    let report = service.ingest_cvs(JobId(job_id), uploads).await?;
    Ok(Json(report))
}
