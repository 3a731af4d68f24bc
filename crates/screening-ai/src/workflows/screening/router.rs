use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    CandidateDraft, CandidateId, CriterionDraft, CriterionId, JobDraft, JobId, JobStatus,
};
use super::errors::ScreeningError;
use super::oracle::ScoringOracle;
use super::repository::{RepositoryError, ScreeningRepository};
use super::service::{ScreeningService, ScreeningServiceError};

/// Router builder exposing the screening pipeline over HTTP.
pub fn screening_router<R, O>(service: Arc<ScreeningService<R, O>>) -> Router
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            post(create_job_handler::<R, O>).get(list_jobs_handler::<R, O>),
        )
        .route("/api/v1/jobs/:job_id", get(get_job_handler::<R, O>))
        .route(
            "/api/v1/jobs/:job_id/criteria",
            post(add_criterion_handler::<R, O>),
        )
        .route(
            "/api/v1/jobs/:job_id/criteria/:criterion_id",
            delete(remove_criterion_handler::<R, O>),
        )
        .route("/api/v1/jobs/:job_id/activate", post(activate_handler::<R, O>))
        .route(
            "/api/v1/jobs/:job_id/candidates",
            post(add_candidate_handler::<R, O>).get(list_candidates_handler::<R, O>),
        )
        .route(
            "/api/v1/candidates/:candidate_id",
            delete(delete_candidate_handler::<R, O>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/result",
            get(candidate_result_handler::<R, O>),
        )
        .route("/api/v1/jobs/:job_id/screen", post(screen_handler::<R, O>))
        .route("/api/v1/jobs/:job_id/complete", post(complete_handler::<R, O>))
        .route("/api/v1/jobs/:job_id/archive", post(archive_handler::<R, O>))
        .route("/api/v1/jobs/:job_id/results", get(results_handler::<R, O>))
        .route("/api/v1/jobs/:job_id/longlist", get(longlist_handler::<R, O>))
        .route(
            "/api/v1/jobs/:job_id/statistics",
            get(statistics_handler::<R, O>),
        )
        .with_state(service)
}

fn error_response(error: ScreeningServiceError) -> Response {
    let status = match &error {
        ScreeningServiceError::Screening(inner) => match inner {
            ScreeningError::Validation { .. } | ScreeningError::Extraction(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ScreeningError::InvalidState { .. }
            | ScreeningError::ImmutableState { .. }
            | ScreeningError::ProcessingInProgress { .. } => StatusCode::CONFLICT,
            ScreeningError::ScoringIncomplete { .. } => StatusCode::BAD_GATEWAY,
        },
        ScreeningServiceError::Repository(inner) => match inner {
            RepositoryError::NotFound => StatusCode::NOT_FOUND,
            RepositoryError::Conflict => StatusCode::CONFLICT,
            RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    let body = Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobListQuery {
    status: Option<JobStatus>,
}

pub(crate) async fn create_job_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Json(draft): Json<JobDraft>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.create_job(draft) {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_jobs_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Query(query): Query<JobListQuery>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.list_jobs(query.status) {
        Ok(jobs) => Json(jobs).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_job_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.get_job(JobId(job_id)) {
        Ok(job) => Json(job).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_criterion_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
    Json(draft): Json<CriterionDraft>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.add_criterion(JobId(job_id), draft) {
        Ok(criterion) => (StatusCode::CREATED, Json(criterion)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_criterion_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path((job_id, criterion_id)): Path<(u64, u64)>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.remove_criterion(JobId(job_id), CriterionId(criterion_id)) {
        Ok(removed) => Json(removed).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activate_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.activate_job(JobId(job_id)) {
        Ok(job) => Json(job).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_candidate_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
    Json(draft): Json<CandidateDraft>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.add_candidate(JobId(job_id), draft) {
        Ok(candidate) => (StatusCode::CREATED, Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_candidates_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.candidates(JobId(job_id)) {
        Ok(candidates) => Json(candidates).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_candidate_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(candidate_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.delete_candidate(CandidateId(candidate_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn candidate_result_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(candidate_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.candidate_result(CandidateId(candidate_id)) {
        Ok(result) => Json(result).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn screen_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.process_all(JobId(job_id)).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.complete_job(JobId(job_id)) {
        Ok(job) => Json(job).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn archive_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.archive_job(JobId(job_id)) {
        Ok(job) => Json(job).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn results_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.results(JobId(job_id)) {
        Ok(results) => Json(results).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn longlist_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.longlist(JobId(job_id)) {
        Ok(results) => Json(results).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statistics_handler<R, O>(
    State(service): State<Arc<ScreeningService<R, O>>>,
    Path(job_id): Path<u64>,
) -> Response
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    match service.statistics(JobId(job_id)) {
        Ok(stats) => Json(stats).into_response(),
        Err(error) => error_response(error),
    }
}
