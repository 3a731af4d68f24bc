use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::domain::{
    Candidate, CandidateId, GradeLevel, Job, JobId, JobStatus, ScreeningResult,
};

/// Storage abstraction so the screening service can be exercised in
/// isolation. Results are always replaced wholesale per job; deleting a
/// candidate also drops its result.
pub trait ScreeningRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn update_job(&self, job: &Job) -> Result<(), RepositoryError>;
    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;
    fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>, RepositoryError>;
    fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError>;

    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError>;
    fn fetch_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn delete_candidate(&self, id: CandidateId) -> Result<(), RepositoryError>;
    fn candidates_for_job(&self, job: JobId) -> Result<Vec<Candidate>, RepositoryError>;

    fn replace_results(
        &self,
        job: JobId,
        results: Vec<ScreeningResult>,
    ) -> Result<(), RepositoryError>;
    fn results_for_job(&self, job: JobId) -> Result<Vec<ScreeningResult>, RepositoryError>;
    fn result_for_candidate(
        &self,
        id: CandidateId,
    ) -> Result<Option<ScreeningResult>, RepositoryError>;
    fn has_results(&self, job: JobId) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Listing view with the candidate count dashboards want.
#[derive(Debug, Clone, Serialize)]
pub struct JobOverview {
    pub id: JobId,
    pub title: String,
    pub reference_number: Option<String>,
    pub grade_level: GradeLevel,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub candidate_count: usize,
}

impl JobOverview {
    pub fn from_job(job: &Job, candidate_count: usize) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            reference_number: job.reference_number.clone(),
            grade_level: job.grade_level,
            status: job.status,
            created_at: job.created_at,
            candidate_count,
        }
    }
}
