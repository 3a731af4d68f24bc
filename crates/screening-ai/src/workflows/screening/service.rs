use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::ScreeningConfig;

use super::aggregation::{assign_ranks, build_result};
use super::criteria;
use super::domain::{
    Candidate, CandidateDraft, CandidateId, Criterion, CriterionDraft, CriterionId, Job, JobDraft,
    JobId, JobStatus, ScreeningResult,
};
use super::errors::ScreeningError;
use super::lifecycle;
use super::longlist::{select_longlist, statistics, ScreeningStatistics};
use super::oracle::{OracleEvaluation, ScoringOracle, TextExtractor};
use super::repository::{JobOverview, RepositoryError, ScreeningRepository};
use super::roster::RosterProvider;

/// Service composing the repository, the scoring oracle, the text-extraction
/// boundary, and the roster lookup. All mutation of jobs, candidates, and
/// results goes through here.
pub struct ScreeningService<R, O> {
    repository: Arc<R>,
    oracle: Arc<O>,
    extractor: Arc<dyn TextExtractor>,
    roster: Arc<dyn RosterProvider>,
    config: ScreeningConfig,
    // Jobs with a bulk scoring run in flight. Guards both double-runs and
    // mutation of criteria/candidates mid-run.
    active_runs: Arc<Mutex<HashSet<JobId>>>,
    job_sequence: AtomicU64,
    candidate_sequence: AtomicU64,
    criterion_sequence: AtomicU64,
}

/// Error raised by the screening service.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Screening(#[from] ScreeningError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome of one bulk scoring run: independent per-candidate results, with
/// failures reported instead of aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub job_id: JobId,
    pub scored: Vec<ScreeningResult>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub reason: String,
}

/// One uploaded CV awaiting extraction.
#[derive(Debug, Clone)]
pub struct CvUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Per-file outcomes of a bulk CV upload.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub accepted: Vec<Candidate>,
    pub failures: Vec<IngestFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub filename: String,
    pub reason: String,
}

struct RunGuard {
    runs: Arc<Mutex<HashSet<JobId>>>,
    job: JobId,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // The lock must come free on success, failure, or cancellation.
        lock_runs(&self.runs).remove(&self.job);
    }
}

fn lock_runs(runs: &Mutex<HashSet<JobId>>) -> MutexGuard<'_, HashSet<JobId>> {
    runs.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R, O> ScreeningService<R, O>
where
    R: ScreeningRepository + 'static,
    O: ScoringOracle + 'static,
{
    pub fn new(
        repository: Arc<R>,
        oracle: Arc<O>,
        extractor: Arc<dyn TextExtractor>,
        roster: Arc<dyn RosterProvider>,
        config: ScreeningConfig,
    ) -> Self {
        Self {
            repository,
            oracle,
            extractor,
            roster,
            config,
            active_runs: Arc::new(Mutex::new(HashSet::new())),
            job_sequence: AtomicU64::new(1),
            candidate_sequence: AtomicU64::new(1),
            criterion_sequence: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.job_sequence.fetch_add(1, Ordering::Relaxed))
    }

    fn next_candidate_id(&self) -> CandidateId {
        CandidateId(self.candidate_sequence.fetch_add(1, Ordering::Relaxed))
    }

    fn next_criterion_id(&self) -> CriterionId {
        CriterionId(self.criterion_sequence.fetch_add(1, Ordering::Relaxed))
    }

    fn ensure_not_running(&self, job: JobId, action: &str) -> Result<(), ScreeningError> {
        if lock_runs(&self.active_runs).contains(&job) {
            return Err(ScreeningError::ImmutableState {
                job,
                message: format!("{action} is blocked while a scoring run is in flight"),
            });
        }
        Ok(())
    }

    fn begin_run(&self, job: JobId) -> Result<RunGuard, ScreeningError> {
        let mut runs = lock_runs(&self.active_runs);
        if !runs.insert(job) {
            return Err(ScreeningError::ProcessingInProgress { job });
        }
        Ok(RunGuard {
            runs: Arc::clone(&self.active_runs),
            job,
        })
    }

    fn job(&self, id: JobId) -> Result<Job, ScreeningServiceError> {
        Ok(self.repository.fetch_job(id)?.ok_or(RepositoryError::NotFound)?)
    }

    // ---- jobs ----

    pub fn create_job(&self, draft: JobDraft) -> Result<Job, ScreeningServiceError> {
        if draft.title.trim().is_empty() {
            return Err(ScreeningError::validation("job", "title must not be empty").into());
        }
        if let Some(reference) = draft.reference_number.as_deref() {
            if self.repository.reference_exists(reference)? {
                return Err(ScreeningError::validation(
                    "job",
                    format!("reference number '{reference}' is already taken"),
                )
                .into());
            }
        }

        let job = Job {
            id: self.next_job_id(),
            title: draft.title,
            reference_number: draft.reference_number,
            department: draft.department,
            duty_station: draft.duty_station,
            grade_level: draft.grade_level,
            description: draft.description,
            raw_jd_text: draft.raw_jd_text,
            status: JobStatus::Draft,
            education_criteria: Vec::new(),
            experience_criteria: Vec::new(),
            created_at: Utc::now(),
            screened_at: None,
        };
        Ok(self.repository.insert_job(job)?)
    }

    pub fn get_job(&self, id: JobId) -> Result<Job, ScreeningServiceError> {
        self.job(id)
    }

    pub fn list_jobs(
        &self,
        status: Option<JobStatus>,
    ) -> Result<Vec<JobOverview>, ScreeningServiceError> {
        self.repository
            .list_jobs(status)?
            .into_iter()
            .map(|job| {
                let count = self.repository.candidates_for_job(job.id)?.len();
                Ok(JobOverview::from_job(&job, count))
            })
            .collect()
    }

    pub fn activate_job(&self, id: JobId) -> Result<Job, ScreeningServiceError> {
        let mut job = self.job(id)?;
        lifecycle::advance(&mut job, JobStatus::Active)?;
        self.repository.update_job(&job)?;
        info!(job = %id, "job activated");
        Ok(job)
    }

    pub fn complete_job(&self, id: JobId) -> Result<Job, ScreeningServiceError> {
        self.ensure_not_running(id, "completion")?;
        let mut job = self.job(id)?;
        lifecycle::advance(&mut job, JobStatus::Completed)?;
        self.repository.update_job(&job)?;
        info!(job = %id, "screening completed");
        Ok(job)
    }

    pub fn archive_job(&self, id: JobId) -> Result<Job, ScreeningServiceError> {
        self.ensure_not_running(id, "archival")?;
        let mut job = self.job(id)?;
        lifecycle::advance(&mut job, JobStatus::Archived)?;
        self.repository.update_job(&job)?;
        info!(job = %id, "job archived");
        Ok(job)
    }

    // ---- criteria ----

    pub fn add_criterion(
        &self,
        job_id: JobId,
        draft: CriterionDraft,
    ) -> Result<Criterion, ScreeningServiceError> {
        self.ensure_not_running(job_id, "criteria edit")?;
        let mut job = self.job(job_id)?;
        let has_results = self.repository.has_results(job_id)?;
        let criterion = criteria::add_criterion(
            &mut job,
            self.next_criterion_id(),
            draft,
            &self.config,
            has_results,
        )?;
        self.repository.update_job(&job)?;
        Ok(criterion)
    }

    pub fn remove_criterion(
        &self,
        job_id: JobId,
        criterion_id: CriterionId,
    ) -> Result<Criterion, ScreeningServiceError> {
        self.ensure_not_running(job_id, "criteria edit")?;
        let mut job = self.job(job_id)?;
        let has_results = self.repository.has_results(job_id)?;
        let removed = criteria::remove_criterion(&mut job, criterion_id, has_results)?;
        self.repository.update_job(&job)?;
        Ok(removed)
    }

    // ---- candidates ----

    pub fn add_candidate(
        &self,
        job_id: JobId,
        draft: CandidateDraft,
    ) -> Result<Candidate, ScreeningServiceError> {
        self.ensure_not_running(job_id, "candidate intake")?;
        let job = self.job(job_id)?;
        match job.status {
            JobStatus::Draft | JobStatus::Active | JobStatus::Screening => {}
            JobStatus::Completed | JobStatus::Archived => {
                return Err(ScreeningError::ImmutableState {
                    job: job_id,
                    message: format!("{} jobs no longer accept candidates", job.status),
                }
                .into());
            }
        }
        if draft.full_name.trim().is_empty() {
            return Err(
                ScreeningError::validation(job_id.to_string(), "candidate name must not be empty")
                    .into(),
            );
        }
        // Empty CV text is rejected here, never passed to the oracle.
        if draft.cv_text.trim().is_empty() {
            return Err(ScreeningError::validation(
                job_id.to_string(),
                "candidate CV text must not be empty",
            )
            .into());
        }

        let candidate = Candidate {
            id: self.next_candidate_id(),
            job_id,
            full_name: draft.full_name,
            gender: draft.gender,
            nationality: draft.nationality,
            age: draft.age,
            has_disability: draft.has_disability,
            cv_filename: draft.cv_filename,
            cv_text: draft.cv_text,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_candidate(candidate)?)
    }

    pub fn candidates(&self, job_id: JobId) -> Result<Vec<Candidate>, ScreeningServiceError> {
        self.job(job_id)?;
        Ok(self.repository.candidates_for_job(job_id)?)
    }

    pub fn delete_candidate(&self, id: CandidateId) -> Result<(), ScreeningServiceError> {
        let candidate = self
            .repository
            .fetch_candidate(id)?
            .ok_or(RepositoryError::NotFound)?;
        self.ensure_not_running(candidate.job_id, "candidate deletion")?;
        let job = self.job(candidate.job_id)?;
        if job.status == JobStatus::Completed {
            return Err(ScreeningError::ImmutableState {
                job: job.id,
                message: "candidates cannot be deleted once the job is completed".to_string(),
            }
            .into());
        }
        Ok(self.repository.delete_candidate(id)?)
    }

    /// Create one candidate from an uploaded file via the extraction boundary.
    /// The filename stem doubles as the initial candidate name.
    pub async fn ingest_cv(
        &self,
        job_id: JobId,
        upload: CvUpload,
    ) -> Result<Candidate, ScreeningServiceError> {
        let text = self
            .extractor
            .extract(&upload.bytes, &upload.filename)
            .await
            .map_err(ScreeningError::from)?;
        let full_name = upload
            .filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(upload.filename.as_str())
            .to_string();
        self.add_candidate(
            job_id,
            CandidateDraft {
                full_name,
                gender: Default::default(),
                nationality: None,
                age: None,
                has_disability: false,
                cv_filename: Some(upload.filename),
                cv_text: text,
            },
        )
    }

    /// Bulk upload: each file succeeds or fails on its own; only repository
    /// outages abort the loop.
    pub async fn ingest_cvs(
        &self,
        job_id: JobId,
        uploads: Vec<CvUpload>,
    ) -> Result<IngestReport, ScreeningServiceError> {
        let mut report = IngestReport {
            accepted: Vec::new(),
            failures: Vec::new(),
        };
        for upload in uploads {
            let filename = upload.filename.clone();
            match self.ingest_cv(job_id, upload).await {
                Ok(candidate) => report.accepted.push(candidate),
                Err(ScreeningServiceError::Screening(error)) => {
                    report.failures.push(IngestFailure {
                        filename,
                        reason: error.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }
        Ok(report)
    }

    // ---- bulk scoring ----

    /// Score every candidate of the job against its criteria, rank the
    /// successes, and store the results (superseding any previous run).
    /// Individual candidate failures are collected, not fatal.
    pub async fn process_all(&self, job_id: JobId) -> Result<BatchReport, ScreeningServiceError> {
        let _guard = self.begin_run(job_id)?;

        let mut job = self.job(job_id)?;
        match job.status {
            JobStatus::Active | JobStatus::Screening => {}
            other => {
                return Err(ScreeningError::InvalidState {
                    job: job_id,
                    from: other,
                    requested: JobStatus::Screening,
                }
                .into());
            }
        }
        if job.education_criteria.is_empty() || job.experience_criteria.is_empty() {
            return Err(ScreeningError::validation(
                job_id.to_string(),
                "scoring requires at least one criterion in each category",
            )
            .into());
        }
        let candidates = self.repository.candidates_for_job(job_id)?;
        if candidates.is_empty() {
            return Err(ScreeningError::validation(
                job_id.to_string(),
                "scoring requires at least one candidate",
            )
            .into());
        }

        info!(job = %job_id, candidates = candidates.len(), "starting bulk scoring run");

        let shared_job = Arc::new(job.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.oracle_concurrency.max(1)));
        let per_call = self.config.oracle_timeout();
        let attempts = self.config.oracle_attempts.max(1);

        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let job = Arc::clone(&shared_job);
            let oracle = Arc::clone(&self.oracle);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome =
                    evaluate_with_retry(oracle.as_ref(), &job, &candidate, per_call, attempts)
                        .await;
                (candidate, outcome)
            });
        }

        let mut created_at = HashMap::new();
        let mut scored = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (candidate, outcome) = match joined {
                Ok(pair) => pair,
                Err(error) => {
                    warn!(job = %job_id, "scoring task aborted: {error}");
                    continue;
                }
            };
            match outcome {
                Ok(evaluation) => {
                    let facts = self.roster.bonus_facts(&candidate);
                    match build_result(
                        &shared_job,
                        &candidate,
                        &evaluation,
                        facts,
                        self.config.bonus_points,
                    ) {
                        Ok(result) => {
                            created_at.insert(candidate.id, candidate.created_at);
                            scored.push(result);
                        }
                        Err(error) => failures.push(BatchFailure {
                            candidate_id: candidate.id,
                            full_name: candidate.full_name,
                            reason: error.to_string(),
                        }),
                    }
                }
                Err(reason) => {
                    let error = ScreeningError::ScoringIncomplete {
                        candidate: candidate.id,
                        reason,
                    };
                    warn!(job = %job_id, candidate = %candidate.id, "{error}");
                    failures.push(BatchFailure {
                        candidate_id: candidate.id,
                        full_name: candidate.full_name,
                        reason: error.to_string(),
                    });
                }
            }
        }

        assign_ranks(&mut scored, &created_at, self.config.longlist_size);
        self.repository.replace_results(job_id, scored.clone())?;

        // The job moves to screening even when some candidates failed.
        if job.status == JobStatus::Active {
            lifecycle::advance(&mut job, JobStatus::Screening)?;
        }
        job.screened_at = Some(Utc::now());
        self.repository.update_job(&job)?;

        info!(
            job = %job_id,
            scored = scored.len(),
            failed = failures.len(),
            "bulk scoring run finished"
        );

        Ok(BatchReport {
            job_id,
            scored,
            failures,
        })
    }

    // ---- reads ----

    pub fn results(&self, job_id: JobId) -> Result<Vec<ScreeningResult>, ScreeningServiceError> {
        self.job(job_id)?;
        let mut results = self.repository.results_for_job(job_id)?;
        results.sort_by_key(|result| result.rank);
        Ok(results)
    }

    pub fn longlist(&self, job_id: JobId) -> Result<Vec<ScreeningResult>, ScreeningServiceError> {
        self.job(job_id)?;
        let results = self.repository.results_for_job(job_id)?;
        Ok(select_longlist(&results))
    }

    pub fn statistics(
        &self,
        job_id: JobId,
    ) -> Result<ScreeningStatistics, ScreeningServiceError> {
        self.job(job_id)?;
        let candidates = self.repository.candidates_for_job(job_id)?;
        let results = self.repository.results_for_job(job_id)?;
        Ok(statistics(&candidates, &results))
    }

    pub fn candidate_result(
        &self,
        id: CandidateId,
    ) -> Result<ScreeningResult, ScreeningServiceError> {
        Ok(self
            .repository
            .result_for_candidate(id)?
            .ok_or(RepositoryError::NotFound)?)
    }
}

async fn evaluate_with_retry<O>(
    oracle: &O,
    job: &Job,
    candidate: &Candidate,
    per_call: Duration,
    attempts: u32,
) -> Result<OracleEvaluation, String>
where
    O: ScoringOracle + ?Sized,
{
    let mut last_failure = String::new();
    for attempt in 1..=attempts {
        match tokio::time::timeout(per_call, oracle.evaluate(job, candidate)).await {
            Ok(Ok(evaluation)) => return Ok(evaluation),
            Ok(Err(error)) => last_failure = error.to_string(),
            Err(_) => {
                last_failure = format!("evaluator call timed out after {}s", per_call.as_secs())
            }
        }
        if attempt < attempts {
            warn!(
                candidate = %candidate.id,
                attempt,
                "oracle attempt failed, retrying: {last_failure}"
            );
        }
    }
    Err(last_failure)
}
