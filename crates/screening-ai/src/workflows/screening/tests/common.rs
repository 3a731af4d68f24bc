use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::ScreeningConfig;
use crate::workflows::screening::criteria::per_criterion_max;
use crate::workflows::screening::domain::{
    Candidate, CandidateDraft, CandidateId, Criterion, CriterionCategory, CriterionDraft,
    CriterionId, CriterionKind, Gender, GradeLevel, Job, JobDraft, JobId, JobStatus,
    ScreeningResult,
};
use crate::workflows::screening::errors::ExtractionError;
use crate::workflows::screening::oracle::{
    OracleError, OracleEvaluation, OracleScore, ScoringOracle, TextExtractor,
};
use crate::workflows::screening::repository::{RepositoryError, ScreeningRepository};
use crate::workflows::screening::roster::{ConfigRoster, RosterProvider};
use crate::workflows::screening::service::ScreeningService;

// ---- configuration ----

pub(super) fn test_config() -> ScreeningConfig {
    ScreeningConfig {
        oracle_concurrency: 3,
        oracle_timeout_secs: 30,
        oracle_attempts: 2,
        least_represented_countries: vec!["Eritrea".to_string(), "Lesotho".to_string()],
        ..ScreeningConfig::default()
    }
}

// ---- drafts ----

pub(super) fn job_draft(title: &str, grade: GradeLevel) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        reference_number: None,
        department: Some("Human Resources Management Directorate".to_string()),
        duty_station: Some("Addis Ababa".to_string()),
        grade_level: grade,
        description: None,
        raw_jd_text: None,
    }
}

pub(super) fn education(name: &str) -> CriterionDraft {
    CriterionDraft {
        name: name.to_string(),
        description: String::new(),
        mandatory: true,
        kind: CriterionKind::Education,
    }
}

pub(super) fn education_optional(name: &str) -> CriterionDraft {
    CriterionDraft {
        mandatory: false,
        ..education(name)
    }
}

pub(super) fn experience(name: &str, years_required: u32) -> CriterionDraft {
    CriterionDraft {
        name: name.to_string(),
        description: String::new(),
        mandatory: true,
        kind: CriterionKind::Experience { years_required },
    }
}

pub(super) fn candidate(name: &str) -> CandidateDraft {
    CandidateDraft {
        full_name: name.to_string(),
        gender: Gender::Unspecified,
        nationality: None,
        age: None,
        has_disability: false,
        cv_filename: None,
        cv_text: "Fifteen years of programme management across three regions.".to_string(),
    }
}

pub(super) fn diverse_candidate(
    name: &str,
    gender: Gender,
    nationality: &str,
    age: u32,
    has_disability: bool,
) -> CandidateDraft {
    CandidateDraft {
        gender,
        nationality: Some(nationality.to_string()),
        age: Some(age),
        has_disability,
        ..candidate(name)
    }
}

// ---- standalone domain fixtures (no service) ----

pub(super) fn fixture_job(education_count: usize, experience_count: usize) -> Job {
    let education_criteria = (1..=education_count as u64)
        .map(|id| fixture_criterion(id, CriterionKind::Education))
        .collect();
    let experience_criteria = (1..=experience_count as u64)
        .map(|id| fixture_criterion(100 + id, CriterionKind::Experience { years_required: 5 }))
        .collect();
    Job {
        id: JobId(1),
        title: "Senior Policy Officer".to_string(),
        reference_number: Some("AU/HRM/042".to_string()),
        department: None,
        duty_station: None,
        grade_level: GradeLevel::P3,
        description: None,
        raw_jd_text: None,
        status: JobStatus::Active,
        education_criteria,
        experience_criteria,
        created_at: Utc::now(),
        screened_at: None,
    }
}

pub(super) fn fixture_criterion(id: u64, kind: CriterionKind) -> Criterion {
    Criterion {
        id: CriterionId(id),
        name: format!("criterion {id}"),
        description: String::new(),
        mandatory: true,
        kind,
    }
}

pub(super) fn fixture_candidate(id: u64, job: JobId, name: &str) -> Candidate {
    Candidate {
        id: CandidateId(id),
        job_id: job,
        full_name: name.to_string(),
        gender: Gender::Unspecified,
        nationality: None,
        age: None,
        has_disability: false,
        cv_filename: None,
        cv_text: "CV text".to_string(),
        created_at: Utc::now(),
    }
}

// ---- scripted oracle ----

#[derive(Debug, Clone, Copy)]
pub(super) enum ScriptScore {
    /// Fraction of each criterion's max, 1.0 meaning a perfect score.
    Fraction(f64),
    /// Absolute raw points per criterion in the category.
    Raw(f64),
}

impl ScriptScore {
    fn raw_for(self, max: f64) -> f64 {
        match self {
            ScriptScore::Fraction(fraction) => fraction * max,
            ScriptScore::Raw(raw) => raw,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct CandidateScript {
    pub education: ScriptScore,
    pub experience: ScriptScore,
    /// Criterion names the oracle "forgets" to score.
    pub omit: Vec<&'static str>,
    /// Added on top of every scaled score; drives clamping tests.
    pub overshoot: f64,
}

impl Default for CandidateScript {
    fn default() -> Self {
        Self {
            education: ScriptScore::Fraction(1.0),
            experience: ScriptScore::Fraction(1.0),
            omit: Vec::new(),
            overshoot: 0.0,
        }
    }
}

impl CandidateScript {
    pub(super) fn fractions(education: f64, experience: f64) -> Self {
        Self {
            education: ScriptScore::Fraction(education),
            experience: ScriptScore::Fraction(experience),
            ..Self::default()
        }
    }

    pub(super) fn raw(education: f64, experience: f64) -> Self {
        Self {
            education: ScriptScore::Raw(education),
            experience: ScriptScore::Raw(experience),
            ..Self::default()
        }
    }
}

pub(super) fn scripted_evaluation(job: &Job, script: &CandidateScript) -> OracleEvaluation {
    let mut scores = Vec::new();
    for category in [CriterionCategory::Education, CriterionCategory::Experience] {
        let max = per_criterion_max(job, category);
        let base = match category {
            CriterionCategory::Education => script.education,
            CriterionCategory::Experience => script.experience,
        };
        for criterion in job.criteria(category) {
            if script.omit.contains(&criterion.name.as_str()) {
                continue;
            }
            scores.push(OracleScore {
                criterion_id: criterion.id,
                raw_score: base.raw_for(max) + script.overshoot,
                reasoning: format!("scripted score for '{}'", criterion.name),
            });
        }
    }
    OracleEvaluation {
        scores,
        overall_reasoning: "scripted evaluation".to_string(),
        strengths: vec!["broad regional exposure".to_string()],
        weaknesses: Vec::new(),
        flags: Vec::new(),
        recommendations: String::new(),
    }
}

/// Deterministic evaluator: per-candidate scripts keyed by full name, with
/// a shared fallback.
pub(super) struct ScriptedOracle {
    scripts: HashMap<String, CandidateScript>,
    fallback: CandidateScript,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub(super) fn uniform(fraction: f64) -> Self {
        Self {
            scripts: HashMap::new(),
            fallback: CandidateScript::fractions(fraction, fraction),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn with_script(mut self, name: &str, script: CandidateScript) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script_for(&self, name: &str) -> &CandidateScript {
        self.scripts.get(name).unwrap_or(&self.fallback)
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn evaluate(
        &self,
        job: &Job,
        candidate: &Candidate,
    ) -> Result<OracleEvaluation, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(scripted_evaluation(job, self.script_for(&candidate.full_name)))
    }
}

/// Fails every call for the listed names, scoring everyone else perfectly.
pub(super) struct FlakyOracle {
    inner: ScriptedOracle,
    fail_names: Vec<String>,
    pub failed_calls: Arc<AtomicUsize>,
}

impl FlakyOracle {
    pub(super) fn failing_for(names: &[&str]) -> Self {
        Self {
            inner: ScriptedOracle::uniform(1.0),
            fail_names: names.iter().map(|name| name.to_string()).collect(),
            failed_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ScoringOracle for FlakyOracle {
    async fn evaluate(
        &self,
        job: &Job,
        candidate: &Candidate,
    ) -> Result<OracleEvaluation, OracleError> {
        if self.fail_names.contains(&candidate.full_name) {
            self.failed_calls.fetch_add(1, Ordering::SeqCst);
            return Err(OracleError::Unavailable("scripted outage".to_string()));
        }
        self.inner.evaluate(job, candidate).await
    }
}

/// Never completes for the listed names; the service timeout must fire.
pub(super) struct StallingOracle {
    inner: ScriptedOracle,
    stall_names: Vec<String>,
}

impl StallingOracle {
    pub(super) fn stalling_for(names: &[&str]) -> Self {
        Self {
            inner: ScriptedOracle::uniform(1.0),
            stall_names: names.iter().map(|name| name.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ScoringOracle for StallingOracle {
    async fn evaluate(
        &self,
        job: &Job,
        candidate: &Candidate,
    ) -> Result<OracleEvaluation, OracleError> {
        if self.stall_names.contains(&candidate.full_name) {
            tokio::time::sleep(Duration::from_secs(86_400)).await;
        }
        self.inner.evaluate(job, candidate).await
    }
}

/// Blocks every evaluation on a semaphore the test releases explicitly, so
/// a run can be held in flight while assertions happen.
pub(super) struct GatedOracle {
    inner: ScriptedOracle,
    pub entered: Arc<AtomicUsize>,
    pub gate: Arc<tokio::sync::Semaphore>,
}

impl GatedOracle {
    pub(super) fn closed() -> Self {
        Self {
            inner: ScriptedOracle::uniform(1.0),
            entered: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(tokio::sync::Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl ScoringOracle for GatedOracle {
    async fn evaluate(
        &self,
        job: &Job,
        candidate: &Candidate,
    ) -> Result<OracleEvaluation, OracleError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| OracleError::Unavailable("gate closed".to_string()))?;
        self.inner.evaluate(job, candidate).await
    }
}

// ---- extraction ----

pub(super) struct Utf8Extractor;

#[async_trait]
impl TextExtractor for Utf8Extractor {
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
        String::from_utf8(bytes.to_vec()).map_err(|_| ExtractionError {
            filename: filename.to_string(),
            message: "file is not valid UTF-8".to_string(),
        })
    }
}

// ---- repository ----

#[derive(Default)]
pub(super) struct MemoryRepository {
    jobs: Mutex<HashMap<JobId, Job>>,
    candidates: Mutex<HashMap<CandidateId, Candidate>>,
    results: Mutex<HashMap<JobId, Vec<ScreeningResult>>>,
}

impl ScreeningRepository for MemoryRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut jobs = self.jobs.lock().expect("jobs mutex poisoned");
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn update_job(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().expect("jobs mutex poisoned");
        if !jobs.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let jobs = self.jobs.lock().expect("jobs mutex poisoned");
        Ok(jobs.get(&id).cloned())
    }

    fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>, RepositoryError> {
        let jobs = self.jobs.lock().expect("jobs mutex poisoned");
        let mut listed: Vec<Job> = jobs
            .values()
            .filter(|job| status.is_none() || status == Some(job.status))
            .cloned()
            .collect();
        listed.sort_by_key(|job| job.id);
        Ok(listed)
    }

    fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError> {
        let jobs = self.jobs.lock().expect("jobs mutex poisoned");
        Ok(jobs
            .values()
            .any(|job| job.reference_number.as_deref() == Some(reference)))
    }

    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut candidates = self.candidates.lock().expect("candidates mutex poisoned");
        if candidates.contains_key(&candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    fn fetch_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let candidates = self.candidates.lock().expect("candidates mutex poisoned");
        Ok(candidates.get(&id).cloned())
    }

    fn delete_candidate(&self, id: CandidateId) -> Result<(), RepositoryError> {
        let mut candidates = self.candidates.lock().expect("candidates mutex poisoned");
        let removed = candidates.remove(&id).ok_or(RepositoryError::NotFound)?;
        let mut results = self.results.lock().expect("results mutex poisoned");
        if let Some(job_results) = results.get_mut(&removed.job_id) {
            job_results.retain(|result| result.candidate_id != id);
        }
        Ok(())
    }

    fn candidates_for_job(&self, job: JobId) -> Result<Vec<Candidate>, RepositoryError> {
        let candidates = self.candidates.lock().expect("candidates mutex poisoned");
        let mut listed: Vec<Candidate> = candidates
            .values()
            .filter(|candidate| candidate.job_id == job)
            .cloned()
            .collect();
        listed.sort_by_key(|candidate| candidate.id);
        Ok(listed)
    }

    fn replace_results(
        &self,
        job: JobId,
        new_results: Vec<ScreeningResult>,
    ) -> Result<(), RepositoryError> {
        let mut results = self.results.lock().expect("results mutex poisoned");
        results.insert(job, new_results);
        Ok(())
    }

    fn results_for_job(&self, job: JobId) -> Result<Vec<ScreeningResult>, RepositoryError> {
        let results = self.results.lock().expect("results mutex poisoned");
        Ok(results.get(&job).cloned().unwrap_or_default())
    }

    fn result_for_candidate(
        &self,
        id: CandidateId,
    ) -> Result<Option<ScreeningResult>, RepositoryError> {
        let results = self.results.lock().expect("results mutex poisoned");
        Ok(results
            .values()
            .flatten()
            .find(|result| result.candidate_id == id)
            .cloned())
    }

    fn has_results(&self, job: JobId) -> Result<bool, RepositoryError> {
        let results = self.results.lock().expect("results mutex poisoned");
        Ok(results.get(&job).is_some_and(|stored| !stored.is_empty()))
    }
}

// ---- service assembly ----

pub(super) fn service_with<Oracle>(
    oracle: Oracle,
    config: ScreeningConfig,
) -> (
    Arc<ScreeningService<MemoryRepository, Oracle>>,
    Arc<MemoryRepository>,
)
where
    Oracle: ScoringOracle + 'static,
{
    let repository = Arc::new(MemoryRepository::default());
    let roster: Arc<dyn RosterProvider> = Arc::new(ConfigRoster::new(&config));
    let extractor: Arc<dyn TextExtractor> = Arc::new(Utf8Extractor);
    let service = Arc::new(ScreeningService::new(
        Arc::clone(&repository),
        Arc::new(oracle),
        extractor,
        roster,
        config,
    ));
    (service, repository)
}

pub(super) fn ready_job<Oracle>(
    service: &ScreeningService<MemoryRepository, Oracle>,
    grade: GradeLevel,
    education_count: usize,
    experience_count: usize,
) -> Job
where
    Oracle: ScoringOracle + 'static,
{
    let job = service
        .create_job(job_draft("Senior Policy Officer", grade))
        .expect("job creates");
    for index in 0..education_count {
        service
            .add_criterion(job.id, education(&format!("education {index}")))
            .expect("education criterion adds");
    }
    for index in 0..experience_count {
        service
            .add_criterion(job.id, experience(&format!("experience {index}"), 3))
            .expect("experience criterion adds");
    }
    service.activate_job(job.id).expect("job activates")
}
