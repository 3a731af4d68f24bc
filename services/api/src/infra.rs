use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use screening_ai::config::ScreeningConfig;
use screening_ai::workflows::screening::{
    per_criterion_max, Candidate, CandidateId, ConfigRoster, CriterionCategory, ExtractionError,
    GradeLevel, Job, JobId, JobStatus, OracleError, OracleEvaluation, OracleScore,
    RepositoryError, RosterProvider, ScoringOracle, ScreeningRepository, ScreeningResult,
    ScreeningService, TextExtractor,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryScreeningRepository {
    jobs: Mutex<HashMap<JobId, Job>>,
    candidates: Mutex<HashMap<CandidateId, Candidate>>,
    results: Mutex<HashMap<JobId, Vec<ScreeningResult>>>,
}

impl ScreeningRepository for InMemoryScreeningRepository {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id, job.clone());
        Ok(job)
    }

    fn update_job(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        if guard.contains_key(&job.id) {
            guard.insert(job.id, job.clone());
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        let mut jobs: Vec<Job> = guard
            .values()
            .filter(|job| status.is_none() || status == Some(job.status))
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.id);
        Ok(jobs)
    }

    fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        Ok(guard
            .values()
            .any(|job| job.reference_number.as_deref() == Some(reference)))
    }

    fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut guard = self.candidates.lock().expect("candidate mutex poisoned");
        if guard.contains_key(&candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    fn fetch_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("candidate mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn delete_candidate(&self, id: CandidateId) -> Result<(), RepositoryError> {
        let mut guard = self.candidates.lock().expect("candidate mutex poisoned");
        let removed = guard.remove(&id).ok_or(RepositoryError::NotFound)?;
        let mut results = self.results.lock().expect("result mutex poisoned");
        if let Some(stored) = results.get_mut(&removed.job_id) {
            stored.retain(|result| result.candidate_id != id);
        }
        Ok(())
    }

    fn candidates_for_job(&self, job: JobId) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.candidates.lock().expect("candidate mutex poisoned");
        let mut candidates: Vec<Candidate> = guard
            .values()
            .filter(|candidate| candidate.job_id == job)
            .cloned()
            .collect();
        candidates.sort_by_key(|candidate| candidate.id);
        Ok(candidates)
    }

    fn replace_results(
        &self,
        job: JobId,
        new_results: Vec<ScreeningResult>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.results.lock().expect("result mutex poisoned");
        guard.insert(job, new_results);
        Ok(())
    }

    fn results_for_job(&self, job: JobId) -> Result<Vec<ScreeningResult>, RepositoryError> {
        let guard = self.results.lock().expect("result mutex poisoned");
        Ok(guard.get(&job).cloned().unwrap_or_default())
    }

    fn result_for_candidate(
        &self,
        id: CandidateId,
    ) -> Result<Option<ScreeningResult>, RepositoryError> {
        let guard = self.results.lock().expect("result mutex poisoned");
        Ok(guard
            .values()
            .flatten()
            .find(|result| result.candidate_id == id)
            .cloned())
    }

    fn has_results(&self, job: JobId) -> Result<bool, RepositoryError> {
        let guard = self.results.lock().expect("result mutex poisoned");
        Ok(guard.get(&job).is_some_and(|stored| !stored.is_empty()))
    }
}

/// Offline evaluator scoring each criterion by lexical overlap between the
/// criterion wording and the CV text. Deterministic, so demo runs and local
/// deployments reproduce the same ranking every time.
pub(crate) struct KeywordOracle;

impl KeywordOracle {
    fn terms(criterion_text: &str) -> Vec<String> {
        criterion_text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.len() > 3)
            .map(|word| word.to_lowercase())
            .collect()
    }

    fn coverage(cv: &str, terms: &[String]) -> f64 {
        if terms.is_empty() {
            return 0.5;
        }
        let hits = terms.iter().filter(|term| cv.contains(term.as_str())).count();
        hits as f64 / terms.len() as f64
    }
}

#[async_trait]
impl ScoringOracle for KeywordOracle {
    async fn evaluate(
        &self,
        job: &Job,
        candidate: &Candidate,
    ) -> Result<OracleEvaluation, OracleError> {
        let cv = candidate.cv_text.to_lowercase();
        let mut scores = Vec::new();
        for category in [CriterionCategory::Education, CriterionCategory::Experience] {
            let max = per_criterion_max(job, category);
            for criterion in job.criteria(category) {
                let terms = Self::terms(&format!("{} {}", criterion.name, criterion.description));
                let coverage = Self::coverage(&cv, &terms);
                scores.push(OracleScore {
                    criterion_id: criterion.id,
                    raw_score: coverage * max,
                    reasoning: format!(
                        "CV covers {:.0}% of the wording of '{}'",
                        coverage * 100.0,
                        criterion.name
                    ),
                });
            }
        }
        Ok(OracleEvaluation {
            scores,
            overall_reasoning: "keyword coverage against the stated criteria".to_string(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            flags: Vec::new(),
            recommendations: String::new(),
        })
    }
}

/// Treats uploads as plain UTF-8 text. PDF and DOCX extraction sit behind the
/// same trait in deployments that carry those decoders.
pub(crate) struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, ExtractionError> {
        String::from_utf8(bytes.to_vec()).map_err(|_| ExtractionError {
            filename: filename.to_string(),
            message: "upload is not valid UTF-8 text".to_string(),
        })
    }
}

pub(crate) fn build_screening_service(
    config: ScreeningConfig,
) -> Arc<ScreeningService<InMemoryScreeningRepository, KeywordOracle>> {
    let roster: Arc<dyn RosterProvider> = Arc::new(ConfigRoster::new(&config));
    Arc::new(ScreeningService::new(
        Arc::new(InMemoryScreeningRepository::default()),
        Arc::new(KeywordOracle),
        Arc::new(PlainTextExtractor),
        roster,
        config,
    ))
}

pub(crate) fn parse_grade(raw: &str) -> Result<GradeLevel, String> {
    match raw.trim().to_uppercase().as_str() {
        "P1" => Ok(GradeLevel::P1),
        "P2" => Ok(GradeLevel::P2),
        "P3" => Ok(GradeLevel::P3),
        "P4" => Ok(GradeLevel::P4),
        "P5" => Ok(GradeLevel::P5),
        "P6" => Ok(GradeLevel::P6),
        "D1" => Ok(GradeLevel::D1),
        "D2" => Ok(GradeLevel::D2),
        other => Err(format!("unknown grade level '{other}', expected P1-P6, D1, or D2")),
    }
}
