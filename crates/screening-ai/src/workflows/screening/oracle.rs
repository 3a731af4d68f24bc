use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::domain::{Candidate, CriterionId, Job};
use super::errors::ExtractionError;

/// Raw per-criterion score as returned by the external evaluator, already
/// scaled to that criterion's max. Out-of-range values are clamped (not
/// rejected) by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleScore {
    pub criterion_id: CriterionId,
    pub raw_score: f64,
    pub reasoning: String,
}

/// Full evaluator output for one (job, candidate) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleEvaluation {
    pub scores: Vec<OracleScore>,
    pub overall_reasoning: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub flags: Vec<String>,
    pub recommendations: String,
}

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),
    #[error("evaluator returned malformed output: {0}")]
    Malformed(String),
}

/// Contract for the external AI evaluator. Treated as non-deterministic,
/// slow, and unreliable; the service wraps every call in a timeout and a
/// bounded retry.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn evaluate(
        &self,
        job: &Job,
        candidate: &Candidate,
    ) -> Result<OracleEvaluation, OracleError>;
}

/// Boundary contract for the upstream document-to-text step. The core never
/// parses documents itself; implementations live with the callers.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, ExtractionError>;
}
