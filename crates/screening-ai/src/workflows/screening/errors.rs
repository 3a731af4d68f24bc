use thiserror::Error;

use super::domain::{CandidateId, JobId, JobStatus};

/// Upstream text extraction failed for one file. Attributed per file so a
/// bulk upload can keep going.
#[derive(Debug, Clone, Error)]
#[error("failed to extract text from '{filename}': {message}")]
pub struct ExtractionError {
    pub filename: String,
    pub message: String,
}

/// Failure taxonomy for the screening core. Every variant names the entity
/// it is attributable to; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum ScreeningError {
    /// Malformed or out-of-bound input. No state change; never retried.
    #[error("{entity}: {message}")]
    Validation { entity: String, message: String },
    /// Illegal lifecycle transition attempt. No state change.
    #[error("job {job} cannot move from {from} to {requested}")]
    InvalidState {
        job: JobId,
        from: JobStatus,
        requested: JobStatus,
    },
    /// Mutation attempted on frozen (completed or mid-scoring) data.
    #[error("job {job} is frozen: {message}")]
    ImmutableState { job: JobId, message: String },
    /// A second bulk scoring run was requested while one is in flight.
    #[error("a scoring run is already in flight for job {job}")]
    ProcessingInProgress { job: JobId },
    /// The oracle failed or timed out for one candidate within a batch. The
    /// candidate stays un-ranked until reprocessed; the batch continues.
    #[error("scoring incomplete for candidate {candidate}: {reason}")]
    ScoringIncomplete {
        candidate: CandidateId,
        reason: String,
    },
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl ScreeningError {
    pub(crate) fn validation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        ScreeningError::Validation {
            entity: entity.into(),
            message: message.into(),
        }
    }
}
