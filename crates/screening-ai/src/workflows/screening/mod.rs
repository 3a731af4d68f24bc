//! CV screening pipeline: criteria with shared point budgets, the job
//! lifecycle state machine, the scoring-oracle boundary, deterministic
//! aggregation/ranking, and longlist selection.

pub mod aggregation;
pub mod criteria;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod longlist;
pub mod oracle;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use criteria::per_criterion_max;
pub use domain::{
    BonusFacts, Candidate, CandidateDraft, CandidateId, Criterion, CriterionCategory,
    CriterionDraft, CriterionId, CriterionKind, Gender, GradeLevel, Job, JobDraft, JobId,
    JobStatus, ScoreBreakdown, ScreeningResult,
};
pub use errors::{ExtractionError, ScreeningError};
pub use longlist::{
    select_longlist, GenderDistribution, ScoreSummary, ScreeningStatistics,
};
pub use oracle::{OracleError, OracleEvaluation, OracleScore, ScoringOracle, TextExtractor};
pub use repository::{JobOverview, RepositoryError, ScreeningRepository};
pub use roster::{ConfigRoster, RosterProvider};
pub use router::screening_router;
pub use service::{
    BatchFailure, BatchReport, CvUpload, IngestFailure, IngestReport, ScreeningService,
    ScreeningServiceError,
};
