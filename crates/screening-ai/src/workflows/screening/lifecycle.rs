//! Job lifecycle state machine: `draft -> active -> screening -> completed`,
//! with `archived` as a terminal dead-end reachable from any non-completed
//! state. No transition may be skipped.

use super::domain::{Job, JobStatus};
use super::errors::ScreeningError;

pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Draft, Active) | (Active, Screening) | (Screening, Completed) | (Draft, Archived) | (Active, Archived) | (Screening, Archived)
    )
}

/// Move a job to `requested`, enforcing the transition table plus the
/// activation guards (a title and at least one criterion per category).
pub fn advance(job: &mut Job, requested: JobStatus) -> Result<(), ScreeningError> {
    let invalid = || ScreeningError::InvalidState {
        job: job.id,
        from: job.status,
        requested,
    };

    if !can_transition(job.status, requested) {
        return Err(invalid());
    }

    if requested == JobStatus::Active {
        let has_criteria =
            !job.education_criteria.is_empty() && !job.experience_criteria.is_empty();
        if job.title.trim().is_empty() || !has_criteria {
            return Err(invalid());
        }
    }

    job.status = requested;
    Ok(())
}
