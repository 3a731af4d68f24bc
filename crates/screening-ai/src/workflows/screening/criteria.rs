//! Criteria model: each category shares a fixed point budget (30 education,
//! 70 experience) divided evenly among whatever criteria exist, so per-criterion
//! maxima are always computed at read time and never stored.

use crate::config::ScreeningConfig;

use super::domain::{Criterion, CriterionCategory, CriterionDraft, CriterionId, Job, JobStatus};
use super::errors::ScreeningError;

/// Maximum raw points a single criterion in `category` can contribute.
/// With no criteria present the whole budget would go to the first one.
pub fn per_criterion_max(job: &Job, category: CriterionCategory) -> f64 {
    let count = job.criteria(category).len();
    if count == 0 {
        return category.budget();
    }
    category.budget() / count as f64
}

pub(crate) fn add_criterion(
    job: &mut Job,
    id: CriterionId,
    draft: CriterionDraft,
    config: &ScreeningConfig,
    has_results: bool,
) -> Result<Criterion, ScreeningError> {
    ensure_editable(job, has_results)?;

    if draft.name.trim().is_empty() {
        return Err(ScreeningError::validation(
            job.id.to_string(),
            "criterion name must not be empty",
        ));
    }

    let category = draft.kind.category();
    match category {
        CriterionCategory::Education => {
            if let Some(max) = config.max_education_criteria {
                if job.education_criteria.len() >= max {
                    return Err(ScreeningError::validation(
                        job.id.to_string(),
                        format!("at most {max} education criteria are allowed"),
                    ));
                }
            }
        }
        CriterionCategory::Experience => {
            if job.experience_criteria.len() >= config.max_experience_criteria {
                return Err(ScreeningError::validation(
                    job.id.to_string(),
                    format!(
                        "at most {} experience criteria are allowed",
                        config.max_experience_criteria
                    ),
                ));
            }
        }
    }

    let criterion = Criterion {
        id,
        name: draft.name,
        description: draft.description,
        mandatory: draft.mandatory,
        kind: draft.kind,
    };
    job.criteria_mut(category).push(criterion.clone());
    Ok(criterion)
}

pub(crate) fn remove_criterion(
    job: &mut Job,
    id: CriterionId,
    has_results: bool,
) -> Result<Criterion, ScreeningError> {
    ensure_editable(job, has_results)?;

    for category in [CriterionCategory::Education, CriterionCategory::Experience] {
        let Some(position) = job
            .criteria(category)
            .iter()
            .position(|criterion| criterion.id == id)
        else {
            continue;
        };
        if job.criteria(category).len() == 1 {
            return Err(ScreeningError::validation(
                job.id.to_string(),
                format!("removing {id} would leave no {category} criteria"),
            ));
        }
        return Ok(job.criteria_mut(category).remove(position));
    }

    Err(ScreeningError::validation(
        job.id.to_string(),
        format!("{id} does not belong to this job"),
    ))
}

fn ensure_editable(job: &Job, has_results: bool) -> Result<(), ScreeningError> {
    match job.status {
        JobStatus::Draft | JobStatus::Active => {}
        JobStatus::Completed | JobStatus::Archived => {
            return Err(ScreeningError::ImmutableState {
                job: job.id,
                message: format!("criteria cannot change once the job is {}", job.status),
            });
        }
        JobStatus::Screening => {
            return Err(ScreeningError::validation(
                job.id.to_string(),
                "criteria may only change while the job is draft or active",
            ));
        }
    }

    if has_results {
        return Err(ScreeningError::validation(
            job.id.to_string(),
            "criteria are frozen once screening results exist",
        ));
    }

    Ok(())
}
