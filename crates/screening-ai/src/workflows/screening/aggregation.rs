//! Aggregation engine: turns raw oracle output into a [`ScreeningResult`]
//! and assigns deterministic, dense, unique ranks across a job's candidates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::criteria::per_criterion_max;
use super::domain::{
    BonusFacts, Candidate, CandidateId, CriterionCategory, Job, ScoreBreakdown, ScreeningResult,
};
use super::errors::ScreeningError;
use super::oracle::{OracleEvaluation, OracleScore};

/// Combine one candidate's oracle evaluation with the roster facts into an
/// un-ranked result. Fails with `ScoringIncomplete` when a mandatory
/// criterion has no score; a missing optional criterion scores zero and is
/// flagged instead.
pub fn build_result(
    job: &Job,
    candidate: &Candidate,
    evaluation: &OracleEvaluation,
    facts: BonusFacts,
    bonus_points: f64,
) -> Result<ScreeningResult, ScreeningError> {
    let mut flags = evaluation.flags.clone();
    let by_criterion: HashMap<_, _> = evaluation
        .scores
        .iter()
        .map(|score| (score.criterion_id, score))
        .collect();

    let education_breakdown = score_category(
        job,
        candidate,
        CriterionCategory::Education,
        &by_criterion,
        &mut flags,
    )?;
    let experience_breakdown = score_category(
        job,
        candidate,
        CriterionCategory::Experience,
        &by_criterion,
        &mut flags,
    )?;

    let education_total: f64 = education_breakdown.iter().map(|entry| entry.raw_score).sum();
    let experience_total: f64 = experience_breakdown
        .iter()
        .map(|entry| entry.raw_score)
        .sum();
    let total_bonus = bonus_points * f64::from(facts.active_count());
    // Bonuses can push the final score past 100. Intentional, never capped.
    let final_score = education_total + experience_total + total_bonus;
    let passes_cutoff = final_score >= job.cutoff_threshold();

    Ok(ScreeningResult {
        job_id: job.id,
        candidate_id: candidate.id,
        education_breakdown,
        experience_breakdown,
        education_total,
        experience_total,
        bonuses: facts,
        total_bonus,
        final_score,
        passes_cutoff,
        rank: 0,
        is_in_longlist: false,
        overall_reasoning: evaluation.overall_reasoning.clone(),
        strengths: evaluation.strengths.clone(),
        weaknesses: evaluation.weaknesses.clone(),
        flags,
        recommendations: evaluation.recommendations.clone(),
        scored_at: Utc::now(),
    })
}

fn score_category(
    job: &Job,
    candidate: &Candidate,
    category: CriterionCategory,
    scores: &HashMap<super::domain::CriterionId, &OracleScore>,
    flags: &mut Vec<String>,
) -> Result<Vec<ScoreBreakdown>, ScreeningError> {
    let max = per_criterion_max(job, category);

    job.criteria(category)
        .iter()
        .map(|criterion| match scores.get(&criterion.id) {
            Some(score) => {
                let mut raw = score.raw_score;
                if !(0.0..=max).contains(&raw) {
                    flags.push(format!(
                        "score for '{}' clamped from {:.2} into [0, {:.2}]",
                        criterion.name, raw, max
                    ));
                    // clamp() propagates NaN, which would poison the totals.
                    raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, max) };
                }
                Ok(ScoreBreakdown {
                    criterion_id: criterion.id,
                    criterion_name: criterion.name.clone(),
                    raw_score: raw,
                    max_score: max,
                    reasoning: score.reasoning.clone(),
                })
            }
            None if criterion.mandatory => Err(ScreeningError::ScoringIncomplete {
                candidate: candidate.id,
                reason: format!(
                    "no score returned for mandatory {category} criterion '{}'",
                    criterion.name
                ),
            }),
            None => {
                flags.push(format!(
                    "no score returned for optional criterion '{}'",
                    criterion.name
                ));
                Ok(ScoreBreakdown {
                    criterion_id: criterion.id,
                    criterion_name: criterion.name.clone(),
                    raw_score: 0.0,
                    max_score: max,
                    reasoning: "not scored by the evaluator".to_string(),
                })
            }
        })
        .collect()
}

/// Sort results by final score descending and assign dense 1-based ranks.
/// Tie-breaks, in order: higher experience total, higher education total,
/// earlier candidate creation, lower candidate id. Every candidate ends up
/// with a unique rank even when all keys tie.
pub fn assign_ranks(
    results: &mut Vec<ScreeningResult>,
    created_at: &HashMap<CandidateId, DateTime<Utc>>,
    longlist_size: u32,
) {
    results.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| b.experience_total.total_cmp(&a.experience_total))
            .then_with(|| b.education_total.total_cmp(&a.education_total))
            .then_with(|| {
                created_at
                    .get(&a.candidate_id)
                    .cmp(&created_at.get(&b.candidate_id))
            })
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    for (index, result) in results.iter_mut().enumerate() {
        result.rank = index as u32 + 1;
        // A failing candidate is never longlisted, whatever its rank.
        result.is_in_longlist = result.passes_cutoff && result.rank <= longlist_size;
    }
}
