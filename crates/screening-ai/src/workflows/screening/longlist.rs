//! Longlist selection and per-job screening statistics, both pure reads
//! over stored results.

use serde::Serialize;

use super::domain::{Candidate, Gender, ScreeningResult};

/// The cutoff-passing top of the ranking, ordered by rank ascending.
pub fn select_longlist(results: &[ScreeningResult]) -> Vec<ScreeningResult> {
    let mut selected: Vec<ScreeningResult> = results
        .iter()
        .filter(|result| result.is_in_longlist)
        .cloned()
        .collect();
    selected.sort_by_key(|result| result.rank);
    selected
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenderDistribution {
    pub female: usize,
    pub male: usize,
    pub other: usize,
    pub unspecified: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub lowest: f64,
    pub average: f64,
    pub highest: f64,
}

/// Snapshot consumed by dashboards and reports; never mutated by readers.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningStatistics {
    pub total_candidates: usize,
    pub scored_candidates: usize,
    pub passing_cutoff: usize,
    pub failing_cutoff: usize,
    pub longlist_count: usize,
    pub gender_distribution: GenderDistribution,
    pub least_represented_countries: usize,
    pub scores: Option<ScoreSummary>,
}

pub fn statistics(candidates: &[Candidate], results: &[ScreeningResult]) -> ScreeningStatistics {
    let mut genders = GenderDistribution::default();
    for candidate in candidates {
        match candidate.gender {
            Gender::Female => genders.female += 1,
            Gender::Male => genders.male += 1,
            Gender::Other => genders.other += 1,
            Gender::Unspecified => genders.unspecified += 1,
        }
    }

    let passing = results.iter().filter(|result| result.passes_cutoff).count();
    let scores = if results.is_empty() {
        None
    } else {
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for result in results {
            lowest = lowest.min(result.final_score);
            highest = highest.max(result.final_score);
            sum += result.final_score;
        }
        Some(ScoreSummary {
            lowest,
            average: sum / results.len() as f64,
            highest,
        })
    };

    ScreeningStatistics {
        total_candidates: candidates.len(),
        scored_candidates: results.len(),
        passing_cutoff: passing,
        failing_cutoff: results.len() - passing,
        longlist_count: results
            .iter()
            .filter(|result| result.is_in_longlist)
            .count(),
        gender_distribution: genders,
        least_represented_countries: results
            .iter()
            .filter(|result| result.bonuses.least_represented_country)
            .count(),
        scores,
    }
}
