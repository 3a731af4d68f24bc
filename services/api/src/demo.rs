use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;

use screening_ai::config::ScreeningConfig;
use screening_ai::error::AppError;
use screening_ai::workflows::screening::{
    CandidateDraft, CriterionDraft, CriterionKind, Gender, GradeLevel, JobDraft,
    ScreeningStatistics,
};

use crate::infra::{build_screening_service, parse_grade};

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// CSV roster of candidates. Omit to screen a built-in sample roster.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Title of the posting being screened
    #[arg(long, default_value = "Senior Policy Officer")]
    pub(crate) title: String,
    /// Grade level (P1-P6, D1, D2), which sets the cutoff
    #[arg(long, default_value = "P3", value_parser = parse_grade)]
    pub(crate) grade: GradeLevel,
    /// Print every ranked candidate instead of only the longlist
    #[arg(long)]
    pub(crate) all: bool,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    full_name: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    nationality: Option<String>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    has_disability: bool,
    cv_text: String,
}

impl RosterRow {
    fn into_draft(self) -> CandidateDraft {
        let gender = match self.gender.trim().to_lowercase().as_str() {
            "female" | "f" => Gender::Female,
            "male" | "m" => Gender::Male,
            "other" => Gender::Other,
            _ => Gender::Unspecified,
        };
        CandidateDraft {
            full_name: self.full_name,
            gender,
            nationality: self.nationality,
            age: self.age,
            has_disability: self.has_disability,
            cv_filename: None,
            cv_text: self.cv_text,
        }
    }
}

fn load_roster(path: &PathBuf) -> Result<Vec<CandidateDraft>, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut drafts = Vec::new();
    for row in reader.deserialize::<RosterRow>() {
        drafts.push(row.map_err(csv_error)?.into_draft());
    }
    Ok(drafts)
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
}

fn sample_roster() -> Vec<CandidateDraft> {
    let rows = [
        ("Naledi Mokoena", Gender::Female, Some("Lesotho"), Some(32), false,
         "Masters degree in public policy. Nine years of regional programme management and donor coordination across southern Africa."),
        ("Kwame Mensah", Gender::Male, Some("Ghana"), Some(41), false,
         "Doctorate in economics. Programme management for trade policy initiatives, with budget oversight experience."),
        ("Awa Diallo", Gender::Female, Some("Senegal"), Some(37), true,
         "Masters degree in international relations. Seven years coordinating member-state policy consultations."),
        ("Tesfaye Lemma", Gender::Male, Some("Ethiopia"), Some(52), false,
         "Bachelors degree. Two years of administrative support."),
    ];
    rows.into_iter()
        .map(|(name, gender, nationality, age, has_disability, cv)| CandidateDraft {
            full_name: name.to_string(),
            gender,
            nationality: nationality.map(str::to_string),
            age,
            has_disability,
            cv_filename: None,
            cv_text: cv.to_string(),
        })
        .collect()
}

fn default_criteria() -> Vec<CriterionDraft> {
    vec![
        CriterionDraft {
            name: "masters degree or higher in a relevant field".to_string(),
            description: "public policy, economics, international relations".to_string(),
            mandatory: true,
            kind: CriterionKind::Education,
        },
        CriterionDraft {
            name: "programme management experience".to_string(),
            description: "managing multi-country programmes and budgets".to_string(),
            mandatory: true,
            kind: CriterionKind::Experience { years_required: 7 },
        },
        CriterionDraft {
            name: "policy coordination with member states".to_string(),
            description: "consultations, donor coordination, regional bodies".to_string(),
            mandatory: false,
            kind: CriterionKind::Experience { years_required: 5 },
        },
    ]
}

pub(crate) async fn run_screening_demo(args: ScreenArgs) -> Result<(), AppError> {
    let ScreenArgs {
        roster,
        title,
        grade,
        all,
    } = args;

    let service = build_screening_service(ScreeningConfig::default());

    let job = service.create_job(JobDraft {
        title: title.clone(),
        reference_number: None,
        department: None,
        duty_station: None,
        grade_level: grade,
        description: None,
        raw_jd_text: None,
    })?;
    for criterion in default_criteria() {
        service.add_criterion(job.id, criterion)?;
    }
    service.activate_job(job.id)?;

    let drafts = match roster {
        Some(path) => load_roster(&path)?,
        None => sample_roster(),
    };
    let candidate_count = drafts.len();
    for draft in drafts {
        service.add_candidate(job.id, draft)?;
    }

    println!("Screening '{title}' ({grade}) with {candidate_count} candidates");
    println!("Cutoff: {:.0} points\n", grade.cutoff_threshold());

    let report = service.process_all(job.id).await?;

    let results = service.results(job.id)?;
    let names: std::collections::HashMap<_, _> = service
        .candidates(job.id)?
        .into_iter()
        .map(|candidate| (candidate.id, candidate.full_name))
        .collect();

    println!(
        "{:<5} {:<24} {:>6} {:>6} {:>6} {:>7}  {:<8} {:<9}",
        "Rank", "Candidate", "Edu", "Exp", "Bonus", "Final", "Cutoff", "Longlist"
    );
    for result in &results {
        if !all && !result.is_in_longlist {
            continue;
        }
        let name = names
            .get(&result.candidate_id)
            .map(String::as_str)
            .unwrap_or("(removed)");
        println!(
            "{:<5} {:<24} {:>6.1} {:>6.1} {:>6.1} {:>7.1}  {:<8} {:<9}",
            result.rank,
            name,
            result.education_total,
            result.experience_total,
            result.total_bonus,
            result.final_score,
            if result.passes_cutoff { "pass" } else { "fail" },
            if result.is_in_longlist { "yes" } else { "no" },
        );
    }

    if !report.failures.is_empty() {
        println!("\nNot scored:");
        for failure in &report.failures {
            println!("  {}: {}", failure.full_name, failure.reason);
        }
    }

    render_statistics(&service.statistics(job.id)?);
    Ok(())
}

fn render_statistics(stats: &ScreeningStatistics) {
    println!("\nStatistics");
    println!(
        "  candidates: {} total, {} scored, {} passing, {} on the longlist",
        stats.total_candidates, stats.scored_candidates, stats.passing_cutoff, stats.longlist_count
    );
    println!(
        "  gender: {} female, {} male, {} other, {} unspecified",
        stats.gender_distribution.female,
        stats.gender_distribution.male,
        stats.gender_distribution.other,
        stats.gender_distribution.unspecified
    );
    if let Some(scores) = &stats.scores {
        println!(
            "  final scores: lowest {:.1}, average {:.1}, highest {:.1}",
            scores.lowest, scores.average, scores.highest
        );
    }
}
