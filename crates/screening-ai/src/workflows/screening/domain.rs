use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for jobs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Identifier wrapper for candidates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CandidateId(pub u64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidate-{}", self.0)
    }
}

/// Identifier wrapper for evaluation criteria.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CriterionId(pub u64);

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "criterion-{}", self.0)
    }
}

/// Seniority classification of a posting. Determines the cutoff threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeLevel {
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    D1,
    D2,
}

impl GradeLevel {
    /// Minimum final score required to pass: 70 for P5 and above, 60 otherwise.
    pub const fn cutoff_threshold(self) -> f64 {
        match self {
            GradeLevel::P5 | GradeLevel::P6 | GradeLevel::D1 | GradeLevel::D2 => 70.0,
            GradeLevel::P1 | GradeLevel::P2 | GradeLevel::P3 | GradeLevel::P4 => 60.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            GradeLevel::P1 => "P1",
            GradeLevel::P2 => "P2",
            GradeLevel::P3 => "P3",
            GradeLevel::P4 => "P4",
            GradeLevel::P5 => "P5",
            GradeLevel::P6 => "P6",
            GradeLevel::D1 => "D1",
            GradeLevel::D2 => "D2",
        }
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status tracked throughout the screening workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    Screening,
    Completed,
    Archived,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Screening => "screening",
            JobStatus::Completed => "completed",
            JobStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Criterion category, carrying that category's fixed point budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionCategory {
    Education,
    Experience,
}

impl CriterionCategory {
    /// Aggregate budget shared evenly by all criteria in the category.
    pub const fn budget(self) -> f64 {
        match self {
            CriterionCategory::Education => 30.0,
            CriterionCategory::Experience => 70.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CriterionCategory::Education => "education",
            CriterionCategory::Experience => "experience",
        }
    }
}

impl fmt::Display for CriterionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Variant-specific payload of a criterion. Dispatch is by tag, the shared
/// base contract (id, name, description, mandatory) lives on [`Criterion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum CriterionKind {
    Education,
    Experience { years_required: u32 },
}

impl CriterionKind {
    pub const fn category(&self) -> CriterionCategory {
        match self {
            CriterionKind::Education => CriterionCategory::Education,
            CriterionKind::Experience { .. } => CriterionCategory::Experience,
        }
    }
}

/// A single evaluation criterion owned by exactly one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub description: String,
    pub mandatory: bool,
    #[serde(flatten)]
    pub kind: CriterionKind,
}

impl Criterion {
    pub fn category(&self) -> CriterionCategory {
        self.kind.category()
    }
}

/// Caller-supplied definition for a new criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(flatten)]
    pub kind: CriterionKind,
}

/// A job posting with its evaluation criteria and lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub reference_number: Option<String>,
    pub department: Option<String>,
    pub duty_station: Option<String>,
    pub grade_level: GradeLevel,
    pub description: Option<String>,
    pub raw_jd_text: Option<String>,
    pub status: JobStatus,
    pub education_criteria: Vec<Criterion>,
    pub experience_criteria: Vec<Criterion>,
    pub created_at: DateTime<Utc>,
    pub screened_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn cutoff_threshold(&self) -> f64 {
        self.grade_level.cutoff_threshold()
    }

    pub fn criteria(&self, category: CriterionCategory) -> &[Criterion] {
        match category {
            CriterionCategory::Education => &self.education_criteria,
            CriterionCategory::Experience => &self.experience_criteria,
        }
    }

    pub(crate) fn criteria_mut(&mut self, category: CriterionCategory) -> &mut Vec<Criterion> {
        match category {
            CriterionCategory::Education => &mut self.education_criteria,
            CriterionCategory::Experience => &mut self.experience_criteria,
        }
    }

    pub fn criterion(&self, id: CriterionId) -> Option<&Criterion> {
        self.education_criteria
            .iter()
            .chain(self.experience_criteria.iter())
            .find(|criterion| criterion.id == id)
    }
}

/// Caller-supplied fields for a new job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub duty_station: Option<String>,
    pub grade_level: GradeLevel,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub raw_jd_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
    #[default]
    Unspecified,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
            Gender::Unspecified => "unspecified",
        }
    }
}

/// An applicant attached to exactly one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub job_id: JobId,
    pub full_name: String,
    pub gender: Gender,
    pub nationality: Option<String>,
    pub age: Option<u32>,
    pub has_disability: bool,
    pub cv_filename: Option<String>,
    pub cv_text: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDraft {
    pub full_name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub has_disability: bool,
    #[serde(default)]
    pub cv_filename: Option<String>,
    pub cv_text: String,
}

/// One scored criterion within a candidate's result, post-clamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub criterion_id: CriterionId,
    pub criterion_name: String,
    pub raw_score: f64,
    pub max_score: f64,
    pub reasoning: String,
}

/// Which of the four independent +N-point bonus rules fired for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusFacts {
    pub female: bool,
    pub within_age_limit: bool,
    pub least_represented_country: bool,
    pub inclusion: bool,
}

impl BonusFacts {
    pub fn active_count(&self) -> u32 {
        [
            self.female,
            self.within_age_limit,
            self.least_represented_country,
            self.inclusion,
        ]
        .into_iter()
        .filter(|flag| *flag)
        .count() as u32
    }
}

/// Aggregated outcome for one candidate, superseded wholesale on reprocess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub education_breakdown: Vec<ScoreBreakdown>,
    pub experience_breakdown: Vec<ScoreBreakdown>,
    pub education_total: f64,
    pub experience_total: f64,
    pub bonuses: BonusFacts,
    pub total_bonus: f64,
    pub final_score: f64,
    pub passes_cutoff: bool,
    /// 1-based, unique within the job, dense over successfully scored candidates.
    pub rank: u32,
    pub is_in_longlist: bool,
    pub overall_reasoning: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub flags: Vec<String>,
    pub recommendations: String,
    pub scored_at: DateTime<Utc>,
}
