use std::collections::HashSet;

use crate::config::ScreeningConfig;

use super::domain::{BonusFacts, Candidate, Gender};

/// Read-only lookup supplying the bonus-eligibility facts for a candidate.
/// The aggregation engine never decides eligibility itself.
pub trait RosterProvider: Send + Sync {
    fn bonus_facts(&self, candidate: &Candidate) -> BonusFacts;
}

/// Default provider deriving eligibility from candidate attributes plus the
/// configured country list and age limit.
pub struct ConfigRoster {
    countries: HashSet<String>,
    age_limit: u32,
}

impl ConfigRoster {
    pub fn new(config: &ScreeningConfig) -> Self {
        Self {
            countries: config
                .least_represented_countries
                .iter()
                .map(|country| country.trim().to_ascii_lowercase())
                .collect(),
            age_limit: config.bonus_age_limit,
        }
    }
}

impl RosterProvider for ConfigRoster {
    fn bonus_facts(&self, candidate: &Candidate) -> BonusFacts {
        BonusFacts {
            female: candidate.gender == Gender::Female,
            within_age_limit: candidate.age.is_some_and(|age| age <= self.age_limit),
            least_represented_country: candidate
                .nationality
                .as_deref()
                .is_some_and(|nationality| {
                    self.countries
                        .contains(&nationality.trim().to_ascii_lowercase())
                }),
            inclusion: candidate.has_disability,
        }
    }
}
