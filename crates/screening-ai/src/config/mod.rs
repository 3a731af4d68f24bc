use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub screening: ScreeningConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut screening = ScreeningConfig::default();
        if let Ok(raw) = env::var("SCREENING_ORACLE_CONCURRENCY") {
            screening.oracle_concurrency = raw
                .parse()
                .map_err(|_| ConfigError::InvalidScreeningSetting {
                    name: "SCREENING_ORACLE_CONCURRENCY",
                })?;
        }
        if let Ok(raw) = env::var("SCREENING_ORACLE_TIMEOUT_SECS") {
            screening.oracle_timeout_secs = raw
                .parse()
                .map_err(|_| ConfigError::InvalidScreeningSetting {
                    name: "SCREENING_ORACLE_TIMEOUT_SECS",
                })?;
        }
        if let Ok(raw) = env::var("SCREENING_LONGLIST_SIZE") {
            screening.longlist_size = raw
                .parse()
                .map_err(|_| ConfigError::InvalidScreeningSetting {
                    name: "SCREENING_LONGLIST_SIZE",
                })?;
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            screening,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for the screening pipeline.
///
/// The bonus-eligibility inputs (country list, age limit) are deliberately
/// configuration rather than code: the roster rules change per recruitment
/// round without a redeploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Maximum number of concurrent scoring-oracle calls per bulk run.
    pub oracle_concurrency: usize,
    /// Per-call timeout for a single oracle evaluation.
    pub oracle_timeout_secs: u64,
    /// Total attempts per candidate before the failure becomes permanent
    /// for the batch (initial call plus retries).
    pub oracle_attempts: u32,
    /// Number of top-ranked, cutoff-passing candidates in the longlist.
    pub longlist_size: u32,
    /// Points awarded per active bonus flag.
    pub bonus_points: f64,
    /// Inclusive age ceiling for the youth bonus.
    pub bonus_age_limit: u32,
    /// Nationalities eligible for the least-represented-country bonus.
    pub least_represented_countries: Vec<String>,
    /// Optional cap on education criteria; the model itself is unbounded.
    pub max_education_criteria: Option<usize>,
    /// Hard cap on experience criteria.
    pub max_experience_criteria: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            oracle_concurrency: 4,
            oracle_timeout_secs: 30,
            oracle_attempts: 2,
            longlist_size: 20,
            bonus_points: 5.0,
            bonus_age_limit: 35,
            least_represented_countries: default_least_represented_countries(),
            max_education_criteria: None,
            max_experience_criteria: 7,
        }
    }
}

impl ScreeningConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }
}

fn default_least_represented_countries() -> Vec<String> {
    [
        "Botswana",
        "Cabo Verde",
        "Central African Republic",
        "Chad",
        "Comoros",
        "Djibouti",
        "Equatorial Guinea",
        "Eritrea",
        "Eswatini",
        "Gabon",
        "Gambia",
        "Guinea-Bissau",
        "Lesotho",
        "Liberia",
        "Libya",
        "Madagascar",
        "Malawi",
        "Mauritania",
        "Mauritius",
        "Mozambique",
        "Namibia",
        "Niger",
        "Sao Tome and Principe",
        "Seychelles",
        "Sierra Leone",
        "Somalia",
        "South Sudan",
        "Togo",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidScreeningSetting { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidScreeningSetting { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidScreeningSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("SCREENING_ORACLE_CONCURRENCY");
        env::remove_var("SCREENING_ORACLE_TIMEOUT_SECS");
        env::remove_var("SCREENING_LONGLIST_SIZE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.screening.longlist_size, 20);
        assert_eq!(config.screening.oracle_attempts, 2);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn screening_overrides_are_applied() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_ORACLE_CONCURRENCY", "8");
        env::set_var("SCREENING_LONGLIST_SIZE", "10");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.screening.oracle_concurrency, 8);
        assert_eq!(config.screening.longlist_size, 10);
    }

    #[test]
    fn malformed_screening_override_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCREENING_ORACLE_TIMEOUT_SECS", "soon");
        let error = AppConfig::load().expect_err("timeout must be numeric");
        assert!(matches!(
            error,
            ConfigError::InvalidScreeningSetting {
                name: "SCREENING_ORACLE_TIMEOUT_SECS"
            }
        ));
    }

    #[test]
    fn default_bonus_inputs_are_sane() {
        let config = ScreeningConfig::default();
        assert_eq!(config.bonus_points, 5.0);
        assert_eq!(config.bonus_age_limit, 35);
        assert_eq!(config.max_experience_criteria, 7);
        assert!(config.max_education_criteria.is_none());
        assert!(!config.least_represented_countries.is_empty());
    }
}
