use std::env;
use std::path::PathBuf;

use crate::engine::failure::DEFAULT_FAILURE_RATE;
use crate::error::AppError;
use crate::models::availability::AvailabilitySeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub accept_failure_rate: f64,
    pub rng_seed: Option<u64>,
    pub scenario_delay_ms: u64,
    pub availability_seed_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            accept_failure_rate: DEFAULT_FAILURE_RATE,
            rng_seed: None,
            scenario_delay_ms: 500,
            availability_seed_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let accept_failure_rate =
            parse_or_default("ACCEPT_FAILURE_RATE", defaults.accept_failure_rate)?;
        if !(0.0..=1.0).contains(&accept_failure_rate) {
            return Err(AppError::Config(format!(
                "ACCEPT_FAILURE_RATE must be within [0, 1], got {accept_failure_rate}"
            )));
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or_default("LOG_FORMAT", defaults.log_format)?,
            accept_failure_rate,
            rng_seed: parse_optional("RNG_SEED")?,
            scenario_delay_ms: parse_or_default("SCENARIO_DELAY_MS", defaults.scenario_delay_ms)?,
            availability_seed_file: env::var("AVAILABILITY_SEED_FILE").ok().map(PathBuf::from),
        })
    }

    /// Availability from `AVAILABILITY_SEED_FILE`, or the demo data when unset.
    pub fn load_availability(&self) -> Result<AvailabilitySeed, AppError> {
        let Some(path) = &self.availability_seed_file else {
            return Ok(AvailabilitySeed::demo());
        };

        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::Config(format!("failed to read {}: {err}", path.display()))
        })?;

        AvailabilitySeed::from_json_str(&raw)
            .map_err(|err| AppError::Config(format!("invalid seed file {}: {err}", path.display())))
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(key)?.unwrap_or(default))
}

fn parse_optional<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(None),
    }
}
