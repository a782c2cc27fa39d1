use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::domain::clock::{OffsetClock, DEFAULT_UTC_OFFSET_MINUTES};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("BUSINESS_UTC_OFFSET_MINUTES out of range: {0}")]
    InvalidOffset(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub utc_offset_minutes: i32,
    pub check_timeout: Duration,
    pub request_timeout: Duration,
    pub submit_unlock_after: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            check_timeout: Duration::from_millis(8_000),
            request_timeout: Duration::from_millis(15_000),
            submit_unlock_after: Duration::from_millis(5_000),
        }
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("ORDER_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let utc_offset_minutes = parse_or(
            &lookup,
            "BUSINESS_UTC_OFFSET_MINUTES",
            defaults.utc_offset_minutes,
        )?;
        if OffsetClock::from_minutes(utc_offset_minutes).is_none() {
            return Err(ConfigError::InvalidOffset(utc_offset_minutes));
        }

        Ok(Self {
            api_url,
            utc_offset_minutes,
            check_timeout: millis_or(&lookup, "AVAILABILITY_CHECK_TIMEOUT_MS", defaults.check_timeout)?,
            request_timeout: millis_or(&lookup, "REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            submit_unlock_after: millis_or(
                &lookup,
                "SUBMIT_UNLOCK_AFTER_MS",
                defaults.submit_unlock_after,
            )?,
        })
    }

    pub fn clock(&self) -> OffsetClock {
        OffsetClock::from_minutes(self.utc_offset_minutes).unwrap_or_default()
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, name, default.as_millis() as u64).map(Duration::from_millis)
}
