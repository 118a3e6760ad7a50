//! Environment configuration
//!
//! `.env` is loaded by `run()` before `AppConfig::from_env` reads the process
//! environment. Empty values count as unset.

use std::env;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::analysis::DEFAULT_FREQUENCY_WINDOW_WEEKS;
use crate::logging::DEFAULT_FILTER;
use crate::schedule::DEFAULT_HORIZON_MONTHS;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const DATABASE_URL_VAR: &str = "LIFTLOG_DATABASE_URL";
pub const REST_URL_VAR: &str = "LIFTLOG_REST_URL";
pub const REST_API_KEY_VAR: &str = "LIFTLOG_REST_API_KEY";
pub const REST_ACCESS_TOKEN_VAR: &str = "LIFTLOG_REST_ACCESS_TOKEN";
pub const USER_ID_VAR: &str = "LIFTLOG_USER_ID";
pub const HORIZON_MONTHS_VAR: &str = "LIFTLOG_SCHEDULE_HORIZON_MONTHS";
pub const FREQUENCY_WINDOW_VAR: &str = "LIFTLOG_FREQUENCY_WINDOW_WEEKS";
pub const LOG_VAR: &str = "LIFTLOG_LOG";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://liftlog.db?mode=rwc";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

impl Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Hosted backend credentials; present only when `LIFTLOG_REST_URL` is set
#[derive(Debug, Clone, PartialEq)]
pub struct RestSettings {
  pub url: String,
  pub api_key: String,
  pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_url: String,
  pub rest: Option<RestSettings>,
  pub user_id: Option<Uuid>,
  pub horizon_months: u32,
  pub frequency_window_weeks: u32,
  pub log_filter: String,
}

fn var(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
  match var(key) {
    Some(value) => value
      .parse()
      .map(Some)
      .map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value,
      }),
    None => Ok(None),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let rest = match var(REST_URL_VAR) {
      Some(url) => Some(RestSettings {
        url,
        api_key: var(REST_API_KEY_VAR)
          .ok_or_else(|| ConfigError::Missing(REST_API_KEY_VAR.into()))?,
        access_token: var(REST_ACCESS_TOKEN_VAR),
      }),
      None => None,
    };

    Ok(Self {
      database_url: var(DATABASE_URL_VAR).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
      rest,
      user_id: parsed(USER_ID_VAR)?,
      horizon_months: parsed(HORIZON_MONTHS_VAR)?.unwrap_or(DEFAULT_HORIZON_MONTHS),
      frequency_window_weeks: parsed(FREQUENCY_WINDOW_VAR)?
        .unwrap_or(DEFAULT_FREQUENCY_WINDOW_WEEKS),
      log_filter: var(LOG_VAR).unwrap_or_else(|| DEFAULT_FILTER.to_string()),
    })
  }
}
