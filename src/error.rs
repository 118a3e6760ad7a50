//! Error types shared across the crate
//!
//! Module-specific errors (`ScheduleError`, `ConfigError`) live next to their
//! modules; this file holds the store error and the top-level `AppError`.

use serde::Serialize;

use crate::config::ConfigError;
use crate::schedule::ScheduleError;

/// ---------------------------------------------------------------------------
/// Store Errors
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Invalid backend URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("Backend returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("Failed to decode {what}: {reason}")]
  Decode { what: String, reason: String },
}

impl StoreError {
  pub fn decode(what: &str, reason: impl std::fmt::Display) -> Self {
    StoreError::Decode {
      what: what.to_string(),
      reason: reason.to_string(),
    }
  }
}

impl Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Application Errors
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("Configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("Store error: {0}")]
  Store(#[from] StoreError),

  #[error("Schedule error: {0}")]
  Schedule(#[from] ScheduleError),

  #[error("Output error: {0}")]
  Output(#[from] serde_json::Error),
}

impl Serialize for AppError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}
