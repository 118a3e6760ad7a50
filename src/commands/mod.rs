//! Operations the UI layer calls
//!
//! Commands own the "catch, log, degrade" policy: failures are logged here and
//! returned as display strings so the caller can keep its previous state.

pub mod analysis;
pub mod schedule;

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::store::{RestConfig, RestStore, SqliteStore, WorkoutHistoryStore};

pub struct AppState {
  pub store: Arc<dyn WorkoutHistoryStore>,
  pub horizon_months: u32,
  pub frequency_window_weeks: u32,
}

impl AppState {
  pub fn new(store: Arc<dyn WorkoutHistoryStore>, config: &AppConfig) -> Self {
    Self {
      store,
      horizon_months: config.horizon_months,
      frequency_window_weeks: config.frequency_window_weeks,
    }
  }

  /// Hosted backend when configured, local SQLite otherwise
  pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
    let store: Arc<dyn WorkoutHistoryStore> = match &config.rest {
      Some(rest) => {
        info!("Using hosted store at {}", rest.url);
        let rest_config = RestConfig::new(&rest.url, &rest.api_key, rest.access_token.as_deref())?;
        Arc::new(RestStore::new(rest_config))
      }
      None => Arc::new(SqliteStore::connect(&config.database_url).await?),
    };

    Ok(Self::new(store, config))
  }
}
