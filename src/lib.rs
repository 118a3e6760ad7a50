pub mod analysis;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod muscles;
pub mod schedule;
pub mod store;

#[cfg(test)]
mod test_utils;

use tracing::{info, warn};

use commands::AppState;
use config::AppConfig;
use error::AppError;
use models::{ChartFilters, ChartMode};

pub async fn run() -> Result<(), AppError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let config = AppConfig::from_env()?;
  logging::init(&config.log_filter);

  let state = AppState::from_config(&config).await?;
  info!("Store ready");

  let Some(user_id) = config.user_id else {
    warn!("{} not set; nothing to refresh", config::USER_ID_VAR);
    return Ok(());
  };

  let inserted = commands::schedule::refresh_routine_instances(&state, user_id).await;
  info!("Routine refresh added {} instances", inserted);

  match commands::analysis::get_weekly_chart(
    &state,
    user_id,
    ChartMode::Volume,
    ChartFilters::default(),
  )
  .await
  {
    Ok(chart) => println!("{}", serde_json::to_string_pretty(&chart)?),
    Err(e) => warn!("Volume chart unavailable: {}", e),
  }

  Ok(())
}
