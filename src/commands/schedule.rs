use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::models::{InstanceStatusUpdate, ScheduledRoutine};
use crate::schedule::{self, ScheduleRequest};

/// ---------------------------------------------------------------------------
/// Scheduling Commands
/// ---------------------------------------------------------------------------

/// Create one routine per selected weekday and fill its first instances
pub async fn schedule_routine(
  state: &AppState,
  request: ScheduleRequest,
) -> Result<Vec<ScheduledRoutine>, String> {
  schedule_routine_on(state, request, Utc::now().date_naive()).await
}

async fn schedule_routine_on(
  state: &AppState,
  request: ScheduleRequest,
  today: NaiveDate,
) -> Result<Vec<ScheduledRoutine>, String> {
  let planned = schedule::plan_scheduled_routines(&request, today).map_err(|e| {
    let e = AppError::from(e);
    warn!("Rejected schedule request '{}': {}", request.routine_name, e);
    e.to_string()
  })?;

  let created = state
    .store
    .create_scheduled_routines(&planned)
    .await
    .map_err(|e| {
      warn!("Failed to create scheduled routines: {}", e);
      format!("Failed to schedule routine: {}", e)
    })?;

  info!(
    "Scheduled '{}' on {} day(s)",
    request.routine_name,
    created.len()
  );
  refresh_routine_instances_on(state, request.user_id, today).await;

  Ok(created)
}

/// App-load refresh of the rolling instance window. Never fails: store errors
/// are logged and reported as zero new instances.
pub async fn refresh_routine_instances(state: &AppState, user_id: Uuid) -> u64 {
  refresh_routine_instances_on(state, user_id, Utc::now().date_naive()).await
}

async fn refresh_routine_instances_on(state: &AppState, user_id: Uuid, today: NaiveDate) -> u64 {
  match schedule::sync_routine_instances(state.store.as_ref(), user_id, today, state.horizon_months)
    .await
  {
    Ok(inserted) => inserted,
    Err(e) => {
      warn!("Failed to refresh routine instances for {}: {}", user_id, e);
      0
    }
  }
}

/// Link a finished workout to its instance. `Ok(false)` when the instance had
/// already left `pending`.
pub async fn complete_routine_instance(
  state: &AppState,
  instance_id: Uuid,
  workout_log_id: Uuid,
) -> Result<bool, String> {
  let update = InstanceStatusUpdate::completed(workout_log_id, Utc::now());
  state
    .store
    .update_instance_status(instance_id, &update)
    .await
    .map_err(|e| {
      warn!("Failed to complete instance {}: {}", instance_id, e);
      format!("Failed to complete routine instance: {}", e)
    })
}

pub async fn skip_routine_instance(state: &AppState, instance_id: Uuid) -> Result<bool, String> {
  state
    .store
    .update_instance_status(instance_id, &InstanceStatusUpdate::skipped())
    .await
    .map_err(|e| {
      warn!("Failed to skip instance {}: {}", instance_id, e);
      format!("Failed to skip routine instance: {}", e)
    })
}

/// Stop generating instances for a routine; history is kept
pub async fn unschedule_routine(state: &AppState, routine_id: Uuid) -> Result<(), String> {
  state
    .store
    .deactivate_scheduled_routine(routine_id)
    .await
    .map_err(|e| {
      warn!("Failed to deactivate routine {}: {}", routine_id, e);
      format!("Failed to unschedule routine: {}", e)
    })
}
