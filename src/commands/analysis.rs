use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::AppState;
use crate::analysis::{self as charts, WeeklyMuscleVolume};
use crate::models::analytics::ExerciseFrequency;
use crate::models::{ChartFilters, ChartMode, WeeklyDataPoint, WorkoutLog};

/// ---------------------------------------------------------------------------
/// Chart Commands
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
  pub mode: ChartMode,
  pub points: Vec<WeeklyDataPoint>,
  pub trend: f64,
  /// Exercise actually charted in strength mode
  pub exercise_name: Option<String>,
}

async fn load_workouts(state: &AppState, user_id: Uuid) -> Result<Vec<WorkoutLog>, String> {
  state.store.fetch_workouts(user_id).await.map_err(|e| {
    warn!("Failed to fetch workouts for {}: {}", user_id, e);
    format!("Failed to fetch workouts: {}", e)
  })
}

/// Weekly series for the chart. Strength mode without a picked exercise
/// charts the most frequently logged one.
pub async fn get_weekly_chart(
  state: &AppState,
  user_id: Uuid,
  mode: ChartMode,
  filters: ChartFilters,
) -> Result<ChartResponse, String> {
  let workouts = load_workouts(state, user_id).await?;
  Ok(build_chart(
    &workouts,
    mode,
    filters,
    Utc::now().date_naive(),
    state.frequency_window_weeks,
  ))
}

fn build_chart(
  workouts: &[WorkoutLog],
  mode: ChartMode,
  mut filters: ChartFilters,
  today: NaiveDate,
  window_weeks: u32,
) -> ChartResponse {
  if mode == ChartMode::Strength && filters.exercise_name.is_none() {
    filters.exercise_name = charts::most_frequent_exercise(workouts, &filters, today, window_weeks);
  }

  let points = charts::aggregate(workouts, mode, &filters);
  let trend = charts::trend(&points);

  ChartResponse {
    mode,
    points,
    trend,
    exercise_name: match mode {
      ChartMode::Strength => filters.exercise_name,
      ChartMode::Volume => None,
    },
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyResult {
  pub window_weeks: u32,
  pub exercises: Vec<ExerciseFrequency>,
}

pub async fn get_exercise_frequency(
  state: &AppState,
  user_id: Uuid,
  filters: ChartFilters,
) -> Result<FrequencyResult, String> {
  let workouts = load_workouts(state, user_id).await?;
  Ok(FrequencyResult {
    window_weeks: state.frequency_window_weeks,
    exercises: charts::exercise_frequency(
      &workouts,
      &filters,
      Utc::now().date_naive(),
      state.frequency_window_weeks,
    ),
  })
}

pub async fn get_muscle_breakdown(
  state: &AppState,
  user_id: Uuid,
  filters: ChartFilters,
) -> Result<Vec<WeeklyMuscleVolume>, String> {
  let workouts = load_workouts(state, user_id).await?;
  Ok(charts::weekly_muscle_volume(&workouts, &filters))
}

pub async fn get_available_exercises(
  state: &AppState,
  user_id: Uuid,
  filters: ChartFilters,
) -> Result<Vec<String>, String> {
  let workouts = load_workouts(state, user_id).await?;
  Ok(charts::available_exercises(&workouts, &filters))
}
