//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Store and app state fixtures
//! - Mock data factories
//! - Helper assertions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::commands::AppState;
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::models::{
  ExerciseRecord, InstanceStatusUpdate, NewRoutineInstance, NewScheduledRoutine, RecurrencePolicy,
  RoutineExercise, RoutineInstance, ScheduledRoutine, SetRecord, WorkoutLog,
};
use crate::store::{SqliteStore, WorkoutHistoryStore};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  crate::db::run_migrations(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Config pointing at an in-memory database with default tuning
pub fn test_config() -> AppConfig {
  AppConfig {
    database_url: "sqlite::memory:".to_string(),
    rest: None,
    user_id: None,
    horizon_months: 3,
    frequency_window_weeks: 8,
    log_filter: "info".to_string(),
  }
}

/// App state backed by a fresh SQLite store, plus a user id to work with.
/// The store handle is returned too so tests can seed and inspect it.
pub async fn setup_test_state() -> (AppState, Arc<SqliteStore>, Uuid) {
  let store = Arc::new(SqliteStore::new(setup_test_db().await));
  let state = AppState::new(store.clone(), &test_config());
  (state, store, Uuid::new_v4())
}

/// Insert workouts for `user_id`, overriding whatever user they were built with
pub async fn seed_workouts(store: &SqliteStore, user_id: Uuid, workouts: &[WorkoutLog]) {
  for workout in workouts {
    let mut log = workout.clone();
    log.user_id = user_id;
    store
      .insert_workout_log(&log)
      .await
      .expect("Failed to insert test workout");
  }
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_exercise(name: &str, muscle_group: Option<&str>, sets: Vec<SetRecord>) -> ExerciseRecord {
  ExerciseRecord {
    name: name.to_string(),
    muscle_group: muscle_group.map(str::to_string),
    sets,
    ..Default::default()
  }
}

/// Workout with the exercises stored as a bare array
pub fn mock_workout(date: NaiveDate, exercises: Vec<ExerciseRecord>) -> WorkoutLog {
  mock_workout_value(
    date,
    serde_json::to_value(exercises).expect("Failed to serialize exercises"),
  )
}

/// Workout with an arbitrary raw payload, for legacy and malformed shapes
pub fn mock_workout_value(date: NaiveDate, exercises: serde_json::Value) -> WorkoutLog {
  WorkoutLog {
    id: Uuid::new_v4(),
    user_id: Uuid::new_v4(),
    log_date: date,
    exercises,
  }
}

/// Push routine starting 2024-03-01 at 07:00 with the policy's end date
pub fn mock_new_routine(user_id: Uuid, day_of_week: &str, recurring: RecurrencePolicy) -> NewScheduledRoutine {
  let start_date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
  NewScheduledRoutine {
    user_id,
    routine_name: "Push A".to_string(),
    routine_data: vec![
      RoutineExercise {
        name: "Bench Press".to_string(),
        muscle_group: Some("Chest".to_string()),
        primary_group: None,
        sets: 4,
        rep_range: Some("6-8".to_string()),
      },
      RoutineExercise {
        name: "Overhead Press".to_string(),
        muscle_group: Some("Shoulders".to_string()),
        primary_group: None,
        sets: 3,
        rep_range: Some("8-10".to_string()),
      },
    ],
    day_of_week: day_of_week.to_string(),
    scheduled_time: NaiveTime::from_hms_opt(7, 0, 0).expect("valid time"),
    recurring,
    start_date,
    end_date: recurring.end_date(start_date),
    is_active: true,
  }
}

/// Persisted form of a planned routine, with a fresh id
pub fn mock_routine(planned: &NewScheduledRoutine) -> ScheduledRoutine {
  ScheduledRoutine {
    id: Uuid::new_v4(),
    user_id: planned.user_id,
    routine_name: planned.routine_name.clone(),
    routine_data: planned.routine_data.clone(),
    day_of_week: planned.day_of_week.clone(),
    scheduled_time: planned.scheduled_time,
    recurring: planned.recurring,
    start_date: planned.start_date,
    end_date: planned.end_date,
    is_active: planned.is_active,
  }
}

/// ---------------------------------------------------------------------------
/// Failing Store
/// ---------------------------------------------------------------------------

/// Store whose every call fails, for exercising degrade paths
pub struct FailingStore;

fn unavailable() -> StoreError {
  StoreError::Status {
    status: 503,
    body: "service unavailable".to_string(),
  }
}

#[async_trait]
impl WorkoutHistoryStore for FailingStore {
  async fn fetch_workouts(&self, _user_id: Uuid) -> Result<Vec<WorkoutLog>, StoreError> {
    Err(unavailable())
  }

  async fn fetch_scheduled_routines(
    &self,
    _user_id: Uuid,
  ) -> Result<Vec<ScheduledRoutine>, StoreError> {
    Err(unavailable())
  }

  async fn create_scheduled_routines(
    &self,
    _routines: &[NewScheduledRoutine],
  ) -> Result<Vec<ScheduledRoutine>, StoreError> {
    Err(unavailable())
  }

  async fn deactivate_scheduled_routine(&self, _routine_id: Uuid) -> Result<(), StoreError> {
    Err(unavailable())
  }

  async fn fetch_routine_instances(
    &self,
    _routine_id: Uuid,
    _from: NaiveDate,
    _to: NaiveDate,
  ) -> Result<Vec<RoutineInstance>, StoreError> {
    Err(unavailable())
  }

  async fn upsert_routine_instances(
    &self,
    _instances: &[NewRoutineInstance],
  ) -> Result<u64, StoreError> {
    Err(unavailable())
  }

  async fn update_instance_status(
    &self,
    _instance_id: Uuid,
    _update: &InstanceStatusUpdate,
  ) -> Result<bool, StoreError> {
    Err(unavailable())
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workout_logs', 'scheduled_routines', 'routine_instances')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 3, "Expected 3 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workouts_assigns_user() {
    let (_state, store, user_id) = setup_test_state().await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

    seed_workouts(
      &store,
      user_id,
      &[mock_workout(date, vec![mock_exercise("Squat", None, vec![SetRecord::new(100.0, 5)])])],
    )
    .await;

    let workouts = store.fetch_workouts(user_id).await.unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].user_id, user_id);
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let workout = mock_workout(
      date,
      vec![mock_exercise("Bench Press", Some("Chest"), vec![SetRecord::new(135.0, 10)])],
    );
    assert!(workout.exercises.is_array());
    assert_eq!(workout.exercises()[0].sets[0].tonnage(), 1350.0);

    let planned = mock_new_routine(Uuid::new_v4(), "Monday", RecurrencePolicy::TwoWeeks);
    assert_eq!(planned.end_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    let routine = mock_routine(&planned);
    assert_eq!(routine.routine_data.len(), 2);
    assert!(routine.is_active);
  }
}
