//! Workout History Store
//!
//! The system of record for workouts, scheduled routines and their dated
//! instances. The analytics and scheduling code only talks to this trait.

pub mod rest;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
  InstanceStatusUpdate, NewRoutineInstance, NewScheduledRoutine, RoutineInstance, ScheduledRoutine,
  WorkoutLog,
};

pub use rest::{RestConfig, RestStore};
pub use sqlite::SqliteStore;

#[async_trait]
pub trait WorkoutHistoryStore: Send + Sync {
  /// All workouts of a user, ordered by log date ascending
  async fn fetch_workouts(&self, user_id: Uuid) -> Result<Vec<WorkoutLog>, StoreError>;

  /// Active scheduled routines of a user
  async fn fetch_scheduled_routines(&self, user_id: Uuid)
    -> Result<Vec<ScheduledRoutine>, StoreError>;

  async fn create_scheduled_routines(
    &self,
    routines: &[NewScheduledRoutine],
  ) -> Result<Vec<ScheduledRoutine>, StoreError>;

  /// Stop future generation; existing instances are kept
  async fn deactivate_scheduled_routine(&self, routine_id: Uuid) -> Result<(), StoreError>;

  /// Instances of one routine dated within `[from, to]`
  async fn fetch_routine_instances(
    &self,
    routine_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<RoutineInstance>, StoreError>;

  /// Insert instances, silently skipping any `(scheduled_routine_id, scheduled_date)`
  /// pair that already exists. Returns the number of rows actually inserted.
  async fn upsert_routine_instances(
    &self,
    instances: &[NewRoutineInstance],
  ) -> Result<u64, StoreError>;

  /// Apply a status change to a pending instance. Returns false when the
  /// instance does not exist or has already left `pending`.
  async fn update_instance_status(
    &self,
    instance_id: Uuid,
    update: &InstanceStatusUpdate,
  ) -> Result<bool, StoreError>;
}
