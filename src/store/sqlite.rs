//! Local SQLite implementation of the workout history store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::WorkoutHistoryStore;
use crate::db::{self, DbPool};
use crate::error::StoreError;
use crate::models::{
  decode_routine_data, InstanceStatus, InstanceStatusUpdate, NewRoutineInstance,
  NewScheduledRoutine, RecurrencePolicy, RoutineInstance, ScheduledRoutine, WorkoutLog,
};

pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
    Ok(Self::new(db::initialize_db(database_url).await?))
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  /// Persist a finished workout
  pub async fn insert_workout_log(&self, log: &WorkoutLog) -> Result<(), StoreError> {
    let exercises = serde_json::to_string(&log.exercises)
      .map_err(|e| StoreError::decode("workout exercises", e))?;

    sqlx::query(
      r#"
      INSERT INTO workout_logs (id, user_id, log_date, exercises)
      VALUES (?1, ?2, ?3, ?4)
      "#,
    )
    .bind(log.id.to_string())
    .bind(log.user_id.to_string())
    .bind(log.log_date)
    .bind(exercises)
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, StoreError> {
  Uuid::parse_str(value).map_err(|e| StoreError::decode(what, e))
}

fn workout_from_row(row: &SqliteRow) -> Result<WorkoutLog, StoreError> {
  let id: String = row.try_get("id")?;
  let user_id: String = row.try_get("user_id")?;
  let raw: Option<String> = row.try_get("exercises")?;

  // A corrupt payload only empties this workout
  let exercises = match raw {
    Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
      debug!("Workout {} has unparseable exercises: {}", id, e);
      serde_json::Value::Null
    }),
    None => serde_json::Value::Null,
  };

  Ok(WorkoutLog {
    id: parse_uuid(&id, "workout id")?,
    user_id: parse_uuid(&user_id, "workout user id")?,
    log_date: row.try_get("log_date")?,
    exercises,
  })
}

fn routine_from_row(row: &SqliteRow) -> Result<ScheduledRoutine, StoreError> {
  let id: String = row.try_get("id")?;
  let user_id: String = row.try_get("user_id")?;
  let raw_data: Option<String> = row.try_get("routine_data")?;
  let recurring: String = row.try_get("recurring")?;
  let end_date: Option<NaiveDate> = row.try_get("end_date")?;

  // A corrupt template only empties this routine's exercise list
  let routine_data = match raw_data {
    Some(text) => match serde_json::from_str(&text) {
      Ok(value) => decode_routine_data(value),
      Err(e) => {
        debug!("Routine {} has unparseable routine data: {}", id, e);
        Vec::new()
      }
    },
    None => Vec::new(),
  };

  Ok(ScheduledRoutine {
    id: parse_uuid(&id, "routine id")?,
    user_id: parse_uuid(&user_id, "routine user id")?,
    routine_name: row.try_get("routine_name")?,
    routine_data,
    day_of_week: row.try_get("day_of_week")?,
    scheduled_time: row.try_get::<NaiveTime, _>("scheduled_time")?,
    recurring: recurring
      .parse::<RecurrencePolicy>()
      .map_err(|e| StoreError::decode("recurrence policy", e))?,
    start_date: row.try_get("start_date")?,
    end_date,
    is_active: row.try_get("is_active")?,
  })
}

fn instance_from_row(row: &SqliteRow) -> Result<RoutineInstance, StoreError> {
  let id: String = row.try_get("id")?;
  let routine_id: String = row.try_get("scheduled_routine_id")?;
  let status: String = row.try_get("status")?;
  let workout_log_id: Option<String> = row.try_get("workout_log_id")?;

  Ok(RoutineInstance {
    id: parse_uuid(&id, "instance id")?,
    scheduled_routine_id: parse_uuid(&routine_id, "instance routine id")?,
    scheduled_date: row.try_get("scheduled_date")?,
    scheduled_time: row.try_get("scheduled_time")?,
    status: status
      .parse::<InstanceStatus>()
      .map_err(|e| StoreError::decode("instance status", e))?,
    workout_log_id: workout_log_id
      .map(|s| parse_uuid(&s, "instance workout id"))
      .transpose()?,
    completed_at: row.try_get::<Option<DateTime<Utc>>, _>("completed_at")?,
  })
}

#[async_trait]
impl WorkoutHistoryStore for SqliteStore {
  async fn fetch_workouts(&self, user_id: Uuid) -> Result<Vec<WorkoutLog>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT id, user_id, log_date, exercises
      FROM workout_logs
      WHERE user_id = ?1
      ORDER BY log_date ASC
      "#,
    )
    .bind(user_id.to_string())
    .fetch_all(&self.pool)
    .await?;

    rows.iter().map(workout_from_row).collect()
  }

  async fn fetch_scheduled_routines(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<ScheduledRoutine>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT id, user_id, routine_name, routine_data, day_of_week, scheduled_time,
             recurring, start_date, end_date, is_active
      FROM scheduled_routines
      WHERE user_id = ?1 AND is_active = 1
      ORDER BY created_at, id
      "#,
    )
    .bind(user_id.to_string())
    .fetch_all(&self.pool)
    .await?;

    rows.iter().map(routine_from_row).collect()
  }

  async fn create_scheduled_routines(
    &self,
    routines: &[NewScheduledRoutine],
  ) -> Result<Vec<ScheduledRoutine>, StoreError> {
    let mut tx = self.pool.begin().await?;
    let mut created = Vec::with_capacity(routines.len());

    for routine in routines {
      let id = Uuid::new_v4();
      let routine_data = serde_json::to_string(&routine.routine_data)
        .map_err(|e| StoreError::decode("routine data", e))?;

      sqlx::query(
        r#"
        INSERT INTO scheduled_routines (
          id, user_id, routine_name, routine_data, day_of_week, scheduled_time,
          recurring, start_date, end_date, is_active
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
      )
      .bind(id.to_string())
      .bind(routine.user_id.to_string())
      .bind(&routine.routine_name)
      .bind(routine_data)
      .bind(&routine.day_of_week)
      .bind(routine.scheduled_time)
      .bind(routine.recurring.as_str())
      .bind(routine.start_date)
      .bind(routine.end_date)
      .bind(routine.is_active)
      .execute(&mut *tx)
      .await?;

      created.push(ScheduledRoutine {
        id,
        user_id: routine.user_id,
        routine_name: routine.routine_name.clone(),
        routine_data: routine.routine_data.clone(),
        day_of_week: routine.day_of_week.clone(),
        scheduled_time: routine.scheduled_time,
        recurring: routine.recurring,
        start_date: routine.start_date,
        end_date: routine.end_date,
        is_active: routine.is_active,
      });
    }

    tx.commit().await?;
    Ok(created)
  }

  async fn deactivate_scheduled_routine(&self, routine_id: Uuid) -> Result<(), StoreError> {
    sqlx::query("UPDATE scheduled_routines SET is_active = 0 WHERE id = ?1")
      .bind(routine_id.to_string())
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn fetch_routine_instances(
    &self,
    routine_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<RoutineInstance>, StoreError> {
    let rows = sqlx::query(
      r#"
      SELECT id, scheduled_routine_id, scheduled_date, scheduled_time, status,
             workout_log_id, completed_at
      FROM routine_instances
      WHERE scheduled_routine_id = ?1 AND scheduled_date >= ?2 AND scheduled_date <= ?3
      ORDER BY scheduled_date
      "#,
    )
    .bind(routine_id.to_string())
    .bind(from)
    .bind(to)
    .fetch_all(&self.pool)
    .await?;

    rows.iter().map(instance_from_row).collect()
  }

  async fn upsert_routine_instances(
    &self,
    instances: &[NewRoutineInstance],
  ) -> Result<u64, StoreError> {
    let mut tx = self.pool.begin().await?;
    let mut inserted = 0;

    for instance in instances {
      let result = sqlx::query(
        r#"
        INSERT INTO routine_instances (id, scheduled_routine_id, scheduled_date, scheduled_time, status)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(scheduled_routine_id, scheduled_date) DO NOTHING
        "#,
      )
      .bind(Uuid::new_v4().to_string())
      .bind(instance.scheduled_routine_id.to_string())
      .bind(instance.scheduled_date)
      .bind(instance.scheduled_time)
      .bind(instance.status.as_str())
      .execute(&mut *tx)
      .await?;

      inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
  }

  async fn update_instance_status(
    &self,
    instance_id: Uuid,
    update: &InstanceStatusUpdate,
  ) -> Result<bool, StoreError> {
    if !InstanceStatus::Pending.can_transition_to(update.status) {
      return Ok(false);
    }

    let result = sqlx::query(
      r#"
      UPDATE routine_instances
      SET status = ?1, workout_log_id = ?2, completed_at = ?3
      WHERE id = ?4 AND status = 'pending'
      "#,
    )
    .bind(update.status.as_str())
    .bind(update.workout_log_id.map(|id| id.to_string()))
    .bind(update.completed_at)
    .bind(instance_id.to_string())
    .execute(&self.pool)
    .await?;

    Ok(result.rows_affected() > 0)
  }
}
