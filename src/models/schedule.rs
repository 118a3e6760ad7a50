use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::analytics::PrimaryGroup;
use super::workout::{lenient_name, lenient_primary_group, lenient_string};

/// How long a scheduled routine keeps generating instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrencePolicy {
  #[serde(rename = "2-weeks")]
  TwoWeeks,
  #[serde(rename = "1-month")]
  OneMonth,
  #[serde(rename = "2-months")]
  TwoMonths,
  #[serde(rename = "3-months")]
  ThreeMonths,
  #[serde(rename = "6-months")]
  SixMonths,
  #[serde(rename = "indefinitely")]
  Indefinitely,
  #[serde(rename = "none")]
  None,
}

impl RecurrencePolicy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::TwoWeeks => "2-weeks",
      Self::OneMonth => "1-month",
      Self::TwoMonths => "2-months",
      Self::ThreeMonths => "3-months",
      Self::SixMonths => "6-months",
      Self::Indefinitely => "indefinitely",
      Self::None => "none",
    }
  }

  /// Last date of the recurrence, anchored at `anchor`. `None` means open-ended.
  pub fn end_date(&self, anchor: NaiveDate) -> Option<NaiveDate> {
    match self {
      Self::TwoWeeks => anchor.checked_add_days(chrono::Days::new(14)),
      Self::OneMonth => anchor.checked_add_months(Months::new(1)),
      Self::TwoMonths => anchor.checked_add_months(Months::new(2)),
      Self::ThreeMonths => anchor.checked_add_months(Months::new(3)),
      Self::SixMonths => anchor.checked_add_months(Months::new(6)),
      Self::Indefinitely | Self::None => None,
    }
  }
}

impl std::fmt::Display for RecurrencePolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for RecurrencePolicy {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "2-weeks" => Ok(Self::TwoWeeks),
      "1-month" => Ok(Self::OneMonth),
      "2-months" => Ok(Self::TwoMonths),
      "3-months" => Ok(Self::ThreeMonths),
      "6-months" => Ok(Self::SixMonths),
      "indefinitely" => Ok(Self::Indefinitely),
      "none" => Ok(Self::None),
      _ => Err(format!("Unknown recurrence policy: {}", s)),
    }
  }
}

/// One exercise of a routine template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineExercise {
  #[serde(default, deserialize_with = "lenient_name")]
  pub name: String,
  #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
  pub muscle_group: Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient_primary_group",
    skip_serializing_if = "Option::is_none"
  )]
  pub primary_group: Option<PrimaryGroup>,
  /// Older templates store the planned sets themselves rather than a count
  #[serde(default, deserialize_with = "lenient_set_count")]
  pub sets: u32,
  /// Free-form target such as "8-12"
  #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
  pub rep_range: Option<String>,
}

fn lenient_set_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
    Some(serde_json::Value::Array(sets)) => u32::try_from(sets.len()).unwrap_or(u32::MAX),
    _ => 0,
  })
}

/// Decode a routine template, skipping entries that are not exercise objects.
/// A template that is not an array reads as empty.
pub fn decode_routine_data(raw: serde_json::Value) -> Vec<RoutineExercise> {
  let serde_json::Value::Array(entries) = raw else {
    if !raw.is_null() {
      tracing::debug!("Ignoring routine data that is not a list");
    }
    return Vec::new();
  };
  entries
    .into_iter()
    .filter_map(|entry| match RoutineExercise::deserialize(entry) {
      Ok(exercise) => Some(exercise),
      Err(e) => {
        tracing::debug!("Skipping unrecognized routine exercise: {}", e);
        None
      }
    })
    .collect()
}

fn lenient_routine_data<'de, D>(deserializer: D) -> Result<Vec<RoutineExercise>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(value.map(decode_routine_data).unwrap_or_default())
}

/// A recurring workout template bound to one weekday
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledRoutine {
  pub id: Uuid,
  pub user_id: Uuid,
  pub routine_name: String,
  #[serde(default, deserialize_with = "lenient_routine_data")]
  pub routine_data: Vec<RoutineExercise>,
  /// English weekday name, e.g. "Monday"
  pub day_of_week: String,
  pub scheduled_time: NaiveTime,
  pub recurring: RecurrencePolicy,
  pub start_date: NaiveDate,
  pub end_date: Option<NaiveDate>,
  pub is_active: bool,
}

/// For inserting new scheduled routines (without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScheduledRoutine {
  pub user_id: Uuid,
  pub routine_name: String,
  pub routine_data: Vec<RoutineExercise>,
  pub day_of_week: String,
  pub scheduled_time: NaiveTime,
  pub recurring: RecurrencePolicy,
  pub start_date: NaiveDate,
  pub end_date: Option<NaiveDate>,
  pub is_active: bool,
}

// ---------------------------------------------------------------------------
/// Instance Status: pending until the user finishes or skips it
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
  #[default]
  Pending,
  Completed,
  Skipped,
}

impl InstanceStatus {
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Self::Pending)
  }

  pub fn can_transition_to(&self, next: InstanceStatus) -> bool {
    matches!(
      (self, next),
      (Self::Pending, Self::Completed) | (Self::Pending, Self::Skipped)
    )
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Completed => "completed",
      Self::Skipped => "skipped",
    }
  }
}

impl std::fmt::Display for InstanceStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for InstanceStatus {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "completed" => Ok(Self::Completed),
      "skipped" => Ok(Self::Skipped),
      _ => Err(format!("Unknown instance status: {}", s)),
    }
  }
}

/// A single dated occurrence of a scheduled routine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineInstance {
  pub id: Uuid,
  pub scheduled_routine_id: Uuid,
  pub scheduled_date: NaiveDate,
  pub scheduled_time: NaiveTime,
  pub status: InstanceStatus,
  pub workout_log_id: Option<Uuid>,
  pub completed_at: Option<DateTime<Utc>>,
}

/// For inserting new instances; unique on `(scheduled_routine_id, scheduled_date)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoutineInstance {
  pub scheduled_routine_id: Uuid,
  pub scheduled_date: NaiveDate,
  pub scheduled_time: NaiveTime,
  pub status: InstanceStatus,
}

impl NewRoutineInstance {
  pub fn key(&self) -> (Uuid, NaiveDate) {
    (self.scheduled_routine_id, self.scheduled_date)
  }
}

/// A status change to apply to a still-pending instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceStatusUpdate {
  pub status: InstanceStatus,
  pub workout_log_id: Option<Uuid>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl InstanceStatusUpdate {
  pub fn completed(workout_log_id: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      status: InstanceStatus::Completed,
      workout_log_id: Some(workout_log_id),
      completed_at: Some(at),
    }
  }

  pub fn skipped() -> Self {
    Self {
      status: InstanceStatus::Skipped,
      workout_log_id: None,
      completed_at: None,
    }
  }
}
