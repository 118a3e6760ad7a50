use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::analytics::PrimaryGroup;

/// One logged workout as persisted by the history store.
///
/// `exercises` is kept as raw JSON: historical rows come in two shapes and are
/// only normalized when read through [`WorkoutLog::exercises`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutLog {
  pub id: Uuid,
  pub user_id: Uuid,
  pub log_date: NaiveDate,
  #[serde(default)]
  pub exercises: serde_json::Value,
}

impl WorkoutLog {
  pub fn exercises(&self) -> Vec<ExerciseRecord> {
    normalize_workout_payload(&self.exercises)
  }
}

/// One exercise performed in one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
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
  #[serde(default, deserialize_with = "lenient_bool")]
  pub is_cardio: bool,
  #[serde(default, deserialize_with = "lenient_sets")]
  pub sets: Vec<SetRecord>,
}

/// One set within an exercise. Weight and reps come from free-text inputs in
/// older rows, so both numbers and numeric strings are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetRecord {
  #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
  pub weight: Option<f64>,
  #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
  pub reps: Option<u32>,
  #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
  pub distance: Option<f64>,
  #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
  pub time: Option<String>,
}

impl SetRecord {
  pub fn new(weight: f64, reps: u32) -> Self {
    Self {
      weight: Some(weight),
      reps: Some(reps),
      ..Self::default()
    }
  }

  /// Weight and reps when both are positive; anything else moves no tonnage.
  pub fn loaded(&self) -> Option<(f64, u32)> {
    match (self.weight, self.reps) {
      (Some(w), Some(r)) if w > 0.0 && r > 0 => Some((w, r)),
      _ => None,
    }
  }

  pub fn tonnage(&self) -> f64 {
    self.loaded().map(|(w, r)| w * r as f64).unwrap_or(0.0)
  }
}

/// ---------------------------------------------------------------------------
/// Payload Normalization
/// ---------------------------------------------------------------------------

/// The two historical shapes of the `exercises` column. Only the exercise
/// list is read from the wrapped form; `title`, `tags` and `sourcePostId`
/// are ignored whatever their type.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkoutPayload {
  /// `[{ name, sets, ... }, ...]`
  Bare(Vec<serde_json::Value>),
  /// `{ title, exercises: [...], tags, sourcePostId }`
  Wrapped { exercises: Vec<serde_json::Value> },
}

impl WorkoutPayload {
  /// Decode each entry on its own; entries that are not exercise objects are skipped.
  pub fn into_exercises(self) -> Vec<ExerciseRecord> {
    let entries = match self {
      WorkoutPayload::Bare(entries) => entries,
      WorkoutPayload::Wrapped { exercises } => exercises,
    };
    entries
      .into_iter()
      .filter_map(|entry| match ExerciseRecord::deserialize(entry) {
        Ok(exercise) => Some(exercise),
        Err(e) => {
          tracing::debug!("Skipping unrecognized exercise entry: {}", e);
          None
        }
      })
      .collect()
  }
}

/// Normalize either payload shape into a flat exercise list.
///
/// Anything else (null, a string, an object without `exercises`) yields an
/// empty list so one bad row never aborts a whole aggregation.
pub fn normalize_workout_payload(raw: &serde_json::Value) -> Vec<ExerciseRecord> {
  match WorkoutPayload::deserialize(raw) {
    Ok(payload) => payload.into_exercises(),
    Err(e) => {
      if !raw.is_null() {
        tracing::debug!("Skipping unrecognized workout payload: {}", e);
      }
      Vec::new()
    }
  }
}

/// ---------------------------------------------------------------------------
/// Lenient field decoders
/// ---------------------------------------------------------------------------

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(value.and_then(|v| match v {
    serde_json::Value::Number(n) => n.as_f64(),
    serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  })
  .filter(|n| n.is_finite() && *n >= 0.0))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  // Fractional counts are not a rep count
  let value = lenient_f64(deserializer)?;
  Ok(value
    .filter(|n| n.fract() == 0.0 && *n <= u32::MAX as f64)
    .map(|n| n as u32))
}

pub(super) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(value.and_then(|v| match v {
    serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
    serde_json::Value::Number(n) => Some(n.to_string()),
    _ => None,
  }))
}

pub(super) fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(matches!(value, Some(serde_json::Value::Bool(true))))
}

/// Sets must be an array; non-object entries inside it are dropped
fn lenient_sets<'de, D>(deserializer: D) -> Result<Vec<SetRecord>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  let Some(serde_json::Value::Array(entries)) = value else {
    return Ok(Vec::new());
  };
  Ok(entries
    .into_iter()
    .filter_map(|entry| SetRecord::deserialize(entry).ok())
    .collect())
}

pub(super) fn lenient_primary_group<'de, D>(deserializer: D) -> Result<Option<PrimaryGroup>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(value.and_then(|v| v.as_str().and_then(|s| s.parse().ok())))
}
