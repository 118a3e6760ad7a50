//! Deterministic analysis layer for strength training history
//!
//! Turns raw workout logs into weekly chart series: summed tonnage, peak
//! estimated one-rep max, per-muscle tonnage, and the exercise frequency used
//! to pick a default exercise for strength charts.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::analytics::ExerciseFrequency;
use crate::models::{ChartFilters, ChartMode, ExerciseRecord, PrimaryGroup, WeeklyDataPoint, WorkoutLog};
use crate::muscles::{self, Muscle};

/// Holds with no meaningful tonnage, matched by substring
const TIME_BASED_CORE: &[&str] = &[
  "plank",
  "dead bug",
  "bird dog",
  "superman",
  "hollow body hold",
  "side plank",
];

pub const DEFAULT_FREQUENCY_WINDOW_WEEKS: u32 = 8;

/// ---------------------------------------------------------------------------
/// Week bucketing
/// ---------------------------------------------------------------------------

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
  date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Short chart label, e.g. "Mar 4"
pub fn week_label(week: NaiveDate) -> String {
  week.format("%b %-d").to_string()
}

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// ---------------------------------------------------------------------------
/// Per-exercise classification
/// ---------------------------------------------------------------------------

pub fn is_time_based_core(name: &str) -> bool {
  let key = muscles::normalize_name(name);
  TIME_BASED_CORE.iter().any(|pattern| key.contains(pattern))
}

/// Exercises that count toward weight-based charts
pub fn is_load_bearing(exercise: &ExerciseRecord) -> bool {
  !exercise.is_cardio && !is_time_based_core(&exercise.name)
}

/// Stored primary group, else the one implied by the muscle group label
pub fn effective_primary_group(exercise: &ExerciseRecord) -> Option<PrimaryGroup> {
  exercise.primary_group.or_else(|| {
    exercise
      .muscle_group
      .as_deref()
      .and_then(muscles::primary_group_for_muscle_group)
  })
}

pub fn matches_filters(exercise: &ExerciseRecord, filters: &ChartFilters) -> bool {
  if let Some(group) = filters.primary_group {
    if effective_primary_group(exercise) != Some(group) {
      return false;
    }
    if let Some(sub) = filters.active_sub_group() {
      if exercise.muscle_group.as_deref() != Some(sub) {
        return false;
      }
    }
  }

  match filters.exercise_name.as_deref() {
    Some(name) => muscles::normalize_name(name) == muscles::normalize_name(&exercise.name),
    None => true,
  }
}

/// Epley estimate; zero when the set moved no load
pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
  if weight <= 0.0 || reps == 0 {
    return 0.0;
  }
  if reps == 1 {
    weight
  } else {
    (weight * (1.0 + reps as f64 / 30.0)).round()
  }
}

/// Qualifying exercises of every workout, paired with the workout date
fn qualifying_exercises<'a>(
  workouts: &'a [WorkoutLog],
  filters: &'a ChartFilters,
) -> impl Iterator<Item = (NaiveDate, ExerciseRecord)> + 'a {
  workouts.iter().flat_map(move |workout| {
    workout
      .exercises()
      .into_iter()
      .filter(move |e| is_load_bearing(e) && matches_filters(e, filters))
      .map(move |e| (workout.log_date, e))
  })
}

/// ---------------------------------------------------------------------------
/// Weekly Aggregator
/// ---------------------------------------------------------------------------

/// Bucket qualifying sets by week.
///
/// Volume sums `weight * reps`; strength keeps the highest e1RM seen in the
/// week and needs `filters.exercise_name`, returning nothing without it.
/// Output is ordered by week.
pub fn aggregate(
  workouts: &[WorkoutLog],
  mode: ChartMode,
  filters: &ChartFilters,
) -> Vec<WeeklyDataPoint> {
  if mode == ChartMode::Strength && filters.exercise_name.is_none() {
    return Vec::new();
  }

  let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();

  for (date, exercise) in qualifying_exercises(workouts, filters) {
    let week = week_start(date);
    for (weight, reps) in exercise.sets.iter().filter_map(|s| s.loaded()) {
      match mode {
        ChartMode::Volume => {
          *buckets.entry(week).or_insert(0.0) += weight * reps as f64;
        }
        ChartMode::Strength => {
          let e1rm = estimated_one_rep_max(weight, reps);
          let peak = buckets.entry(week).or_insert(0.0);
          if e1rm > *peak {
            *peak = e1rm;
          }
        }
      }
    }
  }

  buckets
    .into_iter()
    .map(|(week, value)| WeeklyDataPoint {
      week,
      week_label: week_label(week),
      value: round2(value),
    })
    .collect()
}

/// Latest week minus the week before; 0 with fewer than two points
pub fn trend(points: &[WeeklyDataPoint]) -> f64 {
  match points {
    [.., previous, latest] => round2(latest.value - previous.value),
    _ => 0.0,
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Frequency
/// ---------------------------------------------------------------------------

/// Count how often each exercise was logged with real load over the trailing
/// window ending at `today`. Names group case-insensitively and keep their
/// first-seen spelling. Sorted by count, then name.
pub fn exercise_frequency(
  workouts: &[WorkoutLog],
  filters: &ChartFilters,
  today: NaiveDate,
  window_weeks: u32,
) -> Vec<ExerciseFrequency> {
  let window_start = today - Duration::weeks(window_weeks as i64);
  let group_filters = ChartFilters {
    exercise_name: None,
    ..filters.clone()
  };

  let mut counts: HashMap<String, ExerciseFrequency> = HashMap::new();
  for (date, exercise) in qualifying_exercises(workouts, &group_filters) {
    if date < window_start || date > today {
      continue;
    }
    if !exercise.sets.iter().any(|s| s.loaded().is_some()) {
      continue;
    }
    let key = muscles::normalize_name(&exercise.name);
    if key.is_empty() {
      continue;
    }
    counts
      .entry(key)
      .or_insert_with(|| ExerciseFrequency {
        name: exercise.name.trim().to_string(),
        count: 0,
      })
      .count += 1;
  }

  let mut frequencies: Vec<ExerciseFrequency> = counts.into_values().collect();
  frequencies.sort_by(|a, b| {
    b.count
      .cmp(&a.count)
      .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
  });
  frequencies
}

/// Default exercise for strength charts when the user has not picked one
pub fn most_frequent_exercise(
  workouts: &[WorkoutLog],
  filters: &ChartFilters,
  today: NaiveDate,
  window_weeks: u32,
) -> Option<String> {
  exercise_frequency(workouts, filters, today, window_weeks)
    .into_iter()
    .next()
    .map(|f| f.name)
}

/// Distinct exercise names with loaded sets, for the exercise picker
pub fn available_exercises(workouts: &[WorkoutLog], filters: &ChartFilters) -> Vec<String> {
  let group_filters = ChartFilters {
    exercise_name: None,
    ..filters.clone()
  };
  let mut seen: BTreeMap<String, String> = BTreeMap::new();
  for (_, exercise) in qualifying_exercises(workouts, &group_filters) {
    let key = muscles::normalize_name(&exercise.name);
    if key.is_empty() || !exercise.sets.iter().any(|s| s.loaded().is_some()) {
      continue;
    }
    seen.entry(key).or_insert_with(|| exercise.name.trim().to_string());
  }
  seen.into_values().collect()
}

/// ---------------------------------------------------------------------------
/// Per-muscle tonnage
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMuscleVolume {
  pub week: NaiveDate,
  pub week_label: String,
  pub muscles: BTreeMap<Muscle, f64>,
}

impl WeeklyMuscleVolume {
  pub fn total(&self) -> f64 {
    round2(self.muscles.values().sum())
  }
}

/// Tonnage of one exercise split across the muscles it trains
pub fn exercise_muscle_tonnage(exercise: &ExerciseRecord) -> BTreeMap<Muscle, f64> {
  let mut totals: BTreeMap<Muscle, f64> = BTreeMap::new();
  if !is_load_bearing(exercise) {
    return totals;
  }

  let config = muscles::resolve(
    &exercise.name,
    exercise.muscle_group.as_deref(),
    exercise.primary_group,
  );

  for (weight, reps) in exercise.sets.iter().filter_map(|s| s.loaded()) {
    for (muscle, tonnage) in muscles::allocate(weight, reps, &config.muscle_contributions) {
      *totals.entry(muscle).or_insert(0.0) += tonnage;
    }
  }
  totals
}

/// Weekly tonnage per muscle across all qualifying exercises
pub fn weekly_muscle_volume(
  workouts: &[WorkoutLog],
  filters: &ChartFilters,
) -> Vec<WeeklyMuscleVolume> {
  let mut buckets: BTreeMap<NaiveDate, BTreeMap<Muscle, f64>> = BTreeMap::new();

  for (date, exercise) in qualifying_exercises(workouts, filters) {
    let week = buckets.entry(week_start(date)).or_default();
    for (muscle, tonnage) in exercise_muscle_tonnage(&exercise) {
      *week.entry(muscle).or_insert(0.0) += tonnage;
    }
  }

  buckets
    .into_iter()
    .map(|(week, muscles)| WeeklyMuscleVolume {
      week,
      week_label: week_label(week),
      muscles: muscles.into_iter().map(|(m, v)| (m, round2(v))).collect(),
    })
    .collect()
}
