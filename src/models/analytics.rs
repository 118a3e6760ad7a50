use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Coarse movement category used for high-level analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimaryGroup {
  Push,
  Pull,
  Legs,
  Core,
}

impl PrimaryGroup {
  pub const ALL: [PrimaryGroup; 4] = [Self::Push, Self::Pull, Self::Legs, Self::Core];

  pub fn as_str(&self) -> &'static str {
    match self {
      PrimaryGroup::Push => "Push",
      PrimaryGroup::Pull => "Pull",
      PrimaryGroup::Legs => "Legs",
      PrimaryGroup::Core => "Core",
    }
  }
}

impl std::fmt::Display for PrimaryGroup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for PrimaryGroup {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "push" => Ok(Self::Push),
      "pull" => Ok(Self::Pull),
      "legs" => Ok(Self::Legs),
      "core" => Ok(Self::Core),
      _ => Err(format!("Unknown primary group: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChartMode {
  /// Summed tonnage per week
  #[default]
  Volume,
  /// Peak estimated one-rep max per week for a single exercise
  Strength,
}

/// Sub-group value meaning "no sub-group filter"
pub const ALL_SUB_GROUPS: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartFilters {
  pub primary_group: Option<PrimaryGroup>,
  /// Raw `muscleGroup` label; only honoured when `primary_group` is set
  pub sub_group: Option<String>,
  pub exercise_name: Option<String>,
}

impl ChartFilters {
  pub fn for_exercise(name: &str) -> Self {
    Self {
      exercise_name: Some(name.to_string()),
      ..Self::default()
    }
  }

  /// Effective sub-group filter, with the "All" sentinel treated as none
  pub fn active_sub_group(&self) -> Option<&str> {
    self.primary_group?;
    self
      .sub_group
      .as_deref()
      .filter(|s| !s.is_empty() && *s != ALL_SUB_GROUPS)
  }
}

/// One point of a weekly chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyDataPoint {
  /// Monday of the week
  pub week: NaiveDate,
  pub week_label: String,
  pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseFrequency {
  pub name: String,
  pub count: usize,
}
