//! Exercise-to-muscle attribution
//!
//! Resolves a free-text exercise name into fractional muscle contributions and
//! splits a set's tonnage across those muscles. Resolution never fails: names
//! the table does not know fall back through the muscle group, then the primary
//! group, then a generic `other` bucket.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::PrimaryGroup;

/// ---------------------------------------------------------------------------
/// Muscle taxonomy
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Muscle {
  Chest,
  Shoulders,
  Triceps,
  Lats,
  UpperBack,
  Traps,
  Biceps,
  Forearms,
  Quads,
  Hamstrings,
  Glutes,
  Calves,
  Abs,
  Obliques,
  LowerBack,
  Other,
}

impl Muscle {
  pub fn as_str(&self) -> &'static str {
    match self {
      Muscle::Chest => "chest",
      Muscle::Shoulders => "shoulders",
      Muscle::Triceps => "triceps",
      Muscle::Lats => "lats",
      Muscle::UpperBack => "upper_back",
      Muscle::Traps => "traps",
      Muscle::Biceps => "biceps",
      Muscle::Forearms => "forearms",
      Muscle::Quads => "quads",
      Muscle::Hamstrings => "hamstrings",
      Muscle::Glutes => "glutes",
      Muscle::Calves => "calves",
      Muscle::Abs => "abs",
      Muscle::Obliques => "obliques",
      Muscle::LowerBack => "lower_back",
      Muscle::Other => "other",
    }
  }
}

impl std::fmt::Display for Muscle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Muscle name to fraction of the work; fractions of one exercise sum to 1.0
pub type ContributionMap = BTreeMap<Muscle, f64>;

/// Resolved attribution for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMuscleConfig {
  pub primary_group: PrimaryGroup,
  pub muscle_contributions: ContributionMap,
}

impl ExerciseMuscleConfig {
  fn from_static(primary_group: PrimaryGroup, contributions: &[(Muscle, f64)]) -> Self {
    Self {
      primary_group,
      muscle_contributions: contributions.iter().copied().collect(),
    }
  }
}

/// How a config was found, mostly for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
  ExactName,
  PartialName,
  MuscleGroup,
  PrimaryGroup,
  Fallback,
}

/// ---------------------------------------------------------------------------
/// Exercise Classification Table
/// ---------------------------------------------------------------------------

pub struct ExerciseEntry {
  /// Lowercase, hyphen-free name
  pub name: &'static str,
  pub primary_group: PrimaryGroup,
  pub contributions: &'static [(Muscle, f64)],
}

macro_rules! exercise {
  ($name:literal, $group:ident, [$(($muscle:ident, $share:literal)),+ $(,)?]) => {
    ExerciseEntry {
      name: $name,
      primary_group: PrimaryGroup::$group,
      contributions: &[$((Muscle::$muscle, $share)),+],
    }
  };
}

/// Declaration order is the tie-break order for partial matches.
pub static EXERCISE_TABLE: &[ExerciseEntry] = &[
  // Push: chest
  exercise!("bench press", Push, [(Chest, 0.6), (Shoulders, 0.2), (Triceps, 0.2)]),
  exercise!("barbell bench press", Push, [(Chest, 0.6), (Shoulders, 0.2), (Triceps, 0.2)]),
  exercise!("dumbbell bench press", Push, [(Chest, 0.65), (Shoulders, 0.2), (Triceps, 0.15)]),
  exercise!("incline bench press", Push, [(Chest, 0.5), (Shoulders, 0.3), (Triceps, 0.2)]),
  exercise!("incline dumbbell press", Push, [(Chest, 0.5), (Shoulders, 0.3), (Triceps, 0.2)]),
  exercise!("decline bench press", Push, [(Chest, 0.7), (Shoulders, 0.1), (Triceps, 0.2)]),
  exercise!("close grip bench press", Push, [(Triceps, 0.5), (Chest, 0.35), (Shoulders, 0.15)]),
  exercise!("chest press", Push, [(Chest, 0.65), (Shoulders, 0.2), (Triceps, 0.15)]),
  exercise!("machine chest press", Push, [(Chest, 0.65), (Shoulders, 0.2), (Triceps, 0.15)]),
  exercise!("chest fly", Push, [(Chest, 0.9), (Shoulders, 0.1)]),
  exercise!("dumbbell fly", Push, [(Chest, 0.9), (Shoulders, 0.1)]),
  exercise!("cable fly", Push, [(Chest, 0.9), (Shoulders, 0.1)]),
  exercise!("pec deck", Push, [(Chest, 0.9), (Shoulders, 0.1)]),
  exercise!("cable crossover", Push, [(Chest, 0.85), (Shoulders, 0.15)]),
  exercise!("push up", Push, [(Chest, 0.55), (Shoulders, 0.2), (Triceps, 0.2), (Abs, 0.05)]),
  exercise!("pushup", Push, [(Chest, 0.55), (Shoulders, 0.2), (Triceps, 0.2), (Abs, 0.05)]),
  exercise!("dips", Push, [(Triceps, 0.45), (Chest, 0.4), (Shoulders, 0.15)]),
  exercise!("chest dip", Push, [(Chest, 0.6), (Triceps, 0.3), (Shoulders, 0.1)]),
  exercise!("tricep dip", Push, [(Triceps, 0.7), (Chest, 0.2), (Shoulders, 0.1)]),
  // Push: shoulders
  exercise!("overhead press", Push, [(Shoulders, 0.65), (Triceps, 0.25), (Traps, 0.1)]),
  exercise!("military press", Push, [(Shoulders, 0.65), (Triceps, 0.25), (Traps, 0.1)]),
  exercise!("shoulder press", Push, [(Shoulders, 0.7), (Triceps, 0.3)]),
  exercise!("dumbbell shoulder press", Push, [(Shoulders, 0.7), (Triceps, 0.3)]),
  exercise!("arnold press", Push, [(Shoulders, 0.75), (Triceps, 0.25)]),
  exercise!("push press", Push, [(Shoulders, 0.55), (Triceps, 0.2), (Quads, 0.15), (Traps, 0.1)]),
  exercise!("lateral raise", Push, [(Shoulders, 0.9), (Traps, 0.1)]),
  exercise!("front raise", Push, [(Shoulders, 0.9), (Chest, 0.1)]),
  exercise!("landmine press", Push, [(Shoulders, 0.6), (Chest, 0.2), (Triceps, 0.2)]),
  // Push: triceps
  exercise!("tricep pushdown", Push, [(Triceps, 1.0)]),
  exercise!("triceps pushdown", Push, [(Triceps, 1.0)]),
  exercise!("rope pushdown", Push, [(Triceps, 1.0)]),
  exercise!("tricep extension", Push, [(Triceps, 1.0)]),
  exercise!("overhead tricep extension", Push, [(Triceps, 1.0)]),
  exercise!("skull crusher", Push, [(Triceps, 1.0)]),
  exercise!("tricep kickback", Push, [(Triceps, 1.0)]),
  exercise!("diamond push up", Push, [(Triceps, 0.5), (Chest, 0.4), (Shoulders, 0.1)]),
  // Pull: back
  exercise!("pull up", Pull, [(Lats, 0.6), (Biceps, 0.2), (UpperBack, 0.2)]),
  exercise!("pullup", Pull, [(Lats, 0.6), (Biceps, 0.2), (UpperBack, 0.2)]),
  exercise!("chin up", Pull, [(Lats, 0.5), (Biceps, 0.35), (UpperBack, 0.15)]),
  exercise!("chinup", Pull, [(Lats, 0.5), (Biceps, 0.35), (UpperBack, 0.15)]),
  exercise!("lat pulldown", Pull, [(Lats, 0.65), (Biceps, 0.2), (UpperBack, 0.15)]),
  exercise!("close grip pulldown", Pull, [(Lats, 0.6), (Biceps, 0.25), (UpperBack, 0.15)]),
  exercise!("straight arm pulldown", Pull, [(Lats, 0.85), (UpperBack, 0.15)]),
  exercise!("barbell row", Pull, [(UpperBack, 0.4), (Lats, 0.35), (Biceps, 0.15), (LowerBack, 0.1)]),
  exercise!("bent over row", Pull, [(UpperBack, 0.4), (Lats, 0.35), (Biceps, 0.15), (LowerBack, 0.1)]),
  exercise!("pendlay row", Pull, [(UpperBack, 0.45), (Lats, 0.35), (Biceps, 0.1), (LowerBack, 0.1)]),
  exercise!("dumbbell row", Pull, [(Lats, 0.5), (UpperBack, 0.3), (Biceps, 0.2)]),
  exercise!("one arm dumbbell row", Pull, [(Lats, 0.5), (UpperBack, 0.3), (Biceps, 0.2)]),
  exercise!("seated cable row", Pull, [(UpperBack, 0.45), (Lats, 0.35), (Biceps, 0.2)]),
  exercise!("cable row", Pull, [(UpperBack, 0.45), (Lats, 0.35), (Biceps, 0.2)]),
  exercise!("t bar row", Pull, [(UpperBack, 0.45), (Lats, 0.35), (Biceps, 0.1), (LowerBack, 0.1)]),
  exercise!("chest supported row", Pull, [(UpperBack, 0.5), (Lats, 0.3), (Biceps, 0.2)]),
  exercise!("inverted row", Pull, [(UpperBack, 0.45), (Lats, 0.3), (Biceps, 0.25)]),
  exercise!("machine row", Pull, [(UpperBack, 0.45), (Lats, 0.35), (Biceps, 0.2)]),
  exercise!("pullover", Pull, [(Lats, 0.7), (Chest, 0.3)]),
  exercise!("rear delt fly", Pull, [(Shoulders, 0.6), (UpperBack, 0.4)]),
  exercise!("reverse fly", Pull, [(Shoulders, 0.5), (UpperBack, 0.5)]),
  exercise!("face pull", Pull, [(Shoulders, 0.5), (UpperBack, 0.3), (Traps, 0.2)]),
  exercise!("upright row", Pull, [(Shoulders, 0.5), (Traps, 0.5)]),
  exercise!("shrug", Pull, [(Traps, 1.0)]),
  exercise!("deadlift", Pull, [(Hamstrings, 0.25), (Glutes, 0.25), (LowerBack, 0.2), (UpperBack, 0.1), (Traps, 0.1), (Quads, 0.1)]),
  exercise!("rack pull", Pull, [(LowerBack, 0.3), (Traps, 0.3), (UpperBack, 0.2), (Glutes, 0.2)]),
  exercise!("farmers walk", Pull, [(Forearms, 0.4), (Traps, 0.3), (Quads, 0.1), (Glutes, 0.1), (Abs, 0.1)]),
  // Pull: arms
  exercise!("bicep curl", Pull, [(Biceps, 0.9), (Forearms, 0.1)]),
  exercise!("biceps curl", Pull, [(Biceps, 0.9), (Forearms, 0.1)]),
  exercise!("barbell curl", Pull, [(Biceps, 0.9), (Forearms, 0.1)]),
  exercise!("dumbbell curl", Pull, [(Biceps, 0.9), (Forearms, 0.1)]),
  exercise!("ez bar curl", Pull, [(Biceps, 0.9), (Forearms, 0.1)]),
  exercise!("cable curl", Pull, [(Biceps, 0.9), (Forearms, 0.1)]),
  exercise!("hammer curl", Pull, [(Biceps, 0.6), (Forearms, 0.4)]),
  exercise!("preacher curl", Pull, [(Biceps, 1.0)]),
  exercise!("concentration curl", Pull, [(Biceps, 1.0)]),
  exercise!("incline dumbbell curl", Pull, [(Biceps, 1.0)]),
  exercise!("reverse curl", Pull, [(Forearms, 0.6), (Biceps, 0.4)]),
  exercise!("wrist curl", Pull, [(Forearms, 1.0)]),
  // Legs
  exercise!("squat", Legs, [(Quads, 0.5), (Glutes, 0.3), (Hamstrings, 0.1), (LowerBack, 0.1)]),
  exercise!("back squat", Legs, [(Quads, 0.5), (Glutes, 0.3), (Hamstrings, 0.1), (LowerBack, 0.1)]),
  exercise!("front squat", Legs, [(Quads, 0.6), (Glutes, 0.25), (Abs, 0.15)]),
  exercise!("goblet squat", Legs, [(Quads, 0.55), (Glutes, 0.3), (Abs, 0.15)]),
  exercise!("hack squat", Legs, [(Quads, 0.7), (Glutes, 0.2), (Hamstrings, 0.1)]),
  exercise!("box squat", Legs, [(Quads, 0.45), (Glutes, 0.35), (Hamstrings, 0.2)]),
  exercise!("sissy squat", Legs, [(Quads, 1.0)]),
  exercise!("bulgarian split squat", Legs, [(Quads, 0.5), (Glutes, 0.35), (Hamstrings, 0.15)]),
  exercise!("split squat", Legs, [(Quads, 0.5), (Glutes, 0.35), (Hamstrings, 0.15)]),
  exercise!("lunge", Legs, [(Quads, 0.5), (Glutes, 0.35), (Hamstrings, 0.15)]),
  exercise!("step up", Legs, [(Quads, 0.5), (Glutes, 0.4), (Hamstrings, 0.1)]),
  exercise!("leg press", Legs, [(Quads, 0.6), (Glutes, 0.3), (Hamstrings, 0.1)]),
  exercise!("leg extension", Legs, [(Quads, 1.0)]),
  exercise!("leg curl", Legs, [(Hamstrings, 1.0)]),
  exercise!("lying leg curl", Legs, [(Hamstrings, 1.0)]),
  exercise!("seated leg curl", Legs, [(Hamstrings, 1.0)]),
  exercise!("nordic curl", Legs, [(Hamstrings, 1.0)]),
  exercise!("romanian deadlift", Legs, [(Hamstrings, 0.5), (Glutes, 0.3), (LowerBack, 0.2)]),
  exercise!("rdl", Legs, [(Hamstrings, 0.5), (Glutes, 0.3), (LowerBack, 0.2)]),
  exercise!("stiff leg deadlift", Legs, [(Hamstrings, 0.55), (Glutes, 0.25), (LowerBack, 0.2)]),
  exercise!("sumo deadlift", Legs, [(Glutes, 0.3), (Quads, 0.25), (Hamstrings, 0.25), (LowerBack, 0.2)]),
  exercise!("trap bar deadlift", Legs, [(Quads, 0.35), (Glutes, 0.3), (Hamstrings, 0.2), (LowerBack, 0.15)]),
  exercise!("good morning", Legs, [(Hamstrings, 0.5), (LowerBack, 0.3), (Glutes, 0.2)]),
  exercise!("hip thrust", Legs, [(Glutes, 0.8), (Hamstrings, 0.2)]),
  exercise!("glute bridge", Legs, [(Glutes, 0.8), (Hamstrings, 0.2)]),
  exercise!("glute kickback", Legs, [(Glutes, 1.0)]),
  exercise!("hip abduction", Legs, [(Glutes, 1.0)]),
  exercise!("kettlebell swing", Legs, [(Glutes, 0.45), (Hamstrings, 0.35), (LowerBack, 0.2)]),
  exercise!("calf raise", Legs, [(Calves, 1.0)]),
  exercise!("wall sit", Legs, [(Quads, 0.8), (Glutes, 0.2)]),
  // Core
  exercise!("crunch", Core, [(Abs, 1.0)]),
  exercise!("cable crunch", Core, [(Abs, 1.0)]),
  exercise!("bicycle crunch", Core, [(Abs, 0.5), (Obliques, 0.5)]),
  exercise!("sit up", Core, [(Abs, 0.85), (Obliques, 0.15)]),
  exercise!("situp", Core, [(Abs, 0.85), (Obliques, 0.15)]),
  exercise!("v up", Core, [(Abs, 0.85), (Obliques, 0.15)]),
  exercise!("leg raise", Core, [(Abs, 0.8), (Obliques, 0.2)]),
  exercise!("hanging leg raise", Core, [(Abs, 0.75), (Obliques, 0.15), (Forearms, 0.1)]),
  exercise!("toes to bar", Core, [(Abs, 0.7), (Lats, 0.15), (Forearms, 0.15)]),
  exercise!("ab wheel", Core, [(Abs, 0.8), (Obliques, 0.1), (Lats, 0.1)]),
  exercise!("ab rollout", Core, [(Abs, 0.8), (Obliques, 0.1), (Lats, 0.1)]),
  exercise!("russian twist", Core, [(Obliques, 0.7), (Abs, 0.3)]),
  exercise!("wood chop", Core, [(Obliques, 0.7), (Abs, 0.2), (Shoulders, 0.1)]),
  exercise!("pallof press", Core, [(Obliques, 0.6), (Abs, 0.4)]),
  exercise!("mountain climber", Core, [(Abs, 0.6), (Quads, 0.2), (Shoulders, 0.2)]),
  exercise!("plank", Core, [(Abs, 0.7), (Obliques, 0.2), (LowerBack, 0.1)]),
  exercise!("side plank", Core, [(Obliques, 0.7), (Abs, 0.3)]),
  exercise!("dead bug", Core, [(Abs, 0.9), (Obliques, 0.1)]),
  exercise!("bird dog", Core, [(LowerBack, 0.5), (Abs, 0.3), (Glutes, 0.2)]),
  exercise!("superman", Core, [(LowerBack, 0.7), (Glutes, 0.3)]),
  exercise!("hollow body hold", Core, [(Abs, 1.0)]),
  exercise!("back extension", Core, [(LowerBack, 0.6), (Glutes, 0.25), (Hamstrings, 0.15)]),
  exercise!("hyperextension", Core, [(LowerBack, 0.6), (Glutes, 0.25), (Hamstrings, 0.15)]),
];

static EXACT_INDEX: LazyLock<HashMap<&'static str, &'static ExerciseEntry>> =
  LazyLock::new(|| EXERCISE_TABLE.iter().map(|e| (e.name, e)).collect());

/// Coarse `muscleGroup` labels. Single muscles get 100%; the legacy umbrella
/// labels ("Back", "Legs", "Core", "Arms") get a split.
static MUSCLE_GROUP_DEFAULTS: &[(&str, PrimaryGroup, &[(Muscle, f64)])] = &[
  ("chest", PrimaryGroup::Push, &[(Muscle::Chest, 1.0)]),
  ("shoulders", PrimaryGroup::Push, &[(Muscle::Shoulders, 1.0)]),
  ("delts", PrimaryGroup::Push, &[(Muscle::Shoulders, 1.0)]),
  ("triceps", PrimaryGroup::Push, &[(Muscle::Triceps, 1.0)]),
  ("lats", PrimaryGroup::Pull, &[(Muscle::Lats, 1.0)]),
  ("upper back", PrimaryGroup::Pull, &[(Muscle::UpperBack, 1.0)]),
  ("traps", PrimaryGroup::Pull, &[(Muscle::Traps, 1.0)]),
  ("biceps", PrimaryGroup::Pull, &[(Muscle::Biceps, 1.0)]),
  ("forearms", PrimaryGroup::Pull, &[(Muscle::Forearms, 1.0)]),
  ("back", PrimaryGroup::Pull, &[(Muscle::Lats, 0.5), (Muscle::UpperBack, 0.35), (Muscle::LowerBack, 0.15)]),
  ("arms", PrimaryGroup::Pull, &[(Muscle::Biceps, 0.5), (Muscle::Triceps, 0.5)]),
  ("quads", PrimaryGroup::Legs, &[(Muscle::Quads, 1.0)]),
  ("quadriceps", PrimaryGroup::Legs, &[(Muscle::Quads, 1.0)]),
  ("hamstrings", PrimaryGroup::Legs, &[(Muscle::Hamstrings, 1.0)]),
  ("glutes", PrimaryGroup::Legs, &[(Muscle::Glutes, 1.0)]),
  ("calves", PrimaryGroup::Legs, &[(Muscle::Calves, 1.0)]),
  ("legs", PrimaryGroup::Legs, &[(Muscle::Quads, 0.4), (Muscle::Hamstrings, 0.3), (Muscle::Glutes, 0.2), (Muscle::Calves, 0.1)]),
  ("abs", PrimaryGroup::Core, &[(Muscle::Abs, 1.0)]),
  ("obliques", PrimaryGroup::Core, &[(Muscle::Obliques, 1.0)]),
  ("lower back", PrimaryGroup::Core, &[(Muscle::LowerBack, 1.0)]),
  ("core", PrimaryGroup::Core, &[(Muscle::Abs, 0.6), (Muscle::Obliques, 0.25), (Muscle::LowerBack, 0.15)]),
];

fn primary_group_default(group: PrimaryGroup) -> &'static [(Muscle, f64)] {
  match group {
    PrimaryGroup::Push => &[(Muscle::Chest, 0.4), (Muscle::Shoulders, 0.3), (Muscle::Triceps, 0.3)],
    PrimaryGroup::Pull => &[(Muscle::Lats, 0.4), (Muscle::UpperBack, 0.3), (Muscle::Biceps, 0.3)],
    PrimaryGroup::Legs => &[
      (Muscle::Quads, 0.35),
      (Muscle::Glutes, 0.3),
      (Muscle::Hamstrings, 0.25),
      (Muscle::Calves, 0.1),
    ],
    PrimaryGroup::Core => &[(Muscle::Abs, 0.6), (Muscle::Obliques, 0.25), (Muscle::LowerBack, 0.15)],
  }
}

/// Lowercase, treat `-`/`_` as spaces, collapse whitespace
pub fn normalize_name(name: &str) -> String {
  name
    .to_lowercase()
    .replace(['-', '_'], " ")
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Primary group implied by a raw `muscleGroup` label
pub fn primary_group_for_muscle_group(muscle_group: &str) -> Option<PrimaryGroup> {
  let key = normalize_name(muscle_group);
  MUSCLE_GROUP_DEFAULTS
    .iter()
    .find(|(label, _, _)| *label == key)
    .map(|(_, group, _)| *group)
}

/// Minimum input length for the "table name contains input" direction
const MIN_REVERSE_MATCH_LEN: usize = 3;

/// Words match exactly or up to a plural suffix ("raise" / "raises", "crunch" / "crunches")
fn same_word(a: &str, b: &str) -> bool {
  let plural_of = |long: &str, short: &str| {
    long
      .strip_prefix(short)
      .is_some_and(|rest| rest == "s" || rest == "es")
  };
  a == b || plural_of(a, b) || plural_of(b, a)
}

/// Whether `needle` appears in `haystack` as a run of whole words
fn contains_words(haystack: &str, needle: &str) -> bool {
  let haystack: Vec<&str> = haystack.split(' ').collect();
  let needle: Vec<&str> = needle.split(' ').collect();
  if needle.is_empty() || needle.len() > haystack.len() {
    return false;
  }
  haystack
    .windows(needle.len())
    .any(|run| run.iter().zip(&needle).all(|(h, n)| same_word(h, n)))
}

fn find_partial(key: &str) -> Option<&'static ExerciseEntry> {
  // Input contains a table name: the most specific (longest) name wins,
  // declaration order breaks ties.
  let mut best: Option<&'static ExerciseEntry> = None;
  for entry in EXERCISE_TABLE {
    if contains_words(key, entry.name) && best.is_none_or(|b| entry.name.len() > b.name.len()) {
      best = Some(entry);
    }
  }
  if best.is_some() {
    return best;
  }

  // Table name contains the input: first in declaration order
  if key.len() < MIN_REVERSE_MATCH_LEN {
    return None;
  }
  EXERCISE_TABLE
    .iter()
    .find(|entry| contains_words(entry.name, key))
}

/// Resolve an exercise into its muscle attribution and where it came from.
pub fn resolve_with_source(
  exercise_name: &str,
  muscle_group: Option<&str>,
  primary_group: Option<PrimaryGroup>,
) -> (ExerciseMuscleConfig, ResolutionSource) {
  let key = normalize_name(exercise_name);

  if !key.is_empty() {
    if let Some(entry) = EXACT_INDEX.get(key.as_str()) {
      return (
        ExerciseMuscleConfig::from_static(entry.primary_group, entry.contributions),
        ResolutionSource::ExactName,
      );
    }
    if let Some(entry) = find_partial(&key) {
      return (
        ExerciseMuscleConfig::from_static(entry.primary_group, entry.contributions),
        ResolutionSource::PartialName,
      );
    }
  }

  if let Some(label) = muscle_group.map(normalize_name) {
    if let Some((_, group, contributions)) =
      MUSCLE_GROUP_DEFAULTS.iter().find(|(l, _, _)| *l == label)
    {
      return (
        ExerciseMuscleConfig::from_static(*group, contributions),
        ResolutionSource::MuscleGroup,
      );
    }
  }

  if let Some(group) = primary_group {
    return (
      ExerciseMuscleConfig::from_static(group, primary_group_default(group)),
      ResolutionSource::PrimaryGroup,
    );
  }

  // Unknown exercises land in Push/other rather than failing
  (
    ExerciseMuscleConfig::from_static(PrimaryGroup::Push, &[(Muscle::Other, 1.0)]),
    ResolutionSource::Fallback,
  )
}

/// Resolve an exercise into its muscle attribution. Never fails.
pub fn resolve(
  exercise_name: &str,
  muscle_group: Option<&str>,
  primary_group: Option<PrimaryGroup>,
) -> ExerciseMuscleConfig {
  resolve_with_source(exercise_name, muscle_group, primary_group).0
}

/// ---------------------------------------------------------------------------
/// Tonnage Allocator
/// ---------------------------------------------------------------------------

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// Split `weight * reps` across muscles by fraction, each share rounded to
/// two decimals. Zero weight or reps gives zero for every muscle.
pub fn allocate(weight: f64, reps: u32, contributions: &ContributionMap) -> BTreeMap<Muscle, f64> {
  let total = if weight > 0.0 && reps > 0 {
    weight * reps as f64
  } else {
    0.0
  };

  contributions
    .iter()
    .map(|(muscle, fraction)| (*muscle, round2(total * fraction)))
    .collect()
}
