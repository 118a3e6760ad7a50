pub mod analytics;
pub mod schedule;
pub mod workout;

pub use analytics::{ChartFilters, ChartMode, PrimaryGroup, WeeklyDataPoint};
pub use schedule::{
  decode_routine_data, InstanceStatus, InstanceStatusUpdate, NewRoutineInstance, NewScheduledRoutine, RecurrencePolicy,
  RoutineExercise, RoutineInstance, ScheduledRoutine,
};
pub use workout::{normalize_workout_payload, ExerciseRecord, SetRecord, WorkoutLog};
