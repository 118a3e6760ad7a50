//! Recurring Schedule Expander
//!
//! Turns scheduled routines into dated pending instances:
//! - one routine per selected weekday, end date derived from the recurrence policy
//! - instances step forward in 7-day increments from the first matching weekday
//! - generation stops at the routine end date or the global horizon, whichever is sooner
//! - dates already present in the store are never emitted twice
//!
//! There is no background scheduler. `sync_routine_instances` is re-run on each
//! app load to keep the rolling window populated, and the store's unique key on
//! `(scheduled_routine_id, scheduled_date)` absorbs overlapping runs.

use std::collections::HashSet;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    InstanceStatus, NewRoutineInstance, NewScheduledRoutine, RecurrencePolicy, RoutineExercise,
    ScheduledRoutine,
};
use crate::store::WorkoutHistoryStore;

pub const DEFAULT_HORIZON_MONTHS: u32 = 3;

// ---------------------------------------------------------------------------
/// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Cannot move instance from {from} to {to}")]
    InvalidTransition {
        from: InstanceStatus,
        to: InstanceStatus,
    },

    #[error("Unknown recurrence policy: {0}")]
    UnknownRecurrence(String),
}

// ---------------------------------------------------------------------------
/// Calendar helpers
// ---------------------------------------------------------------------------

/// Parse an English weekday name ("Monday", "mon", case-insensitive)
pub fn parse_weekday(name: &str) -> Result<Weekday, ScheduleError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| ScheduleError::InvalidWeekday(name.to_string()))
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn parse_recurrence(value: &str) -> Result<RecurrencePolicy, ScheduleError> {
    value
        .trim()
        .parse()
        .map_err(|_| ScheduleError::UnknownRecurrence(value.to_string()))
}

/// First date on or after `from` that falls on `weekday`
pub fn first_occurrence(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = (weekday.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(from)
}

/// Last date the expander may generate for, `months` ahead of today
pub fn generation_horizon(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

// ---------------------------------------------------------------------------
/// Expansion
// ---------------------------------------------------------------------------

/// Dated pending instances for one routine, skipping dates in `existing`.
///
/// Generation starts at the later of `today` and the routine's start date and
/// ends at the earlier of its end date and `horizon_end` (both inclusive).
/// Inactive routines produce nothing.
pub fn expand(
    routine: &ScheduledRoutine,
    today: NaiveDate,
    horizon_end: NaiveDate,
    existing: &HashSet<NaiveDate>,
) -> Result<Vec<NewRoutineInstance>, ScheduleError> {
    if !routine.is_active {
        return Ok(Vec::new());
    }

    let weekday = parse_weekday(&routine.day_of_week)?;
    let from = today.max(routine.start_date);
    let until = routine
        .end_date
        .map_or(horizon_end, |end| end.min(horizon_end));

    let mut instances = Vec::new();
    let mut date = first_occurrence(from, weekday);

    while date <= until {
        if !existing.contains(&date) {
            instances.push(NewRoutineInstance {
                scheduled_routine_id: routine.id,
                scheduled_date: date,
                scheduled_time: routine.scheduled_time,
                status: InstanceStatus::Pending,
            });
        }
        match date.checked_add_days(Days::new(7)) {
            Some(next) => date = next,
            None => break,
        }
    }

    Ok(instances)
}

// ---------------------------------------------------------------------------
/// Planning: one routine per selected weekday
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub user_id: Uuid,
    pub routine_name: String,
    pub routine_data: Vec<RoutineExercise>,
    pub days_of_week: Vec<String>,
    pub scheduled_time: NaiveTime,
    pub recurring: RecurrencePolicy,
}

/// Build the routines to persist for a request, anchored at `today`.
///
/// Weekday names are validated and canonicalised; repeated days collapse to one.
pub fn plan_scheduled_routines(
    request: &ScheduleRequest,
    today: NaiveDate,
) -> Result<Vec<NewScheduledRoutine>, ScheduleError> {
    let end_date = request.recurring.end_date(today);
    let mut seen = HashSet::new();
    let mut routines = Vec::new();

    for day in &request.days_of_week {
        let weekday = parse_weekday(day)?;
        if !seen.insert(weekday) {
            continue;
        }

        routines.push(NewScheduledRoutine {
            user_id: request.user_id,
            routine_name: request.routine_name.clone(),
            routine_data: request.routine_data.clone(),
            day_of_week: weekday_name(weekday).to_string(),
            scheduled_time: request.scheduled_time,
            recurring: request.recurring,
            start_date: today,
            end_date,
            is_active: true,
        });
    }

    Ok(routines)
}

// ---------------------------------------------------------------------------
/// Instance status state machine
// ---------------------------------------------------------------------------

pub fn validate_transition(from: InstanceStatus, to: InstanceStatus) -> Result<(), ScheduleError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ScheduleError::InvalidTransition { from, to })
    }
}

// ---------------------------------------------------------------------------
/// Store orchestration
// ---------------------------------------------------------------------------

/// Expand every active routine of a user up to the horizon and upsert the result.
///
/// A routine with an unparseable weekday is skipped so the others still fill.
/// Returns the number of instances actually inserted.
pub async fn sync_routine_instances(
    store: &dyn WorkoutHistoryStore,
    user_id: Uuid,
    today: NaiveDate,
    horizon_months: u32,
) -> Result<u64, StoreError> {
    let routines = store.fetch_scheduled_routines(user_id).await?;
    let horizon_end = generation_horizon(today, horizon_months);

    let mut batch = Vec::new();
    for routine in &routines {
        let existing: HashSet<NaiveDate> = store
            .fetch_routine_instances(routine.id, today, horizon_end)
            .await?
            .into_iter()
            .map(|i| i.scheduled_date)
            .collect();

        match expand(routine, today, horizon_end, &existing) {
            Ok(instances) => {
                debug!(
                    "Routine {} ({}): {} new instances",
                    routine.routine_name,
                    routine.day_of_week,
                    instances.len()
                );
                batch.extend(instances);
            }
            Err(e) => warn!("Skipping routine {}: {}", routine.id, e),
        }
    }

    if batch.is_empty() {
        return Ok(0);
    }

    let inserted = store.upsert_routine_instances(&batch).await?;
    info!(
        "Generated {} routine instances through {} for user {}",
        inserted, horizon_end, user_id
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::test_utils::{mock_new_routine, mock_routine, setup_test_db, teardown_test_db};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(days: &[&str], recurring: RecurrencePolicy) -> ScheduleRequest {
        ScheduleRequest {
            user_id: Uuid::new_v4(),
            routine_name: "Upper A".to_string(),
            routine_data: Vec::new(),
            days_of_week: days.iter().map(|d| d.to_string()).collect(),
            scheduled_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            recurring,
        }
    }

    #[test]
    fn test_parse_weekday_accepts_english_names() {
        assert_eq!(parse_weekday("Monday"), Ok(Weekday::Mon));
        assert_eq!(parse_weekday(" friday "), Ok(Weekday::Fri));
        assert_eq!(parse_weekday("sun"), Ok(Weekday::Sun));
        assert_eq!(
            parse_weekday("Funday"),
            Err(ScheduleError::InvalidWeekday("Funday".to_string()))
        );
    }

    #[test]
    fn test_first_occurrence() {
        // 2024-03-01 is a Friday
        let friday = date(2024, 3, 1);
        assert_eq!(first_occurrence(friday, Weekday::Fri), friday);
        assert_eq!(first_occurrence(friday, Weekday::Mon), date(2024, 3, 4));
        assert_eq!(first_occurrence(friday, Weekday::Thu), date(2024, 3, 7));
    }

    #[test]
    fn test_two_week_monday_yields_two_or_three_pending() {
        for offset in 0..7 {
            let today = date(2024, 3, 4) + Days::new(offset);
            let plan = plan_scheduled_routines(&request(&["Monday"], RecurrencePolicy::TwoWeeks), today)
                .unwrap();
            assert_eq!(plan.len(), 1);

            let routine = mock_routine(&plan[0]);
            let horizon = generation_horizon(today, DEFAULT_HORIZON_MONTHS);
            let instances = expand(&routine, today, horizon, &HashSet::new()).unwrap();

            let expected = if today.weekday() == Weekday::Mon { 3 } else { 2 };
            assert_eq!(instances.len(), expected, "today = {}", today);
            assert!(instances.iter().all(|i| i.status == InstanceStatus::Pending));
            assert!(instances.iter().all(|i| i.scheduled_date.weekday() == Weekday::Mon));
            assert!(instances.iter().all(|i| i.scheduled_date <= today + Days::new(14)));
        }
    }

    #[test]
    fn test_open_ended_routine_is_bounded_by_horizon() {
        let today = date(2024, 3, 1);
        let plan = plan_scheduled_routines(&request(&["Monday"], RecurrencePolicy::Indefinitely), today)
            .unwrap();
        assert_eq!(plan[0].end_date, None);

        let routine = mock_routine(&plan[0]);
        let horizon = generation_horizon(today, 3);
        assert_eq!(horizon, date(2024, 6, 1));

        let instances = expand(&routine, today, horizon, &HashSet::new()).unwrap();
        // 13 Mondays, Mar 4 through May 27
        assert_eq!(instances.len(), 13);
        assert_eq!(instances.first().unwrap().scheduled_date, date(2024, 3, 4));
        assert_eq!(instances.last().unwrap().scheduled_date, date(2024, 5, 27));

        // Dates are strictly increasing one week apart
        for pair in instances.windows(2) {
            assert_eq!(pair[1].scheduled_date - pair[0].scheduled_date, chrono::Duration::days(7));
        }
    }

    #[test]
    fn test_expand_skips_existing_inactive_and_future_start() {
        let today = date(2024, 3, 1);
        let plan = plan_scheduled_routines(&request(&["Wednesday"], RecurrencePolicy::OneMonth), today)
            .unwrap();
        let mut routine = mock_routine(&plan[0]);
        let horizon = generation_horizon(today, 3);

        // Mar 6, 13, 20, 27 before the Apr 1 end date
        let all = expand(&routine, today, horizon, &HashSet::new()).unwrap();
        assert_eq!(all.len(), 4);

        let existing: HashSet<NaiveDate> = [date(2024, 3, 6), date(2024, 3, 20)].into_iter().collect();
        let rest = expand(&routine, today, horizon, &existing).unwrap();
        let dates: Vec<NaiveDate> = rest.iter().map(|i| i.scheduled_date).collect();
        assert_eq!(dates, vec![date(2024, 3, 13), date(2024, 3, 27)]);

        routine.start_date = date(2024, 3, 15);
        let later = expand(&routine, today, horizon, &HashSet::new()).unwrap();
        assert_eq!(later.first().unwrap().scheduled_date, date(2024, 3, 20));

        routine.is_active = false;
        assert!(expand(&routine, today, horizon, &HashSet::new()).unwrap().is_empty());
    }

    #[test]
    fn test_plan_canonicalises_and_dedupes_days() {
        let today = date(2024, 3, 1);
        let plan = plan_scheduled_routines(
            &request(&["monday", "Thu", "Monday"], RecurrencePolicy::SixMonths),
            today,
        )
        .unwrap();

        let days: Vec<&str> = plan.iter().map(|r| r.day_of_week.as_str()).collect();
        assert_eq!(days, vec!["Monday", "Thursday"]);
        assert!(plan.iter().all(|r| r.start_date == today && r.is_active));
        assert!(plan.iter().all(|r| r.end_date == Some(date(2024, 9, 1))));

        assert!(plan_scheduled_routines(&request(&["Mon", "Someday"], RecurrencePolicy::None), today).is_err());
    }

    #[test]
    fn test_validate_transition() {
        assert!(validate_transition(InstanceStatus::Pending, InstanceStatus::Completed).is_ok());
        assert!(validate_transition(InstanceStatus::Pending, InstanceStatus::Skipped).is_ok());
        assert_eq!(
            validate_transition(InstanceStatus::Skipped, InstanceStatus::Completed),
            Err(ScheduleError::InvalidTransition {
                from: InstanceStatus::Skipped,
                to: InstanceStatus::Completed,
            })
        );
        assert_eq!(
            parse_recurrence("weekly"),
            Err(ScheduleError::UnknownRecurrence("weekly".to_string()))
        );
        assert_eq!(parse_recurrence("3-months"), Ok(RecurrencePolicy::ThreeMonths));
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let store = SqliteStore::new(setup_test_db().await);
        let user_id = Uuid::new_v4();
        let today = date(2024, 3, 1);

        let mut routine = mock_new_routine(user_id, "Monday", RecurrencePolicy::Indefinitely);
        routine.start_date = today;
        routine.end_date = None;
        let created = store.create_scheduled_routines(&[routine]).await.unwrap();

        let first = sync_routine_instances(&store, user_id, today, 3).await.unwrap();
        assert_eq!(first, 13);
        let second = sync_routine_instances(&store, user_id, today, 3).await.unwrap();
        assert_eq!(second, 0);

        let horizon = generation_horizon(today, 3);
        let instances = store
            .fetch_routine_instances(created[0].id, today, horizon)
            .await
            .unwrap();
        assert_eq!(instances.len(), 13);
        let unique: HashSet<NaiveDate> = instances.iter().map(|i| i.scheduled_date).collect();
        assert_eq!(unique.len(), instances.len());

        // A week later the rolling window gains exactly one Monday
        let next_week = date(2024, 3, 8);
        let rolled = sync_routine_instances(&store, user_id, next_week, 3).await.unwrap();
        assert_eq!(rolled, 1);

        teardown_test_db(store.pool().clone()).await;
    }

    #[tokio::test]
    async fn test_sync_skips_bad_routine_and_deactivated() {
        let store = SqliteStore::new(setup_test_db().await);
        let user_id = Uuid::new_v4();
        let today = date(2024, 3, 1);

        let mut good = mock_new_routine(user_id, "Friday", RecurrencePolicy::TwoWeeks);
        good.start_date = today;
        good.end_date = RecurrencePolicy::TwoWeeks.end_date(today);
        let mut bad = good.clone();
        bad.day_of_week = "Caturday".to_string();
        let mut dropped = good.clone();
        dropped.day_of_week = "Tuesday".to_string();

        let created = store
            .create_scheduled_routines(&[good, bad, dropped])
            .await
            .unwrap();
        store.deactivate_scheduled_routine(created[2].id).await.unwrap();

        // Mar 1, 8, 15 for the Friday routine only
        let inserted = sync_routine_instances(&store, user_id, today, 3).await.unwrap();
        assert_eq!(inserted, 3);

        teardown_test_db(store.pool().clone()).await;
    }

    #[tokio::test]
    async fn test_sync_survives_legacy_routine_data() {
        let store = SqliteStore::new(setup_test_db().await);
        let user_id = Uuid::new_v4();
        let today = date(2024, 3, 1);

        let mut good = mock_new_routine(user_id, "Friday", RecurrencePolicy::TwoWeeks);
        good.start_date = today;
        good.end_date = RecurrencePolicy::TwoWeeks.end_date(today);
        store.create_scheduled_routines(&[good]).await.unwrap();

        // Templates written by older clients: planned sets as an array, and plain garbage
        for (day, data) in [
            ("Wednesday", r#"[{"name":"Squat","sets":[{"reps":"8-12"},{"reps":"8-12"}]}]"#),
            ("Sunday", "{not json"),
        ] {
            sqlx::query(
                "INSERT INTO scheduled_routines (id, user_id, routine_name, routine_data, day_of_week, \
                 scheduled_time, recurring, start_date, end_date, is_active) \
                 VALUES (?1, ?2, 'Legacy', ?3, ?4, ?5, '2-weeks', ?6, ?7, 1)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id.to_string())
            .bind(data)
            .bind(day)
            .bind(NaiveTime::from_hms_opt(7, 0, 0).unwrap())
            .bind(today)
            .bind(date(2024, 3, 15))
            .execute(store.pool())
            .await
            .unwrap();
        }

        let routines = store.fetch_scheduled_routines(user_id).await.unwrap();
        assert_eq!(routines.len(), 3);
        let wednesday = routines.iter().find(|r| r.day_of_week == "Wednesday").unwrap();
        assert_eq!(wednesday.routine_data[0].name, "Squat");
        assert_eq!(wednesday.routine_data[0].sets, 2);
        let sunday = routines.iter().find(|r| r.day_of_week == "Sunday").unwrap();
        assert!(sunday.routine_data.is_empty());

        // Fridays Mar 1, 8, 15; Wednesdays Mar 6, 13; Sundays Mar 3, 10
        let inserted = sync_routine_instances(&store, user_id, today, 3).await.unwrap();
        assert_eq!(inserted, 7);

        teardown_test_db(store.pool().clone()).await;
    }
}
