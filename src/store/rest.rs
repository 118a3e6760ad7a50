//! Hosted backend store speaking the PostgREST dialect
//!
//! Tables are addressed as `{base_url}/{table}` with `column=op.value` filters.
//! Every request carries the project API key and a bearer token.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::WorkoutHistoryStore;
use crate::error::StoreError;
use crate::models::{
  InstanceStatus, InstanceStatusUpdate, NewRoutineInstance, NewScheduledRoutine, RoutineInstance,
  ScheduledRoutine, WorkoutLog,
};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RestConfig {
  pub base_url: Url,
  pub api_key: String,
  pub access_token: String,
}

impl RestConfig {
  /// The base URL always ends up with a trailing slash so table names join under it
  pub fn new(base_url: &str, api_key: &str, access_token: Option<&str>) -> Result<Self, StoreError> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
      normalized.push('/');
    }

    Ok(Self {
      base_url: Url::parse(&normalized)?,
      api_key: api_key.to_string(),
      access_token: access_token.unwrap_or(api_key).to_string(),
    })
  }
}

/// ---------------------------------------------------------------------------
/// Store
/// ---------------------------------------------------------------------------

pub struct RestStore {
  client: Client,
  config: RestConfig,
}

impl RestStore {
  pub fn new(config: RestConfig) -> Self {
    Self {
      client: Client::new(),
      config,
    }
  }

  fn endpoint(&self, table: &str, params: &[(&str, String)]) -> Result<Url, StoreError> {
    let mut url = self.config.base_url.join(table)?;
    if !params.is_empty() {
      let mut pairs = url.query_pairs_mut();
      for (key, value) in params {
        pairs.append_pair(key, value);
      }
    }
    Ok(url)
  }

  fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
    request
      .header("apikey", &self.config.api_key)
      .bearer_auth(&self.config.access_token)
  }

  async fn get_rows<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, StoreError> {
    debug!("GET {}", url);
    let response = self.authorized(self.client.get(url)).send().await?;
    read_rows(response).await
  }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
  if !response.status().is_success() {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    return Err(StoreError::Status { status, body });
  }
  Ok(response)
}

async fn read_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, StoreError> {
  let response = check_status(response).await?;
  let text = response.text().await?;
  serde_json::from_str(&text).map_err(|e| StoreError::decode("backend rows", e))
}

#[async_trait]
impl WorkoutHistoryStore for RestStore {
  async fn fetch_workouts(&self, user_id: Uuid) -> Result<Vec<WorkoutLog>, StoreError> {
    let url = self.endpoint(
      "workout_logs",
      &[
        ("select", "id,user_id,log_date,exercises".to_string()),
        ("user_id", format!("eq.{}", user_id)),
        ("order", "log_date.asc".to_string()),
      ],
    )?;
    self.get_rows(url).await
  }

  async fn fetch_scheduled_routines(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<ScheduledRoutine>, StoreError> {
    let url = self.endpoint(
      "scheduled_routines",
      &[
        ("user_id", format!("eq.{}", user_id)),
        ("is_active", "eq.true".to_string()),
      ],
    )?;
    self.get_rows(url).await
  }

  async fn create_scheduled_routines(
    &self,
    routines: &[NewScheduledRoutine],
  ) -> Result<Vec<ScheduledRoutine>, StoreError> {
    if routines.is_empty() {
      return Ok(Vec::new());
    }

    let rows: Vec<ScheduledRoutine> = routines
      .iter()
      .map(|r| ScheduledRoutine {
        id: Uuid::new_v4(),
        user_id: r.user_id,
        routine_name: r.routine_name.clone(),
        routine_data: r.routine_data.clone(),
        day_of_week: r.day_of_week.clone(),
        scheduled_time: r.scheduled_time,
        recurring: r.recurring,
        start_date: r.start_date,
        end_date: r.end_date,
        is_active: r.is_active,
      })
      .collect();

    let url = self.endpoint("scheduled_routines", &[])?;
    let response = self
      .authorized(self.client.post(url))
      .header("Prefer", "return=representation")
      .json(&rows)
      .send()
      .await?;

    read_rows(response).await
  }

  async fn deactivate_scheduled_routine(&self, routine_id: Uuid) -> Result<(), StoreError> {
    let url = self.endpoint("scheduled_routines", &[("id", format!("eq.{}", routine_id))])?;
    let response = self
      .authorized(self.client.patch(url))
      .json(&serde_json::json!({ "is_active": false }))
      .send()
      .await?;

    check_status(response).await?;
    Ok(())
  }

  async fn fetch_routine_instances(
    &self,
    routine_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<RoutineInstance>, StoreError> {
    let url = self.endpoint(
      "routine_instances",
      &[
        ("scheduled_routine_id", format!("eq.{}", routine_id)),
        ("scheduled_date", format!("gte.{}", from)),
        ("scheduled_date", format!("lte.{}", to)),
        ("order", "scheduled_date.asc".to_string()),
      ],
    )?;
    self.get_rows(url).await
  }

  async fn upsert_routine_instances(
    &self,
    instances: &[NewRoutineInstance],
  ) -> Result<u64, StoreError> {
    if instances.is_empty() {
      return Ok(0);
    }

    let rows: Vec<RoutineInstance> = instances
      .iter()
      .map(|i| RoutineInstance {
        id: Uuid::new_v4(),
        scheduled_routine_id: i.scheduled_routine_id,
        scheduled_date: i.scheduled_date,
        scheduled_time: i.scheduled_time,
        status: i.status,
        workout_log_id: None,
        completed_at: None,
      })
      .collect();

    let url = self.endpoint(
      "routine_instances",
      &[("on_conflict", "scheduled_routine_id,scheduled_date".to_string())],
    )?;
    let response = self
      .authorized(self.client.post(url))
      .header("Prefer", "resolution=ignore-duplicates,return=representation")
      .json(&rows)
      .send()
      .await?;

    // Skipped duplicates are absent from the representation
    let inserted: Vec<serde_json::Value> = read_rows(response).await?;
    Ok(inserted.len() as u64)
  }

  async fn update_instance_status(
    &self,
    instance_id: Uuid,
    update: &InstanceStatusUpdate,
  ) -> Result<bool, StoreError> {
    if !InstanceStatus::Pending.can_transition_to(update.status) {
      return Ok(false);
    }

    let url = self.endpoint(
      "routine_instances",
      &[
        ("id", format!("eq.{}", instance_id)),
        ("status", "eq.pending".to_string()),
      ],
    )?;
    let response = self
      .authorized(self.client.patch(url))
      .header("Prefer", "return=representation")
      .json(update)
      .send()
      .await?;

    let updated: Vec<serde_json::Value> = read_rows(response).await?;
    Ok(!updated.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveTime;
  use mockito::{Matcher, Server};
  use serde_json::json;

  fn store_for(server: &Server) -> RestStore {
    let config = RestConfig::new(&server.url(), "anon-key", Some("user-token")).unwrap();
    RestStore::new(config)
  }

  #[test]
  fn test_config_normalizes_base_url() {
    let config = RestConfig::new("https://example.test/rest/v1", "key", None).unwrap();
    assert_eq!(config.base_url.as_str(), "https://example.test/rest/v1/");
    // Without a user token the API key doubles as bearer
    assert_eq!(config.access_token, "key");
    assert!(RestConfig::new("not a url", "key", None).is_err());
  }

  #[tokio::test]
  async fn test_fetch_workouts_sends_filters_and_auth() {
    let mut server = Server::new_async().await;
    let user_id = Uuid::new_v4();
    let workout_id = Uuid::new_v4();

    let mock = server
      .mock("GET", "/workout_logs")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("user_id".into(), format!("eq.{}", user_id)),
        Matcher::UrlEncoded("order".into(), "log_date.asc".into()),
      ]))
      .match_header("apikey", "anon-key")
      .match_header("authorization", "Bearer user-token")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        json!([{
          "id": workout_id,
          "user_id": user_id,
          "log_date": "2024-03-04",
          "exercises": {
            "title": "Push day",
            "exercises": [{ "name": "Bench Press", "sets": [{ "weight": "135", "reps": 10 }] }]
          }
        }])
        .to_string(),
      )
      .create_async()
      .await;

    let workouts = store_for(&server).fetch_workouts(user_id).await.unwrap();
    mock.assert_async().await;

    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].id, workout_id);
    let exercises = workouts[0].exercises();
    assert_eq!(exercises[0].name, "Bench Press");
    assert_eq!(exercises[0].sets[0].loaded(), Some((135.0, 10)));
  }

  #[tokio::test]
  async fn test_error_status_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/scheduled_routines")
      .match_query(Matcher::Any)
      .with_status(401)
      .with_body("JWT expired")
      .create_async()
      .await;

    let err = store_for(&server)
      .fetch_scheduled_routines(Uuid::new_v4())
      .await
      .unwrap_err();

    match err {
      StoreError::Status { status, body } => {
        assert_eq!(status, 401);
        assert_eq!(body, "JWT expired");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn test_fetch_routines_tolerates_legacy_templates() {
    let mut server = Server::new_async().await;
    let user_id = Uuid::new_v4();
    let routine = |day: &str, data: serde_json::Value| {
      json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "routine_name": "Legs",
        "routine_data": data,
        "day_of_week": day,
        "scheduled_time": "07:00:00",
        "recurring": "indefinitely",
        "start_date": "2024-03-01",
        "end_date": null,
        "is_active": true
      })
    };

    let _mock = server
      .mock("GET", "/scheduled_routines")
      .match_query(Matcher::Any)
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(
        json!([
          routine("Monday", json!([{ "name": "Squat", "sets": [{ "reps": "8-12" }] }])),
          routine("Thursday", json!("not a template")),
          routine("Saturday", json!(null)),
        ])
        .to_string(),
      )
      .create_async()
      .await;

    let routines = store_for(&server).fetch_scheduled_routines(user_id).await.unwrap();
    assert_eq!(routines.len(), 3);
    assert_eq!(routines[0].routine_data[0].sets, 1);
    assert!(routines[1].routine_data.is_empty());
    assert!(routines[2].routine_data.is_empty());
    assert_eq!(routines[2].scheduled_time, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
  }

  #[tokio::test]
  async fn test_upsert_counts_returned_rows() {
    let mut server = Server::new_async().await;
    let routine_id = Uuid::new_v4();

    let mock = server
      .mock("POST", "/routine_instances")
      .match_query(Matcher::UrlEncoded(
        "on_conflict".into(),
        "scheduled_routine_id,scheduled_date".into(),
      ))
      .match_header("prefer", "resolution=ignore-duplicates,return=representation")
      .with_status(201)
      .with_header("content-type", "application/json")
      .with_body(
        json!([{
          "id": Uuid::new_v4(),
          "scheduled_routine_id": routine_id,
          "scheduled_date": "2024-03-11",
          "scheduled_time": "07:00:00",
          "status": "pending",
          "workout_log_id": null,
          "completed_at": null
        }])
        .to_string(),
      )
      .create_async()
      .await;

    let time = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
    let batch: Vec<NewRoutineInstance> = [4, 11]
      .into_iter()
      .map(|day| NewRoutineInstance {
        scheduled_routine_id: routine_id,
        scheduled_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        scheduled_time: time,
        status: InstanceStatus::Pending,
      })
      .collect();

    let inserted = store_for(&server).upsert_routine_instances(&batch).await.unwrap();
    mock.assert_async().await;
    assert_eq!(inserted, 1);

    // Nothing to send means no request at all
    assert_eq!(store_for(&server).upsert_routine_instances(&[]).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_status_update_guards_on_pending() {
    let mut server = Server::new_async().await;
    let instance_id = Uuid::new_v4();

    let mock = server
      .mock("PATCH", "/routine_instances")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("id".into(), format!("eq.{}", instance_id)),
        Matcher::UrlEncoded("status".into(), "eq.pending".into()),
      ]))
      .match_body(Matcher::PartialJson(json!({ "status": "skipped" })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body("[]")
      .create_async()
      .await;

    let applied = store_for(&server)
      .update_instance_status(instance_id, &InstanceStatusUpdate::skipped())
      .await
      .unwrap();
    mock.assert_async().await;
    assert!(!applied);
  }
}
