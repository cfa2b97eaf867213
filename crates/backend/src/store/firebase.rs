//! Firebase realtime database over its REST API.
//!
//! The queue lives at `users/{uid}/realtime` as a JSON *string* holding the
//! serialized snapshot, which is how desks have always stored it:
//!
//! ```text
//! GET   {base}/users/{uid}/realtime.json          -> "{\"1\":{...}}" | null
//! PATCH {base}/users/{uid}.json  {"realtime": "{\"1\":{...}}"}
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, trace, warn};

use super::{RealtimeStore, StoreError};
use crate::domain::{config::RealtimeConfig, session::HospitalId};

#[derive(Debug, Clone)]
pub struct FirebaseRealtimeStore {
  client: reqwest::Client,
  base_url: String,
  auth_token: Option<String>,
}

impl FirebaseRealtimeStore {
  pub fn new(config: &RealtimeConfig, auth_token: Option<String>) -> Result<Self, StoreError> {
    let base_url = config
      .url
      .as_deref()
      .map(|u| u.trim().trim_end_matches('/').to_string())
      .filter(|u| !u.is_empty())
      .ok_or(StoreError::MissingConfig("realtime.url"))?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;

    debug!(url = %base_url, has_token = auth_token.is_some(), "Firebase realtime store initialized");

    Ok(Self {
      client,
      base_url,
      auth_token,
    })
  }

  fn url(&self, path: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
      .map_err(|e| StoreError::Unavailable(format!("invalid realtime url: {}", e)))?;
    if let Some(token) = &self.auth_token {
      url.query_pairs_mut().append_pair("auth", token);
    }
    Ok(url)
  }

  async fn check(response: reqwest::Response, started: Instant) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    trace!(status = %status, elapsed_ms = started.elapsed().as_millis(), "Received response from Firebase");

    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, "Firebase request failed");
    Err(StoreError::Http {
      status: status.as_u16(),
      body,
    })
  }
}

fn map_send_error(e: reqwest::Error) -> StoreError {
  if e.is_timeout() {
    StoreError::Timeout
  } else {
    StoreError::Request(e)
  }
}

/// The stored value is normally a string; an object written by other tooling is
/// accepted as its JSON text.
fn realtime_text(value: serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::Null => None,
    serde_json::Value::String(text) => Some(text),
    other => Some(other.to_string()),
  }
}

#[async_trait]
impl RealtimeStore for FirebaseRealtimeStore {
  fn name(&self) -> &str {
    "firebase"
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %hospital))]
  async fn read(&self, hospital: &HospitalId) -> Result<Option<String>, StoreError> {
    let url = self.url(&format!("users/{}/realtime.json", hospital))?;
    let started = Instant::now();

    let response = self.client.get(url).send().await.map_err(map_send_error)?;
    let value: serde_json::Value = Self::check(response, started).await?.json().await?;
    Ok(realtime_text(value))
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %hospital, bytes = value.len()))]
  async fn write(&self, hospital: &HospitalId, value: &str) -> Result<(), StoreError> {
    let url = self.url(&format!("users/{}.json", hospital))?;
    let body = serde_json::json!({ "realtime": value });
    let started = Instant::now();

    let response = self
      .client
      .patch(url)
      .json(&body)
      .send()
      .await
      .map_err(map_send_error)?;
    Self::check(response, started).await?;
    Ok(())
  }
}
