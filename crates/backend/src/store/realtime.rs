//! Remote copy of the live queue.
//!
//! The value is the serialized [`QueueSnapshot`](crate::queue::QueueSnapshot)
//! of one hospital. Writes always overwrite the whole value; nothing is merged.

use std::{
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use super::{FirebaseRealtimeStore, StoreError};
use crate::domain::{
  config::{Config, RealtimeProvider},
  session::HospitalId,
};

#[async_trait]
pub trait RealtimeStore: Send + Sync {
  fn name(&self) -> &str;

  async fn read(&self, hospital: &HospitalId) -> Result<Option<String>, StoreError>;
  async fn write(&self, hospital: &HospitalId, value: &str) -> Result<(), StoreError>;
}

impl dyn RealtimeStore {
  pub fn from_config(config: &Config, data_dir: &Path) -> Result<Arc<dyn RealtimeStore>, StoreError> {
    let store: Arc<dyn RealtimeStore> = match config.realtime.provider {
      RealtimeProvider::File => Arc::new(FileRealtimeStore::new(crate::dirs::realtime_dir(data_dir))),
      RealtimeProvider::Firebase => Arc::new(FirebaseRealtimeStore::new(&config.realtime, config.realtime_token())?),
      RealtimeProvider::Memory => Arc::new(MemoryRealtimeStore::new()),
    };
    info!(provider = store.name(), "Realtime store initialized");
    Ok(store)
  }
}

// ============================================================================
// File-backed store
// ============================================================================

/// `{dir}/{uid}.json` per hospital.
#[derive(Debug, Clone)]
pub struct FileRealtimeStore {
  dir: PathBuf,
}

impl FileRealtimeStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, hospital: &HospitalId) -> PathBuf {
    self.dir.join(format!("{}.json", hospital))
  }
}

#[async_trait]
impl RealtimeStore for FileRealtimeStore {
  fn name(&self) -> &str {
    "file"
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %hospital))]
  async fn read(&self, hospital: &HospitalId) -> Result<Option<String>, StoreError> {
    match tokio::fs::read_to_string(self.path_for(hospital)).await {
      Ok(value) => Ok(Some(value)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %hospital, bytes = value.len()))]
  async fn write(&self, hospital: &HospitalId, value: &str) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(&self.dir).await?;

    let path = self.path_for(hospital);
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, value).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
  }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process store with a switch that makes every call fail.
#[derive(Debug, Default)]
pub struct MemoryRealtimeStore {
  values: DashMap<HospitalId, String>,
  failing: AtomicBool,
  writes: AtomicUsize,
}

impl MemoryRealtimeStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Current value without going through the trait.
  pub fn value(&self, hospital: &HospitalId) -> Option<String> {
    self.values.get(hospital).map(|v| v.value().clone())
  }

  /// Number of successful writes so far.
  pub fn writes(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  fn check(&self) -> Result<(), StoreError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(StoreError::Unavailable("memory store set to fail".to_string()));
    }
    Ok(())
  }
}

#[async_trait]
impl RealtimeStore for MemoryRealtimeStore {
  fn name(&self) -> &str {
    "memory"
  }

  async fn read(&self, hospital: &HospitalId) -> Result<Option<String>, StoreError> {
    self.check()?;
    Ok(self.value(hospital))
  }

  async fn write(&self, hospital: &HospitalId, value: &str) -> Result<(), StoreError> {
    self.check()?;
    self.values.insert(hospital.clone(), value.to_string());
    self.writes.fetch_add(1, Ordering::SeqCst);
    debug!(hospital = %hospital, bytes = value.len(), "Memory realtime value written");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  #[tokio::test]
  async fn test_file_store_read_missing_is_none() {
    let temp = TempDir::new().unwrap();
    let store = FileRealtimeStore::new(temp.path().join("realtime"));
    assert_eq!(store.read(&HospitalId::from("h1")).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_file_store_overwrites_whole_value() {
    let temp = TempDir::new().unwrap();
    let store = FileRealtimeStore::new(temp.path().join("realtime"));
    let hospital = HospitalId::from("h1");

    store.write(&hospital, r#"{"1":{}}"#).await.unwrap();
    store.write(&hospital, "{}").await.unwrap();
    assert_eq!(store.read(&hospital).await.unwrap().as_deref(), Some("{}"));
    assert!(temp.path().join("realtime/h1.json").exists());
  }

  #[tokio::test]
  async fn test_memory_store_failure_switch() {
    let store = MemoryRealtimeStore::new();
    let hospital = HospitalId::from("h1");

    store.write(&hospital, "{}").await.unwrap();
    store.set_failing(true);
    assert!(matches!(store.write(&hospital, "x").await, Err(StoreError::Unavailable(_))));
    assert!(store.read(&hospital).await.is_err());
    assert_eq!(store.value(&hospital).as_deref(), Some("{}"));
    assert_eq!(store.writes(), 1);
  }

  #[test]
  fn test_from_config_requires_firebase_url() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.realtime.provider = RealtimeProvider::Firebase;
    let result = <dyn RealtimeStore>::from_config(&config, temp.path());
    assert!(matches!(result, Err(StoreError::MissingConfig(_))));
  }
}
