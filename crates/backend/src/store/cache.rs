//! On-device key-value cache.
//!
//! Reads and writes are synchronous so a value can be written through before
//! the caller continues.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::trace;

use super::StoreError;

pub trait LocalCache: Send + Sync {
  fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
  fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One `{key}.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
  dir: PathBuf,
}

impl FileCache {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl LocalCache for FileCache {
  fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
    match std::fs::read_to_string(self.path_for(key)) {
      Ok(value) => Ok(Some(value)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    std::fs::create_dir_all(&self.dir)?;

    // rename is atomic on the same filesystem, so readers never see half a value
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value)?;
    std::fs::rename(&tmp, &path)?;

    trace!(key, bytes = value.len(), "Cache value written");
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    match std::fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
  values: DashMap<String, String>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LocalCache for MemoryCache {
  fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.values.get(key).map(|v| v.value().clone()))
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    self.values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    self.values.remove(key);
    Ok(())
  }
}
