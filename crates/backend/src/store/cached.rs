//! A value held in memory and mirrored to one cache key.

use std::{fmt, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::{LocalCache, StoreError};

/// Cache keys used by the desk.
pub mod keys {
  /// Signed-in session (`Option<Session>`)
  pub const USER: &str = "user";
  /// Doctor roster
  pub const DOCTORS: &str = "doctors";
  /// Local copy of the live queue
  pub const REALTIME: &str = "realtime";
}

pub struct CachedValue<T> {
  key: &'static str,
  cache: Arc<dyn LocalCache>,
  value: T,
}

impl<T> fmt::Debug for CachedValue<T>
where
  T: fmt::Debug,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CachedValue")
      .field("key", &self.key)
      .field("value", &self.value)
      .finish()
  }
}

impl<T> CachedValue<T>
where
  T: Serialize + DeserializeOwned + Default,
{
  /// Seed from the cache. An absent or unreadable value starts from the default.
  pub fn load(cache: Arc<dyn LocalCache>, key: &'static str) -> Self {
    let value = match cache.get_string(key) {
      Ok(Some(text)) => match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
          warn!(key, err = %e, "Corrupt cache value, starting from default");
          T::default()
        }
      },
      Ok(None) => {
        debug!(key, "No cached value");
        T::default()
      }
      Err(e) => {
        warn!(key, err = %e, "Failed to read cache, starting from default");
        T::default()
      }
    };

    Self { key, cache, value }
  }

  pub fn key(&self) -> &'static str {
    self.key
  }

  pub fn get(&self) -> &T {
    &self.value
  }

  /// Set the in-memory value and write it through to the cache.
  ///
  /// The in-memory value is updated even when the cache write fails.
  pub fn replace(&mut self, value: T) -> Result<(), StoreError> {
    let text = serde_json::to_string(&value)?;
    self.value = value;
    self.cache.set(self.key, &text)
  }

  pub fn reset(&mut self) -> Result<(), StoreError> {
    self.replace(T::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    domain::{queue::QueueSnapshot, session::Session},
    store::MemoryCache,
  };

  #[test]
  fn test_load_absent_is_default() {
    let cache: Arc<dyn LocalCache> = Arc::new(MemoryCache::new());
    let session = CachedValue::<Option<Session>>::load(cache, keys::USER);
    assert_eq!(session.get(), &None);
  }

  #[test]
  fn test_replace_writes_through() {
    let cache: Arc<dyn LocalCache> = Arc::new(MemoryCache::new());
    let mut session = CachedValue::<Option<Session>>::load(cache.clone(), keys::USER);
    session.replace(Some(Session::new("h1", "desk@example.com"))).unwrap();

    let reloaded = CachedValue::<Option<Session>>::load(cache, keys::USER);
    assert_eq!(reloaded.get().as_ref().map(|s| s.uid.as_str()), Some("h1"));
  }

  #[test]
  fn test_corrupt_value_falls_back_to_default() {
    let cache: Arc<dyn LocalCache> = Arc::new(MemoryCache::new());
    cache.set(keys::REALTIME, "{not json").unwrap();
    let queue = CachedValue::<QueueSnapshot>::load(cache, keys::REALTIME);
    assert!(queue.get().is_empty());
  }

  #[test]
  fn test_reset_clears_cache_value() {
    let cache: Arc<dyn LocalCache> = Arc::new(MemoryCache::new());
    let mut queue = CachedValue::<QueueSnapshot>::load(cache.clone(), keys::REALTIME);
    queue
      .replace(QueueSnapshot::from_json(r#"{"1": {"name": "a", "docid": "1", "waitno": 0}}"#).unwrap())
      .unwrap();
    queue.reset().unwrap();

    assert!(queue.get().is_empty());
    assert_eq!(cache.get_string(keys::REALTIME).unwrap().as_deref(), Some("{}"));
  }
}
