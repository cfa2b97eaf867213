//! Wiring from configuration to a running desk.

use std::{path::Path, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
  actor::{DeskActor, DeskHandle, DeskStores},
  domain::config::Config,
  relational::{RelationalError, RelationalService},
  store::{FileCache, LocalCache, RealtimeStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
  #[error("Failed to set up realtime store: {0}")]
  Realtime(#[from] StoreError),
  #[error("Failed to set up relational service: {0}")]
  Relational(#[from] RelationalError),
}

/// A running desk actor and the token that stops it.
pub struct FrontDesk {
  handle: DeskHandle,
  cancel: CancellationToken,
}

impl FrontDesk {
  /// Build the stores named by `config` and spawn the desk actor.
  ///
  /// Must be called from within a tokio runtime.
  pub fn open(config: &Config, data_dir: &Path) -> Result<Self, OpenError> {
    let cache_dir = config
      .cache
      .directory
      .clone()
      .unwrap_or_else(|| crate::dirs::cache_dir(data_dir));
    info!(cache = %cache_dir.display(), "Opening front desk");

    let stores = DeskStores {
      cache: Arc::new(FileCache::new(cache_dir)) as Arc<dyn LocalCache>,
      realtime: <dyn RealtimeStore>::from_config(config, data_dir)?,
      relational: <dyn RelationalService>::from_config(config)?,
    };

    let cancel = CancellationToken::new();
    let handle = DeskActor::spawn(stores, cancel.clone());
    Ok(Self { handle, cancel })
  }

  pub fn handle(&self) -> DeskHandle {
    self.handle.clone()
  }

  /// Stop the actor after it finishes the message in hand.
  pub fn close(self) {
    self.cancel.cancel();
  }
}
