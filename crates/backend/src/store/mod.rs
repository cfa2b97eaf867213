//! Persistence collaborators.
//!
//! - [`LocalCache`]: synchronous on-device key-value cache
//! - [`CachedValue`]: one in-memory value mirrored to a cache key
//! - [`RealtimeStore`]: the remote copy of the live queue, overwritten whole

mod cache;
mod cached;
mod error;
mod firebase;
mod realtime;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use cached::{CachedValue, keys};
pub use error::StoreError;
pub use firebase::FirebaseRealtimeStore;
pub use realtime::{FileRealtimeStore, MemoryRealtimeStore, RealtimeStore};
