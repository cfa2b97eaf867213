//! Filesystem locations.
//!
//! Both the data and the config directory resolve the same way: an explicit
//! override variable, then the XDG variable joined with `frontdesk`, then the
//! platform default joined with `frontdesk`.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "frontdesk";

fn resolve(override_var: &str, xdg_var: &str, platform: Option<PathBuf>) -> PathBuf {
  if let Some(dir) = std::env::var_os(override_var) {
    return PathBuf::from(dir);
  }
  if let Some(xdg) = std::env::var_os(xdg_var) {
    return PathBuf::from(xdg).join(APP_DIR);
  }
  platform.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Base path for local cache files, file-backed stores and logs (`DATA_DIR` > `XDG_DATA_HOME`).
pub fn default_data_dir() -> PathBuf {
  resolve("DATA_DIR", "XDG_DATA_HOME", dirs::data_local_dir())
}

/// Directory holding `config.toml` (`CONFIG_DIR` > `XDG_CONFIG_HOME`).
pub fn default_config_dir() -> PathBuf {
  resolve("CONFIG_DIR", "XDG_CONFIG_HOME", dirs::config_dir())
}

/// One file per cache key.
pub fn cache_dir(data_dir: &Path) -> PathBuf {
  data_dir.join("cache")
}

/// One file per hospital for the file-backed realtime store.
pub fn realtime_dir(data_dir: &Path) -> PathBuf {
  data_dir.join("realtime")
}
