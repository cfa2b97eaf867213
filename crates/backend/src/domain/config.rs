//! Configuration system for the front desk.
//!
//! Config location: `$CONFIG_DIR/config.toml` > `$XDG_CONFIG_HOME/frontdesk/config.toml`
//! > platform config dir. Every section falls back to defaults, so an absent or
//! partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// Realtime Store Configuration
// ============================================================================

/// Where the live queue is mirrored remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeProvider {
  /// `{data_dir}/realtime/{uid}.json`, for single-desk installs
  #[default]
  File,
  /// Firebase realtime database REST API
  Firebase,
  /// In-process only; nothing survives the process
  Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
  pub provider: RealtimeProvider,

  /// Database URL, e.g. `https://my-app-default-rtdb.firebaseio.com`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,

  /// Database auth token (falls back to FRONTDESK_FIREBASE_TOKEN)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub auth_token: Option<String>,

  /// Request timeout in seconds
  /// Default: 10
  pub timeout_secs: u64,
}

impl Default for RealtimeConfig {
  fn default() -> Self {
    Self {
      provider: RealtimeProvider::default(),
      url: None,
      auth_token: None,
      timeout_secs: 10,
    }
  }
}

// ============================================================================
// Relational Service Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationalProvider {
  /// No relational backend; patients are queued without appointment records
  #[default]
  None,
  /// Supabase (PostgREST) project
  Supabase,
  /// In-process only
  Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
  pub provider: RelationalProvider,

  /// Project URL, e.g. `https://abcd.supabase.co`
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,

  /// Anon or service key (falls back to FRONTDESK_SUPABASE_KEY)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,

  /// Request timeout in seconds
  /// Default: 10
  pub timeout_secs: u64,
}

impl Default for RelationalConfig {
  fn default() -> Self {
    Self {
      provider: RelationalProvider::default(),
      url: None,
      api_key: None,
      timeout_secs: 10,
    }
  }
}

// ============================================================================
// Cache Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Override for the local cache directory (default: `{data_dir}/cache`)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub directory: Option<PathBuf>,
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "warn"
  #[serde(default = "default_log_level")]
  pub level: String,

  /// Also write logs to `{data_dir}/frontdesk.log`
  /// Default: false
  pub file: bool,

  /// Log file rotation: "daily", "hourly", "never"
  /// Default: "daily"
  #[serde(default = "default_log_rotation")]
  pub rotation: String,
}

fn default_log_level() -> String {
  "warn".to_string()
}
fn default_log_rotation() -> String {
  "daily".to_string()
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: false,
      rotation: default_log_rotation(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Remote mirror of the live queue
  #[serde(default)]
  pub realtime: RealtimeConfig,

  /// Patient and appointment records
  #[serde(default)]
  pub relational: RelationalConfig,

  /// On-device cache
  #[serde(default)]
  pub cache: CacheConfig,

  /// Log output
  #[serde(default)]
  pub logging: LoggingConfig,
}

impl Config {
  /// Load the user config, falling back to defaults when absent or unreadable
  pub fn load() -> Self {
    match Self::config_path() {
      Some(path) => Self::load_from(&path),
      None => Self::default(),
    }
  }

  /// Load from an explicit path
  pub fn load_from(path: &Path) -> Self {
    if !path.exists() {
      debug!(path = %path.display(), "No config file, using defaults");
      return Self::default();
    }

    match std::fs::read_to_string(path).map(|content| toml::from_str::<Config>(&content)) {
      Ok(Ok(config)) => config,
      Ok(Err(e)) => {
        warn!(path = %path.display(), err = %e, "Invalid config file, using defaults");
        Self::default()
      }
      Err(e) => {
        warn!(path = %path.display(), err = %e, "Unreadable config file, using defaults");
        Self::default()
      }
    }
  }

  /// Get the user-level config path
  pub fn config_path() -> Option<PathBuf> {
    Some(crate::dirs::default_config_dir().join("config.toml"))
  }

  /// Firebase token from config or FRONTDESK_FIREBASE_TOKEN
  pub fn realtime_token(&self) -> Option<String> {
    self
      .realtime
      .auth_token
      .clone()
      .or_else(|| std::env::var("FRONTDESK_FIREBASE_TOKEN").ok())
  }

  /// Supabase key from config or FRONTDESK_SUPABASE_KEY
  pub fn relational_key(&self) -> Option<String> {
    self
      .relational
      .api_key
      .clone()
      .or_else(|| std::env::var("FRONTDESK_SUPABASE_KEY").ok())
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    r#"# Front desk configuration

# ============================================================================
# Realtime Queue Store
# ============================================================================

[realtime]
# Provider: file (local directory), firebase, or memory
provider = "file"
# url = "https://my-app-default-rtdb.firebaseio.com"
# auth_token = "..."    # or set FRONTDESK_FIREBASE_TOKEN
timeout_secs = 10

# ============================================================================
# Relational Service (patients, appointments)
# ============================================================================

[relational]
# Provider: none, supabase, or memory
provider = "none"
# url = "https://abcd.supabase.co"
# api_key = "..."       # or set FRONTDESK_SUPABASE_KEY
timeout_secs = 10

# ============================================================================
# Local Cache
# ============================================================================

[cache]
# directory = "/var/lib/frontdesk/cache"

# ============================================================================
# Logging
# ============================================================================

[logging]
# off, error, warn, info, debug, trace (RUST_LOG overrides)
level = "warn"
file = false
# daily, hourly, never
rotation = "daily"
"#
    .to_string()
  }
}
