//! Logging setup for CLI commands

use std::path::Path;

use frontdesk::config::LoggingConfig;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "frontdesk.log";

/// Parse log level from config string
fn parse_log_level(level: &str) -> LevelFilter {
  level.trim().parse().unwrap_or(LevelFilter::WARN)
}

fn env_filter(level: LevelFilter) -> EnvFilter {
  // RUST_LOG overrides the configured level
  EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy()
}

/// Initialize logging: stderr always, plus a rolling file in the data dir when
/// `logging.file` is set.
///
/// Returns the guard that must be kept alive for the duration of the program
pub fn init_logging(config: &LoggingConfig, data_dir: &Path) -> Option<WorkerGuard> {
  let level = parse_log_level(&config.level);

  let console = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_filter(env_filter(level));

  if !config.file || std::fs::create_dir_all(data_dir).is_err() {
    tracing_subscriber::registry().with(console).init();
    return None;
  }

  let file_appender = match config.rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(data_dir, LOG_FILE),
    "never" => tracing_appender::rolling::never(data_dir, LOG_FILE),
    _ => tracing_appender::rolling::daily(data_dir, LOG_FILE),
  };
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  let file = tracing_subscriber::fmt::layer()
    .with_writer(file_writer)
    .with_ansi(false)
    .with_target(true)
    .with_filter(env_filter(level));

  tracing_subscriber::registry().with(console).with(file).init();
  Some(guard)
}
