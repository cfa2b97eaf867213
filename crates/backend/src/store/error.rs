#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("Realtime store returned {status}: {body}")]
  Http { status: u16, body: String },
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Request timed out")]
  Timeout,
  #[error("Missing configuration: {0}")]
  MissingConfig(&'static str),
  #[error("Store unavailable: {0}")]
  Unavailable(String),
}
