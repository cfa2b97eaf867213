//! String identifier newtypes.
//!
//! Identifiers coming back from the realtime store and the relational service
//! were written by several clients over time, so some are JSON strings and some
//! are JSON numbers. All of them deserialize from either and serialize as strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
  String(String),
  Signed(i64),
  Unsigned(u64),
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match StringOrNumber::deserialize(deserializer)? {
    StringOrNumber::String(s) => s,
    StringOrNumber::Signed(n) => n.to_string(),
    StringOrNumber::Unsigned(n) => n.to_string(),
  })
}

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct $name(#[serde(deserialize_with = "crate::domain::ids::lenient_string")] String);

    impl $name {
      pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
      }

      pub fn as_str(&self) -> &str {
        &self.0
      }

      pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
      }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(value: &str) -> Self {
        Self(value.to_string())
      }
    }

    impl From<String> for $name {
      fn from(value: String) -> Self {
        Self(value)
      }
    }
  };
}
