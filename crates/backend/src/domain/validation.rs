//! Form validation shared by queue, roster and admission input.

/// Input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  MissingField(&'static str),
  #[error("Invalid {field}: {reason}")]
  Invalid { field: &'static str, reason: String },
}

impl ValidationError {
  pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Invalid {
      field,
      reason: reason.into(),
    }
  }
}

/// Reject blank (empty or whitespace-only) required fields.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    return Err(ValidationError::MissingField(field));
  }
  Ok(())
}
