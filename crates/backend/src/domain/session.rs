use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, require};

string_id!(
  /// Signed-in hospital account; addresses the realtime value and scopes relational records.
  HospitalId
);

/// The signed-in desk user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub uid: HospitalId,
  #[serde(default)]
  pub email: String,
}

impl Session {
  pub fn new(uid: impl Into<HospitalId>, email: impl Into<String>) -> Self {
    Self {
      uid: uid.into(),
      email: email.into(),
    }
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    require("uid", self.uid.as_str())?;
    Ok(())
  }
}
