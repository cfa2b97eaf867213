//! Doctor roster.
//!
//! The roster is desk-local: it lives in the local cache only and supplies the
//! denormalized doctor fields copied into queue entries at append time.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
  queue::DoctorId,
  validation::{ValidationError, require},
};

string_id!(
  /// Doctor record in the relational service.
  DoctorRef
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
  #[default]
  #[serde(alias = "male")]
  Male,
  #[serde(alias = "female")]
  Female,
  #[serde(alias = "other")]
  Other,
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Male => "Male",
      Self::Female => "Female",
      Self::Other => "Other",
    })
  }
}

impl FromStr for Gender {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "male" | "m" => Ok(Self::Male),
      "female" | "f" => Ok(Self::Female),
      "other" | "o" => Ok(Self::Other),
      _ => Err(ValidationError::invalid("gender", format!("'{}' (expected male, female or other)", s))),
    }
  }
}

/// A doctor profile as kept on the desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
  pub name: String,
  pub department: String,
  #[serde(rename = "phoneNumber")]
  pub phone_number: String,
  #[serde(default)]
  pub gender: Gender,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
  #[serde(rename = "doctor_id", default, skip_serializing_if = "Option::is_none")]
  pub doctor_ref: Option<DoctorRef>,
}

impl Doctor {
  pub fn new(name: impl Into<String>, department: impl Into<String>, phone_number: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      department: department.into(),
      phone_number: phone_number.into(),
      gender: Gender::default(),
      image: None,
      doctor_ref: None,
    }
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    require("name", &self.name)?;
    require("department", &self.department)?;
    require("phone number", &self.phone_number)?;
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error("Doctor not found: {0}")]
  NotFound(DoctorId),
}

/// A doctor taken off the roster and the keys that moved to close the gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedDoctor {
  pub doctor: Doctor,
  /// `(old, new)` for every doctor whose key changed.
  pub rekeyed: Vec<(DoctorId, DoctorId)>,
}

/// Doctors keyed by a dense 1-based integer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorRoster {
  doctors: BTreeMap<u32, Doctor>,
}

impl DoctorRoster {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.doctors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.doctors.is_empty()
  }

  pub fn get(&self, id: &DoctorId) -> Option<&Doctor> {
    Self::key(id).and_then(|k| self.doctors.get(&k))
  }

  /// Doctors in key order.
  pub fn iter(&self) -> impl Iterator<Item = (DoctorId, &Doctor)> {
    self.doctors.iter().map(|(k, d)| (DoctorId::new(k.to_string()), d))
  }

  /// Add a doctor at key `len + 1`.
  pub fn add(&mut self, doctor: Doctor) -> Result<DoctorId, RosterError> {
    doctor.validate()?;

    let mut key = self.doctors.len() as u32 + 1;
    if self.doctors.contains_key(&key) {
      key = self.doctors.keys().next_back().copied().unwrap_or(0) + 1;
    }
    self.doctors.insert(key, doctor);
    Ok(DoctorId::new(key.to_string()))
  }

  /// Replace a doctor's profile in place.
  pub fn modify(&mut self, id: &DoctorId, doctor: Doctor) -> Result<(), RosterError> {
    doctor.validate()?;

    let slot = Self::key(id)
      .and_then(|k| self.doctors.get_mut(&k))
      .ok_or_else(|| RosterError::NotFound(id.clone()))?;
    *slot = doctor;
    Ok(())
  }

  /// Remove a doctor and re-key the rest densely in key order.
  pub fn remove(&mut self, id: &DoctorId) -> Result<RemovedDoctor, RosterError> {
    let doctor = Self::key(id)
      .and_then(|k| self.doctors.remove(&k))
      .ok_or_else(|| RosterError::NotFound(id.clone()))?;

    let mut rekeyed = Vec::new();
    let remaining = std::mem::take(&mut self.doctors);
    for (i, (old, d)) in remaining.into_iter().enumerate() {
      let new = i as u32 + 1;
      if new != old {
        rekeyed.push((DoctorId::new(old.to_string()), DoctorId::new(new.to_string())));
      }
      self.doctors.insert(new, d);
    }
    Ok(RemovedDoctor { doctor, rekeyed })
  }

  fn key(id: &DoctorId) -> Option<u32> {
    id.as_str().trim().parse().ok()
  }
}
