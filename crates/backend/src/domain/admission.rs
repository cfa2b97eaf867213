//! Patient intake.
//!
//! An [`Admission`] is what the desk fills in to put a patient in a doctor's
//! line: who the patient is, which doctor, and why they came.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
  queue::{DoctorId, PatientRef},
  roster::Gender,
  validation::{ValidationError, require},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentType {
  #[serde(rename = "Walk-in")]
  WalkIn,
  Booking,
  Emergency,
}

impl AppointmentType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::WalkIn => "Walk-in",
      Self::Booking => "Booking",
      Self::Emergency => "Emergency",
    }
  }
}

impl fmt::Display for AppointmentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AppointmentType {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
      "walkin" => Ok(Self::WalkIn),
      "booking" => Ok(Self::Booking),
      "emergency" => Ok(Self::Emergency),
      _ => Err(ValidationError::invalid(
        "appointment type",
        format!("'{}' (expected walk-in, booking or emergency)", s),
      )),
    }
  }
}

/// Registration details of a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
  pub name: String,
  pub address: String,
  pub date_of_birth: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  pub gender: Gender,
  pub mobile_number: String,
  /// How the patient heard about the hospital.
  pub discovery: String,
}

impl PatientDetails {
  pub fn validate(&self) -> Result<(), ValidationError> {
    require("name", &self.name)?;
    require("address", &self.address)?;
    require("mobile number", &self.mobile_number)?;
    require("discovery", &self.discovery)?;
    if self.date_of_birth > Utc::now().date_naive() {
      return Err(ValidationError::invalid("date of birth", "cannot be in the future"));
    }
    Ok(())
  }
}

/// A patient arriving for one doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
  pub doctor_id: DoctorId,
  pub patient: PatientDetails,
  pub appointment_type: AppointmentType,
  pub reason_for_visit: String,
  /// Patient picked from an earlier lookup. When set, no name and mobile
  /// match is attempted and no patient record is created.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub returning_patient: Option<PatientRef>,
}

impl Admission {
  pub fn validate(&self) -> Result<(), ValidationError> {
    require("doctor", self.doctor_id.as_str())?;
    self.patient.validate()?;
    require("reason for visit", &self.reason_for_visit)?;
    Ok(())
  }
}
