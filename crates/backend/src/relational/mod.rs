//! Patient and appointment records.
//!
//! The queue only holds references into this service. A patient is found or
//! created on admission, an appointment is opened for the visit, and its
//! consultation times are stamped as the doctor's line advances.

mod memory;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use memory::{AppointmentRecord, MemoryRelational};
use serde::{Deserialize, Serialize};
pub use supabase::SupabaseService;
use tracing::info;

use crate::domain::{
  admission::{AppointmentType, PatientDetails},
  config::{Config, RelationalProvider},
  queue::{AppointmentRef, PatientRef},
  roster::DoctorRef,
  session::HospitalId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
  Scheduled,
  Completed,
}

/// Appointment to open for a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
  pub hospital: HospitalId,
  pub doctor: Option<DoctorRef>,
  pub patient: PatientRef,
  pub appointment_type: AppointmentType,
  pub reason_for_visit: String,
  /// Appointment time; the consultation start time is initialised to the same instant.
  pub at: DateTime<Utc>,
}

/// A patient on file, as offered to the desk when a returning patient gives
/// their mobile number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMatch {
  #[serde(rename = "patient_id")]
  pub patient_ref: PatientRef,
  pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RelationalError {
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Request timed out")]
  Timeout,
  #[error("Relational service returned {status}: {body}")]
  Http { status: u16, body: String },
  #[error("Unexpected response: {0}")]
  UnexpectedResponse(String),
  #[error("Appointment not found: {0}")]
  AppointmentNotFound(AppointmentRef),
  #[error("Missing configuration: {0}")]
  MissingConfig(&'static str),
  #[error("Relational service unavailable: {0}")]
  Unavailable(String),
}

#[async_trait]
pub trait RelationalService: Send + Sync {
  fn name(&self) -> &str;

  /// A patient with this name and mobile number who has visited this hospital.
  async fn find_patient(
    &self,
    hospital: &HospitalId,
    name: &str,
    mobile_number: &str,
  ) -> Result<Option<PatientRef>, RelationalError>;

  /// Every patient with this mobile number who has visited this hospital.
  /// Family members often share a number, so the desk picks one.
  async fn find_patients_by_mobile(
    &self,
    hospital: &HospitalId,
    mobile_number: &str,
  ) -> Result<Vec<PatientMatch>, RelationalError>;

  async fn create_patient(&self, patient: &PatientDetails) -> Result<PatientRef, RelationalError>;

  /// Open an appointment with status `scheduled`.
  async fn create_appointment(&self, appointment: &NewAppointment) -> Result<AppointmentRef, RelationalError>;

  async fn mark_consultation_started(
    &self,
    appointment: &AppointmentRef,
    at: DateTime<Utc>,
  ) -> Result<(), RelationalError>;

  /// Stamp the end time and mark the appointment `completed`.
  async fn mark_consultation_ended(&self, appointment: &AppointmentRef, at: DateTime<Utc>)
  -> Result<(), RelationalError>;
}

impl dyn RelationalService {
  /// `None` when no relational backend is configured.
  pub fn from_config(config: &Config) -> Result<Option<Arc<dyn RelationalService>>, RelationalError> {
    let service: Arc<dyn RelationalService> = match config.relational.provider {
      RelationalProvider::None => return Ok(None),
      RelationalProvider::Supabase => Arc::new(SupabaseService::new(&config.relational, config.relational_key())?),
      RelationalProvider::Memory => Arc::new(MemoryRelational::new()),
    };
    info!(provider = service.name(), "Relational service initialized");
    Ok(Some(service))
  }
}
