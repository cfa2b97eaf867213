use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{AppointmentStatus, NewAppointment, PatientMatch, RelationalError, RelationalService};
use crate::domain::{
  admission::PatientDetails,
  queue::{AppointmentRef, PatientRef},
  session::HospitalId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRecord {
  pub appointment: NewAppointment,
  pub status: AppointmentStatus,
  pub consultation_start_time: DateTime<Utc>,
  pub consultation_end_time: Option<DateTime<Utc>>,
}

/// In-process records, with a switch that makes every call fail.
#[derive(Debug, Default)]
pub struct MemoryRelational {
  patients: DashMap<PatientRef, PatientDetails>,
  appointments: DashMap<AppointmentRef, AppointmentRecord>,
  failing: AtomicBool,
}

impl MemoryRelational {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn patient_count(&self) -> usize {
    self.patients.len()
  }

  pub fn appointment(&self, appointment: &AppointmentRef) -> Option<AppointmentRecord> {
    self.appointments.get(appointment).map(|r| r.value().clone())
  }

  pub fn appointment_count(&self) -> usize {
    self.appointments.len()
  }

  fn check(&self) -> Result<(), RelationalError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(RelationalError::Unavailable("memory service set to fail".to_string()));
    }
    Ok(())
  }

  fn visited(&self, patient: &PatientRef, hospital: &HospitalId) -> bool {
    self
      .appointments
      .iter()
      .any(|a| &a.appointment.patient == patient && &a.appointment.hospital == hospital)
  }

  fn update(
    &self,
    appointment: &AppointmentRef,
    apply: impl FnOnce(&mut AppointmentRecord),
  ) -> Result<(), RelationalError> {
    self.check()?;
    let mut record = self
      .appointments
      .get_mut(appointment)
      .ok_or_else(|| RelationalError::AppointmentNotFound(appointment.clone()))?;
    apply(record.value_mut());
    Ok(())
  }
}

#[async_trait]
impl RelationalService for MemoryRelational {
  fn name(&self) -> &str {
    "memory"
  }

  async fn find_patient(
    &self,
    hospital: &HospitalId,
    name: &str,
    mobile_number: &str,
  ) -> Result<Option<PatientRef>, RelationalError> {
    self.check()?;
    Ok(
      self
        .patients
        .iter()
        .filter(|p| p.name == name && p.mobile_number == mobile_number)
        .map(|p| p.key().clone())
        .find(|p| self.visited(p, hospital)),
    )
  }

  async fn find_patients_by_mobile(
    &self,
    hospital: &HospitalId,
    mobile_number: &str,
  ) -> Result<Vec<PatientMatch>, RelationalError> {
    self.check()?;
    let mut matches: Vec<PatientMatch> = self
      .patients
      .iter()
      .filter(|p| p.mobile_number == mobile_number && self.visited(p.key(), hospital))
      .map(|p| PatientMatch {
        patient_ref: p.key().clone(),
        name: p.name.clone(),
      })
      .collect();
    // v7 ids sort in creation order
    matches.sort_by(|a, b| a.patient_ref.cmp(&b.patient_ref));
    Ok(matches)
  }

  async fn create_patient(&self, patient: &PatientDetails) -> Result<PatientRef, RelationalError> {
    self.check()?;
    let id = PatientRef::new(Uuid::now_v7().to_string());
    self.patients.insert(id.clone(), patient.clone());
    debug!(patient = %id, "Patient created");
    Ok(id)
  }

  async fn create_appointment(&self, appointment: &NewAppointment) -> Result<AppointmentRef, RelationalError> {
    self.check()?;
    let id = AppointmentRef::new(Uuid::now_v7().to_string());
    self.appointments.insert(
      id.clone(),
      AppointmentRecord {
        appointment: appointment.clone(),
        status: AppointmentStatus::Scheduled,
        consultation_start_time: appointment.at,
        consultation_end_time: None,
      },
    );
    debug!(appointment = %id, "Appointment created");
    Ok(id)
  }

  async fn mark_consultation_started(
    &self,
    appointment: &AppointmentRef,
    at: DateTime<Utc>,
  ) -> Result<(), RelationalError> {
    self.update(appointment, |r| r.consultation_start_time = at)
  }

  async fn mark_consultation_ended(
    &self,
    appointment: &AppointmentRef,
    at: DateTime<Utc>,
  ) -> Result<(), RelationalError> {
    self.update(appointment, |r| {
      r.consultation_end_time = Some(at);
      r.status = AppointmentStatus::Completed;
    })
  }
}
