//! Admission flow against the relational service.

use chrono::Utc;
use tracing::{debug, info};

use crate::{
  domain::{
    admission::Admission,
    queue::{AppointmentRef, PatientRef},
    roster::DoctorRef,
    session::HospitalId,
  },
  relational::{NewAppointment, RelationalError, RelationalService},
};

/// Records opened for one visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
  pub patient_ref: PatientRef,
  pub appointment_ref: AppointmentRef,
}

/// Use the patient the desk picked, else find the returning patient (same name
/// and mobile number, seen at this hospital), else register a new one. Then
/// open an appointment for the visit.
pub async fn register_visit(
  relational: &dyn RelationalService,
  hospital: &HospitalId,
  doctor: Option<&DoctorRef>,
  admission: &Admission,
) -> Result<Visit, RelationalError> {
  let patient = &admission.patient;

  let known = match &admission.returning_patient {
    Some(picked) => Some(picked.clone()),
    None => {
      relational
        .find_patient(hospital, &patient.name, &patient.mobile_number)
        .await?
    }
  };

  let patient_ref = match known {
    Some(existing) => {
      debug!(patient = %existing, "Returning patient");
      existing
    }
    None => relational.create_patient(patient).await?,
  };

  let appointment = NewAppointment {
    hospital: hospital.clone(),
    doctor: doctor.cloned(),
    patient: patient_ref.clone(),
    appointment_type: admission.appointment_type,
    reason_for_visit: admission.reason_for_visit.clone(),
    at: Utc::now(),
  };
  let appointment_ref = relational.create_appointment(&appointment).await?;

  info!(
    hospital = %hospital,
    patient = %patient_ref,
    appointment = %appointment_ref,
    "Visit registered"
  );

  Ok(Visit {
    patient_ref,
    appointment_ref,
  })
}
