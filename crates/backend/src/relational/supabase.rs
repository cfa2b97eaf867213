//! Supabase over PostgREST.
//!
//! Tables used: `patients` and `appointments`. Inserts ask for the written row
//! back (`Prefer: return=representation`) to learn the generated id.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, trace, warn};

use super::{AppointmentStatus, NewAppointment, PatientMatch, RelationalError, RelationalService};
use crate::domain::{
  admission::{AppointmentType, PatientDetails},
  config::RelationalConfig,
  queue::{AppointmentRef, PatientRef},
  roster::{DoctorRef, Gender},
  session::HospitalId,
};

#[derive(Debug, Clone)]
pub struct SupabaseService {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

#[derive(Serialize)]
struct PatientRow<'a> {
  name: &'a str,
  address: &'a str,
  date_of_birth: String,
  email: Option<&'a str>,
  gender: Gender,
  contact_number: &'a str,
  how_did_you_get_to_know_us: &'a str,
}

#[derive(Serialize)]
struct AppointmentRow<'a> {
  hospital_id: &'a HospitalId,
  doctor_id: Option<&'a DoctorRef>,
  patient_id: &'a PatientRef,
  appointment_type: AppointmentType,
  reason_for_visit: &'a str,
  appointment_time: String,
  consultation_start_time: String,
  status: AppointmentStatus,
}

#[derive(Serialize)]
struct ConsultationUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  consultation_start_time: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  consultation_end_time: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  status: Option<AppointmentStatus>,
}

#[derive(Deserialize)]
struct PatientId {
  patient_id: PatientRef,
}

#[derive(Deserialize)]
struct AppointmentId {
  appointment_id: AppointmentRef,
}

fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn map_send_error(e: reqwest::Error) -> RelationalError {
  if e.is_timeout() {
    RelationalError::Timeout
  } else {
    RelationalError::Request(e)
  }
}

impl SupabaseService {
  pub fn new(config: &RelationalConfig, api_key: Option<String>) -> Result<Self, RelationalError> {
    let base_url = config
      .url
      .as_deref()
      .map(|u| u.trim().trim_end_matches('/').to_string())
      .filter(|u| !u.is_empty())
      .ok_or(RelationalError::MissingConfig("relational.url"))?;
    let api_key = api_key
      .filter(|k| !k.trim().is_empty())
      .ok_or(RelationalError::MissingConfig("relational.api_key"))?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;

    debug!(url = %base_url, "Supabase service initialized");
    Ok(Self {
      client,
      base_url,
      api_key,
    })
  }

  fn table_url(&self, table: &str, filters: &[(&str, String)]) -> Result<Url, RelationalError> {
    let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
      .map_err(|e| RelationalError::UnexpectedResponse(format!("invalid relational url: {}", e)))?;
    if !filters.is_empty() {
      let mut query = url.query_pairs_mut();
      for (key, value) in filters {
        query.append_pair(key, value);
      }
    }
    Ok(url)
  }

  /// Send a request and decode the row array PostgREST answers with.
  async fn rows<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Vec<T>, RelationalError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let started = Instant::now();
    let mut request = self
      .client
      .request(method.clone(), url)
      .header("apikey", &self.api_key)
      .header("Authorization", format!("Bearer {}", self.api_key))
      .header("Prefer", "return=representation");
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await.map_err(map_send_error)?;
    let status = response.status();
    trace!(%method, status = %status, elapsed_ms = started.elapsed().as_millis(), "Received response from Supabase");

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      if status.as_u16() == 401 || status.as_u16() == 403 {
        error!(status = %status, "Supabase authentication failed");
      } else {
        warn!(status = %status, "Supabase request failed");
      }
      return Err(RelationalError::Http {
        status: status.as_u16(),
        body,
      });
    }

    Ok(response.json().await?)
  }

  async fn update_appointment(
    &self,
    appointment: &AppointmentRef,
    update: &ConsultationUpdate,
  ) -> Result<(), RelationalError> {
    let url = self.table_url(
      "appointments",
      &[
        ("appointment_id", format!("eq.{}", appointment)),
        ("select", "appointment_id".to_string()),
      ],
    )?;
    let rows: Vec<AppointmentId> = self.rows(Method::PATCH, url, Some(update)).await?;
    if rows.is_empty() {
      return Err(RelationalError::AppointmentNotFound(appointment.clone()));
    }
    Ok(())
  }
}

#[async_trait]
impl RelationalService for SupabaseService {
  fn name(&self) -> &str {
    "supabase"
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %hospital))]
  async fn find_patient(
    &self,
    hospital: &HospitalId,
    name: &str,
    mobile_number: &str,
  ) -> Result<Option<PatientRef>, RelationalError> {
    let url = self.table_url(
      "patients",
      &[
        ("select", "patient_id,appointments!inner(appointment_id)".to_string()),
        ("contact_number", format!("eq.{}", mobile_number)),
        ("name", format!("eq.{}", name)),
        ("appointments.hospital_id", format!("eq.{}", hospital)),
        ("limit", "1".to_string()),
      ],
    )?;
    let rows: Vec<PatientId> = self.rows::<_, ()>(Method::GET, url, None).await?;
    Ok(rows.into_iter().next().map(|r| r.patient_id))
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %hospital))]
  async fn find_patients_by_mobile(
    &self,
    hospital: &HospitalId,
    mobile_number: &str,
  ) -> Result<Vec<PatientMatch>, RelationalError> {
    let url = self.table_url(
      "patients",
      &[
        ("select", "patient_id,name,appointments!inner(appointment_id)".to_string()),
        ("contact_number", format!("eq.{}", mobile_number)),
        ("appointments.hospital_id", format!("eq.{}", hospital)),
      ],
    )?;
    self.rows::<_, ()>(Method::GET, url, None).await
  }

  #[tracing::instrument(level = "debug", skip_all)]
  async fn create_patient(&self, patient: &PatientDetails) -> Result<PatientRef, RelationalError> {
    let row = PatientRow {
      name: &patient.name,
      address: &patient.address,
      date_of_birth: patient.date_of_birth.format("%Y-%m-%d").to_string(),
      email: patient.email.as_deref(),
      gender: patient.gender,
      contact_number: &patient.mobile_number,
      how_did_you_get_to_know_us: &patient.discovery,
    };
    let url = self.table_url("patients", &[("select", "patient_id".to_string())])?;
    let rows: Vec<PatientId> = self.rows(Method::POST, url, Some(&[row])).await?;
    rows
      .into_iter()
      .next()
      .map(|r| r.patient_id)
      .ok_or_else(|| RelationalError::UnexpectedResponse("patient insert returned no row".to_string()))
  }

  #[tracing::instrument(level = "debug", skip_all, fields(hospital = %appointment.hospital, patient = %appointment.patient))]
  async fn create_appointment(&self, appointment: &NewAppointment) -> Result<AppointmentRef, RelationalError> {
    let row = AppointmentRow {
      hospital_id: &appointment.hospital,
      doctor_id: appointment.doctor.as_ref(),
      patient_id: &appointment.patient,
      appointment_type: appointment.appointment_type,
      reason_for_visit: &appointment.reason_for_visit,
      appointment_time: timestamp(appointment.at),
      consultation_start_time: timestamp(appointment.at),
      status: AppointmentStatus::Scheduled,
    };
    let url = self.table_url("appointments", &[("select", "appointment_id".to_string())])?;
    let rows: Vec<AppointmentId> = self.rows(Method::POST, url, Some(&[row])).await?;
    rows
      .into_iter()
      .next()
      .map(|r| r.appointment_id)
      .ok_or_else(|| RelationalError::UnexpectedResponse("appointment insert returned no row".to_string()))
  }

  #[tracing::instrument(level = "debug", skip_all, fields(appointment = %appointment))]
  async fn mark_consultation_started(
    &self,
    appointment: &AppointmentRef,
    at: DateTime<Utc>,
  ) -> Result<(), RelationalError> {
    let update = ConsultationUpdate {
      consultation_start_time: Some(timestamp(at)),
      consultation_end_time: None,
      status: None,
    };
    self.update_appointment(appointment, &update).await
  }

  #[tracing::instrument(level = "debug", skip_all, fields(appointment = %appointment))]
  async fn mark_consultation_ended(
    &self,
    appointment: &AppointmentRef,
    at: DateTime<Utc>,
  ) -> Result<(), RelationalError> {
    let update = ConsultationUpdate {
      consultation_start_time: None,
      consultation_end_time: Some(timestamp(at)),
      status: Some(AppointmentStatus::Completed),
    };
    self.update_appointment(appointment, &update).await
  }
}
