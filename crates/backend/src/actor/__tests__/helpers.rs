//! Test helpers for desk actor integration tests.
//!
//! Provides `DeskTestContext`, which owns a temporary cache directory and the
//! in-memory collaborators, and spawns desk actors over them.

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::{
  actor::{DeskActor, DeskHandle, DeskStores},
  domain::{
    admission::{Admission, AppointmentType, PatientDetails},
    queue::{DoctorId, QueueSnapshot},
    roster::{Doctor, Gender},
    session::{HospitalId, Session},
  },
  relational::MemoryRelational,
  store::{CachedValue, FileCache, LocalCache, MemoryRealtimeStore, keys},
};

pub const HOSPITAL: &str = "hosp-1";

pub struct DeskTestContext {
  /// Keeps the cache directory alive for the test
  #[allow(dead_code)]
  pub data_dir: TempDir,
  pub cache: Arc<dyn LocalCache>,
  pub realtime: Arc<MemoryRealtimeStore>,
  pub relational: Arc<MemoryRelational>,
  pub cancel: CancellationToken,
}

impl DeskTestContext {
  pub fn new() -> Self {
    let data_dir = TempDir::new().expect("create data temp dir");
    let cache: Arc<dyn LocalCache> = Arc::new(FileCache::new(crate::dirs::cache_dir(data_dir.path())));

    Self {
      data_dir,
      cache,
      realtime: Arc::new(MemoryRealtimeStore::new()),
      relational: Arc::new(MemoryRelational::new()),
      cancel: CancellationToken::new(),
    }
  }

  pub fn hospital(&self) -> HospitalId {
    HospitalId::from(HOSPITAL)
  }

  /// Spawn an actor wired to the memory relational service.
  pub fn spawn(&self) -> DeskHandle {
    DeskActor::spawn(
      DeskStores {
        cache: self.cache.clone(),
        realtime: self.realtime.clone(),
        relational: Some(self.relational.clone()),
      },
      self.cancel.child_token(),
    )
  }

  pub fn spawn_without_relational(&self) -> DeskHandle {
    DeskActor::spawn(
      DeskStores {
        cache: self.cache.clone(),
        realtime: self.realtime.clone(),
        relational: None,
      },
      self.cancel.child_token(),
    )
  }

  /// Spawn, sign in and register one doctor (roster id "1").
  pub async fn ready(&self) -> DeskHandle {
    let handle = self.spawn();
    prepare(&handle).await;
    handle
  }

  /// Snapshot as last written to the realtime store.
  pub fn remote_snapshot(&self) -> Option<QueueSnapshot> {
    self
      .realtime
      .value(&self.hospital())
      .map(|text| QueueSnapshot::from_json(&text).expect("remote value should parse"))
  }

  /// Snapshot as held by the local cache.
  pub fn cached_snapshot(&self) -> QueueSnapshot {
    CachedValue::<QueueSnapshot>::load(self.cache.clone(), keys::REALTIME)
      .get()
      .clone()
  }
}

pub async fn prepare(handle: &DeskHandle) {
  handle
    .sign_in(Session::new(HOSPITAL, "desk@example.com"))
    .await
    .expect("sign in");
  let id = handle
    .add_doctor(Doctor::new("Dr Rao", "ENT", "555-0101"))
    .await
    .expect("add doctor");
  assert_eq!(id, DoctorId::from("1"));
}

pub fn admission(doctor: &str, name: &str, mobile: &str) -> Admission {
  Admission {
    doctor_id: DoctorId::from(doctor),
    patient: PatientDetails {
      name: name.to_string(),
      address: "22 Park St".to_string(),
      date_of_birth: NaiveDate::from_ymd_opt(1992, 3, 9).expect("valid date"),
      email: None,
      gender: Gender::Female,
      mobile_number: mobile.to_string(),
      discovery: "Referral".to_string(),
    },
    appointment_type: AppointmentType::WalkIn,
    reason_for_visit: "Sore throat".to_string(),
    returning_patient: None,
  }
}

/// (id, patient, wait number) in snapshot order
pub fn shape(snapshot: &QueueSnapshot) -> Vec<(u32, String, u32)> {
  snapshot
    .iter()
    .map(|e| (e.id.get(), e.patient_name.clone(), e.wait_number))
    .collect()
}

pub fn row(id: u32, patient: &str, wait: u32) -> (u32, String, u32) {
  (id, patient.to_string(), wait)
}
