//! DeskActor - owns the desk state and applies every change to it
//!
//! # Persistence
//!
//! A queue change is applied in memory and written through to the local cache
//! first, then the whole snapshot overwrites the realtime value. If the remote
//! write fails the local state stays ahead and the caller gets
//! [`DeskError::Persistence`]; the next successful write or a `refresh`
//! reconciles the two. An advance that only took locally still records the
//! consultation times and reports them in [`DeskError::AdvanceNotSaved`].
//! Operations that change nothing write nothing.
//!
//! # Lifecycle
//!
//! The actor runs until one of:
//! - The CancellationToken is triggered
//! - A `DeskPayload::Shutdown` message is received
//! - Every handle is dropped

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
  AdvanceOutcome, ConsultationEvent, DeskError, NotificationFailure,
  handle::DeskHandle,
  message::{DeskMessage, DeskPayload, RequestId},
};
use crate::{
  domain::{
    admission::Admission,
    queue::{DoctorId, EntryId, NewEntry, QueueEntry, QueueSnapshot},
    roster::{Doctor, DoctorRoster},
    session::{HospitalId, Session},
    validation::require,
  },
  relational::{PatientMatch, RelationalService},
  service::{
    intake::{Visit, register_visit},
    queue as reindex,
  },
  store::{CachedValue, LocalCache, RealtimeStore, StoreError, keys},
};

/// Collaborators the actor is built from.
#[derive(Clone)]
pub struct DeskStores {
  pub cache: Arc<dyn LocalCache>,
  pub realtime: Arc<dyn RealtimeStore>,
  pub relational: Option<Arc<dyn RelationalService>>,
}

pub struct DeskActor {
  session: CachedValue<Option<Session>>,
  roster: CachedValue<DoctorRoster>,
  queue: CachedValue<QueueSnapshot>,
  realtime: Arc<dyn RealtimeStore>,
  relational: Option<Arc<dyn RelationalService>>,
  request_rx: mpsc::Receiver<DeskMessage>,
  cancel: CancellationToken,
}

impl DeskActor {
  /// Seed state from the local cache and start the event loop.
  pub fn spawn(stores: DeskStores, cancel: CancellationToken) -> DeskHandle {
    let (tx, rx) = mpsc::channel(64);

    let actor = Self {
      session: CachedValue::load(stores.cache.clone(), keys::USER),
      roster: CachedValue::load(stores.cache.clone(), keys::DOCTORS),
      queue: CachedValue::load(stores.cache, keys::REALTIME),
      realtime: stores.realtime,
      relational: stores.relational,
      request_rx: rx,
      cancel,
    };

    info!(
      signed_in = actor.session.get().is_some(),
      doctors = actor.roster.get().len(),
      entries = actor.queue.get().len(),
      realtime = actor.realtime.name(),
      relational = actor.relational.as_ref().map(|r| r.name()).unwrap_or("none"),
      "Spawning DeskActor"
    );

    tokio::spawn(actor.run());
    DeskHandle::new(tx)
  }

  async fn run(mut self) {
    loop {
      tokio::select! {
        biased;

        _ = self.cancel.cancelled() => {
          info!("DeskActor shutting down (cancelled)");
          break;
        }

        msg = self.request_rx.recv() => {
          match msg {
            Some(msg) => self.handle_message(msg).await,
            None => {
              info!("DeskActor shutting down (channel closed)");
              break;
            }
          }
        }
      }
    }

    info!("DeskActor stopped");
  }

  async fn handle_message(&mut self, msg: DeskMessage) {
    let DeskMessage { id, payload } = msg;
    debug!(request_id = %id, request_type = payload.kind(), "Handling request");

    // a dropped receiver only means the caller stopped waiting
    match payload {
      DeskPayload::Snapshot(reply) => {
        let _ = reply.send(self.queue.get().clone());
      }
      DeskPayload::Session(reply) => {
        let _ = reply.send(self.session.get().clone());
      }
      DeskPayload::Roster(reply) => {
        let _ = reply.send(self.roster.get().clone());
      }
      DeskPayload::SignIn { session, reply } => {
        let _ = reply.send(self.sign_in(session));
      }
      DeskPayload::SignOut(reply) => {
        let _ = reply.send(self.sign_out());
      }
      DeskPayload::Refresh(reply) => {
        let _ = reply.send(self.refresh().await);
      }
      DeskPayload::AddDoctor { doctor, reply } => {
        let _ = reply.send(self.add_doctor(doctor));
      }
      DeskPayload::ModifyDoctor { id, doctor, reply } => {
        let _ = reply.send(self.modify_doctor(&id, doctor));
      }
      DeskPayload::RemoveDoctor { id, reply } => {
        let _ = reply.send(self.remove_doctor(&id).await);
      }
      DeskPayload::FindPatients { mobile, reply } => {
        let _ = reply.send(self.find_patients(&mobile).await);
      }
      DeskPayload::Admit { admission, reply } => {
        let _ = reply.send(self.admit(*admission).await);
      }
      DeskPayload::Append { entry, reply } => {
        let _ = reply.send(self.append(entry).await);
      }
      DeskPayload::Advance { doctor, reply } => {
        let _ = reply.send(self.advance(id, &doctor).await);
      }
      DeskPayload::Delete { id: entry, reply } => {
        let _ = reply.send(self.delete(entry).await);
      }
      DeskPayload::Reorder { ids, reply } => {
        let _ = reply.send(self.reorder(&ids).await);
      }
      DeskPayload::MoveEntry { id: entry, position, reply } => {
        let _ = reply.send(self.move_entry(entry, position).await);
      }
      DeskPayload::Shutdown => {
        info!("DeskActor shutdown requested");
        self.cancel.cancel();
      }
    }
  }

  // ==========================================================================
  // Session
  // ==========================================================================

  fn hospital(&self) -> Result<HospitalId, DeskError> {
    self
      .session
      .get()
      .as_ref()
      .map(|s| s.uid.clone())
      .ok_or(DeskError::NotSignedIn)
  }

  fn sign_in(&mut self, session: Session) -> Result<(), DeskError> {
    session.validate()?;
    info!(hospital = %session.uid, "Signed in");
    self.session.replace(Some(session))?;
    Ok(())
  }

  fn sign_out(&mut self) -> Result<(), DeskError> {
    let hospital = self.session.get().as_ref().map(|s| s.uid.to_string());

    // every value is reset even if an earlier cache write fails
    let results = [self.session.reset(), self.roster.reset(), self.queue.reset()];
    info!(hospital = hospital.as_deref().unwrap_or("-"), "Signed out");
    results.into_iter().collect::<Result<(), StoreError>>()?;
    Ok(())
  }

  async fn refresh(&mut self) -> Result<bool, DeskError> {
    let hospital = self.hospital()?;

    let Some(text) = self.realtime.read(&hospital).await.map_err(DeskError::Persistence)? else {
      debug!(hospital = %hospital, "No remote queue");
      return Ok(false);
    };

    let snapshot = QueueSnapshot::from_json(&text).map_err(|e| DeskError::Persistence(StoreError::from(e)))?;
    if let Err(violation) = reindex::invariants::check(&snapshot) {
      warn!(hospital = %hospital, %violation, "Remote queue is not well formed");
    }
    info!(hospital = %hospital, entries = snapshot.len(), "Queue refreshed from realtime store");
    self.queue.replace(snapshot)?;
    Ok(true)
  }

  // ==========================================================================
  // Roster
  // ==========================================================================

  fn add_doctor(&mut self, doctor: Doctor) -> Result<DoctorId, DeskError> {
    let mut roster = self.roster.get().clone();
    let id = roster.add(doctor)?;
    self.roster.replace(roster)?;
    info!(doctor = %id, "Doctor added");
    Ok(id)
  }

  fn modify_doctor(&mut self, id: &DoctorId, doctor: Doctor) -> Result<(), DeskError> {
    let mut roster = self.roster.get().clone();
    roster.modify(id, doctor)?;
    self.roster.replace(roster)?;
    info!(doctor = %id, "Doctor modified");
    Ok(())
  }

  /// Remove a doctor from the roster and move queued lines to the new keys.
  ///
  /// Refused while the doctor still has patients queued.
  async fn remove_doctor(&mut self, id: &DoctorId) -> Result<Doctor, DeskError> {
    let waiting = self.queue.get().count_for(id);
    if waiting > 0 {
      return Err(DeskError::DoctorHasPatients { doctor: id.clone(), waiting });
    }

    let mut roster = self.roster.get().clone();
    let removed = roster.remove(id)?;
    let next = reindex::rename_doctors(self.queue.get(), &removed.rekeyed).map_err(DeskError::QueueConflict)?;
    let hospital = if &next != self.queue.get() { Some(self.hospital()?) } else { None };

    self.roster.replace(roster)?;
    info!(doctor = %id, name = %removed.doctor.name, rekeyed = removed.rekeyed.len(), "Doctor removed");

    if let Some(hospital) = hospital {
      self.persist(&hospital, next).await?;
    }
    Ok(removed.doctor)
  }

  // ==========================================================================
  // Queue
  // ==========================================================================

  /// Write a new snapshot locally, then overwrite the realtime value.
  async fn persist(&mut self, hospital: &HospitalId, next: QueueSnapshot) -> Result<(), DeskError> {
    let text = next.to_json().map_err(StoreError::from)?;
    let entries = next.len();
    self.queue.replace(next)?;

    if let Err(e) = self.realtime.write(hospital, &text).await {
      warn!(hospital = %hospital, entries, error = %e, "Realtime write failed, local queue is ahead");
      return Err(DeskError::Persistence(e));
    }

    info!(hospital = %hospital, entries, "Queue persisted");
    Ok(())
  }

  async fn find_patients(&self, mobile: &str) -> Result<Vec<PatientMatch>, DeskError> {
    require("mobile number", mobile)?;
    let hospital = self.hospital()?;
    let Some(relational) = &self.relational else {
      return Ok(Vec::new());
    };
    let found = relational.find_patients_by_mobile(&hospital, mobile.trim()).await?;
    debug!(hospital = %hospital, matches = found.len(), "Patients found by mobile");
    Ok(found)
  }

  async fn admit(&mut self, admission: Admission) -> Result<EntryId, DeskError> {
    admission.validate()?;
    let hospital = self.hospital()?;
    let doctor = self
      .roster
      .get()
      .get(&admission.doctor_id)
      .cloned()
      .ok_or_else(|| DeskError::DoctorNotFound(admission.doctor_id.clone()))?;

    let visit = match &self.relational {
      Some(relational) => {
        Some(register_visit(relational.as_ref(), &hospital, doctor.doctor_ref.as_ref(), &admission).await?)
      }
      None => None,
    };

    let (appointment, patient) = match visit {
      Some(Visit {
        patient_ref,
        appointment_ref,
      }) => (Some(appointment_ref), Some(patient_ref)),
      None => (None, None),
    };
    let entry = NewEntry::new(admission.doctor_id, admission.patient.name)
      .with_doctor(doctor.name, doctor.department)
      .with_appointment(appointment, patient);

    self.append_entry(&hospital, entry).await
  }

  async fn append(&mut self, mut entry: NewEntry) -> Result<EntryId, DeskError> {
    entry.validate()?;
    let hospital = self.hospital()?;

    // denormalize from the roster unless the caller already did
    if entry.doctor_name.is_empty()
      && let Some(doctor) = self.roster.get().get(&entry.doctor_id)
    {
      entry.doctor_name = doctor.name.clone();
      entry.doctor_department = doctor.department.clone();
    }

    self.append_entry(&hospital, entry).await
  }

  async fn append_entry(&mut self, hospital: &HospitalId, entry: NewEntry) -> Result<EntryId, DeskError> {
    let doctor = entry.doctor_id.clone();
    let (next, id) = reindex::append(self.queue.get(), entry);
    let wait_number = next.get(id).map(|e| e.wait_number).unwrap_or_default();

    self.persist(hospital, next).await?;
    info!(doctor = %doctor, entry = %id, wait_number, "Patient queued");
    Ok(id)
  }

  async fn advance(&mut self, request_id: RequestId, doctor: &DoctorId) -> Result<AdvanceOutcome, DeskError> {
    let hospital = self.hospital()?;
    let advanced = reindex::advance(self.queue.get(), doctor);

    let Some(removed) = advanced.removed else {
      debug!(doctor = %doctor, "No patient in consultation");
      return Ok(AdvanceOutcome::default());
    };
    let promoted = advanced.promoted;
    let next = advanced.snapshot;
    if let Err(e) = self.persist(&hospital, next.clone()).await {
      if self.queue.get() != &next {
        return Err(e);
      }
      // the local queue moved on, so the consultation did too
      let notification_errors = self.notify_consultations(request_id, &removed, promoted.as_ref()).await;
      warn!(doctor = %doctor, finished = %removed.patient_name, "Consultation advanced locally only");
      return Err(DeskError::AdvanceNotSaved {
        outcome: Box::new(AdvanceOutcome {
          removed: Some(removed),
          promoted,
          notification_errors,
        }),
        source: Box::new(e),
      });
    }

    info!(
      doctor = %doctor,
      finished = %removed.patient_name,
      next = promoted.as_ref().map(|e| e.patient_name.as_str()).unwrap_or("-"),
      "Consultation advanced"
    );

    let notification_errors = self.notify_consultations(request_id, &removed, promoted.as_ref()).await;
    Ok(AdvanceOutcome {
      removed: Some(removed),
      promoted,
      notification_errors,
    })
  }

  /// Stamp consultation times for the finished and promoted patients.
  ///
  /// Failures are reported, never rolled back: the queue has already moved on.
  async fn notify_consultations(
    &self,
    request_id: RequestId,
    removed: &QueueEntry,
    promoted: Option<&QueueEntry>,
  ) -> Vec<NotificationFailure> {
    let Some(relational) = &self.relational else {
      return Vec::new();
    };

    let now = Utc::now();
    let mut failures = Vec::new();

    if let Some(appointment) = &removed.appointment_ref
      && let Err(e) = relational.mark_consultation_ended(appointment, now).await
    {
      warn!(request_id = %request_id, appointment = %appointment, error = %e, "Failed to record consultation end");
      failures.push(NotificationFailure {
        appointment: appointment.clone(),
        event: ConsultationEvent::Ended,
        message: e.to_string(),
      });
    }

    if let Some(appointment) = promoted.and_then(|e| e.appointment_ref.as_ref())
      && let Err(e) = relational.mark_consultation_started(appointment, now).await
    {
      warn!(request_id = %request_id, appointment = %appointment, error = %e, "Failed to record consultation start");
      failures.push(NotificationFailure {
        appointment: appointment.clone(),
        event: ConsultationEvent::Started,
        message: e.to_string(),
      });
    }

    failures
  }

  async fn delete(&mut self, id: EntryId) -> Result<bool, DeskError> {
    let hospital = self.hospital()?;
    if !self.queue.get().contains(id) {
      debug!(entry = %id, "Delete of absent entry ignored");
      return Ok(false);
    }

    let next = reindex::delete_by_id(self.queue.get(), id);
    self.persist(&hospital, next).await?;
    info!(entry = %id, "Entry removed");
    Ok(true)
  }

  async fn reorder(&mut self, ids: &[EntryId]) -> Result<(), DeskError> {
    let hospital = self.hospital()?;
    let next = reindex::reorder(reindex::order_from_ids(self.queue.get(), ids));
    self.apply_order(&hospital, next).await
  }

  async fn move_entry(&mut self, id: EntryId, position: usize) -> Result<(), DeskError> {
    let hospital = self.hospital()?;
    let order = reindex::move_entry(self.queue.get(), id, position).ok_or(DeskError::EntryNotFound(id))?;
    self.apply_order(&hospital, reindex::reorder(order)).await
  }

  async fn apply_order(&mut self, hospital: &HospitalId, next: QueueSnapshot) -> Result<(), DeskError> {
    if &next == self.queue.get() {
      debug!("Order unchanged");
      return Ok(());
    }
    self.persist(hospital, next).await?;
    info!("Queue reordered");
    Ok(())
  }
}
