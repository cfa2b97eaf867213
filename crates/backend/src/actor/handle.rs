//! Handle for talking to the desk actor
//!
//! The handle is cheap to clone. Each method sends one message and awaits its
//! reply.

use tokio::sync::{mpsc, oneshot};

use super::{
  AdvanceOutcome, DeskError,
  message::{DeskMessage, DeskPayload, Reply},
};
use crate::{
  domain::{
    admission::Admission,
    queue::{DoctorId, EntryId, NewEntry, QueueSnapshot},
    roster::{Doctor, DoctorRoster},
    session::Session,
  },
  relational::PatientMatch,
};

#[derive(Clone, Debug)]
pub struct DeskHandle {
  tx: mpsc::Sender<DeskMessage>,
}

impl DeskHandle {
  pub fn new(tx: mpsc::Sender<DeskMessage>) -> Self {
    Self { tx }
  }

  async fn send(&self, payload: DeskPayload) -> Result<(), SendError> {
    self
      .tx
      .send(DeskMessage::new(payload))
      .await
      .map_err(|_| SendError::ActorGone)
  }

  async fn read<T>(&self, payload: impl FnOnce(oneshot::Sender<T>) -> DeskPayload) -> Result<T, SendError> {
    let (reply, rx) = oneshot::channel();
    self.send(payload(reply)).await?;
    rx.await.map_err(|_| SendError::ActorGone)
  }

  async fn request<T>(&self, payload: impl FnOnce(Reply<T>) -> DeskPayload) -> Result<T, DeskError> {
    let (reply, rx) = oneshot::channel();
    self.send(payload(reply)).await?;
    rx.await.map_err(|_| SendError::ActorGone)?
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  pub async fn snapshot(&self) -> Result<QueueSnapshot, SendError> {
    self.read(DeskPayload::Snapshot).await
  }

  pub async fn session(&self) -> Result<Option<Session>, SendError> {
    self.read(DeskPayload::Session).await
  }

  pub async fn roster(&self) -> Result<DoctorRoster, SendError> {
    self.read(DeskPayload::Roster).await
  }

  // ==========================================================================
  // Session
  // ==========================================================================

  pub async fn sign_in(&self, session: Session) -> Result<(), DeskError> {
    self.request(|reply| DeskPayload::SignIn { session, reply }).await
  }

  /// Clear the session, roster and queue, in memory and in the cache.
  pub async fn sign_out(&self) -> Result<(), DeskError> {
    self.request(DeskPayload::SignOut).await
  }

  /// Replace the local queue with the remote value, if there is one.
  pub async fn refresh(&self) -> Result<bool, DeskError> {
    self.request(DeskPayload::Refresh).await
  }

  // ==========================================================================
  // Roster
  // ==========================================================================

  pub async fn add_doctor(&self, doctor: Doctor) -> Result<DoctorId, DeskError> {
    self.request(|reply| DeskPayload::AddDoctor { doctor, reply }).await
  }

  pub async fn modify_doctor(&self, id: DoctorId, doctor: Doctor) -> Result<(), DeskError> {
    self
      .request(|reply| DeskPayload::ModifyDoctor { id, doctor, reply })
      .await
  }

  pub async fn remove_doctor(&self, id: DoctorId) -> Result<Doctor, DeskError> {
    self.request(|reply| DeskPayload::RemoveDoctor { id, reply }).await
  }

  // ==========================================================================
  // Queue
  // ==========================================================================

  /// Patients on file for a mobile number. Empty without a relational service.
  pub async fn find_patients(&self, mobile: String) -> Result<Vec<PatientMatch>, DeskError> {
    self
      .request(|reply| DeskPayload::FindPatients { mobile, reply })
      .await
  }

  /// Register the visit and put the patient at the back of the doctor's line.
  pub async fn admit(&self, admission: Admission) -> Result<EntryId, DeskError> {
    self
      .request(|reply| DeskPayload::Admit {
        admission: Box::new(admission),
        reply,
      })
      .await
  }

  pub async fn append(&self, entry: NewEntry) -> Result<EntryId, DeskError> {
    self.request(|reply| DeskPayload::Append { entry, reply }).await
  }

  /// Finish the current consultation for a doctor.
  pub async fn advance(&self, doctor: DoctorId) -> Result<AdvanceOutcome, DeskError> {
    self.request(|reply| DeskPayload::Advance { doctor, reply }).await
  }

  pub async fn delete(&self, id: EntryId) -> Result<bool, DeskError> {
    self.request(|reply| DeskPayload::Delete { id, reply }).await
  }

  /// Apply a new display order given as entry ids.
  pub async fn reorder(&self, ids: Vec<EntryId>) -> Result<(), DeskError> {
    self.request(|reply| DeskPayload::Reorder { ids, reply }).await
  }

  pub async fn move_entry(&self, id: EntryId, position: usize) -> Result<(), DeskError> {
    self
      .request(|reply| DeskPayload::MoveEntry { id, position, reply })
      .await
  }

  pub async fn shutdown(&self) -> Result<(), SendError> {
    self.send(DeskPayload::Shutdown).await
  }
}

/// Error when sending to an actor
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
  #[error("Actor has shut down")]
  ActorGone,
}
