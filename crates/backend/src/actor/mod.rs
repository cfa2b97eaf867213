//! Desk actor
//!
//! One long-lived task owns every piece of mutable desk state (session, roster,
//! live queue) together with the stores behind them. Callers talk to it through
//! a [`DeskHandle`]; messages are handled one at a time, so no operation ever
//! observes another half-done.
//!
//! # Message Flow
//!
//! ```text
//! CLI -> DeskHandle -> DeskActor -> reindexer -> local cache -> realtime store
//!                          |
//!                          v
//!                  relational service (admission, consultation times)
//! ```

mod desk;
pub mod handle;
pub mod message;

#[cfg(test)]
mod __tests__;

pub use desk::{DeskActor, DeskStores};
pub use handle::DeskHandle;
use serde::Serialize;

use self::handle::SendError;
use crate::{
  domain::{
    queue::{AppointmentRef, DoctorId, EntryId, QueueEntry},
    roster::RosterError,
    validation::ValidationError,
  },
  relational::RelationalError,
  store::StoreError,
};

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
  #[error(transparent)]
  Validation(#[from] ValidationError),
  #[error("Not signed in")]
  NotSignedIn,
  #[error("Doctor not found: {0}")]
  DoctorNotFound(DoctorId),
  #[error("Doctor {doctor} still has {waiting} patient(s) in the queue")]
  DoctorHasPatients { doctor: DoctorId, waiting: usize },
  #[error("Queue already has a line for doctor {0}")]
  QueueConflict(DoctorId),
  #[error("Queue entry not found: {0}")]
  EntryNotFound(EntryId),
  #[error(transparent)]
  Roster(#[from] RosterError),
  #[error("Local cache error: {0}")]
  Store(#[from] StoreError),
  /// The local copy changed but the realtime store did not take the new value.
  #[error("Failed to sync queue with realtime store: {0}")]
  Persistence(#[source] StoreError),
  /// The queue advanced locally but the new value was not saved everywhere.
  /// Consultation times were still sent; `outcome` holds what moved.
  #[error("Consultation advanced but not saved: {source}")]
  AdvanceNotSaved {
    outcome: Box<AdvanceOutcome>,
    #[source]
    source: Box<DeskError>,
  },
  #[error("Failed to register visit: {0}")]
  Relational(#[from] RelationalError),
  #[error(transparent)]
  ActorGone(#[from] SendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationEvent {
  Started,
  Ended,
}

/// A consultation time the relational service did not record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationFailure {
  pub appointment: AppointmentRef,
  pub event: ConsultationEvent,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdvanceOutcome {
  pub removed: Option<QueueEntry>,
  pub promoted: Option<QueueEntry>,
  pub notification_errors: Vec<NotificationFailure>,
}
