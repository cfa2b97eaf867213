//! Desk actor message types
//!
//! Every request carries a `oneshot` sender for its single reply.

use tokio::sync::oneshot;
use uuid::Uuid;

use super::{AdvanceOutcome, DeskError};
use crate::{
  domain::{
    admission::Admission,
    queue::{DoctorId, EntryId, NewEntry, QueueSnapshot},
    roster::{Doctor, DoctorRoster},
    session::Session,
  },
  relational::PatientMatch,
};

/// Unique identifier for a request (for correlation in logs)
pub type RequestId = Uuid;

pub type Reply<T> = oneshot::Sender<Result<T, DeskError>>;

/// A message sent to the DeskActor
#[derive(Debug)]
pub struct DeskMessage {
  pub id: RequestId,
  pub payload: DeskPayload,
}

impl DeskMessage {
  pub fn new(payload: DeskPayload) -> Self {
    Self {
      id: Uuid::new_v4(),
      payload,
    }
  }
}

#[derive(Debug)]
pub enum DeskPayload {
  // Reads
  Snapshot(oneshot::Sender<QueueSnapshot>),
  Session(oneshot::Sender<Option<Session>>),
  Roster(oneshot::Sender<DoctorRoster>),

  // Session
  SignIn {
    session: Session,
    reply: Reply<()>,
  },
  SignOut(Reply<()>),
  /// Pull the remote queue over the local copy; replies whether a remote value existed
  Refresh(Reply<bool>),

  // Roster
  AddDoctor {
    doctor: Doctor,
    reply: Reply<DoctorId>,
  },
  ModifyDoctor {
    id: DoctorId,
    doctor: Doctor,
    reply: Reply<()>,
  },
  RemoveDoctor {
    id: DoctorId,
    reply: Reply<Doctor>,
  },

  // Queue
  /// Patients seen at this hospital under a mobile number
  FindPatients {
    mobile: String,
    reply: Reply<Vec<PatientMatch>>,
  },
  Admit {
    admission: Box<Admission>,
    reply: Reply<EntryId>,
  },
  Append {
    entry: NewEntry,
    reply: Reply<EntryId>,
  },
  Advance {
    doctor: DoctorId,
    reply: Reply<AdvanceOutcome>,
  },
  /// Replies whether an entry was removed
  Delete {
    id: EntryId,
    reply: Reply<bool>,
  },
  Reorder {
    ids: Vec<EntryId>,
    reply: Reply<()>,
  },
  MoveEntry {
    id: EntryId,
    position: usize,
    reply: Reply<()>,
  },

  Shutdown,
}

impl DeskPayload {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Snapshot(_) => "snapshot",
      Self::Session(_) => "session",
      Self::Roster(_) => "roster",
      Self::SignIn { .. } => "sign_in",
      Self::SignOut(_) => "sign_out",
      Self::Refresh(_) => "refresh",
      Self::AddDoctor { .. } => "add_doctor",
      Self::ModifyDoctor { .. } => "modify_doctor",
      Self::RemoveDoctor { .. } => "remove_doctor",
      Self::FindPatients { .. } => "find_patients",
      Self::Admit { .. } => "admit",
      Self::Append { .. } => "append",
      Self::Advance { .. } => "advance",
      Self::Delete { .. } => "delete",
      Self::Reorder { .. } => "reorder",
      Self::MoveEntry { .. } => "move_entry",
      Self::Shutdown => "shutdown",
    }
  }
}
