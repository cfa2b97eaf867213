mod actor;
mod domain;
mod runtime;
mod service;

pub mod dirs;
pub mod relational;
pub mod store;

pub use actor::{
  AdvanceOutcome, ConsultationEvent, DeskActor, DeskError, DeskHandle, DeskStores, NotificationFailure,
  handle::SendError,
};
pub use domain::{admission, config, queue, roster, session, validation};
pub use runtime::{FrontDesk, OpenError};
pub use service::{intake, queue as reindex};
