//! Business logic services.
//!
//! Services hold no state of their own; the desk actor owns the state and
//! calls into them.
//!
//! ## Available Services
//!
//! - [`queue`] - Queue reindexing (append, advance, delete, reorder)
//! - [`intake`] - Patient and appointment registration for an admission

pub mod intake;
pub mod queue;
