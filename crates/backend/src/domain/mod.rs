//! Domain types - core front desk entities
//!
//! This module contains the canonical domain types used throughout the application.
//! These types represent the queue, roster and session state and are independent of
//! persistence or collaborator concerns.

#[macro_use]
mod ids;

pub mod admission;
pub mod config;
pub mod queue;
pub mod roster;
pub mod session;
pub mod validation;
