//! Command implementations. Each one opens the desk, talks to it through the
//! handle and closes it again.

mod config;
mod doctor;
mod queue;
mod session;

use anyhow::{Context, Result};
use frontdesk::{FrontDesk, config::Config};

pub use config::{cmd_config_init, cmd_config_show};
pub use doctor::{DoctorArgs, cmd_doctor_add, cmd_doctor_edit, cmd_doctor_list, cmd_doctor_remove};
pub use queue::{
  AdmitArgs, cmd_queue_add, cmd_queue_admit, cmd_queue_move, cmd_queue_next, cmd_queue_patients, cmd_queue_remove,
  cmd_queue_reorder, cmd_queue_show, cmd_queue_sync,
};
pub use session::{cmd_login, cmd_logout};

fn open(config: &Config) -> Result<FrontDesk> {
  let data_dir = frontdesk::dirs::default_data_dir();
  FrontDesk::open(config, &data_dir).context("Failed to open the front desk")
}
