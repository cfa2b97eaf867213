//! Front desk CLI - patient queues for a hospital reception desk

use anyhow::Result;
use clap::{Parser, Subcommand};
use frontdesk::{config::Config, queue::EntryId};

mod commands;
mod format;
mod logging;

use commands::{
  AdmitArgs, DoctorArgs, cmd_config_init, cmd_config_show, cmd_doctor_add, cmd_doctor_edit, cmd_doctor_list,
  cmd_doctor_remove, cmd_login, cmd_logout, cmd_queue_add, cmd_queue_admit, cmd_queue_move, cmd_queue_next,
  cmd_queue_patients, cmd_queue_remove, cmd_queue_reorder, cmd_queue_show, cmd_queue_sync,
};
use logging::init_logging;

#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(about = "Patient queues for a hospital reception desk")]
#[command(after_help = "\
QUICK START:
  frontdesk config init                       # Write a config file
  frontdesk login --uid <hospital>            # Sign in
  frontdesk doctor add --name \"Dr Rao\" --department ENT --phone 555-0101
  frontdesk queue add --doctor 1 --patient Asha

DURING THE DAY:
  frontdesk queue show                        # Every doctor's line
  frontdesk queue next --doctor 1             # Finish the current consultation
  frontdesk queue sync                        # Pull the queue from the realtime store")]
struct Cli {
  /// Output as JSON (show and list commands)
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Sign in as a hospital account
  Login {
    /// Hospital account id
    #[arg(long)]
    uid: String,
    #[arg(long, default_value = "")]
    email: String,
  },
  /// Sign out and clear every local copy (session, doctors, queue)
  Logout,
  /// Manage the doctor roster
  Doctor {
    #[command(subcommand)]
    command: DoctorCommand,
  },
  /// Manage the live queue
  Queue {
    #[command(subcommand)]
    command: QueueCommand,
  },
  /// Configuration management
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

/// Subcommands for `frontdesk doctor`
#[derive(Subcommand)]
pub enum DoctorCommand {
  /// Add a doctor to the roster
  Add(DoctorArgs),
  /// Replace a doctor's profile
  Edit {
    /// Roster id (see `doctor list`)
    id: String,
    #[command(flatten)]
    doctor: DoctorArgs,
  },
  /// Remove a doctor; later doctors move up one id
  Remove { id: String },
  /// List the roster
  #[command(alias = "ls")]
  List,
}

/// Subcommands for `frontdesk queue`
#[derive(Subcommand)]
pub enum QueueCommand {
  /// Show the queue
  #[command(alias = "ls")]
  Show {
    /// Only this doctor's line
    #[arg(long)]
    doctor: Option<String>,
  },
  /// Put a patient at the back of a doctor's line
  Add {
    #[arg(long)]
    doctor: String,
    #[arg(long)]
    patient: String,
  },
  /// List patients on file for a mobile number, to admit one with --patient-ref
  Patients {
    #[arg(long)]
    mobile: String,
  },
  /// Register a visit (patient record and appointment) and queue the patient
  Admit(AdmitArgs),
  /// Finish the current consultation and call the next patient
  Next {
    #[arg(long)]
    doctor: String,
  },
  /// Remove an entry from the queue
  #[command(alias = "rm")]
  Remove {
    /// Entry number
    entry: EntryId,
  },
  /// Move an entry to another place in the queue
  Move {
    /// Entry number
    entry: EntryId,
    /// New place in the queue, 1 being the front
    #[arg(long)]
    to: usize,
  },
  /// Set the queue order; entries not listed keep their relative order at the back
  Reorder {
    /// Entry numbers in the new order
    #[arg(required = true)]
    entries: Vec<EntryId>,
  },
  /// Replace the local queue with the realtime store's copy
  Sync,
}

/// Subcommands for `frontdesk config`
#[derive(Subcommand)]
pub enum ConfigCommand {
  /// Show the effective configuration
  Show,
  /// Write a config template to the user config path
  Init {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let config = Config::load();
  let data_dir = frontdesk::dirs::default_data_dir();

  let _guard = init_logging(&config.logging, &data_dir);

  let json = cli.json;
  match cli.command {
    Commands::Login { uid, email } => cmd_login(&config, &uid, &email).await,
    Commands::Logout => cmd_logout(&config).await,

    Commands::Doctor { command } => match command {
      DoctorCommand::Add(doctor) => cmd_doctor_add(&config, doctor).await,
      DoctorCommand::Edit { id, doctor } => cmd_doctor_edit(&config, &id, doctor).await,
      DoctorCommand::Remove { id } => cmd_doctor_remove(&config, &id).await,
      DoctorCommand::List => cmd_doctor_list(&config, json).await,
    },

    Commands::Queue { command } => match command {
      QueueCommand::Show { doctor } => cmd_queue_show(&config, doctor.as_deref(), json).await,
      QueueCommand::Add { doctor, patient } => cmd_queue_add(&config, &doctor, &patient).await,
      QueueCommand::Patients { mobile } => cmd_queue_patients(&config, &mobile, json).await,
      QueueCommand::Admit(args) => cmd_queue_admit(&config, args).await,
      QueueCommand::Next { doctor } => cmd_queue_next(&config, &doctor, json).await,
      QueueCommand::Remove { entry } => cmd_queue_remove(&config, entry).await,
      QueueCommand::Move { entry, to } => cmd_queue_move(&config, entry, to).await,
      QueueCommand::Reorder { entries } => cmd_queue_reorder(&config, &entries).await,
      QueueCommand::Sync => cmd_queue_sync(&config).await,
    },

    Commands::Config { command } => match command {
      ConfigCommand::Show => cmd_config_show(&config),
      ConfigCommand::Init { force } => cmd_config_init(force),
    },
  }
}
