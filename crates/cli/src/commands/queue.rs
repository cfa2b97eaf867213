use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use frontdesk::{
  DeskError, NotificationFailure,
  admission::{Admission, AppointmentType, PatientDetails},
  config::Config,
  queue::{DoctorId, EntryId, NewEntry, PatientRef, QueueEntry, wait_label},
  roster::Gender,
};
use serde::Serialize;

use super::open;
use crate::format::{EntryView, entry_views, format_entry_line, format_notification_failure, format_queue};

/// Patient and visit details for `queue admit`
#[derive(Args, Debug)]
pub struct AdmitArgs {
  /// Roster id of the doctor
  #[arg(long)]
  doctor: String,
  /// Patient name
  #[arg(long)]
  name: String,
  #[arg(long)]
  address: String,
  /// Date of birth (YYYY-MM-DD)
  #[arg(long)]
  dob: NaiveDate,
  /// male, female or other
  #[arg(long, default_value = "male")]
  gender: Gender,
  #[arg(long)]
  mobile: String,
  #[arg(long)]
  email: Option<String>,
  /// walk-in, booking or emergency
  #[arg(long = "type", default_value = "walk-in")]
  appointment_type: AppointmentType,
  /// Reason for the visit
  #[arg(long)]
  reason: String,
  /// How the patient heard about the hospital
  #[arg(long)]
  discovery: String,
  /// Existing patient id, as listed by `queue patients`
  #[arg(long)]
  patient_ref: Option<String>,
}

impl From<AdmitArgs> for Admission {
  fn from(args: AdmitArgs) -> Self {
    Admission {
      doctor_id: DoctorId::from(args.doctor),
      patient: PatientDetails {
        name: args.name,
        address: args.address,
        date_of_birth: args.dob,
        email: args.email,
        gender: args.gender,
        mobile_number: args.mobile,
        discovery: args.discovery,
      },
      appointment_type: args.appointment_type,
      reason_for_visit: args.reason,
      returning_patient: args.patient_ref.map(PatientRef::from),
    }
  }
}

pub async fn cmd_queue_show(config: &Config, doctor: Option<&str>, json: bool) -> Result<()> {
  let desk = open(config)?;
  let snapshot = desk.handle().snapshot().await?;
  let doctor = doctor.map(DoctorId::from);

  if json {
    println!("{}", serde_json::to_string_pretty(&entry_views(&snapshot, doctor.as_ref()))?);
  } else {
    println!("{}", format_queue(&snapshot, doctor.as_ref()));
  }
  desk.close();
  Ok(())
}

pub async fn cmd_queue_add(config: &Config, doctor: &str, patient: &str) -> Result<()> {
  let desk = open(config)?;
  let handle = desk.handle();

  let id = handle
    .append(NewEntry::new(doctor, patient))
    .await
    .context("Failed to add patient to the queue")?;
  print_queued(handle.snapshot().await?.get(id), id);
  desk.close();
  Ok(())
}

pub async fn cmd_queue_admit(config: &Config, args: AdmitArgs) -> Result<()> {
  let desk = open(config)?;
  let handle = desk.handle();

  let id = handle
    .admit(Admission::from(args))
    .await
    .context("Failed to admit patient")?;
  print_queued(handle.snapshot().await?.get(id), id);
  desk.close();
  Ok(())
}

pub async fn cmd_queue_patients(config: &Config, mobile: &str, json: bool) -> Result<()> {
  let desk = open(config)?;
  let found = desk
    .handle()
    .find_patients(mobile.to_string())
    .await
    .context("Failed to look up patients");
  desk.close();
  let found = found?;

  if json {
    println!("{}", serde_json::to_string_pretty(&found)?);
  } else if found.is_empty() {
    println!("No patients on file for {}.", mobile);
  } else {
    for patient in &found {
      println!("{:<38} {}", patient.patient_ref, patient.name);
    }
  }
  Ok(())
}

fn print_queued(entry: Option<&QueueEntry>, id: EntryId) {
  match entry {
    Some(entry) => println!(
      "Queued {} for {} as #{} ({})",
      entry.patient_name,
      entry.doctor_name,
      id,
      wait_label(entry.wait_number)
    ),
    None => println!("Queued as #{}", id),
  }
}

#[derive(Serialize)]
struct NextOutput<'a> {
  finished: Option<EntryView<'a>>,
  now_serving: Option<EntryView<'a>>,
  notification_errors: &'a [NotificationFailure],
}

pub async fn cmd_queue_next(config: &Config, doctor: &str, json: bool) -> Result<()> {
  let desk = open(config)?;
  let result = desk.handle().advance(DoctorId::from(doctor)).await;
  desk.close();

  // a local-only advance still has an outcome worth showing
  let (outcome, not_saved) = match result {
    Ok(outcome) => (outcome, None),
    Err(DeskError::AdvanceNotSaved { outcome, source }) => (*outcome, Some(source)),
    Err(e) => return Err(e).with_context(|| format!("Failed to advance the queue for doctor {}", doctor)),
  };

  if json {
    let output = NextOutput {
      finished: outcome.removed.as_ref().map(EntryView::from),
      now_serving: outcome.promoted.as_ref().map(EntryView::from),
      notification_errors: &outcome.notification_errors,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else {
    match &outcome.removed {
      Some(entry) => println!("Finished: {}", entry.patient_name),
      None => println!("No patient in consultation for doctor {}", doctor),
    }
    if let Some(entry) = &outcome.promoted {
      println!("Now in consultation: {}", format_entry_line(entry));
    }
    for failure in &outcome.notification_errors {
      eprintln!("{}", format_notification_failure(failure));
    }
  }

  match not_saved {
    Some(source) => Err(anyhow::Error::new(*source)
      .context("The queue moved on locally but the realtime store still has the old value")),
    None => Ok(()),
  }
}

pub async fn cmd_queue_remove(config: &Config, entry: EntryId) -> Result<()> {
  let desk = open(config)?;
  let removed = desk
    .handle()
    .delete(entry)
    .await
    .with_context(|| format!("Failed to remove entry #{}", entry))?;

  if removed {
    println!("Removed entry #{}", entry);
  } else {
    println!("No entry #{} in the queue", entry);
  }
  desk.close();
  Ok(())
}

/// `to` counts from 1 at the front of the queue.
pub async fn cmd_queue_move(config: &Config, entry: EntryId, to: usize) -> Result<()> {
  if to == 0 {
    bail!("--to counts from 1");
  }

  let desk = open(config)?;
  desk
    .handle()
    .move_entry(entry, to - 1)
    .await
    .with_context(|| format!("Failed to move entry #{}", entry))?;
  println!("Moved entry #{} to place {}", entry, to);
  desk.close();
  Ok(())
}

pub async fn cmd_queue_reorder(config: &Config, entries: &[EntryId]) -> Result<()> {
  let desk = open(config)?;
  desk
    .handle()
    .reorder(entries.to_vec())
    .await
    .context("Failed to reorder the queue")?;
  println!("Queue reordered");
  desk.close();
  Ok(())
}

pub async fn cmd_queue_sync(config: &Config) -> Result<()> {
  let desk = open(config)?;
  let loaded = desk
    .handle()
    .refresh()
    .await
    .context("Failed to sync with the realtime store")?;

  if loaded {
    println!("Queue replaced with the realtime store's copy");
  } else {
    println!("The realtime store has no queue for this hospital; kept the local copy");
  }
  desk.close();
  Ok(())
}
