use anyhow::{Context, Result};
use clap::Args;
use frontdesk::{
  config::Config,
  queue::DoctorId,
  roster::{Doctor, DoctorRef, Gender},
};

use super::open;
use crate::format::{doctor_views, format_roster};

/// Doctor profile fields shared by `doctor add` and `doctor edit`
#[derive(Args, Debug)]
pub struct DoctorArgs {
  #[arg(long)]
  name: String,
  #[arg(long)]
  department: String,
  #[arg(long)]
  phone: String,
  /// male, female or other
  #[arg(long, default_value = "male")]
  gender: Gender,
  /// Image URL
  #[arg(long)]
  image: Option<String>,
  /// Id of the doctor in the relational service
  #[arg(long)]
  doctor_ref: Option<String>,
}

impl From<DoctorArgs> for Doctor {
  fn from(args: DoctorArgs) -> Self {
    let mut doctor = Doctor::new(args.name, args.department, args.phone);
    doctor.gender = args.gender;
    doctor.image = args.image;
    doctor.doctor_ref = args.doctor_ref.map(DoctorRef::from);
    doctor
  }
}

pub async fn cmd_doctor_add(config: &Config, args: DoctorArgs) -> Result<()> {
  let desk = open(config)?;
  let doctor = Doctor::from(args);
  let name = doctor.name.clone();

  let id = desk.handle().add_doctor(doctor).await.context("Failed to add doctor")?;
  println!("Added {} as doctor {}", name, id);
  desk.close();
  Ok(())
}

pub async fn cmd_doctor_edit(config: &Config, id: &str, args: DoctorArgs) -> Result<()> {
  let desk = open(config)?;
  desk
    .handle()
    .modify_doctor(DoctorId::from(id), Doctor::from(args))
    .await
    .with_context(|| format!("Failed to update doctor {}", id))?;
  println!("Updated doctor {}", id);
  desk.close();
  Ok(())
}

pub async fn cmd_doctor_remove(config: &Config, id: &str) -> Result<()> {
  let desk = open(config)?;
  let removed = desk
    .handle()
    .remove_doctor(DoctorId::from(id))
    .await
    .with_context(|| format!("Failed to remove doctor {}", id))?;
  println!("Removed {}", removed.name);
  desk.close();
  Ok(())
}

pub async fn cmd_doctor_list(config: &Config, json: bool) -> Result<()> {
  let desk = open(config)?;
  let roster = desk.handle().roster().await?;

  if json {
    println!("{}", serde_json::to_string_pretty(&doctor_views(&roster))?);
  } else {
    println!("{}", format_roster(&roster));
  }
  desk.close();
  Ok(())
}
