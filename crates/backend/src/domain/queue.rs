//! Live queue types.
//!
//! A [`QueueSnapshot`] is the whole queue of one hospital across all doctors.
//! Entries are kept in *snapshot order* (ascending [`EntryId`]), which is also the
//! order the queue reindexer walks when it renumbers.
//!
//! The serialized form is the one the realtime store has always held: a JSON
//! object keyed by the entry id, with the short legacy field names.
//!
//! ```text
//! {"1":{"name":"asha","docid":"1","docname":"Dr Rao","docdept":"ENT","waitno":0,"appointment_id":"77"}}
//! ```

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};

use super::validation::{ValidationError, require};

string_id!(
  /// Roster key of a doctor; scopes a sub-queue.
  DoctorId
);
string_id!(
  /// Appointment record in the relational service.
  AppointmentRef
);
string_id!(
  /// Patient record in the relational service.
  PatientRef
);

/// Position-independent identifier of an entry within one snapshot.
///
/// Ids are 1-based and dense after every restructuring operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u32);

impl EntryId {
  pub fn new(value: u32) -> Self {
    Self(value)
  }

  pub fn get(self) -> u32 {
    self.0
  }
}

impl fmt::Display for EntryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid entry id '{0}': expected a positive integer")]
pub struct ParseEntryIdError(String);

impl FromStr for EntryId {
  type Err = ParseEntryIdError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().parse::<u32>() {
      Ok(n) if n > 0 => Ok(Self(n)),
      _ => Err(ParseEntryIdError(s.to_string())),
    }
  }
}

/// One patient's place in a doctor's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
  /// Carried by the map key on the wire.
  #[serde(skip)]
  pub id: EntryId,
  #[serde(rename = "docid")]
  pub doctor_id: DoctorId,
  #[serde(rename = "docname", default)]
  pub doctor_name: String,
  #[serde(rename = "docdept", default)]
  pub doctor_department: String,
  #[serde(rename = "name")]
  pub patient_name: String,
  #[serde(rename = "waitno")]
  pub wait_number: u32,
  #[serde(rename = "appointment_id", default, skip_serializing_if = "Option::is_none")]
  pub appointment_ref: Option<AppointmentRef>,
  #[serde(rename = "patient_id", default, skip_serializing_if = "Option::is_none")]
  pub patient_ref: Option<PatientRef>,
}

impl QueueEntry {
  /// True when this entry is the doctor's current patient.
  pub fn is_current(&self) -> bool {
    self.wait_number == 0
  }
}

/// Candidate entry for the back of a doctor's line; id and wait number are assigned on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
  pub doctor_id: DoctorId,
  pub doctor_name: String,
  pub doctor_department: String,
  pub patient_name: String,
  pub appointment_ref: Option<AppointmentRef>,
  pub patient_ref: Option<PatientRef>,
}

impl NewEntry {
  pub fn new(doctor_id: impl Into<DoctorId>, patient_name: impl Into<String>) -> Self {
    Self {
      doctor_id: doctor_id.into(),
      doctor_name: String::new(),
      doctor_department: String::new(),
      patient_name: patient_name.into(),
      appointment_ref: None,
      patient_ref: None,
    }
  }

  pub fn with_doctor(mut self, name: impl Into<String>, department: impl Into<String>) -> Self {
    self.doctor_name = name.into();
    self.doctor_department = department.into();
    self
  }

  pub fn with_appointment(mut self, appointment: Option<AppointmentRef>, patient: Option<PatientRef>) -> Self {
    self.appointment_ref = appointment;
    self.patient_ref = patient;
    self
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    require("doctor", self.doctor_id.as_str())?;
    require("patient name", &self.patient_name)?;
    Ok(())
  }

  pub(crate) fn into_entry(self, id: EntryId, wait_number: u32) -> QueueEntry {
    QueueEntry {
      id,
      doctor_id: self.doctor_id,
      doctor_name: self.doctor_name,
      doctor_department: self.doctor_department,
      patient_name: self.patient_name,
      wait_number,
      appointment_ref: self.appointment_ref,
      patient_ref: self.patient_ref,
    }
  }
}

/// Every doctor's queue at one hospital.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueSnapshot {
  entries: Vec<QueueEntry>,
}

impl QueueSnapshot {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a snapshot from entries carrying their ids; entries are put in id order.
  pub fn from_entries(mut entries: Vec<QueueEntry>) -> Self {
    entries.sort_by_key(|e| e.id);
    Self { entries }
  }

  pub fn entries(&self) -> &[QueueEntry] {
    &self.entries
  }

  pub fn iter(&self) -> std::slice::Iter<'_, QueueEntry> {
    self.entries.iter()
  }

  pub fn into_entries(self) -> Vec<QueueEntry> {
    self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get(&self, id: EntryId) -> Option<&QueueEntry> {
    self.entries.iter().find(|e| e.id == id)
  }

  pub fn contains(&self, id: EntryId) -> bool {
    self.get(id).is_some()
  }

  /// Number of entries in one doctor's line.
  pub fn count_for(&self, doctor: &DoctorId) -> usize {
    self.entries.iter().filter(|e| &e.doctor_id == doctor).count()
  }

  /// Doctors present in the snapshot, in order of first appearance.
  pub fn doctors(&self) -> Vec<&DoctorId> {
    let mut seen: Vec<&DoctorId> = Vec::new();
    for entry in &self.entries {
      if !seen.contains(&&entry.doctor_id) {
        seen.push(&entry.doctor_id);
      }
    }
    seen
  }

  pub(crate) fn max_id(&self) -> Option<EntryId> {
    self.entries.iter().map(|e| e.id).max()
  }

  pub(crate) fn push(&mut self, entry: QueueEntry) {
    self.entries.push(entry);
    self.entries.sort_by_key(|e| e.id);
  }

  /// Serialize to the text value held by the realtime store and local cache.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }
}

impl<'a> IntoIterator for &'a QueueSnapshot {
  type Item = &'a QueueEntry;
  type IntoIter = std::slice::Iter<'a, QueueEntry>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.iter()
  }
}

impl Serialize for QueueSnapshot {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for entry in &self.entries {
      map.serialize_entry(&entry.id.to_string(), entry)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for QueueSnapshot {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    // serde_json parses integer map keys from their string form; BTreeMap gives id order
    let raw = BTreeMap::<u32, QueueEntry>::deserialize(deserializer)?;
    let entries = raw
      .into_iter()
      .map(|(id, mut entry)| {
        entry.id = EntryId(id);
        entry
      })
      .collect();
    Ok(Self { entries })
  }
}

/// Display text for a wait number as shown at the desk.
pub fn wait_label(wait_number: u32) -> String {
  match wait_number {
    0 => "In Consultation".to_string(),
    1 => "Next".to_string(),
    n => format!("Wait No: {}", n),
  }
}
