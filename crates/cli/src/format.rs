//! Terminal and JSON rendering for queue and roster output.

use frontdesk::{
  ConsultationEvent, NotificationFailure,
  queue::{AppointmentRef, DoctorId, EntryId, QueueEntry, QueueSnapshot, wait_label},
  roster::{Doctor, DoctorRoster},
};
use serde::Serialize;

/// JSON shape of one queue entry. Unlike the stored form it carries its id inline.
#[derive(Debug, Serialize)]
pub struct EntryView<'a> {
  pub id: EntryId,
  pub doctor_id: &'a DoctorId,
  pub doctor_name: &'a str,
  pub doctor_department: &'a str,
  pub patient_name: &'a str,
  pub wait_number: u32,
  pub status: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub appointment_id: Option<&'a AppointmentRef>,
}

impl<'a> From<&'a QueueEntry> for EntryView<'a> {
  fn from(entry: &'a QueueEntry) -> Self {
    Self {
      id: entry.id,
      doctor_id: &entry.doctor_id,
      doctor_name: &entry.doctor_name,
      doctor_department: &entry.doctor_department,
      patient_name: &entry.patient_name,
      wait_number: entry.wait_number,
      status: wait_label(entry.wait_number),
      appointment_id: entry.appointment_ref.as_ref(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct DoctorView<'a> {
  pub id: DoctorId,
  #[serde(flatten)]
  pub doctor: &'a Doctor,
}

/// Entries of one doctor (or all of them), in line order.
pub fn entry_views<'a>(snapshot: &'a QueueSnapshot, doctor: Option<&DoctorId>) -> Vec<EntryView<'a>> {
  let mut entries: Vec<&QueueEntry> = snapshot
    .iter()
    .filter(|e| doctor.is_none_or(|d| &e.doctor_id == d))
    .collect();
  entries.sort_by_key(|e| (e.doctor_id.clone(), e.wait_number));
  entries.into_iter().map(EntryView::from).collect()
}

pub fn doctor_views(roster: &DoctorRoster) -> Vec<DoctorView<'_>> {
  roster.iter().map(|(id, doctor)| DoctorView { id, doctor }).collect()
}

/// One line for an entry: `#3    Asha                     Next`
pub fn format_entry_line(entry: &QueueEntry) -> String {
  format!(
    "#{:<4} {:<24} {}",
    entry.id,
    entry.patient_name,
    wait_label(entry.wait_number)
  )
}

/// The queue grouped by doctor, each line ordered by wait number.
pub fn format_queue(snapshot: &QueueSnapshot, doctor: Option<&DoctorId>) -> String {
  let mut out = String::new();

  for doctor_id in snapshot.doctors() {
    if doctor.is_some_and(|d| d != doctor_id) {
      continue;
    }

    let mut line: Vec<&QueueEntry> = snapshot.iter().filter(|e| &e.doctor_id == doctor_id).collect();
    line.sort_by_key(|e| e.wait_number);

    // Doctor fields are copied onto every entry
    let heading = line.first().map(|e| (e.doctor_name.as_str(), e.doctor_department.as_str()));
    match heading {
      Some((name, dept)) if !dept.is_empty() => {
        out.push_str(&format!("{} ({}) [doctor {}]\n", name, dept, doctor_id))
      }
      Some((name, _)) => out.push_str(&format!("{} [doctor {}]\n", name, doctor_id)),
      None => continue,
    }

    for entry in line {
      out.push_str("  ");
      out.push_str(&format_entry_line(entry));
      out.push('\n');
    }
    out.push('\n');
  }

  if out.is_empty() {
    return match doctor {
      Some(d) => format!("No patients waiting for doctor {}.", d),
      None => "Queue is empty.".to_string(),
    };
  }
  out.trim_end().to_string()
}

pub fn format_roster(roster: &DoctorRoster) -> String {
  if roster.is_empty() {
    return "No doctors on the roster.".to_string();
  }

  let mut out = String::new();
  for (id, doctor) in roster.iter() {
    out.push_str(&format!(
      "{:<4} {:<24} {:<16} {:<14} {}",
      id, doctor.name, doctor.department, doctor.phone_number, doctor.gender
    ));
    if let Some(doctor_ref) = &doctor.doctor_ref {
      out.push_str(&format!("  ref:{}", doctor_ref));
    }
    out.push('\n');
  }
  out.trim_end().to_string()
}

pub fn format_notification_failure(failure: &NotificationFailure) -> String {
  let event = match failure.event {
    ConsultationEvent::Started => "start",
    ConsultationEvent::Ended => "end",
  };
  format!(
    "Warning: consultation {} not recorded for appointment {}: {}",
    event, failure.appointment, failure.message
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: u32, doctor: &str, patient: &str, wait_number: u32) -> QueueEntry {
    QueueEntry {
      id: EntryId::new(id),
      doctor_id: DoctorId::from(doctor),
      doctor_name: format!("Dr {}", doctor),
      doctor_department: "ENT".to_string(),
      patient_name: patient.to_string(),
      wait_number,
      appointment_ref: None,
      patient_ref: None,
    }
  }

  fn snapshot() -> QueueSnapshot {
    QueueSnapshot::from_entries(vec![
      entry(1, "a", "Asha", 0),
      entry(2, "b", "Ravi", 0),
      entry(3, "a", "Meera", 1),
      entry(4, "a", "Kiran", 2),
    ])
  }

  #[test]
  fn test_queue_groups_by_doctor_in_wait_order() {
    let text = format_queue(&snapshot(), None);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Dr a (ENT) [doctor a]");
    assert!(lines[1].contains("Asha") && lines[1].ends_with("In Consultation"));
    assert!(lines[2].contains("Meera") && lines[2].ends_with("Next"));
    assert!(lines[3].contains("Kiran") && lines[3].ends_with("Wait No: 2"));
    assert_eq!(lines[5], "Dr b (ENT) [doctor b]");
  }

  #[test]
  fn test_queue_filtered_to_one_doctor() {
    let text = format_queue(&snapshot(), Some(&DoctorId::from("b")));
    assert!(text.contains("Ravi"));
    assert!(!text.contains("Asha"));

    let empty = format_queue(&snapshot(), Some(&DoctorId::from("zz")));
    assert_eq!(empty, "No patients waiting for doctor zz.");
    assert_eq!(format_queue(&QueueSnapshot::new(), None), "Queue is empty.");
  }

  #[test]
  fn test_entry_views_carry_ids_and_labels() {
    let snap = snapshot();
    let views = entry_views(&snap, Some(&DoctorId::from("a")));
    let ids: Vec<u32> = views.iter().map(|v| v.id.get()).collect();
    assert_eq!(ids, vec![1, 3, 4]);

    let json = serde_json::to_value(&views[1]).unwrap();
    assert_eq!(json["id"], 3);
    assert_eq!(json["status"], "Next");
    assert!(json.get("appointment_id").is_none());
  }

  #[test]
  fn test_roster_listing() {
    assert_eq!(format_roster(&DoctorRoster::new()), "No doctors on the roster.");

    let mut roster = DoctorRoster::new();
    roster.add(Doctor::new("Dr Rao", "ENT", "555-0101")).unwrap();
    let text = format_roster(&roster);
    assert!(text.starts_with("1 "));
    assert!(text.contains("Dr Rao") && text.contains("555-0101"));
  }
}
