//! Structural checks for a queue snapshot.
//!
//! A well-formed snapshot has unique entry ids and, per doctor, wait numbers
//! that are exactly `0..k` (which also means a single current patient).

use std::collections::{BTreeMap, HashSet};

use crate::domain::queue::{DoctorId, EntryId, QueueSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
  #[error("Entry id {0} appears more than once")]
  DuplicateId(EntryId),
  #[error("Doctor {0} has more than one patient in consultation")]
  MultipleCurrent(DoctorId),
  #[error("Doctor {doctor} has wait number {wait_number} more than once")]
  DuplicateWaitNumber { doctor: DoctorId, wait_number: u32 },
  #[error("Doctor {doctor} wait numbers skip {missing}")]
  Gap { doctor: DoctorId, missing: u32 },
}

pub fn check(snapshot: &QueueSnapshot) -> Result<(), InvariantViolation> {
  let mut ids = HashSet::with_capacity(snapshot.len());
  let mut by_doctor: BTreeMap<&DoctorId, Vec<u32>> = BTreeMap::new();

  for entry in snapshot {
    if !ids.insert(entry.id) {
      return Err(InvariantViolation::DuplicateId(entry.id));
    }
    by_doctor.entry(&entry.doctor_id).or_default().push(entry.wait_number);
  }

  for (doctor, mut numbers) in by_doctor {
    numbers.sort_unstable();
    for (expected, number) in numbers.iter().enumerate() {
      let expected = expected as u32;
      if *number == expected {
        continue;
      }
      if expected > 0 && numbers[expected as usize - 1] == *number {
        if *number == 0 {
          return Err(InvariantViolation::MultipleCurrent(doctor.clone()));
        }
        return Err(InvariantViolation::DuplicateWaitNumber {
          doctor: doctor.clone(),
          wait_number: *number,
        });
      }
      return Err(InvariantViolation::Gap {
        doctor: doctor.clone(),
        missing: expected,
      });
    }
  }

  Ok(())
}
