//! Queue reindexer.
//!
//! Pure functions from (snapshot, operation) to a new snapshot. Nothing here
//! performs I/O; persisting results and notifying the relational service is
//! the caller's job.
//!
//! Every restructuring operation (advance, delete, reorder) funnels through
//! [`reorder`]: walk entries in a given sequence, hand out ids `1..N` in that
//! sequence, and give each doctor a running wait number from 0. Append is the
//! only operation that leaves existing entries untouched.
//!
//! A loaded snapshot's id order need not match its wait numbers. Operations that
//! keep the existing order start from [`line_order`], which trusts wait numbers.

pub mod invariants;

use std::collections::{HashMap, VecDeque};

use crate::domain::queue::{DoctorId, EntryId, NewEntry, QueueEntry, QueueSnapshot};

/// Result of finishing a consultation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advanced {
  pub snapshot: QueueSnapshot,
  /// The patient whose consultation ended.
  pub removed: Option<QueueEntry>,
  /// The patient now in consultation for the same doctor, as renumbered.
  pub promoted: Option<QueueEntry>,
}

/// Put a new patient at the back of a doctor's line.
///
/// The wait number is the doctor's current entry count, so the first patient of
/// an idle doctor is in consultation immediately. The id is one past the
/// largest id (`len + 1` for a dense snapshot), so id order keeps matching line
/// order.
pub fn append(snapshot: &QueueSnapshot, entry: NewEntry) -> (QueueSnapshot, EntryId) {
  let wait_number = snapshot.count_for(&entry.doctor_id) as u32;
  let id = EntryId::new(snapshot.max_id().map(EntryId::get).unwrap_or(0) + 1);

  let mut next = snapshot.clone();
  next.push(entry.into_entry(id, wait_number));
  debug_assert!(invariants::check(&next).is_ok() || invariants::check(snapshot).is_err());
  (next, id)
}

/// Finish the current consultation for `doctor`.
///
/// Removes the doctor's wait-number-0 entry and renumbers what remains in
/// [`line_order`]. When the doctor has no current patient the snapshot comes
/// back unchanged with nothing removed or promoted.
pub fn advance(snapshot: &QueueSnapshot, doctor: &DoctorId) -> Advanced {
  let Some(current) = current_patient(snapshot, doctor).cloned() else {
    return Advanced {
      snapshot: snapshot.clone(),
      removed: None,
      promoted: None,
    };
  };

  let next = reorder(line_order(snapshot).into_iter().filter(|e| e.id != current.id));
  let promoted = current_patient(&next, doctor).cloned();

  Advanced {
    snapshot: next,
    removed: Some(current),
    promoted,
  }
}

/// Remove one entry wherever it sits in line and renumber.
///
/// Deleting an id that is not present returns the snapshot unchanged.
pub fn delete_by_id(snapshot: &QueueSnapshot, id: EntryId) -> QueueSnapshot {
  if !snapshot.contains(id) {
    return snapshot.clone();
  }
  reorder(line_order(snapshot).into_iter().filter(|e| e.id != id))
}

/// Entries in snapshot order, except that each doctor's slots are refilled with
/// that doctor's entries sorted by wait number.
///
/// The interleave of doctors is kept; only the order within a line can change,
/// and only when ids and wait numbers disagree.
pub fn line_order(snapshot: &QueueSnapshot) -> Vec<QueueEntry> {
  let mut lines: HashMap<&DoctorId, VecDeque<&QueueEntry>> = HashMap::new();
  for doctor in snapshot.doctors() {
    let mut line = waiting_for(snapshot, doctor);
    line.sort_by_key(|e| (e.wait_number, e.id));
    lines.insert(doctor, line.into());
  }

  snapshot
    .iter()
    .filter_map(|slot| lines.get_mut(&slot.doctor_id).and_then(VecDeque::pop_front))
    .cloned()
    .collect()
}

/// Rebuild a snapshot from entries in a new display order.
///
/// Ids become `1..N` in the given order and each doctor's wait numbers count up
/// from 0 independently, so interleaved doctors keep their own numbering.
pub fn reorder(entries: impl IntoIterator<Item = QueueEntry>) -> QueueSnapshot {
  let mut counters: HashMap<DoctorId, u32> = HashMap::new();

  let renumbered = entries
    .into_iter()
    .enumerate()
    .map(|(index, mut entry)| {
      let counter = counters.entry(entry.doctor_id.clone()).or_insert(0);
      entry.wait_number = *counter;
      entry.id = EntryId::new(index as u32 + 1);
      *counter += 1;
      entry
    })
    .collect();

  let snapshot = QueueSnapshot::from_entries(renumbered);
  debug_assert!(invariants::check(&snapshot).is_ok());
  snapshot
}

/// Move whole lines to new doctor ids, as after the roster re-keys.
///
/// The mapping is applied all at once, so `3 -> 2` alongside `2 -> 1` does not
/// chain. Ids and wait numbers are untouched. Returns `Err` with the target id
/// when a line would land on a doctor id that already has one.
pub fn rename_doctors(snapshot: &QueueSnapshot, mapping: &[(DoctorId, DoctorId)]) -> Result<QueueSnapshot, DoctorId> {
  let renamed: HashMap<&DoctorId, &DoctorId> = mapping.iter().map(|(old, new)| (old, new)).collect();

  for (_, new) in mapping {
    if !renamed.contains_key(new) && snapshot.count_for(new) > 0 {
      return Err(new.clone());
    }
  }

  let entries = snapshot
    .iter()
    .cloned()
    .map(|mut entry| {
      if let Some(new) = renamed.get(&entry.doctor_id) {
        entry.doctor_id = (*new).clone();
      }
      entry
    })
    .collect();
  Ok(QueueSnapshot::from_entries(entries))
}

/// The patient currently in consultation with `doctor`.
pub fn current_patient<'a>(snapshot: &'a QueueSnapshot, doctor: &DoctorId) -> Option<&'a QueueEntry> {
  snapshot
    .iter()
    .find(|e| &e.doctor_id == doctor && e.wait_number == 0)
}

/// One doctor's line, front to back.
pub fn waiting_for<'a>(snapshot: &'a QueueSnapshot, doctor: &DoctorId) -> Vec<&'a QueueEntry> {
  let mut line: Vec<_> = snapshot.iter().filter(|e| &e.doctor_id == doctor).collect();
  line.sort_by_key(|e| e.wait_number);
  line
}

/// Resolve a sequence of ids into entries for [`reorder`].
///
/// Unknown and repeated ids are skipped. Entries the sequence does not mention
/// follow in their existing order, so a partial list never drops a patient.
pub fn order_from_ids(snapshot: &QueueSnapshot, ids: &[EntryId]) -> Vec<QueueEntry> {
  let mut ordered: Vec<QueueEntry> = Vec::with_capacity(snapshot.len());
  for id in ids {
    if ordered.iter().any(|e| e.id == *id) {
      continue;
    }
    if let Some(entry) = snapshot.get(*id) {
      ordered.push(entry.clone());
    }
  }
  for entry in line_order(snapshot) {
    if !ordered.iter().any(|e| e.id == entry.id) {
      ordered.push(entry);
    }
  }
  ordered
}

/// The order produced by dragging one entry to a 0-based `position`.
///
/// Positions past the end clamp to the back. Returns `None` if `id` is absent.
pub fn move_entry(snapshot: &QueueSnapshot, id: EntryId, position: usize) -> Option<Vec<QueueEntry>> {
  let mut order = line_order(snapshot);
  let from = order.iter().position(|e| e.id == id)?;
  let entry = order.remove(from);
  let to = position.min(order.len());
  order.insert(to, entry);
  Some(order)
}
