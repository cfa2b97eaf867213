//! Queue operations through the desk actor.

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use crate::{
    actor::{
      DeskError,
      __tests__::helpers::{DeskTestContext, admission, prepare, row, shape},
    },
    domain::{
      queue::{DoctorId, EntryId, NewEntry},
      roster::Doctor,
      validation::ValidationError,
    },
    relational::AppointmentStatus,
  };

  // ==========================================================================
  // Append / Advance
  // ==========================================================================

  /// Add P1, add P2, advance: P2 becomes current and both copies agree.
  #[tokio::test]
  async fn test_add_add_advance() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    let doctor = DoctorId::from("1");

    desk.append(NewEntry::new("1", "P1")).await.expect("append P1");
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(shape(&snapshot), vec![row(1, "P1", 0)]);

    desk.append(NewEntry::new("1", "P2")).await.expect("append P2");
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(shape(&snapshot), vec![row(1, "P1", 0), row(2, "P2", 1)]);

    let outcome = desk.advance(doctor).await.expect("advance");
    assert_eq!(outcome.removed.unwrap().patient_name, "P1");
    assert_eq!(outcome.promoted.unwrap().patient_name, "P2");
    assert!(outcome.notification_errors.is_empty());

    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(shape(&snapshot), vec![row(1, "P2", 0)]);
    assert_eq!(ctx.remote_snapshot(), Some(snapshot.clone()));
    assert_eq!(ctx.cached_snapshot(), snapshot);
  }

  #[tokio::test]
  async fn test_append_fills_doctor_fields_from_roster() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;

    let id = desk.append(NewEntry::new("1", "Asha")).await.unwrap();
    let snapshot = desk.snapshot().await.unwrap();
    let entry = snapshot.get(id).unwrap();
    assert_eq!(entry.doctor_name, "Dr Rao");
    assert_eq!(entry.doctor_department, "ENT");
  }

  #[tokio::test]
  async fn test_append_validation_and_sign_in() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn();

    let err = desk.append(NewEntry::new("1", "Asha")).await.unwrap_err();
    assert!(matches!(err, DeskError::NotSignedIn));

    let desk = ctx.ready().await;
    let err = desk.append(NewEntry::new("1", "  ")).await.unwrap_err();
    assert!(matches!(
      err,
      DeskError::Validation(ValidationError::MissingField("patient name"))
    ));
    assert_eq!(ctx.realtime.writes(), 0);
  }

  #[tokio::test]
  async fn test_advance_with_nobody_in_consultation_writes_nothing() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "P1")).await.unwrap();
    let writes = ctx.realtime.writes();

    let outcome = desk.advance(DoctorId::from("2")).await.unwrap();
    assert_eq!(outcome.removed, None);
    assert_eq!(outcome.promoted, None);
    assert_eq!(ctx.realtime.writes(), writes);
  }

  #[tokio::test]
  async fn test_doctors_keep_independent_lines() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.add_doctor(Doctor::new("Dr Iyer", "Cardiology", "555-0102")).await.unwrap();

    for (doctor, patient) in [("1", "a1"), ("2", "b1"), ("1", "a2"), ("2", "b2")] {
      desk.append(NewEntry::new(doctor, patient)).await.unwrap();
    }
    desk.advance(DoctorId::from("2")).await.unwrap();

    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(
      shape(&snapshot),
      vec![row(1, "a1", 0), row(2, "a2", 1), row(3, "b2", 0)]
    );
    assert_eq!(snapshot.get(EntryId::new(3)).unwrap().doctor_name, "Dr Iyer");
  }

  // ==========================================================================
  // Admission
  // ==========================================================================

  #[tokio::test]
  async fn test_admit_links_appointment_and_advance_stamps_times() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;

    let first = desk.admit(admission("1", "Asha", "900")).await.expect("admit Asha");
    let second = desk.admit(admission("1", "Ravi", "901")).await.expect("admit Ravi");

    let snapshot = desk.snapshot().await.unwrap();
    let first_appt = snapshot.get(first).unwrap().appointment_ref.clone().unwrap();
    let second_appt = snapshot.get(second).unwrap().appointment_ref.clone().unwrap();
    assert!(snapshot.get(first).unwrap().patient_ref.is_some());
    assert_eq!(snapshot.get(second).unwrap().doctor_name, "Dr Rao");

    let outcome = desk.advance(DoctorId::from("1")).await.unwrap();
    assert!(outcome.notification_errors.is_empty());

    let finished = ctx.relational.appointment(&first_appt).unwrap();
    assert_eq!(finished.status, AppointmentStatus::Completed);
    assert!(finished.consultation_end_time.is_some());

    let started = ctx.relational.appointment(&second_appt).unwrap();
    assert_eq!(started.status, AppointmentStatus::Scheduled);
    assert!(started.consultation_start_time >= started.appointment.at);
  }

  #[tokio::test]
  async fn test_admit_returning_patient_reuses_record() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;

    desk.admit(admission("1", "Asha", "900")).await.unwrap();
    desk.admit(admission("1", "Asha", "900")).await.unwrap();

    assert_eq!(ctx.relational.patient_count(), 1);
    assert_eq!(ctx.relational.appointment_count(), 2);
  }

  /// Two family members share a number: the lookup offers both, and the desk
  /// admits the one it picks without creating a record.
  #[tokio::test]
  async fn test_find_patients_by_mobile_then_admit_picked() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;

    desk.admit(admission("1", "Asha", "900")).await.unwrap();
    desk.admit(admission("1", "Ravi", "900")).await.unwrap();
    desk.admit(admission("1", "Meera", "901")).await.unwrap();

    let found = desk.find_patients("900".to_string()).await.unwrap();
    let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Asha", "Ravi"]);

    let mut again = admission("1", "Ravi", "900");
    again.returning_patient = Some(found[1].patient_ref.clone());
    let id = desk.admit(again).await.unwrap();

    assert_eq!(ctx.relational.patient_count(), 3);
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(snapshot.get(id).unwrap().patient_ref, Some(found[1].patient_ref.clone()));
  }

  #[tokio::test]
  async fn test_find_patients_needs_mobile_and_sign_in() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn();

    let err = desk.find_patients("900".to_string()).await.unwrap_err();
    assert!(matches!(err, DeskError::NotSignedIn));

    prepare(&desk).await;
    let err = desk.find_patients("  ".to_string()).await.unwrap_err();
    assert!(matches!(err, DeskError::Validation(ValidationError::MissingField("mobile number"))));
    assert!(desk.find_patients("900".to_string()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_admit_unknown_doctor() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;

    let err = desk.admit(admission("7", "Asha", "900")).await.unwrap_err();
    assert!(matches!(err, DeskError::DoctorNotFound(id) if id == DoctorId::from("7")));
    assert_eq!(ctx.relational.appointment_count(), 0);
    assert_eq!(ctx.realtime.writes(), 0);
  }

  #[tokio::test]
  async fn test_admit_without_relational_service() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn_without_relational();
    prepare(&desk).await;

    let id = desk.admit(admission("1", "Asha", "900")).await.unwrap();
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(snapshot.get(id).unwrap().appointment_ref, None);
    assert_eq!(snapshot.get(id).unwrap().wait_number, 0);
  }

  #[tokio::test]
  async fn test_failed_registration_queues_nobody() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    ctx.relational.set_failing(true);

    let err = desk.admit(admission("1", "Asha", "900")).await.unwrap_err();
    assert!(matches!(err, DeskError::Relational(_)));
    assert!(desk.snapshot().await.unwrap().is_empty());
  }

  // ==========================================================================
  // Delete / Reorder
  // ==========================================================================

  #[tokio::test]
  async fn test_delete_renumbers_and_absent_is_noop() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    for patient in ["p0", "p1", "p2"] {
      desk.append(NewEntry::new("1", patient)).await.unwrap();
    }

    assert!(desk.delete(EntryId::new(2)).await.unwrap());
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(shape(&snapshot), vec![row(1, "p0", 0), row(2, "p2", 1)]);

    let writes = ctx.realtime.writes();
    assert!(!desk.delete(EntryId::new(9)).await.unwrap());
    assert_eq!(ctx.realtime.writes(), writes);
    assert_eq!(desk.snapshot().await.unwrap(), snapshot);
  }

  #[tokio::test]
  async fn test_reorder_by_ids() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.add_doctor(Doctor::new("Dr Iyer", "Cardiology", "555-0102")).await.unwrap();
    for (doctor, patient) in [("1", "A1"), ("2", "B1"), ("1", "A2"), ("2", "B2")] {
      desk.append(NewEntry::new(doctor, patient)).await.unwrap();
    }

    let ids = [4, 3, 2, 1].map(EntryId::new).to_vec();
    desk.reorder(ids).await.unwrap();

    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(
      shape(&snapshot),
      vec![row(1, "B2", 0), row(2, "A2", 0), row(3, "B1", 1), row(4, "A1", 1)]
    );
    assert_eq!(ctx.remote_snapshot(), Some(snapshot));
  }

  #[tokio::test]
  async fn test_move_entry() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    for patient in ["p0", "p1", "p2"] {
      desk.append(NewEntry::new("1", patient)).await.unwrap();
    }

    desk.move_entry(EntryId::new(3), 0).await.unwrap();
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(
      shape(&snapshot),
      vec![row(1, "p2", 0), row(2, "p0", 1), row(3, "p1", 2)]
    );

    let err = desk.move_entry(EntryId::new(8), 0).await.unwrap_err();
    assert!(matches!(err, DeskError::EntryNotFound(id) if id == EntryId::new(8)));

    let writes = ctx.realtime.writes();
    desk.move_entry(EntryId::new(1), 0).await.unwrap();
    assert_eq!(ctx.realtime.writes(), writes);
  }

  // ==========================================================================
  // Roster changes with a live queue
  // ==========================================================================

  #[tokio::test]
  async fn test_remove_doctor_moves_queued_lines_to_new_keys() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.add_doctor(Doctor::new("Dr B", "Ortho", "555-0102")).await.unwrap();
    desk.add_doctor(Doctor::new("Dr C", "Derm", "555-0103")).await.unwrap();
    desk.append(NewEntry::new("2", "b-patient")).await.unwrap();
    desk.append(NewEntry::new("3", "c-patient")).await.unwrap();

    let removed = desk.remove_doctor(DoctorId::from("1")).await.unwrap();
    assert_eq!(removed.name, "Dr Rao");

    // Dr C is now doctor 2 and a new patient joins Dr C's line
    desk.append(NewEntry::new("2", "c-new")).await.unwrap();
    let snapshot = desk.snapshot().await.unwrap();
    let lines: Vec<_> = snapshot
      .iter()
      .map(|e| (e.patient_name.as_str(), e.doctor_id.as_str(), e.doctor_name.as_str(), e.wait_number))
      .collect();
    assert_eq!(
      lines,
      vec![
        ("b-patient", "1", "Dr B", 0),
        ("c-patient", "2", "Dr C", 0),
        ("c-new", "2", "Dr C", 1),
      ]
    );
    assert_eq!(ctx.remote_snapshot(), Some(snapshot));
  }

  #[tokio::test]
  async fn test_remove_doctor_with_patients_is_refused() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "Asha")).await.unwrap();

    let err = desk.remove_doctor(DoctorId::from("1")).await.unwrap_err();
    assert!(matches!(err, DeskError::DoctorHasPatients { waiting: 1, .. }));
    assert_eq!(desk.roster().await.unwrap().len(), 1);
    assert_eq!(shape(&desk.snapshot().await.unwrap()), vec![row(1, "Asha", 0)]);
  }
}
