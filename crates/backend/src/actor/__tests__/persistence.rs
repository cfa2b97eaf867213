//! Cache, realtime store and lifecycle behavior of the desk actor.

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use pretty_assertions::assert_eq;

  use crate::{
    actor::{
      ConsultationEvent, DeskError,
      __tests__::helpers::{DeskTestContext, admission, row, shape},
      handle::SendError,
    },
    domain::{
      queue::{DoctorId, NewEntry},
      session::Session,
    },
    relational::AppointmentStatus,
    store::RealtimeStore,
  };

  // ==========================================================================
  // Remote failures
  // ==========================================================================

  #[tokio::test]
  async fn test_remote_failure_leaves_local_ahead() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "P1")).await.unwrap();

    ctx.realtime.set_failing(true);
    let err = desk.append(NewEntry::new("1", "P2")).await.unwrap_err();
    assert!(matches!(err, DeskError::Persistence(_)));

    // local copies took the change, the remote did not
    let local = desk.snapshot().await.unwrap();
    assert_eq!(shape(&local), vec![row(1, "P1", 0), row(2, "P2", 1)]);
    assert_eq!(ctx.cached_snapshot(), local);
    assert_eq!(shape(&ctx.remote_snapshot().unwrap()), vec![row(1, "P1", 0)]);

    // the next successful write overwrites the whole remote value
    ctx.realtime.set_failing(false);
    desk.append(NewEntry::new("1", "P3")).await.unwrap();
    assert_eq!(ctx.remote_snapshot(), Some(desk.snapshot().await.unwrap()));
  }

  #[tokio::test]
  async fn test_notification_failures_do_not_undo_advance() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.admit(admission("1", "Asha", "900")).await.unwrap();
    desk.admit(admission("1", "Ravi", "901")).await.unwrap();

    ctx.relational.set_failing(true);
    let outcome = desk.advance(DoctorId::from("1")).await.expect("advance still succeeds");

    let events: Vec<_> = outcome.notification_errors.iter().map(|f| f.event).collect();
    assert_eq!(events, vec![ConsultationEvent::Ended, ConsultationEvent::Started]);
    assert_eq!(outcome.promoted.unwrap().patient_name, "Ravi");

    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(shape(&snapshot), vec![row(1, "Ravi", 0)]);
    assert_eq!(ctx.remote_snapshot(), Some(snapshot));
  }

  #[tokio::test]
  async fn test_advance_records_consultations_when_remote_write_fails() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    let first = desk.admit(admission("1", "Asha", "900")).await.unwrap();
    let second = desk.admit(admission("1", "Ravi", "901")).await.unwrap();

    let snapshot = desk.snapshot().await.unwrap();
    let first_appt = snapshot.get(first).unwrap().appointment_ref.clone().unwrap();
    let second_appt = snapshot.get(second).unwrap().appointment_ref.clone().unwrap();

    ctx.realtime.set_failing(true);
    let advanced_at = chrono::Utc::now();
    let (outcome, source) = match desk.advance(DoctorId::from("1")).await {
      Err(DeskError::AdvanceNotSaved { outcome, source }) => (outcome, source),
      other => panic!("expected a local-only advance, got {:?}", other),
    };
    assert!(matches!(*source, DeskError::Persistence(_)));
    assert_eq!(outcome.removed.as_ref().unwrap().patient_name, "Asha");
    assert_eq!(outcome.promoted.as_ref().unwrap().patient_name, "Ravi");
    assert!(outcome.notification_errors.is_empty());

    // the relational service saw the same transition the local queue did
    assert_eq!(
      ctx.relational.appointment(&first_appt).unwrap().status,
      AppointmentStatus::Completed
    );
    assert!(ctx.relational.appointment(&first_appt).unwrap().consultation_end_time.is_some());
    assert!(ctx.relational.appointment(&second_appt).unwrap().consultation_start_time >= advanced_at);
    assert_eq!(shape(&desk.snapshot().await.unwrap()), vec![row(1, "Ravi", 0)]);
  }

  // ==========================================================================
  // Refresh
  // ==========================================================================

  #[tokio::test]
  async fn test_refresh_replaces_local_queue() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "stale")).await.unwrap();

    let remote = r#"{"1": {"name": "Asha", "docid": "1", "docname": "Dr Rao", "docdept": "ENT", "waitno": 0},
                     "2": {"name": "Ravi", "docid": "1", "docname": "Dr Rao", "docdept": "ENT", "waitno": 1}}"#;
    ctx.realtime.write(&ctx.hospital(), remote).await.unwrap();

    assert!(desk.refresh().await.unwrap());
    let snapshot = desk.snapshot().await.unwrap();
    assert_eq!(shape(&snapshot), vec![row(1, "Asha", 0), row(2, "Ravi", 1)]);
    assert_eq!(ctx.cached_snapshot(), snapshot);
  }

  #[tokio::test]
  async fn test_refresh_without_remote_value_keeps_local() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn();
    desk.sign_in(Session::new("other-hospital", "")).await.unwrap();

    assert!(!desk.refresh().await.unwrap());
    assert!(desk.snapshot().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_refresh_rejects_malformed_remote() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "P1")).await.unwrap();
    ctx.realtime.write(&ctx.hospital(), "[1, 2, 3]").await.unwrap();

    let err = desk.refresh().await.unwrap_err();
    assert!(matches!(err, DeskError::Persistence(_)));
    assert_eq!(shape(&desk.snapshot().await.unwrap()), vec![row(1, "P1", 0)]);
  }

  #[tokio::test]
  async fn test_refresh_requires_sign_in() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn();
    assert!(matches!(desk.refresh().await, Err(DeskError::NotSignedIn)));
  }

  // ==========================================================================
  // Session lifecycle
  // ==========================================================================

  #[tokio::test]
  async fn test_sign_out_empties_all_three_stores() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "P1")).await.unwrap();

    desk.sign_out().await.unwrap();
    assert_eq!(desk.session().await.unwrap(), None);
    assert!(desk.roster().await.unwrap().is_empty());
    assert!(desk.snapshot().await.unwrap().is_empty());

    // a fresh actor over the same cache starts empty too
    let restarted = ctx.spawn();
    assert_eq!(restarted.session().await.unwrap(), None);
    assert!(restarted.roster().await.unwrap().is_empty());
    assert!(restarted.snapshot().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_state_survives_restart() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    desk.append(NewEntry::new("1", "P1")).await.unwrap();
    desk.append(NewEntry::new("1", "P2")).await.unwrap();
    let before = desk.snapshot().await.unwrap();
    desk.shutdown().await.unwrap();

    let restarted = ctx.spawn();
    assert_eq!(restarted.snapshot().await.unwrap(), before);
    assert_eq!(
      restarted.session().await.unwrap().map(|s| s.uid.to_string()),
      Some(ctx.hospital().to_string())
    );
    assert_eq!(restarted.roster().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_sign_in_requires_uid() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn();
    let err = desk.sign_in(Session::new(" ", "desk@example.com")).await.unwrap_err();
    assert!(matches!(err, DeskError::Validation(_)));
    assert_eq!(desk.session().await.unwrap(), None);
  }

  // ==========================================================================
  // Shutdown
  // ==========================================================================

  #[tokio::test]
  async fn test_shutdown_message_stops_actor() {
    let ctx = DeskTestContext::new();
    let desk = ctx.spawn();
    desk.shutdown().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), desk.snapshot())
      .await
      .expect("request should not hang");
    assert!(matches!(result, Err(SendError::ActorGone)));
  }

  #[tokio::test]
  async fn test_cancellation_stops_actor() {
    let ctx = DeskTestContext::new();
    let desk = ctx.ready().await;
    ctx.cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), desk.append(NewEntry::new("1", "late")))
      .await
      .expect("request should not hang");
    assert!(matches!(result, Err(DeskError::ActorGone(_))));
  }
}
