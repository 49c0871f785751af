// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Working copy of the current timetable with two-phase task toggles.
//!
//! Phase one mutates the local copy immediately. Phase two runs only when a
//! completed task is marked incomplete: the planner re-plans around the
//! missed task and its result replaces the working copy. If phase two
//! fails the optimistic change stays and the session is left `Unsynced`.

use crate::client::{ClientError, Planner};
use crate::models::{InputDetails, RealignTimetable, TimetableData, TimetableDocument};
use serde::{Deserialize, Serialize};

/// How the working copy relates to the stored timetable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SyncStatus {
    /// Matches the last server-confirmed result.
    #[default]
    Synced,
    /// Holds completion marks that are never sent to the server.
    LocalOnly,
    /// A reconciliation failed; the local copy is ahead of the server.
    Unsynced { reason: String },
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The task already had the requested state.
    Unchanged,
    /// Applied locally only.
    LocalOnly,
    /// Applied locally, then replaced by a realigned timetable.
    Realigned,
}

/// Client timetable state for one signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSession {
    pub user_id: Option<String>,
    pub timetable_id: Option<String>,
    pub current_timetable: Option<TimetableData>,
    pub input_details: Option<InputDetails>,
    #[serde(default)]
    pub sync: SyncStatus,
}

impl TimetableSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Replace the working copy with a server-confirmed document.
    pub fn set_timetable(&mut self, doc: TimetableDocument) {
        self.user_id = Some(doc.user_id);
        self.timetable_id = Some(doc.id);
        self.current_timetable = Some(doc.data.timetable);
        self.input_details = Some(doc.data.input_details);
        self.sync = SyncStatus::Synced;
    }

    /// Phase one only: set a task's completion flag locally.
    ///
    /// Returns the previous value. An unknown day or task leaves the
    /// session untouched. Marking complete leaves the session `LocalOnly`.
    /// Marking incomplete without the realign of phase two leaves it
    /// `Unsynced`.
    pub fn toggle_task(
        &mut self,
        day: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<bool, ClientError> {
        let previous = self.apply_toggle(day, task_id, completed)?;

        if previous != completed {
            if completed {
                self.mark_local_only();
            } else if !matches!(self.sync, SyncStatus::Unsynced { .. }) {
                self.sync = SyncStatus::Unsynced {
                    reason: format!("task '{task_id}' on '{day}' was not realigned"),
                };
            }
        }
        Ok(previous)
    }

    /// Toggle a task and, on a completed to incomplete transition, realign.
    pub async fn toggle_and_reconcile(
        &mut self,
        day: &str,
        task_id: &str,
        completed: bool,
        planner: &dyn Planner,
    ) -> Result<ToggleOutcome, ClientError> {
        let previous = self.apply_toggle(day, task_id, completed)?;

        if previous == completed {
            return Ok(ToggleOutcome::Unchanged);
        }
        if completed {
            self.mark_local_only();
            return Ok(ToggleOutcome::LocalOnly);
        }

        let (Some(timetable_id), Some(user_id), Some(details), Some(timetable)) = (
            self.timetable_id.clone(),
            self.user_id.clone(),
            self.input_details.clone(),
            self.current_timetable.clone(),
        ) else {
            self.sync = SyncStatus::Unsynced {
                reason: ClientError::NoTimetable.to_string(),
            };
            return Err(ClientError::NoTimetable);
        };

        let request = RealignTimetable {
            user_id: Some(user_id),
            current_timetable: Some(timetable),
            missed_task_id: Some(task_id.to_string()),
            availability: Some(details.availability),
            study_time: Some(details.study_time),
        };

        match planner.realign(&timetable_id, &request).await {
            Ok(doc) => {
                tracing::debug!(timetable_id = %doc.id, "Timetable realigned");
                self.set_timetable(doc);
                Ok(ToggleOutcome::Realigned)
            }
            Err(e) => {
                tracing::warn!(error = %e, timetable_id = %timetable_id, "Realignment failed");
                self.sync = SyncStatus::Unsynced {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn apply_toggle(
        &mut self,
        day: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<bool, ClientError> {
        let task = self
            .current_timetable
            .as_mut()
            .and_then(|timetable| timetable.task_mut(day, task_id))
            .ok_or_else(|| ClientError::TaskNotFound {
                day: day.to_string(),
                task_id: task_id.to_string(),
            })?;

        let previous = task.completed;
        task.completed = completed;
        Ok(previous)
    }

    // A failed reconciliation stays visible until the next server result.
    fn mark_local_only(&mut self) {
        if self.sync == SyncStatus::Synced {
            self.sync = SyncStatus::LocalOnly;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TimetablePayload};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Planner that records calls and replies with a fixed result.
    struct FakePlanner {
        calls: AtomicUsize,
        last_request: Mutex<Option<RealignTimetable>>,
        fail: bool,
    }

    impl FakePlanner {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                fail,
            }
        }
    }

    #[async_trait]
    impl Planner for FakePlanner {
        async fn realign(
            &self,
            timetable_id: &str,
            request: &RealignTimetable,
        ) -> Result<TimetableDocument, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());

            if self.fail {
                return Err(ClientError::Api {
                    status: Some(500),
                    message: "agent down".into(),
                });
            }

            let mut replanned = TimetableData::new();
            replanned.insert("Tuesday", vec![task("Tuesday-Review", false)]);
            Ok(document(timetable_id, replanned))
        }
    }

    fn task(id: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            description: id.to_string(),
            hours: 1.0,
            completed,
        }
    }

    fn document(id: &str, timetable: TimetableData) -> TimetableDocument {
        TimetableDocument {
            id: id.to_string(),
            user_id: "u1".to_string(),
            data: TimetablePayload {
                timetable,
                input_details: InputDetails {
                    availability: "evenings".into(),
                    start_date: "2024-01-01".into(),
                    study_time: "2h/day".into(),
                },
            },
            created_at: "2024-01-01T00:00:00.000Z".into(),
            updated_at: "2024-01-01T00:00:00.000Z".into(),
        }
    }

    fn loaded_session() -> TimetableSession {
        let mut timetable = TimetableData::new();
        timetable.insert("Monday", vec![task("Monday-Algebra", false)]);

        let mut session = TimetableSession::new("u1");
        session.set_timetable(document("t1", timetable));
        session
    }

    #[tokio::test]
    async fn test_marking_complete_never_realigns() {
        let planner = FakePlanner::new(false);
        let mut session = loaded_session();

        let outcome = session
            .toggle_and_reconcile("Monday", "Monday-Algebra", true, &planner)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::LocalOnly);
        assert_eq!(planner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.sync, SyncStatus::LocalOnly);
        assert!(
            session
                .current_timetable
                .as_ref()
                .unwrap()
                .task("Monday", "Monday-Algebra")
                .unwrap()
                .completed
        );
    }

    #[tokio::test]
    async fn test_unmarking_realigns_exactly_once() {
        let planner = FakePlanner::new(false);
        let mut session = loaded_session();
        session.toggle_task("Monday", "Monday-Algebra", true).unwrap();

        let outcome = session
            .toggle_and_reconcile("Monday", "Monday-Algebra", false, &planner)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::Realigned);
        assert_eq!(planner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.sync, SyncStatus::Synced);

        let sent = planner.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.missed_task_id.as_deref(), Some("Monday-Algebra"));
        assert_eq!(sent.availability.as_deref(), Some("evenings"));

        let current = session.current_timetable.as_ref().unwrap();
        assert!(current.day("Monday").is_none());
        assert!(current.task("Tuesday", "Tuesday-Review").is_some());
    }

    #[tokio::test]
    async fn test_failed_realign_keeps_optimistic_change() {
        let planner = FakePlanner::new(true);
        let mut session = loaded_session();
        session.toggle_task("Monday", "Monday-Algebra", true).unwrap();

        let err = session
            .toggle_and_reconcile("Monday", "Monday-Algebra", false, &planner)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Api { .. }));
        assert_eq!(
            session.sync,
            SyncStatus::Unsynced {
                reason: "agent down".into()
            }
        );
        let task = session
            .current_timetable
            .as_ref()
            .unwrap()
            .task("Monday", "Monday-Algebra")
            .unwrap();
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn test_realign_without_timetable_id_is_rejected() {
        let planner = FakePlanner::new(false);
        let mut session = loaded_session();
        session.timetable_id = None;
        session.toggle_task("Monday", "Monday-Algebra", true).unwrap();

        let err = session
            .toggle_and_reconcile("Monday", "Monday-Algebra", false, &planner)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::NoTimetable));
        assert_eq!(planner.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(session.sync, SyncStatus::Unsynced { .. }));
    }

    #[test]
    fn test_toggle_unknown_task_changes_nothing() {
        let mut session = loaded_session();
        let before = session.clone();

        let err = session.toggle_task("Monday", "missing", true).unwrap_err();

        assert!(matches!(err, ClientError::TaskNotFound { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn test_local_toggle_tracks_sync_status() {
        let mut session = loaded_session();

        session.toggle_task("Monday", "Monday-Algebra", true).unwrap();
        assert_eq!(session.sync, SyncStatus::LocalOnly);

        // Un-completing without phase two leaves the server behind
        session.toggle_task("Monday", "Monday-Algebra", false).unwrap();
        assert!(matches!(session.sync, SyncStatus::Unsynced { .. }));
    }

    #[tokio::test]
    async fn test_completion_after_failed_realign_stays_unsynced() {
        let planner = FakePlanner::new(true);
        let mut timetable = TimetableData::new();
        timetable.insert(
            "Monday",
            vec![task("Monday-Algebra", true), task("Monday-Geometry", false)],
        );
        let mut session = TimetableSession::new("u1");
        session.set_timetable(document("t1", timetable));

        session
            .toggle_and_reconcile("Monday", "Monday-Algebra", false, &planner)
            .await
            .unwrap_err();

        let outcome = session
            .toggle_and_reconcile("Monday", "Monday-Geometry", true, &planner)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::LocalOnly);
        assert_eq!(
            session.sync,
            SyncStatus::Unsynced {
                reason: "agent down".into()
            }
        );
    }
}
