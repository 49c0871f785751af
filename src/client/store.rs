// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable client state container.
//!
//! The session is rehydrated from a JSON file on open, written back after
//! every mutation, and removed on logout.

use crate::client::{ClientError, Planner, TimetableSession, ToggleOutcome};
use crate::models::TimetableDocument;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const STATE_DIR: &str = "study-planner";
const STATE_FILE: &str = "client-state.json";

/// Owns the client session and its on-disk copy.
#[derive(Debug)]
pub struct ClientStore {
    path: PathBuf,
    session: TimetableSession,
}

impl ClientStore {
    /// Default state file: `<data_local_dir>/study-planner/client-state.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(STATE_DIR).join(STATE_FILE))
    }

    /// Open the store at the default location.
    pub fn open_default() -> Result<Self, ClientError> {
        let path = Self::default_path().ok_or_else(|| {
            ClientError::Persistence("no local data directory on this platform".to_string())
        })?;
        Ok(Self::open(path))
    }

    /// Open the store at `path`, rehydrating any saved session.
    ///
    /// A missing or unreadable file starts an empty session.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable client state");
                TimetableSession::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => TimetableSession::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read client state");
                TimetableSession::default()
            }
        };

        Self { path, session }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> &TimetableSession {
        &self.session
    }

    /// Start a session for `user_id`. State from another user is dropped.
    pub fn login(&mut self, user_id: &str) -> Result<(), ClientError> {
        if self.session.user_id.as_deref() != Some(user_id) {
            self.session = TimetableSession::new(user_id);
        }
        self.save()
    }

    /// Replace the working copy with a server-confirmed document.
    pub fn set_timetable(&mut self, doc: TimetableDocument) -> Result<(), ClientError> {
        self.session.set_timetable(doc);
        self.save()
    }

    /// Set a task's completion flag locally, without realigning.
    ///
    /// Returns the previous value. The session's sync status records that
    /// the change has not reached the server.
    pub fn toggle_task(
        &mut self,
        day: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<bool, ClientError> {
        let previous = self.session.toggle_task(day, task_id, completed)?;
        self.save()?;
        Ok(previous)
    }

    /// Toggle a task, realigning through `planner` when it becomes incomplete.
    ///
    /// The session is saved whatever the outcome, so an optimistic change
    /// that failed to reconcile survives a restart.
    pub async fn toggle_and_reconcile(
        &mut self,
        day: &str,
        task_id: &str,
        completed: bool,
        planner: &dyn Planner,
    ) -> Result<ToggleOutcome, ClientError> {
        let outcome = self
            .session
            .toggle_and_reconcile(day, task_id, completed, planner)
            .await;

        if !matches!(outcome, Err(ClientError::TaskNotFound { .. })) {
            self.save()?;
        }
        outcome
    }

    /// Tear down: clear the session and delete the state file.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session = TimetableSession::default();

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persistence(e)),
        }
    }

    /// Write the session to a sibling temp file, then rename it into place.
    fn save(&self) -> Result<(), ClientError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(persistence)?;

        let raw = serde_json::to_vec_pretty(&self.session).map_err(persistence)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(persistence)?;
        tmp.write_all(&raw).map_err(persistence)?;
        tmp.as_file().sync_all().map_err(persistence)?;
        tmp.persist(&self.path).map_err(|e| persistence(e.error))?;
        Ok(())
    }
}

fn persistence(e: impl std::fmt::Display) -> ClientError {
    ClientError::Persistence(e.to_string())
}
