// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side timetable state.
//!
//! [`ClientStore`] owns the working copy of the user's timetable and
//! persists it to local storage; [`TimetableSession`] applies optimistic
//! task toggles and reconciles them through a [`Planner`] such as
//! [`BackendClient`].

pub mod api;
pub mod session;
pub mod store;

pub use api::{BackendClient, Planner};
pub use session::{SyncStatus, TimetableSession, ToggleOutcome};
pub use store::ClientStore;

/// Client-side failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No timetable (or its ID) is loaded, so nothing can be realigned.
    #[error("no timetable is loaded")]
    NoTimetable,

    #[error("task '{task_id}' not found on '{day}'")]
    TaskNotFound { day: String, task_id: String },

    /// The backend rejected or failed a request.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    #[error("failed to persist client state: {0}")]
    Persistence(String),
}
