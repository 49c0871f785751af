// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timetable models for storage and API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A single planned study task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Task {
    /// Unique within its day
    pub id: String,
    pub description: String,
    /// Estimated effort in hours
    #[serde(default)]
    pub hours: f64,
    /// Tracked by the client; never supplied by the agent
    #[serde(default)]
    pub completed: bool,
}

/// Canonical schedule: day key to ordered tasks.
///
/// Keys are kept sorted so serialization is stable. The order carries no
/// calendar meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimetableData(BTreeMap<String, Vec<Task>>);

impl TimetableData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: impl Into<String>, tasks: Vec<Task>) {
        self.0.insert(day.into(), tasks);
    }

    pub fn day(&self, day: &str) -> Option<&[Task]> {
        self.0.get(day).map(Vec::as_slice)
    }

    pub fn days(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Task])> {
        self.0.iter().map(|(day, tasks)| (day.as_str(), tasks.as_slice()))
    }

    pub fn task(&self, day: &str, task_id: &str) -> Option<&Task> {
        self.0.get(day)?.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, day: &str, task_id: &str) -> Option<&mut Task> {
        self.0.get_mut(day)?.iter_mut().find(|t| t.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<Task>)> for TimetableData {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Task>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Constraints a timetable was generated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InputDetails {
    pub availability: String,
    pub start_date: String,
    pub study_time: String,
}

/// Body of a timetable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetablePayload {
    pub timetable: TimetableData,
    pub input_details: InputDetails,
}

/// Stored timetable record in Firestore (`timetables/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableDocument {
    /// Also used as document ID
    pub id: String,
    /// Owner UID; never changes after creation
    pub user_id: String,
    pub data: TimetablePayload,
    pub created_at: String,
    pub updated_at: String,
}

/// Pointer to a user's active timetable (`current_timetables/{userId}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTimetable {
    pub user_id: String,
    pub timetable_id: String,
    pub updated_at: String,
}

/// Material the agent plans from.
#[derive(Debug, Clone)]
pub enum ScheduleSource {
    /// Free-form topic or syllabus text
    Text(String),
    /// Raw bytes of a syllabus PDF
    Pdf(Vec<u8>),
}

impl ScheduleSource {
    fn is_empty(&self) -> bool {
        match self {
            ScheduleSource::Text(text) => text.trim().is_empty(),
            ScheduleSource::Pdf(bytes) => bytes.is_empty(),
        }
    }
}

/// Request to generate a new timetable.
#[derive(Debug, Clone, Default, Validate)]
pub struct GenerateTimetable {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    pub source: Option<ScheduleSource>,
    #[validate(required, length(min = 1))]
    pub availability: Option<String>,
    #[validate(required, length(min = 1))]
    pub start_date: Option<String>,
    #[validate(required, length(min = 1))]
    pub study_time: Option<String>,
}

impl GenerateTimetable {
    /// Whether a non-empty source was supplied.
    pub fn has_source(&self) -> bool {
        self.source.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Trim string fields, turning blank values into `None`.
    pub fn trimmed(self) -> Self {
        Self {
            user_id: non_blank(self.user_id),
            source: self.source,
            availability: non_blank(self.availability),
            start_date: non_blank(self.start_date),
            study_time: non_blank(self.study_time),
        }
    }
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTimetable {
    pub timetable_id: String,
    pub timetable: TimetableData,
}

/// Request to overwrite a timetable (`PUT /api/timetables/{id}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimetable {
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[validate(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timetable_data: Option<TimetableData>,
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_time: Option<String>,
}

impl UpdateTimetable {
    /// Trim string fields, turning blank values into `None`.
    pub fn trimmed(self) -> Self {
        Self {
            user_id: non_blank(self.user_id),
            timetable_data: self.timetable_data,
            availability: non_blank(self.availability),
            start_date: non_blank(self.start_date),
            study_time: non_blank(self.study_time),
        }
    }
}

/// Request to re-plan after a missed task
/// (`POST /api/timetables/{id}/realign`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RealignTimetable {
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[validate(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_timetable: Option<TimetableData>,
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missed_task_id: Option<String>,
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[validate(required, length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_time: Option<String>,
}

impl RealignTimetable {
    /// Trim string fields, turning blank values into `None`.
    pub fn trimmed(self) -> Self {
        Self {
            user_id: non_blank(self.user_id),
            current_timetable: self.current_timetable,
            missed_task_id: non_blank(self.missed_task_id),
            availability: non_blank(self.availability),
            study_time: non_blank(self.study_time),
        }
    }
}

/// Treat whitespace-only strings as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
