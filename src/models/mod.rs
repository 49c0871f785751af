// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod timetable;
pub mod user;

pub use timetable::{
    CurrentTimetable, GenerateTimetable, GeneratedTimetable, InputDetails, RealignTimetable,
    ScheduleSource, Task, TimetableData, TimetableDocument, TimetablePayload, UpdateTimetable,
};
pub use user::{ProfileCreation, ProfileFields, UserProfile};
