// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod agent;
pub mod identity;
pub mod normalizer;
pub mod timetable;

pub use agent::{AgentClient, AgentError};
pub use identity::{FirebaseTokenVerifier, IdentityError, VerifiedIdentity};
pub use normalizer::{normalize, MalformedScheduleError, MetadataKeys};
pub use timetable::TimetableWorkflow;
