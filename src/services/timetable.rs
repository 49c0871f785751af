// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timetable workflow service.
//!
//! Handles the core workflow:
//! 1. Validate the request and check the caller owns it
//! 2. Ask the AI agent for a schedule (generate or realign)
//! 3. Normalize the agent's schedule into canonical timetable data
//! 4. Persist the document (and move the current pointer on generate)
//!
//! The agent call always happens before the store write, and nothing is
//! written when validation, ownership or the agent fails.

use crate::db::DocumentStore;
use crate::error::{invalid_fields, AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    GenerateTimetable, GeneratedTimetable, InputDetails, RealignTimetable, ScheduleSource,
    TimetableData, TimetableDocument, TimetablePayload, UpdateTimetable,
};
use crate::services::agent::{
    AgentClient, AgentError, GenerateScheduleRequest, RealignScheduleRequest,
};
use crate::services::normalizer::{normalize, unwrap_schedule_payload, MetadataKeys};
use crate::time_utils::now_rfc3339;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Orchestrates generate / fetch / update / realign.
pub struct TimetableWorkflow {
    db: Arc<dyn DocumentStore>,
    agent: AgentClient,
    metadata_keys: MetadataKeys,
}

impl TimetableWorkflow {
    pub fn new(db: Arc<dyn DocumentStore>, agent: AgentClient, metadata_keys: MetadataKeys) -> Self {
        Self {
            db,
            agent,
            metadata_keys,
        }
    }

    /// Generate a new timetable and make it the caller's current one.
    pub async fn generate(
        &self,
        caller: &AuthUser,
        request: GenerateTimetable,
    ) -> Result<GeneratedTimetable> {
        // 1. Validate everything before any network call
        let request = request.trimmed();
        let mut missing = request
            .validate()
            .err()
            .map(|e| invalid_fields(&e))
            .unwrap_or_default();
        if !request.has_source() {
            missing.push("source".to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::missing_fields(missing));
        }

        let (Some(user_id), Some(source), Some(availability), Some(start_date), Some(study_time)) = (
            request.user_id,
            request.source,
            request.availability,
            request.start_date,
            request.study_time,
        ) else {
            return Err(AppError::Validation("Incomplete generate request".to_string()));
        };

        ensure_caller_is(caller, &user_id)?;

        // 2. Ask the agent
        let (raw_data, pdf_content) = match &source {
            ScheduleSource::Text(text) => (Some(text.as_str()), None),
            ScheduleSource::Pdf(bytes) => (None, Some(GenerateScheduleRequest::encode_pdf(bytes))),
        };

        tracing::info!(
            user_id = %user_id,
            source = if raw_data.is_some() { "text" } else { "pdf" },
            "Generating timetable"
        );

        let raw = self
            .agent
            .generate(
                &caller.token,
                &GenerateScheduleRequest {
                    user_id: &user_id,
                    raw_data,
                    pdf_content,
                    availability: &availability,
                    start_date: &start_date,
                    study_time: &study_time,
                },
            )
            .await?;

        // 3. Normalize
        let timetable = self.normalize_schedule(raw)?;

        // 4. Persist and move the pointer
        let now = now_rfc3339();
        let doc = TimetableDocument {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            data: TimetablePayload {
                timetable,
                input_details: InputDetails {
                    availability,
                    start_date,
                    study_time,
                },
            },
            created_at: now.clone(),
            updated_at: now,
        };
        self.db.create_timetable(&doc).await?;

        tracing::info!(
            user_id = %doc.user_id,
            timetable_id = %doc.id,
            days = doc.data.timetable.len(),
            "Timetable generated"
        );

        Ok(GeneratedTimetable {
            timetable_id: doc.id,
            timetable: doc.data.timetable,
        })
    }

    /// The user's current timetable.
    ///
    /// Follows the current pointer; documents written before pointers
    /// existed are found by most recent `createdAt`.
    pub async fn fetch_latest(&self, caller: &AuthUser, user_id: &str) -> Result<TimetableDocument> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::missing_fields(["userId"]));
        }
        ensure_caller_is(caller, user_id)?;

        if let Some(pointer) = self.db.get_current_pointer(user_id).await? {
            match self.db.get_timetable(&pointer.timetable_id).await? {
                Some(doc) if doc.user_id == user_id => return Ok(doc),
                _ => tracing::warn!(
                    user_id,
                    timetable_id = %pointer.timetable_id,
                    "Current pointer is dangling, falling back to newest timetable"
                ),
            }
        }

        self.db
            .latest_timetable_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No timetable found for this user".to_string()))
    }

    /// Overwrite a timetable's data and constraints.
    pub async fn update(
        &self,
        caller: &AuthUser,
        timetable_id: &str,
        request: UpdateTimetable,
    ) -> Result<TimetableDocument> {
        let request = request.trimmed();
        let timetable_id = timetable_id.trim();
        check_fields(request.validate(), timetable_id)?;

        let (Some(user_id), Some(timetable), Some(availability), Some(start_date), Some(study_time)) = (
            request.user_id,
            request.timetable_data,
            request.availability,
            request.start_date,
            request.study_time,
        ) else {
            return Err(AppError::Validation("Incomplete update request".to_string()));
        };

        ensure_caller_is(caller, &user_id)?;
        let doc = self.load_owned(timetable_id, &user_id).await?;

        self.overwrite(
            doc,
            timetable,
            InputDetails {
                availability,
                start_date,
                study_time,
            },
        )
        .await
    }

    /// Re-plan after a missed task and persist the agent's new schedule.
    pub async fn realign(
        &self,
        caller: &AuthUser,
        timetable_id: &str,
        request: RealignTimetable,
    ) -> Result<TimetableDocument> {
        let request = request.trimmed();
        let timetable_id = timetable_id.trim();
        check_fields(request.validate(), timetable_id)?;

        let (
            Some(user_id),
            Some(current_timetable),
            Some(missed_task_id),
            Some(availability),
            Some(study_time),
        ) = (
            request.user_id,
            request.current_timetable,
            request.missed_task_id,
            request.availability,
            request.study_time,
        )
        else {
            return Err(AppError::Validation("Incomplete realign request".to_string()));
        };

        ensure_caller_is(caller, &user_id)?;
        let doc = self.load_owned(timetable_id, &user_id).await?;

        tracing::info!(
            user_id = %user_id,
            timetable_id,
            missed_task_id = %missed_task_id,
            "Re-aligning timetable"
        );

        let raw = self
            .agent
            .realign(
                &caller.token,
                &RealignScheduleRequest {
                    user_id: &user_id,
                    current_timetable: &current_timetable,
                    missed_task_id: &missed_task_id,
                    availability: &availability,
                    study_time: &study_time,
                },
            )
            .await?;

        let timetable = self.normalize_schedule(raw)?;
        let start_date = doc.data.input_details.start_date.clone();

        self.overwrite(
            doc,
            timetable,
            InputDetails {
                availability,
                start_date,
                study_time,
            },
        )
        .await
    }

    fn normalize_schedule(&self, raw: Value) -> Result<TimetableData> {
        let raw = unwrap_schedule_payload(raw).map_err(AgentError::from)?;
        Ok(normalize(&raw, &self.metadata_keys).map_err(AgentError::from)?)
    }

    /// Load a timetable and check it belongs to `user_id`.
    async fn load_owned(&self, timetable_id: &str, user_id: &str) -> Result<TimetableDocument> {
        let doc = self
            .db
            .get_timetable(timetable_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Timetable {} not found", timetable_id)))?;

        if doc.user_id != user_id {
            tracing::warn!(
                timetable_id,
                owner = %doc.user_id,
                user_id,
                "Rejected write to timetable owned by another user"
            );
            return Err(AppError::Forbidden(
                "Timetable belongs to another user".to_string(),
            ));
        }

        Ok(doc)
    }

    async fn overwrite(
        &self,
        mut doc: TimetableDocument,
        timetable: TimetableData,
        input_details: InputDetails,
    ) -> Result<TimetableDocument> {
        doc.data = TimetablePayload {
            timetable,
            input_details,
        };
        doc.updated_at = now_rfc3339();

        self.db.save_timetable(&doc).await?;
        tracing::info!(timetable_id = %doc.id, user_id = %doc.user_id, "Timetable updated");

        Ok(doc)
    }
}

fn check_fields(
    validation: std::result::Result<(), validator::ValidationErrors>,
    timetable_id: &str,
) -> Result<()> {
    let mut missing = validation
        .err()
        .map(|e| invalid_fields(&e))
        .unwrap_or_default();
    if timetable_id.is_empty() {
        missing.push("timetableId".to_string());
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::missing_fields(missing))
    }
}

fn ensure_caller_is(caller: &AuthUser, user_id: &str) -> Result<()> {
    if caller.uid == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Cannot act on another user's timetables".to_string(),
        ))
    }
}
