// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timetable routes: generate (text or PDF), fetch, update, realign.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    GenerateTimetable, GeneratedTimetable, RealignTimetable, ScheduleSource, TimetableData,
    TimetableDocument, UpdateTimetable,
};
use crate::routes::ApiJson;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest accepted syllabus upload.
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

const PDF_FIELD: &str = "syllabusPdf";

/// Timetable routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/timetables/generate-text", post(generate_from_text))
        .route(
            "/api/upload-syllabus-pdf",
            post(generate_from_pdf).layer(DefaultBodyLimit::max(MAX_PDF_BYTES)),
        )
        // GET takes a user ID, PUT a timetable ID
        .route("/api/timetables/{id}", get(fetch_latest).put(update))
        .route("/api/timetables/{id}/realign", post(realign))
}

// ─── Generate ────────────────────────────────────────────────

/// Body of `POST /api/timetables/generate-text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_time: Option<String>,
}

/// Response for a successful generation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GenerateResponse {
    pub message: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, Task[]>"))]
    pub timetable: TimetableData,
    pub timetable_id: String,
}

impl From<GeneratedTimetable> for GenerateResponse {
    fn from(generated: GeneratedTimetable) -> Self {
        Self {
            message: "Timetable generated successfully".to_string(),
            timetable: generated.timetable,
            timetable_id: generated.timetable_id,
        }
    }
}

async fn generate_from_text(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<GenerateTextRequest>,
) -> Result<Json<GenerateResponse>> {
    let request = GenerateTimetable {
        user_id: body.user_id,
        source: body.raw_data.map(ScheduleSource::Text),
        availability: body.availability,
        start_date: body.start_date,
        study_time: body.study_time,
    };

    let generated = state.workflow.generate(&user, request).await?;
    Ok(Json(generated.into()))
}

async fn generate_from_pdf(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>> {
    let request = read_pdf_form(multipart).await?;

    let generated = state.workflow.generate(&user, request).await?;
    Ok(Json(generated.into()))
}

/// Collect the syllabus file and constraint fields from a multipart form.
async fn read_pdf_form(mut multipart: Multipart) -> Result<GenerateTimetable> {
    let mut request = GenerateTimetable::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == PDF_FIELD {
            if field.content_type() != Some("application/pdf") {
                return Err(AppError::Validation(
                    "Only PDF files are allowed".to_string(),
                ));
            }
            let bytes = field.bytes().await.map_err(|e| {
                AppError::Validation(format!("Failed to read uploaded file: {}", e.body_text()))
            })?;
            request.source = Some(ScheduleSource::Pdf(bytes.to_vec()));
            continue;
        }

        let slot = match name.as_str() {
            "userId" => &mut request.user_id,
            "availability" => &mut request.availability,
            "startDate" => &mut request.start_date,
            "studyTime" => &mut request.study_time,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown form field");
                continue;
            }
        };
        *slot = Some(field.text().await.map_err(|e| {
            AppError::Validation(format!("Invalid form field '{}': {}", name, e.body_text()))
        })?);
    }

    Ok(request)
}

// ─── Fetch / Update / Realign ────────────────────────────────

async fn fetch_latest(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<TimetableDocument>> {
    let doc = state.workflow.fetch_latest(&user, &user_id).await?;
    Ok(Json(doc))
}

async fn update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(timetable_id): Path<String>,
    ApiJson(body): ApiJson<UpdateTimetable>,
) -> Result<Json<TimetableDocument>> {
    let doc = state.workflow.update(&user, &timetable_id, body).await?;
    Ok(Json(doc))
}

async fn realign(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(timetable_id): Path<String>,
    ApiJson(body): ApiJson<RealignTimetable>,
) -> Result<Json<TimetableDocument>> {
    let doc = state.workflow.realign(&user, &timetable_id, body).await?;
    Ok(Json(doc))
}
