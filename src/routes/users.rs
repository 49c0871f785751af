// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileCreation, ProfileFields, UserProfile};
use crate::routes::ApiJson;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

/// Profile routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/profile/{uid}", get(get_profile).put(update_profile))
}

/// Create the caller's profile, or return the one that already exists.
///
/// Identity fields come from the verified token; the body may add optional
/// profile fields and may be empty.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserProfile>)> {
    let fields: ProfileFields = if body.iter().all(u8::is_ascii_whitespace) {
        ProfileFields::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid profile body: {}", e)))?
    };

    let profile = new_profile(&user, fields);

    match state.db.create_profile(&profile).await? {
        ProfileCreation::Created(profile) => {
            tracing::info!(uid = %profile.uid, "Registered new user profile");
            Ok((StatusCode::CREATED, Json(profile)))
        }
        ProfileCreation::Existing(profile) => Ok((StatusCode::OK, Json(profile))),
    }
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_profile(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    ApiJson(fields): ApiJson<ProfileFields>,
) -> Result<Json<UserProfile>> {
    if user.uid != uid {
        return Err(AppError::Forbidden(
            "Cannot update another user's profile".to_string(),
        ));
    }

    let mut profile = state
        .db
        .get_profile(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    profile.apply(fields);
    profile.updated_at = now_rfc3339();
    state.db.save_profile(&profile).await?;

    Ok(Json(profile))
}

fn new_profile(user: &AuthUser, fields: ProfileFields) -> UserProfile {
    let email = user.email.clone().unwrap_or_default();
    let fallback_name = user
        .name
        .clone()
        .or_else(|| email.split('@').next().map(str::to_string))
        .unwrap_or_default();
    let now = now_rfc3339();

    let mut profile = UserProfile {
        uid: user.uid.clone(),
        email,
        display_name: fallback_name,
        username: None,
        phone: None,
        institution: None,
        study_goal: None,
        grade: None,
        created_at: now.clone(),
        updated_at: now,
    };
    profile.apply(fields);
    profile
}
