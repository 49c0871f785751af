// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer ID token authentication middleware.

use crate::error::AppError;
use crate::services::identity::{issuer_for, FirebaseClaims, IdentityError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifetime of dev tokens minted by [`issue_dev_token`].
const DEV_TOKEN_TTL_SECS: usize = 60 * 60;

/// Authenticated caller extracted from the bearer token.
#[derive(Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Raw ID token, forwarded to the AI agent
    pub token: String,
}

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Middleware that requires a valid bearer ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let identity = state.identity.verify(&token).await.map_err(|e| match e {
        IdentityError::Rejected(reason) => {
            tracing::debug!(reason = %reason, "Rejected ID token");
            AppError::InvalidToken
        }
        IdentityError::Transient(reason) => {
            AppError::Internal(anyhow::anyhow!("ID token verification unavailable: {reason}"))
        }
    })?;

    request.extensions_mut().insert(AuthUser {
        uid: identity.uid,
        email: identity.email,
        name: identity.name,
        token,
    });

    Ok(next.run(request).await)
}

/// Mint an HS256 ID token accepted in dev-key mode.
///
/// Carries the same `iss`/`aud` a Firebase token for `project_id` would.
pub fn issue_dev_token(
    uid: &str,
    email: Option<&str>,
    project_id: &str,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = FirebaseClaims {
        iss: issuer_for(project_id),
        aud: project_id.to_string(),
        sub: uid.to_string(),
        exp: now + DEV_TOKEN_TTL_SECS,
        iat: Some(now),
        auth_time: Some(now),
        email: email.map(str::to_string),
        name: None,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
