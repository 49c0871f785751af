// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the AI planning agent.
//!
//! Handles:
//! - Schedule generation from topic text or a base64-encoded PDF
//! - Schedule re-alignment after a missed task
//! - Mapping agent failures (`{"detail": ...}` bodies) into [`AgentError`]
//!
//! Calls are single-attempt. The caller's bearer token is forwarded so the
//! agent can attribute the request.

use crate::models::TimetableData;
use crate::services::normalizer::MalformedScheduleError;
use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// AI agent failure categories.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The agent answered with a non-success status.
    #[error("agent returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The request never produced a response.
    #[error("agent request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON envelope.
    #[error("agent returned an unreadable payload: {0}")]
    InvalidPayload(String),

    /// The envelope was fine but the schedule inside could not be mapped.
    #[error(transparent)]
    MalformedSchedule(#[from] MalformedScheduleError),
}

/// Body for `POST /schedule/generate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScheduleRequest<'a> {
    pub user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<&'a str>,
    /// Base64-encoded PDF bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_content: Option<String>,
    pub availability: &'a str,
    pub start_date: &'a str,
    pub study_time: &'a str,
}

impl<'a> GenerateScheduleRequest<'a> {
    /// Encode PDF bytes the way the agent expects them.
    pub fn encode_pdf(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }
}

/// Body for `POST /schedule/realign`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealignScheduleRequest<'a> {
    pub user_id: &'a str,
    pub current_timetable: &'a TimetableData,
    pub missed_task_id: &'a str,
    pub availability: &'a str,
    pub study_time: &'a str,
}

#[derive(Deserialize)]
struct GenerateScheduleResponse {
    timetable: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealignScheduleResponse {
    new_timetable: Option<Value>,
}

/// AI agent API client.
#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
}

impl AgentClient {
    /// Create a client for the agent at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building AI agent HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate a schedule. Returns the raw `timetable` value for normalization.
    pub async fn generate(
        &self,
        id_token: &str,
        request: &GenerateScheduleRequest<'_>,
    ) -> Result<Value, AgentError> {
        let url = format!("{}/schedule/generate", self.base_url);
        tracing::debug!(
            user_id = request.user_id,
            has_pdf = request.pdf_content.is_some(),
            "Requesting schedule generation from AI agent"
        );

        let response: GenerateScheduleResponse = self.post_json(&url, id_token, request).await?;
        response
            .timetable
            .ok_or_else(|| AgentError::InvalidPayload("response has no 'timetable' field".into()))
    }

    /// Re-align a schedule. Returns the raw `newTimetable` value.
    pub async fn realign(
        &self,
        id_token: &str,
        request: &RealignScheduleRequest<'_>,
    ) -> Result<Value, AgentError> {
        let url = format!("{}/schedule/realign", self.base_url);
        tracing::debug!(
            user_id = request.user_id,
            missed_task_id = request.missed_task_id,
            "Requesting schedule re-alignment from AI agent"
        );

        let response: RealignScheduleResponse = self.post_json(&url, id_token, request).await?;
        response.new_timetable.ok_or_else(|| {
            AgentError::InvalidPayload("response has no 'newTimetable' field".into())
        })
    }

    /// POST a JSON body with the caller's bearer token and parse the reply.
    async fn post_json<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        id_token: &str,
        body: &B,
    ) -> Result<T, AgentError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(id_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

            tracing::warn!(status = status.as_u16(), detail = %detail, "AI agent returned an error");
            return Err(AgentError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AgentError::InvalidPayload(e.to_string()))
    }
}

/// Pull a human-readable message out of an agent error body.
///
/// FastAPI-style `detail` wins, then `message`, then `error`.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    ["detail", "message", "error"]
        .iter()
        .find_map(|key| match value.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}
