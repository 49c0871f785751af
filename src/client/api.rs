// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the study planner API.

use crate::client::ClientError;
use crate::models::{RealignTimetable, TimetableDocument, UpdateTimetable};
use crate::routes::timetables::{GenerateResponse, GenerateTextRequest};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Something that can re-plan a timetable around a missed task.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn realign(
        &self,
        timetable_id: &str,
        request: &RealignTimetable,
    ) -> Result<TimetableDocument, ClientError>;
}

/// Error body returned by the API.
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Authenticated client for the backend API.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    id_token: String,
}

impl BackendClient {
    pub fn new(base_url: &str, id_token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building API HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            id_token: id_token.to_string(),
        })
    }

    pub async fn generate_from_text(
        &self,
        request: &GenerateTextRequest,
    ) -> Result<GenerateResponse, ClientError> {
        let url = format!("{}/api/timetables/generate-text", self.base_url);
        self.send(self.http.post(url).json(request)).await
    }

    pub async fn fetch_latest(&self, user_id: &str) -> Result<TimetableDocument, ClientError> {
        let url = format!(
            "{}/api/timetables/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        self.send(self.http.get(url)).await
    }

    pub async fn update_timetable(
        &self,
        timetable_id: &str,
        request: &UpdateTimetable,
    ) -> Result<TimetableDocument, ClientError> {
        let url = format!(
            "{}/api/timetables/{}",
            self.base_url,
            urlencoding::encode(timetable_id)
        );
        self.send(self.http.put(url).json(request)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request
            .bearer_auth(&self.id_token)
            .send()
            .await
            .map_err(|e| ClientError::Api {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json::<T>().await.map_err(|e| ClientError::Api {
            status: Some(status.as_u16()),
            message: format!("unreadable response: {e}"),
        })
    }
}

#[async_trait]
impl Planner for BackendClient {
    async fn realign(
        &self,
        timetable_id: &str,
        request: &RealignTimetable,
    ) -> Result<TimetableDocument, ClientError> {
        let url = format!(
            "{}/api/timetables/{}/realign",
            self.base_url,
            urlencoding::encode(timetable_id)
        );
        self.send(self.http.post(url).json(request)).await
    }
}
