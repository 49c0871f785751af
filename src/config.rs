// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Identity provider and document store credentials are supplied by the
//! environment (Application Default Credentials, emulator host variables);
//! this module only carries the values the service itself reads.

use std::env;
use std::time::Duration;

/// Default AI agent location used when `AI_AGENT_BASE_URL` is unset.
pub const DEFAULT_AI_AGENT_BASE_URL: &str = "http://localhost:8000";

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("DOCUMENT_STORE", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Base URL of the AI planning agent
    pub ai_agent_base_url: String,
    /// Timeout applied to every AI agent request
    pub agent_timeout: Duration,
    /// Keys in agent schedules that are metadata rather than days.
    /// `None` uses the built-in set.
    pub agent_metadata_keys: Option<Vec<String>>,
    /// Firebase project ID (token audience, Firestore project)
    pub firebase_project_id: String,
    /// HS256 key accepted instead of Firebase-signed tokens (local dev only)
    pub auth_dev_signing_key: Option<Vec<u8>>,
    /// Document store backend
    pub document_store: StoreBackend,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_dev_signing_key = env::var("AUTH_DEV_SIGNING_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(String::into_bytes);

        // Without a dev key, tokens are verified against the Firebase project,
        // so the project ID must be explicit.
        let firebase_project_id = match env::var("FIREBASE_PROJECT_ID") {
            Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ if auth_dev_signing_key.is_some() => "local-dev".to_string(),
            _ => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
        };

        let document_store = env::var("DOCUMENT_STORE")
            .map(|v| v.parse())
            .unwrap_or(Ok(StoreBackend::Firestore))?;

        let agent_timeout_secs = match env::var("AGENT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("AGENT_TIMEOUT_SECS", raw))?,
            Err(_) => 120,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            ai_agent_base_url: env::var("AI_AGENT_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_AI_AGENT_BASE_URL.to_string()),
            agent_timeout: Duration::from_secs(agent_timeout_secs),
            agent_metadata_keys: env::var("AGENT_METADATA_KEYS")
                .ok()
                .map(|raw| parse_key_list(&raw))
                .filter(|keys| !keys.is_empty()),
            firebase_project_id,
            auth_dev_signing_key,
            document_store,
        })
    }

    /// Config for tests: in-memory store and a known dev signing key.
    pub fn test_default() -> Self {
        Self {
            port: 5000,
            frontend_url: "http://localhost:5173".to_string(),
            ai_agent_base_url: DEFAULT_AI_AGENT_BASE_URL.to_string(),
            agent_timeout: Duration::from_secs(5),
            agent_metadata_keys: None,
            firebase_project_id: "test-project".to_string(),
            auth_dev_signing_key: Some(b"test_jwt_key_32_bytes_minimum!!".to_vec()),
            document_store: StoreBackend::Memory,
        }
    }
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
