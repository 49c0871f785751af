// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Study Planner: AI-generated study timetables
//!
//! This crate provides the backend API that turns a student's constraints
//! into a day-by-day study plan via an external AI agent, persists it, and
//! re-plans when a task is missed. The [`client`] module holds the
//! client-side timetable state that drives re-alignment.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{FirebaseTokenVerifier, TimetableWorkflow};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    pub identity: FirebaseTokenVerifier,
    pub workflow: TimetableWorkflow,
}
