// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversion of AI agent schedules into canonical [`TimetableData`].
//!
//! The agent returns a loosely shaped object: each top-level key is either a
//! day (whose value is a task list or a single task string) or a metadata
//! field. Every entry is classified into a [`DayEntry`] first and only then
//! transformed, so each shape has exactly one code path.
//!
//! Normalization is pure. The same input and key set always yields the same
//! task IDs in the same order, so re-running a workflow never forks task
//! identities.

use crate::models::{Task, TimetableData};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};

/// Top-level keys the agent uses for metadata rather than days.
pub const DEFAULT_METADATA_KEYS: [&str; 3] = ["notes", "raw_input_content_length", "topics_considered"];

/// The agent's response could not be mapped onto a day-keyed schedule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed schedule for day '{day_key}': {reason}")]
pub struct MalformedScheduleError {
    /// Offending day key (empty when the whole payload is unusable)
    pub day_key: String,
    pub reason: String,
}

impl MalformedScheduleError {
    fn new(day_key: &str, reason: impl Into<String>) -> Self {
        Self {
            day_key: day_key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Set of keys that are dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataKeys(BTreeSet<String>);

impl MetadataKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }
}

impl Default for MetadataKeys {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_KEYS)
    }
}

/// Classification of one top-level entry of an agent schedule.
#[derive(Debug, PartialEq)]
pub enum DayEntry<'a> {
    /// The whole day is one task description.
    StringTask(&'a str),
    /// The day is an ordered list of task elements.
    TaskArray(&'a [Value]),
    /// Not a day; dropped.
    Metadata,
    /// Any other shape.
    Invalid(&'static str),
}

/// Classify a top-level entry without transforming it.
pub fn classify<'a>(key: &str, value: &'a Value, metadata_keys: &MetadataKeys) -> DayEntry<'a> {
    if metadata_keys.contains(key) {
        return DayEntry::Metadata;
    }

    match value {
        Value::String(s) => DayEntry::StringTask(s),
        Value::Array(items) => DayEntry::TaskArray(items),
        Value::Object(_) => DayEntry::Invalid("expected a list of tasks, found an object"),
        Value::Number(_) => DayEntry::Invalid("expected a list of tasks, found a number"),
        Value::Bool(_) => DayEntry::Invalid("expected a list of tasks, found a boolean"),
        Value::Null => DayEntry::Invalid("expected a list of tasks, found null"),
    }
}

/// Normalize an agent schedule object into canonical timetable data.
pub fn normalize(
    raw: &Value,
    metadata_keys: &MetadataKeys,
) -> Result<TimetableData, MalformedScheduleError> {
    let days = raw
        .as_object()
        .ok_or_else(|| MalformedScheduleError::new("", "schedule must be a JSON object"))?;

    let mut timetable = TimetableData::new();

    for (day_key, value) in days {
        let tasks = match classify(day_key, value, metadata_keys) {
            DayEntry::Metadata => continue,
            DayEntry::StringTask(text) => vec![string_task(day_key, text)?],
            DayEntry::TaskArray(items) => task_list(day_key, items)?,
            DayEntry::Invalid(reason) => return Err(MalformedScheduleError::new(day_key, reason)),
        };
        timetable.insert(day_key.clone(), tasks);
    }

    Ok(timetable)
}

/// Unwrap a schedule payload that may arrive as a JSON string.
///
/// Objects pass through. Strings yield the first object that parses from,
/// in order, a Markdown code fence body, the outermost braces, or the
/// whole text.
pub fn unwrap_schedule_payload(value: Value) -> Result<Value, MalformedScheduleError> {
    let text = match value {
        Value::Object(_) => return Ok(value),
        Value::String(text) => text,
        other => {
            return Err(MalformedScheduleError::new(
                "",
                format!("expected a schedule object, found {}", json_type(&other)),
            ))
        }
    };

    let candidates = [
        strip_code_fence(&text),
        outermost_braces(&text),
        Some(text.as_str()),
    ];

    let mut first_error = None;
    for candidate in candidates.into_iter().flatten() {
        let error = match serde_json::from_str::<Value>(candidate.trim()) {
            Ok(parsed @ Value::Object(_)) => return Ok(parsed),
            Ok(other) => format!("embedded schedule is {}, not an object", json_type(&other)),
            Err(e) => format!("embedded schedule is not valid JSON: {e}"),
        };
        if first_error.is_none() {
            first_error = Some(error);
        }
    }

    Err(MalformedScheduleError::new(
        "",
        first_error.unwrap_or_else(|| "embedded schedule is empty".to_string()),
    ))
}

/// Deterministic task ID: day key plus description with whitespace removed.
pub fn derive_task_id(day_key: &str, description: &str) -> String {
    let compact: String = description.chars().filter(|c| !c.is_whitespace()).collect();
    format!("{day_key}-{compact}")
}

fn string_task(day_key: &str, text: &str) -> Result<Task, MalformedScheduleError> {
    if text.trim().is_empty() {
        return Err(MalformedScheduleError::new(day_key, "task description is empty"));
    }

    Ok(Task {
        id: derive_task_id(day_key, text),
        description: text.to_string(),
        hours: 0.0,
        completed: false,
    })
}

fn task_list(day_key: &str, items: &[Value]) -> Result<Vec<Task>, MalformedScheduleError> {
    let mut tasks = Vec::with_capacity(items.len());
    let mut issued: HashSet<String> = HashSet::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let mut task = match item {
            Value::String(text) => string_task(day_key, text)?,
            Value::Object(fields) => object_task(day_key, index, fields)?,
            other => {
                return Err(MalformedScheduleError::new(
                    day_key,
                    format!("task {index} is {}, expected an object", json_type(other)),
                ))
            }
        };

        // Taken IDs get the lowest free suffix: -2, -3, ...
        if issued.contains(&task.id) {
            let mut suffix = 2;
            while issued.contains(&format!("{}-{suffix}", task.id)) {
                suffix += 1;
            }
            task.id = format!("{}-{suffix}", task.id);
        }
        issued.insert(task.id.clone());

        tasks.push(task);
    }

    Ok(tasks)
}

fn object_task(
    day_key: &str,
    index: usize,
    fields: &Map<String, Value>,
) -> Result<Task, MalformedScheduleError> {
    let description = fields
        .get("description")
        .or_else(|| fields.get("topic"))
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| {
            MalformedScheduleError::new(day_key, format!("task {index} has no description"))
        })?;

    let id = match fields.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => derive_task_id(day_key, description),
    };

    // Stored hours must round-trip through JSON, so only finite, non-negative values.
    let hours = match fields.get("hours") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|h| h.is_finite() && *h >= 0.0)
    .unwrap_or(0.0);

    Ok(Task {
        id,
        description: description.to_string(),
        hours,
        completed: false,
    })
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_ticks = &text[start + 3..];
    // Skip an optional language tag on the opening fence line.
    let body_start = after_ticks.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_ticks[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
