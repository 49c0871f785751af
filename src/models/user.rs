//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    /// Firebase Auth UID (also used as document ID)
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Optional profile fields, used both at registration and for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub institution: Option<String>,
    pub study_goal: Option<String>,
    pub grade: Option<String>,
}

impl UserProfile {
    /// Apply the fields that are present; absent fields keep their value.
    pub fn apply(&mut self, fields: ProfileFields) {
        if let Some(display_name) = fields.display_name {
            self.display_name = display_name;
        }
        if fields.username.is_some() {
            self.username = fields.username;
        }
        if fields.phone.is_some() {
            self.phone = fields.phone;
        }
        if fields.institution.is_some() {
            self.institution = fields.institution;
        }
        if fields.study_goal.is_some() {
            self.study_goal = fields.study_goal;
        }
        if fields.grade.is_some() {
            self.grade = fields.grade;
        }
    }
}

/// Outcome of idempotent profile creation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileCreation {
    Created(UserProfile),
    Existing(UserProfile),
}
