// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Timetables (generated schedules)
//! - Current-timetable pointers (one per user)

use crate::db::{collections, DocumentStore};
use crate::error::AppError;
use crate::models::{CurrentTimetable, ProfileCreation, TimetableDocument, UserProfile};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| AppError::Store(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Store("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── Timetable Operations ────────────────────────────────────

    /// Writes the document and the owner's pointer in one transaction, so a
    /// pointer never references a document that failed to persist.
    async fn create_timetable(&self, doc: &TimetableDocument) -> Result<(), AppError> {
        let client = self.get_client()?;

        let pointer = CurrentTimetable {
            user_id: doc.user_id.clone(),
            timetable_id: doc.id.clone(),
            updated_at: doc.created_at.clone(),
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::TIMETABLES)
            .document_id(&doc.id)
            .object(doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Store(format!("Failed to add timetable to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::CURRENT_TIMETABLES)
            .document_id(&doc.user_id)
            .object(&pointer)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Store(format!("Failed to add pointer to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Store(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %doc.user_id,
            timetable_id = %doc.id,
            "Timetable created"
        );

        Ok(())
    }

    async fn get_timetable(&self, timetable_id: &str) -> Result<Option<TimetableDocument>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TIMETABLES)
            .obj()
            .one(timetable_id)
            .await
            .map_err(|e| AppError::Store(e.to_string()))
    }

    async fn save_timetable(&self, doc: &TimetableDocument) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TIMETABLES)
            .document_id(&doc.id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;
        Ok(())
    }

    async fn latest_timetable_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TimetableDocument>, AppError> {
        let user_id = user_id.to_string();

        let mut docs: Vec<TimetableDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TIMETABLES)
            .filter(move |q| q.for_all([q.field("userId").eq(user_id.clone())]))
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        Ok(docs.pop())
    }

    async fn get_current_pointer(
        &self,
        user_id: &str,
    ) -> Result<Option<CurrentTimetable>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CURRENT_TIMETABLES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Store(e.to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Store(e.to_string()))
    }

    /// Insert fails when the document already exists, so a concurrent
    /// registration resolves to whichever profile landed first.
    async fn create_profile(&self, profile: &UserProfile) -> Result<ProfileCreation, AppError> {
        if let Some(existing) = self.get_profile(&profile.uid).await? {
            return Ok(ProfileCreation::Existing(existing));
        }

        let inserted: Result<(), _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await;

        match inserted {
            Ok(()) => Ok(ProfileCreation::Created(profile.clone())),
            Err(e) => match self.get_profile(&profile.uid).await? {
                Some(existing) => {
                    tracing::debug!(uid = %profile.uid, "Profile created concurrently");
                    Ok(ProfileCreation::Existing(existing))
                }
                None => Err(AppError::Store(e.to_string())),
            },
        }
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;
        Ok(())
    }
}
