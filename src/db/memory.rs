// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same semantics as [`FirestoreDb`].
//!
//! Used by tests and by `DOCUMENT_STORE=memory` for local development.
//! Data lives only as long as the process.
//!
//! [`FirestoreDb`]: crate::db::FirestoreDb

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{CurrentTimetable, ProfileCreation, TimetableDocument, UserProfile};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory document store.
#[derive(Default)]
pub struct MemoryDb {
    timetables: DashMap<String, TimetableDocument>,
    pointers: DashMap<String, CurrentTimetable>,
    profiles: DashMap<String, UserProfile>,
    writes: AtomicUsize,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful write operations so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored timetable documents.
    pub fn timetable_count(&self) -> usize {
        self.timetables.len()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDb {
    async fn create_timetable(&self, doc: &TimetableDocument) -> Result<(), AppError> {
        match self.timetables.entry(doc.id.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Store(format!(
                    "timetable {} already exists",
                    doc.id
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(doc.clone());
            }
        }

        self.pointers.insert(
            doc.user_id.clone(),
            CurrentTimetable {
                user_id: doc.user_id.clone(),
                timetable_id: doc.id.clone(),
                updated_at: doc.created_at.clone(),
            },
        );
        self.record_write();
        Ok(())
    }

    async fn get_timetable(&self, timetable_id: &str) -> Result<Option<TimetableDocument>, AppError> {
        Ok(self.timetables.get(timetable_id).map(|doc| doc.clone()))
    }

    async fn save_timetable(&self, doc: &TimetableDocument) -> Result<(), AppError> {
        self.timetables.insert(doc.id.clone(), doc.clone());
        self.record_write();
        Ok(())
    }

    async fn latest_timetable_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TimetableDocument>, AppError> {
        Ok(self
            .timetables
            .iter()
            .filter(|doc| doc.user_id == user_id)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|doc| doc.clone()))
    }

    async fn get_current_pointer(
        &self,
        user_id: &str,
    ) -> Result<Option<CurrentTimetable>, AppError> {
        Ok(self.pointers.get(user_id).map(|p| p.clone()))
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(uid).map(|p| p.clone()))
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<ProfileCreation, AppError> {
        match self.profiles.entry(profile.uid.clone()) {
            Entry::Occupied(existing) => Ok(ProfileCreation::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(profile.clone());
                self.record_write();
                Ok(ProfileCreation::Created(profile.clone()))
            }
        }
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.profiles.insert(profile.uid.clone(), profile.clone());
        self.record_write();
        Ok(())
    }
}
