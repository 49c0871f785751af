//! Document store layer (Firestore, with an in-memory twin).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{CurrentTimetable, ProfileCreation, TimetableDocument, UserProfile};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TIMETABLES: &str = "timetables";
    /// Active timetable pointer per user (keyed by userId)
    pub const CURRENT_TIMETABLES: &str = "current_timetables";
}

/// Durable storage for profiles and timetables.
///
/// Every method is a single store round-trip from the caller's point of view
/// and is never retried internally.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Timetables ──────────────────────────────────────────────

    /// Create a timetable document and point the owner's current pointer at it.
    async fn create_timetable(&self, doc: &TimetableDocument) -> Result<(), AppError>;

    /// Get a timetable by document ID.
    async fn get_timetable(&self, timetable_id: &str) -> Result<Option<TimetableDocument>, AppError>;

    /// Overwrite a timetable document by ID. Last writer wins.
    async fn save_timetable(&self, doc: &TimetableDocument) -> Result<(), AppError>;

    /// Most recently created timetable for a user, by `createdAt`.
    async fn latest_timetable_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TimetableDocument>, AppError>;

    /// The user's current-timetable pointer, if one was ever written.
    async fn get_current_pointer(&self, user_id: &str)
        -> Result<Option<CurrentTimetable>, AppError>;

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError>;

    /// Create a profile unless one exists for the same UID.
    async fn create_profile(&self, profile: &UserProfile) -> Result<ProfileCreation, AppError>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError>;
}
