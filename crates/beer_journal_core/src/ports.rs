//! crates/beer_journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or blob storage.

use crate::domain::{NewTasting, Tasting, TastingPatch, TastingSummary, User, UserCredentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Every read and write the application makes against its relational store.
///
/// Tasting operations are always scoped to an owner: a tasting that exists but
/// belongs to someone else is reported as `NotFound`, exactly like a missing one.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str)
        -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user id of an unexpired session, `Unauthorized` otherwise.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Tastings ---
    /// Resolves the beer (get-or-create of the brewery by name, then of the beer
    /// by name under it), scores the sheet and inserts the tasting as one atomic unit.
    async fn create_tasting(&self, user_id: Uuid, tasting: NewTasting) -> PortResult<Tasting>;

    /// Reads the owned tasting, overlays `patch`, re-resolves the beer when a
    /// name changed, recomputes the final score and writes it back atomically.
    async fn update_tasting(
        &self,
        user_id: Uuid,
        tasting_id: Uuid,
        patch: TastingPatch,
    ) -> PortResult<Tasting>;

    async fn get_tasting(&self, user_id: Uuid, tasting_id: Uuid) -> PortResult<Tasting>;

    /// Newest first.
    async fn list_tastings(&self, user_id: Uuid) -> PortResult<Vec<TastingSummary>>;

    async fn delete_tasting(&self, user_id: Uuid, tasting_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` under a name derived from `filename` and returns a publicly
    /// fetchable URL for it.
    async fn put(&self, filename: &str, data: &[u8]) -> PortResult<String>;
}
