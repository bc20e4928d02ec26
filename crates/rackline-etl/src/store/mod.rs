// ABOUTME: Persistence contract consumed by the import coordinator and analytics queries
// ABOUTME: Narrow async trait with caller-managed per-session transaction scopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! The `WorkoutStore` persistence contract.
//!
//! The relational engine itself is an external collaborator; this crate
//! only talks through the narrow read/write contract below. Session
//! creation and set insertion for one session form an atomic unit: the
//! caller opens a scope with [`WorkoutStore::begin`], runs the
//! check-then-insert sequence inside it, and finishes with
//! [`WorkoutStore::commit`] or [`WorkoutStore::rollback`]. Implementations
//! must guarantee release (commit or rollback) on every exit path and may
//! serialize scopes to prevent two concurrent imports from both passing the
//! duplicate check before either commits.

use async_trait::async_trait;
use chrono::NaiveDate;

use rackline_core::errors::StoreResult;
use rackline_core::models::{
    ExerciseCatalogEntry, NormalizedSet, Session, SessionKey, SessionSets,
};

/// In-memory staging implementation of the contract
pub mod memory;

pub use memory::MemoryWorkoutStore;

/// Opaque row identifier of a persisted session
pub type SessionId = i64;

/// Narrow persistence contract for sessions, sets, and the exercise catalog
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Open a transaction scope for one session's check-then-insert sequence.
    ///
    /// # Errors
    /// Returns an error if a scope is already active or cannot be opened.
    async fn begin(&self) -> StoreResult<()>;

    /// Commit the active scope.
    ///
    /// # Errors
    /// Returns an error if no scope is active or the commit fails.
    async fn commit(&self) -> StoreResult<()>;

    /// Roll back the active scope, discarding its writes.
    ///
    /// # Errors
    /// Returns an error if no scope is active.
    async fn rollback(&self) -> StoreResult<()>;

    /// Look up a session by its identity tuple.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn find_session(&self, key: &SessionKey) -> StoreResult<Option<(SessionId, Session)>>;

    /// Insert a session if its key is unseen, returning the id either way.
    ///
    /// # Errors
    /// Returns an error if the write fails or no scope is active.
    async fn upsert_session(&self, session: &Session) -> StoreResult<SessionId>;

    /// Append to a session's notes (the only permitted session mutation).
    ///
    /// # Errors
    /// Returns an error if the write fails or no scope is active.
    async fn append_session_notes(&self, id: SessionId, notes: &str) -> StoreResult<()>;

    /// All sets already persisted for a session, for duplicate detection.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn find_existing_sets(&self, id: SessionId) -> StoreResult<Vec<NormalizedSet>>;

    /// Insert sets under a session, in the given order.
    ///
    /// # Errors
    /// Returns an error if the write fails or no scope is active.
    async fn insert_sets(&self, id: SessionId, sets: &[NormalizedSet]) -> StoreResult<()>;

    /// Insert or replace an exercise catalog entry.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    async fn upsert_exercise(&self, entry: &ExerciseCatalogEntry) -> StoreResult<()>;

    /// Fetch one catalog entry by canonical name.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn find_exercise(&self, name: &str) -> StoreResult<Option<ExerciseCatalogEntry>>;

    /// The whole exercise catalog.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn list_exercises(&self) -> StoreResult<Vec<ExerciseCatalogEntry>>;

    /// Distinct dates that already have a persisted session, for
    /// incremental imports.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn list_session_dates(&self) -> StoreResult<Vec<NaiveDate>>;

    /// Sessions with their sets, optionally filtered by exercise and an
    /// inclusive date range, ordered by (date, `start_time`).
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn list_session_sets(
        &self,
        exercise: Option<&str>,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> StoreResult<Vec<SessionSets>>;
}
