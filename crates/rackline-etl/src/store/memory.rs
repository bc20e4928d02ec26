// ABOUTME: In-memory WorkoutStore used for staging runs and unit tests
// ABOUTME: Snapshot-based transaction scopes over tokio-guarded maps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! In-memory store.
//!
//! Transaction scopes clone the state on [`WorkoutStore::begin`]; rollback
//! restores the snapshot. Mutating operations outside an active scope are
//! rejected so tests catch a coordinator that forgets to open one.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use rackline_core::errors::{StoreError, StoreResult};
use rackline_core::models::{
    ExerciseCatalogEntry, NormalizedSet, Session, SessionKey, SessionSets,
};

use super::{SessionId, WorkoutStore};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    next_id: SessionId,
    sessions: Vec<(SessionId, Session)>,
    sets: HashMap<SessionId, Vec<NormalizedSet>>,
    exercises: BTreeMap<String, ExerciseCatalogEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    state: MemoryState,
    snapshot: Option<MemoryState>,
}

/// In-memory implementation of the persistence contract
#[derive(Debug, Default)]
pub struct MemoryWorkoutStore {
    inner: Mutex<Inner>,
}

impl MemoryWorkoutStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of persisted sets, across all sessions
    pub async fn set_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.state.sets.values().map(Vec::len).sum()
    }

    /// Number of persisted sessions
    pub async fn session_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.state.sessions.len()
    }
}

#[async_trait]
impl WorkoutStore for MemoryWorkoutStore {
    async fn begin(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.snapshot.is_some() {
            return Err(StoreError::Query {
                context: "transaction scope already active".to_owned(),
            });
        }
        inner.snapshot = Some(inner.state.clone());
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .snapshot
            .take()
            .map(|_| ())
            .ok_or(StoreError::NoActiveScope {
                operation: "commit",
            })
    }

    async fn rollback(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let snapshot = inner.snapshot.take().ok_or(StoreError::NoActiveScope {
            operation: "rollback",
        })?;
        inner.state = snapshot;
        Ok(())
    }

    async fn find_session(&self, key: &SessionKey) -> StoreResult<Option<(SessionId, Session)>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .state
            .sessions
            .iter()
            .find(|(_, session)| session.key() == *key)
            .map(|(id, session)| (*id, session.clone())))
    }

    async fn upsert_session(&self, session: &Session) -> StoreResult<SessionId> {
        let mut inner = self.inner.lock().await;
        if inner.snapshot.is_none() {
            return Err(StoreError::NoActiveScope {
                operation: "upsert_session",
            });
        }
        let key = session.key();
        if let Some((id, _)) = inner
            .state
            .sessions
            .iter()
            .find(|(_, existing)| existing.key() == key)
        {
            return Ok(*id);
        }
        inner.state.next_id += 1;
        let id = inner.state.next_id;
        inner.state.sessions.push((id, session.clone()));
        Ok(id)
    }

    async fn append_session_notes(&self, id: SessionId, notes: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.snapshot.is_none() {
            return Err(StoreError::NoActiveScope {
                operation: "append_session_notes",
            });
        }
        let session = inner
            .state
            .sessions
            .iter_mut()
            .find(|(existing, _)| *existing == id)
            .map(|(_, session)| session)
            .ok_or_else(|| StoreError::Query {
                context: format!("session {id} not found"),
            })?;
        session.notes = match session.notes.take() {
            Some(mut current) => {
                current.push('\n');
                current.push_str(notes);
                Some(current)
            }
            None => Some(notes.to_owned()),
        };
        Ok(())
    }

    async fn find_existing_sets(&self, id: SessionId) -> StoreResult<Vec<NormalizedSet>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.sets.get(&id).cloned().unwrap_or_default())
    }

    async fn insert_sets(&self, id: SessionId, sets: &[NormalizedSet]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.snapshot.is_none() {
            return Err(StoreError::NoActiveScope {
                operation: "insert_sets",
            });
        }
        inner
            .state
            .sets
            .entry(id)
            .or_default()
            .extend_from_slice(sets);
        Ok(())
    }

    async fn upsert_exercise(&self, entry: &ExerciseCatalogEntry) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .state
            .exercises
            .insert(entry.canonical_name.clone(), entry.clone());
        Ok(())
    }

    async fn find_exercise(&self, name: &str) -> StoreResult<Option<ExerciseCatalogEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.exercises.get(name).cloned())
    }

    async fn list_exercises(&self) -> StoreResult<Vec<ExerciseCatalogEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner.state.exercises.values().cloned().collect())
    }

    async fn list_session_dates(&self) -> StoreResult<Vec<NaiveDate>> {
        let inner = self.inner.lock().await;
        let dates: BTreeSet<NaiveDate> = inner
            .state
            .sessions
            .iter()
            .map(|(_, session)| session.date)
            .collect();
        Ok(dates.into_iter().collect())
    }

    async fn list_session_sets(
        &self,
        exercise: Option<&str>,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> StoreResult<Vec<SessionSets>> {
        let inner = self.inner.lock().await;
        let mut result: Vec<SessionSets> = inner
            .state
            .sessions
            .iter()
            .filter(|(_, session)| {
                range.is_none_or(|(start, end)| session.date >= start && session.date <= end)
            })
            .map(|(id, session)| {
                let sets = inner
                    .state
                    .sets
                    .get(id)
                    .map(|sets| {
                        sets.iter()
                            .filter(|set| exercise.is_none_or(|name| set.exercise == name))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                SessionSets {
                    session: session.clone(),
                    sets,
                }
            })
            .filter(|entry| !entry.sets.is_empty() || exercise.is_none())
            .collect();
        result.sort_by(|a, b| {
            (a.session.date, a.session.start_time).cmp(&(b.session.date, b.session.start_time))
        });
        Ok(result)
    }
}
