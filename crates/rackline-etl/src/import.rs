// ABOUTME: Incremental, idempotent batch import with per-session atomicity
// ABOUTME: Structural-tuple dedup against existing sets inside scoped transactions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Import coordinator.
//!
//! Owns session and set identity resolution. Each session in a batch is
//! committed as its own atomic unit: a persistence failure rolls back that
//! session only, while prior sessions in the same batch remain committed.
//! Re-running the same file is a no-op on the second pass: every incoming
//! set is checked against the already-persisted sets of its session by
//! structural dedup key, and exact duplicates are counted, not re-inserted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use rackline_core::config::DedupConfig;
use rackline_core::errors::{EtlError, EtlResult, RowError, StoreResult};
use rackline_core::models::{NormalizedSet, Session, SessionKey, SetDedupKey};

use crate::store::WorkoutStore;

/// Outcome counts and error detail for one batch import
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Sets newly persisted
    pub inserted: usize,
    /// Exact structural duplicates skipped (expected, not errors)
    pub skipped_duplicate: usize,
    /// Rows rejected upstream by parsing/normalization
    pub rejected_malformed: usize,
    /// Sets lost to per-session persistence failures
    pub rejected_failed: usize,
    /// Sessions created on first sighting of their key
    pub sessions_created: usize,
    /// Sets filtered out by an incremental window, not errors
    pub filtered_incremental: usize,
    /// Per-row parse/normalization errors
    pub row_errors: Vec<RowError>,
    /// Sessions whose atomic unit could not be committed
    pub failed_sessions: Vec<FailedSession>,
}

/// A session whose persistence was rolled back
#[derive(Debug)]
pub struct FailedSession {
    /// Identity of the rolled-back session
    pub key: SessionKey,
    /// The persistence failure
    pub error: EtlError,
}

impl ImportReport {
    /// Whether every parsed row made it into the store
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected_malformed == 0 && self.rejected_failed == 0
    }
}

/// Deduplicating importer over the persistence contract
pub struct ImportCoordinator {
    store: Arc<dyn WorkoutStore>,
    dedup: DedupConfig,
}

impl ImportCoordinator {
    /// Create a coordinator over a store
    #[must_use]
    pub fn new(store: Arc<dyn WorkoutStore>, dedup: DedupConfig) -> Self {
        Self { store, dedup }
    }

    /// Import a batch of normalized sets.
    ///
    /// Sets are grouped by session key in first-seen order; each session is
    /// persisted inside its own transaction scope. The returned report
    /// carries `{inserted, skipped_duplicate, rejected_failed}` counts plus
    /// the failed-session detail; parse-stage counts are merged in by the
    /// pipeline.
    ///
    /// # Errors
    /// Never fails on per-session persistence problems (those roll back the
    /// affected session and are reported); only returns `Err` if the store
    /// cannot be reached to begin with.
    pub async fn import_batch(&self, sets: &[NormalizedSet]) -> EtlResult<ImportReport> {
        let mut report = ImportReport::default();

        // Group by session key, preserving first-seen order.
        let mut order: Vec<SessionKey> = Vec::new();
        let mut groups: HashMap<SessionKey, Vec<&NormalizedSet>> = HashMap::new();
        for set in sets {
            let group = groups.entry(set.session_key.clone()).or_default();
            if group.is_empty() {
                order.push(set.session_key.clone());
            }
            group.push(set);
        }

        for key in order {
            let group = &groups[&key];
            match self.import_session(&key, group, &mut report).await {
                Ok(()) => {}
                Err(store_error) => {
                    // Per-session atomicity: discard this session's writes
                    // and keep going with the rest of the batch.
                    if let Err(rollback_error) = self.store.rollback().await {
                        warn!(session = %key, error = %rollback_error, "rollback failed");
                    }
                    warn!(session = %key, error = %store_error, "session import rolled back");
                    report.rejected_failed += group.len();
                    report.failed_sessions.push(FailedSession {
                        key,
                        error: EtlError::Store(store_error),
                    });
                }
            }
        }

        info!(
            inserted = report.inserted,
            skipped_duplicate = report.skipped_duplicate,
            rejected_failed = report.rejected_failed,
            sessions_created = report.sessions_created,
            "batch import finished"
        );
        Ok(report)
    }

    /// Check-then-insert sequence for one session, inside one scope.
    ///
    /// The report is only updated after the commit succeeds, so a rolled
    /// back session contributes nothing to the counts.
    async fn import_session(
        &self,
        key: &SessionKey,
        group: &[&NormalizedSet],
        report: &mut ImportReport,
    ) -> StoreResult<()> {
        self.store.begin().await?;

        let existing = self.store.find_session(key).await?;
        let mut created = false;
        let session_id = match existing {
            Some((id, _)) => id,
            None => {
                let session = Session {
                    date: key.date,
                    start_time: key.start_time,
                    training_name: key.training_name.clone(),
                    notes: None,
                };
                created = true;
                self.store.upsert_session(&session).await?
            }
        };

        let mut seen: HashSet<SetDedupKey> = self
            .store
            .find_existing_sets(session_id)
            .await?
            .iter()
            .map(|set| set.dedup_key(self.dedup.use_position))
            .collect();

        let mut duplicates = 0usize;
        let mut fresh: Vec<NormalizedSet> = Vec::with_capacity(group.len());
        for set in group {
            let dedup_key = set.dedup_key(self.dedup.use_position);
            if seen.contains(&dedup_key) {
                debug!(session = %key, exercise = %set.exercise, position = set.position, "duplicate set skipped");
                duplicates += 1;
            } else {
                seen.insert(dedup_key);
                fresh.push((*set).clone());
            }
        }

        if !fresh.is_empty() {
            self.store.insert_sets(session_id, &fresh).await?;
        }
        self.store.commit().await?;

        report.sessions_created += usize::from(created);
        report.skipped_duplicate += duplicates;
        report.inserted += fresh.len();
        Ok(())
    }
}
