// ABOUTME: SQLite implementation of the WorkoutStore contract via sqlx
// ABOUTME: Caller-managed transaction scopes with rollback-on-drop safety
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! SQLite store.
//!
//! Schema: `sessions` keyed by the (date, `start_time`, `training_name`)
//! identity tuple, `sets` owned by sessions in position order, and
//! `exercise_catalog` keyed by canonical name with muscle lists as JSON
//! text. The caller-managed transaction scope maps onto one sqlx
//! transaction held by the store; an uncommitted transaction rolls back
//! when dropped, so a scope is released on every exit path. Scoped writes
//! run against the transaction connection, which serializes the
//! check-then-insert sequence against concurrent importers.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use rackline_core::errors::{StoreError, StoreResult};
use rackline_core::models::{
    ClassificationSource, ExerciseCatalogEntry, NormalizedSet, SeriesType, Session, SessionKey,
    SessionSets,
};
use rackline_etl::store::{SessionId, WorkoutStore};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        start_time TEXT,
        training_name TEXT,
        notes TEXT,
        UNIQUE(date, start_time, training_name)
    )",
    "CREATE TABLE IF NOT EXISTS sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        exercise TEXT NOT NULL,
        series_type TEXT NOT NULL,
        classification TEXT NOT NULL,
        reps INTEGER,
        weight_kg REAL,
        skipped INTEGER NOT NULL DEFAULT 0,
        notes TEXT,
        position INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sets_session ON sets(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_sets_exercise ON sets(exercise)",
    "CREATE TABLE IF NOT EXISTS exercise_catalog (
        canonical_name TEXT PRIMARY KEY,
        main_region TEXT,
        muscles_primary TEXT NOT NULL DEFAULT '[]',
        muscles_secondary TEXT NOT NULL DEFAULT '[]'
    )",
];

/// SQLite-backed `WorkoutStore`
pub struct SqliteWorkoutStore {
    pool: SqlitePool,
    scope: Mutex<Option<Transaction<'static, Sqlite>>>,
}

impl SqliteWorkoutStore {
    /// Open (and bootstrap) a store at the given SQLite URL or file path.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] when the database cannot be
    /// opened or the schema cannot be created.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection {
                context: format!("invalid database url '{url}': {e}"),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection {
                context: format!("cannot open '{url}': {e}"),
            })?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| StoreError::Connection {
                    context: format!("schema bootstrap failed: {e}"),
                })?;
        }
        debug!(url, "sqlite store ready");

        Ok(Self {
            pool,
            scope: Mutex::new(None),
        })
    }

    fn query_error(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
        move |e| StoreError::Query {
            context: format!("{context}: {e}"),
        }
    }

    fn row_to_session(row: &SqliteRow) -> StoreResult<(SessionId, Session)> {
        let id: SessionId = row.try_get("id").map_err(Self::query_error("decode id"))?;
        let date: NaiveDate = row
            .try_get("date")
            .map_err(Self::query_error("decode date"))?;
        let start_time: Option<NaiveTime> = row
            .try_get("start_time")
            .map_err(Self::query_error("decode start_time"))?;
        let training_name: Option<String> = row
            .try_get("training_name")
            .map_err(Self::query_error("decode training_name"))?;
        let notes: Option<String> = row
            .try_get("notes")
            .map_err(Self::query_error("decode notes"))?;
        Ok((
            id,
            Session {
                date,
                start_time,
                training_name,
                notes,
            },
        ))
    }

    fn row_to_set(row: &SqliteRow, key: &SessionKey) -> StoreResult<NormalizedSet> {
        let series_type: String = row
            .try_get("series_type")
            .map_err(Self::query_error("decode series_type"))?;
        let series_type =
            SeriesType::from_str(&series_type).map_err(|context| StoreError::Corrupt {
                column: "series_type",
                context,
            })?;
        let classification: String = row
            .try_get("classification")
            .map_err(Self::query_error("decode classification"))?;
        let classification =
            ClassificationSource::from_str(&classification).map_err(|context| {
                StoreError::Corrupt {
                    column: "classification",
                    context,
                }
            })?;
        let reps: Option<i64> = row
            .try_get("reps")
            .map_err(Self::query_error("decode reps"))?;
        let position: i64 = row
            .try_get("position")
            .map_err(Self::query_error("decode position"))?;

        Ok(NormalizedSet {
            session_key: key.clone(),
            exercise: row
                .try_get("exercise")
                .map_err(Self::query_error("decode exercise"))?,
            series_type,
            classification,
            reps: reps.map(|r| r as u32),
            weight_kg: row
                .try_get("weight_kg")
                .map_err(Self::query_error("decode weight_kg"))?,
            skipped: row
                .try_get("skipped")
                .map_err(Self::query_error("decode skipped"))?,
            notes: row
                .try_get("notes")
                .map_err(Self::query_error("decode notes"))?,
            position: position as u32,
        })
    }

    fn row_to_catalog(row: &SqliteRow) -> StoreResult<ExerciseCatalogEntry> {
        let muscles_primary: String = row
            .try_get("muscles_primary")
            .map_err(Self::query_error("decode muscles_primary"))?;
        let muscles_secondary: String = row
            .try_get("muscles_secondary")
            .map_err(Self::query_error("decode muscles_secondary"))?;
        Ok(ExerciseCatalogEntry {
            canonical_name: row
                .try_get("canonical_name")
                .map_err(Self::query_error("decode canonical_name"))?,
            main_region: row
                .try_get("main_region")
                .map_err(Self::query_error("decode main_region"))?,
            muscles_primary: serde_json::from_str(&muscles_primary).map_err(|e| {
                StoreError::Corrupt {
                    column: "muscles_primary",
                    context: e.to_string(),
                }
            })?,
            muscles_secondary: serde_json::from_str(&muscles_secondary).map_err(|e| {
                StoreError::Corrupt {
                    column: "muscles_secondary",
                    context: e.to_string(),
                }
            })?,
        })
    }

    async fn fetch_session(
        &self,
        key: &SessionKey,
    ) -> StoreResult<Option<(SessionId, Session)>> {
        let query = sqlx::query(
            r"
            SELECT id, date, start_time, training_name, notes
            FROM sessions
            WHERE date = $1 AND start_time IS $2 AND training_name IS $3
            ",
        )
        .bind(key.date)
        .bind(key.start_time)
        .bind(key.training_name.as_deref());

        let mut scope = self.scope.lock().await;
        let row = match scope.as_mut() {
            Some(txn) => query.fetch_optional(&mut **txn).await,
            None => query.fetch_optional(&self.pool).await,
        }
        .map_err(Self::query_error("find_session"))?;
        drop(scope);

        row.as_ref().map(Self::row_to_session).transpose()
    }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutStore {
    async fn begin(&self) -> StoreResult<()> {
        let mut scope = self.scope.lock().await;
        if scope.is_some() {
            return Err(StoreError::Query {
                context: "transaction scope already active".to_owned(),
            });
        }
        let txn = self
            .pool
            .begin()
            .await
            .map_err(Self::query_error("begin"))?;
        *scope = Some(txn);
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        let mut scope = self.scope.lock().await;
        let txn = scope.take().ok_or(StoreError::NoActiveScope {
            operation: "commit",
        })?;
        txn.commit().await.map_err(Self::query_error("commit"))
    }

    async fn rollback(&self) -> StoreResult<()> {
        let mut scope = self.scope.lock().await;
        let txn = scope.take().ok_or(StoreError::NoActiveScope {
            operation: "rollback",
        })?;
        txn.rollback().await.map_err(Self::query_error("rollback"))
    }

    async fn find_session(&self, key: &SessionKey) -> StoreResult<Option<(SessionId, Session)>> {
        self.fetch_session(key).await
    }

    async fn upsert_session(&self, session: &Session) -> StoreResult<SessionId> {
        if let Some((id, _)) = self.fetch_session(&session.key()).await? {
            return Ok(id);
        }

        let query = sqlx::query(
            r"
            INSERT INTO sessions (date, start_time, training_name, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(session.date)
        .bind(session.start_time)
        .bind(session.training_name.as_deref())
        .bind(session.notes.as_deref());

        let mut scope = self.scope.lock().await;
        let row = match scope.as_mut() {
            Some(txn) => query.fetch_one(&mut **txn).await,
            None => {
                return Err(StoreError::NoActiveScope {
                    operation: "upsert_session",
                })
            }
        }
        .map_err(Self::query_error("upsert_session"))?;
        row.try_get("id").map_err(Self::query_error("decode id"))
    }

    async fn append_session_notes(&self, id: SessionId, notes: &str) -> StoreResult<()> {
        let query = sqlx::query(
            r"
            UPDATE sessions
            SET notes = CASE
                WHEN notes IS NULL OR notes = '' THEN $2
                ELSE notes || char(10) || $2
            END
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(notes);

        let mut scope = self.scope.lock().await;
        match scope.as_mut() {
            Some(txn) => query.execute(&mut **txn).await,
            None => {
                return Err(StoreError::NoActiveScope {
                    operation: "append_session_notes",
                })
            }
        }
        .map_err(Self::query_error("append_session_notes"))?;
        Ok(())
    }

    async fn find_existing_sets(&self, id: SessionId) -> StoreResult<Vec<NormalizedSet>> {
        let session_query = sqlx::query(
            r"
            SELECT id, date, start_time, training_name, notes
            FROM sessions WHERE id = $1
            ",
        )
        .bind(id);
        let sets_query = sqlx::query(
            r"
            SELECT exercise, series_type, classification, reps, weight_kg,
                   skipped, notes, position
            FROM sets WHERE session_id = $1
            ORDER BY position
            ",
        )
        .bind(id);

        let mut scope = self.scope.lock().await;
        let (session_row, set_rows) = match scope.as_mut() {
            Some(txn) => {
                let session_row = session_query.fetch_optional(&mut **txn).await;
                let set_rows = match &session_row {
                    Ok(_) => sets_query.fetch_all(&mut **txn).await,
                    Err(_) => Ok(Vec::new()),
                };
                (session_row, set_rows)
            }
            None => {
                let session_row = session_query.fetch_optional(&self.pool).await;
                let set_rows = match &session_row {
                    Ok(_) => sets_query.fetch_all(&self.pool).await,
                    Err(_) => Ok(Vec::new()),
                };
                (session_row, set_rows)
            }
        };
        drop(scope);

        let Some(session_row) = session_row.map_err(Self::query_error("find_existing_sets"))?
        else {
            return Ok(Vec::new());
        };
        let (_, session) = Self::row_to_session(&session_row)?;
        let key = session.key();

        set_rows
            .map_err(Self::query_error("find_existing_sets"))?
            .iter()
            .map(|row| Self::row_to_set(row, &key))
            .collect()
    }

    async fn insert_sets(&self, id: SessionId, sets: &[NormalizedSet]) -> StoreResult<()> {
        let mut scope = self.scope.lock().await;
        let Some(txn) = scope.as_mut() else {
            return Err(StoreError::NoActiveScope {
                operation: "insert_sets",
            });
        };

        for set in sets {
            sqlx::query(
                r"
                INSERT INTO sets (session_id, exercise, series_type, classification,
                                  reps, weight_kg, skipped, notes, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(id)
            .bind(&set.exercise)
            .bind(set.series_type.as_str())
            .bind(set.classification.as_str())
            .bind(set.reps.map(i64::from))
            .bind(set.weight_kg)
            .bind(set.skipped)
            .bind(set.notes.as_deref())
            .bind(i64::from(set.position))
            .execute(&mut **txn)
            .await
            .map_err(Self::query_error("insert_sets"))?;
        }
        Ok(())
    }

    async fn upsert_exercise(&self, entry: &ExerciseCatalogEntry) -> StoreResult<()> {
        let muscles_primary =
            serde_json::to_string(&entry.muscles_primary).map_err(|e| StoreError::Query {
                context: format!("encode muscles_primary: {e}"),
            })?;
        let muscles_secondary =
            serde_json::to_string(&entry.muscles_secondary).map_err(|e| StoreError::Query {
                context: format!("encode muscles_secondary: {e}"),
            })?;

        sqlx::query(
            r"
            INSERT INTO exercise_catalog (canonical_name, main_region,
                                          muscles_primary, muscles_secondary)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(canonical_name) DO UPDATE SET
                main_region = excluded.main_region,
                muscles_primary = excluded.muscles_primary,
                muscles_secondary = excluded.muscles_secondary
            ",
        )
        .bind(&entry.canonical_name)
        .bind(entry.main_region.as_deref())
        .bind(muscles_primary)
        .bind(muscles_secondary)
        .execute(&self.pool)
        .await
        .map_err(Self::query_error("upsert_exercise"))?;
        Ok(())
    }

    async fn find_exercise(&self, name: &str) -> StoreResult<Option<ExerciseCatalogEntry>> {
        let row = sqlx::query(
            r"
            SELECT canonical_name, main_region, muscles_primary, muscles_secondary
            FROM exercise_catalog WHERE canonical_name = $1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::query_error("find_exercise"))?;
        row.as_ref().map(Self::row_to_catalog).transpose()
    }

    async fn list_exercises(&self) -> StoreResult<Vec<ExerciseCatalogEntry>> {
        let rows = sqlx::query(
            r"
            SELECT canonical_name, main_region, muscles_primary, muscles_secondary
            FROM exercise_catalog ORDER BY canonical_name
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::query_error("list_exercises"))?;
        rows.iter().map(Self::row_to_catalog).collect()
    }

    async fn list_session_dates(&self) -> StoreResult<Vec<NaiveDate>> {
        let rows = sqlx::query("SELECT DISTINCT date FROM sessions ORDER BY date")
            .fetch_all(&self.pool)
            .await
            .map_err(Self::query_error("list_session_dates"))?;
        rows.iter()
            .map(|row| {
                row.try_get("date")
                    .map_err(Self::query_error("decode date"))
            })
            .collect()
    }

    async fn list_session_sets(
        &self,
        exercise: Option<&str>,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> StoreResult<Vec<SessionSets>> {
        let (start, end) = range.map_or((None, None), |(start, end)| (Some(start), Some(end)));
        let session_rows = sqlx::query(
            r"
            SELECT id, date, start_time, training_name, notes
            FROM sessions
            WHERE ($1 IS NULL OR date >= $1) AND ($2 IS NULL OR date <= $2)
            ORDER BY date, start_time
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::query_error("list_session_sets"))?;

        let mut result = Vec::with_capacity(session_rows.len());
        for row in &session_rows {
            let (id, session) = Self::row_to_session(row)?;
            let key = session.key();

            let set_rows = sqlx::query(
                r"
                SELECT exercise, series_type, classification, reps, weight_kg,
                       skipped, notes, position
                FROM sets
                WHERE session_id = $1 AND ($2 IS NULL OR exercise = $2)
                ORDER BY position
                ",
            )
            .bind(id)
            .bind(exercise)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::query_error("list_session_sets"))?;

            let sets: Vec<NormalizedSet> = set_rows
                .iter()
                .map(|set_row| Self::row_to_set(set_row, &key))
                .collect::<StoreResult<_>>()?;

            if exercise.is_some() && sets.is_empty() {
                continue;
            }
            result.push(SessionSets { session, sets });
        }
        Ok(result)
    }
}
