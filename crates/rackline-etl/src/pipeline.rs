// ABOUTME: File-to-report orchestration: parse, normalize, classify, map, import
// ABOUTME: One ordered pass per file with incremental-window filtering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! ETL pipeline.
//!
//! One import run is a single ordered pass: raw file → record parser →
//! field normalization → set classification + exercise mapping → import
//! coordinator. Row-level malformed data accumulates into the report's
//! error list and never aborts the batch; only structural problems
//! (unreadable file, wrong root element) surface as `Err`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, info, warn};

use rackline_core::config::EtlConfig;
use rackline_core::errors::{EtlError, EtlResult, RowError};
use rackline_core::models::{NormalizedSet, RawLogEntry, SessionKey};

use crate::classifier::{SetClassifier, SetDraft};
use crate::import::{ImportCoordinator, ImportReport};
use crate::mapper::ExerciseMapper;
use crate::normalize::{
    normalize_bool, normalize_date, normalize_decimal, normalize_int, normalize_time,
};
use crate::parser::{detect_format, parser_for, InputFormat};
use crate::store::WorkoutStore;

/// Per-run import options resolved by the caller (CLI flags, API request)
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Only import sessions within the configured day window that are not
    /// already present in the store
    pub incremental: bool,
    /// Anchor date for the incremental window; defaults to today
    pub reference_date: Option<NaiveDate>,
}

/// A normalized row awaiting classification, still tied to its source row
struct NormalizedRow {
    source_row: usize,
    session_key: SessionKey,
    exercise: String,
    reps: Option<u32>,
    weight_kg: Option<f64>,
    skipped: bool,
    notes: Option<String>,
    series_type_hint: Option<String>,
}

/// End-to-end import pipeline over a persistence store
pub struct EtlPipeline {
    config: EtlConfig,
    store: Arc<dyn WorkoutStore>,
    classifier: SetClassifier,
    coordinator: ImportCoordinator,
}

impl EtlPipeline {
    /// Create a pipeline; all tunables come in through the config
    #[must_use]
    pub fn new(config: EtlConfig, store: Arc<dyn WorkoutStore>) -> Self {
        let classifier = SetClassifier::new(config.classifier.clone());
        let coordinator = ImportCoordinator::new(store.clone(), config.dedup);
        Self {
            config,
            store,
            classifier,
            coordinator,
        }
    }

    /// Import one file, detecting the format from its extension.
    ///
    /// # Errors
    /// Returns a structural [`EtlError`] for unreadable files, unsupported
    /// extensions, or an unreachable store. Row-level problems are reported
    /// in the returned [`ImportReport`], never as `Err`.
    pub async fn import_file(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> EtlResult<ImportReport> {
        let format = detect_format(path)?;
        let bytes = tokio::fs::read(path).await.map_err(|source| EtlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), ?format, "importing file");
        self.import_bytes(format, &bytes, options).await
    }

    /// Import already-loaded file content in a known format.
    ///
    /// # Errors
    /// Same contract as [`EtlPipeline::import_file`].
    pub async fn import_bytes(
        &self,
        format: InputFormat,
        bytes: &[u8],
        options: ImportOptions,
    ) -> EtlResult<ImportReport> {
        let batch = parser_for(format).parse(bytes)?;
        let mut row_errors = batch.errors;

        // The mapper works over the persisted catalog; entries registered
        // during this run are flushed back before the import proper.
        let catalog = self.store.list_exercises().await?;
        let mut mapper = if catalog.is_empty() {
            let mapper = ExerciseMapper::with_seed_catalog(self.config.mapper.clone());
            for entry in mapper.catalog() {
                self.store.upsert_exercise(entry).await?;
            }
            mapper
        } else {
            ExerciseMapper::new(self.config.mapper.clone(), catalog)
        };

        let mut rows: Vec<NormalizedRow> = Vec::with_capacity(batch.entries.len());
        for entry in &batch.entries {
            match self.normalize_entry(entry, &mut mapper) {
                Ok(row) => rows.push(row),
                Err(error) => row_errors.push(RowError::new(entry.source_row, error)),
            }
        }

        let mut filtered_incremental = 0usize;
        if options.incremental {
            let existing_dates = self.store.list_session_dates().await?;
            let reference = options
                .reference_date
                .unwrap_or_else(|| Utc::now().date_naive());
            let cutoff = reference
                .checked_sub_days(Days::new(
                    self.config.incremental.days_threshold.unsigned_abs(),
                ))
                .unwrap_or(reference);
            let before = rows.len();
            rows.retain(|row| {
                row.session_key.date >= cutoff && !existing_dates.contains(&row.session_key.date)
            });
            filtered_incremental = before - rows.len();
            debug!(
                kept = rows.len(),
                filtered = filtered_incremental,
                %cutoff,
                "incremental window applied"
            );
        }

        let sets = self.classify_rows(rows);

        for entry in mapper.take_new_entries() {
            self.store.upsert_exercise(&entry).await?;
        }

        let mut report = self.coordinator.import_batch(&sets).await?;
        report.rejected_malformed = row_errors.len();
        report.row_errors = row_errors;
        report.filtered_incremental = filtered_incremental;

        info!(
            inserted = report.inserted,
            skipped_duplicate = report.skipped_duplicate,
            rejected_malformed = report.rejected_malformed,
            rejected_failed = report.rejected_failed,
            "import finished"
        );
        Ok(report)
    }

    /// Normalize one raw entry into typed values, resolving its exercise.
    fn normalize_entry(
        &self,
        entry: &RawLogEntry,
        mapper: &mut ExerciseMapper,
    ) -> EtlResult<NormalizedRow> {
        let date = normalize_date(entry.date.as_deref().ok_or(
            EtlError::MissingMandatoryField { field: "date" },
        )?)?;

        let start_time = match entry.time.as_deref() {
            Some(raw) => match normalize_time(raw) {
                Ok(time) => Some(time),
                Err(error) => {
                    // The session key tolerates a missing time; an unparsable
                    // one degrades the key rather than losing the row.
                    warn!(row = entry.source_row, %error, "dropping unparsable time");
                    None
                }
            },
            None => None,
        };

        let reps = match entry.reps.as_deref() {
            Some(raw) => normalize_int(raw)?,
            None => None,
        };
        let weight_kg = match entry.weight.as_deref() {
            Some(raw) => Some(normalize_decimal(raw)?),
            None => None,
        };
        let skipped = entry
            .skipped_flag
            .as_deref()
            .is_some_and(normalize_bool);

        if !skipped && reps.is_none() && weight_kg.is_none() {
            return Err(EtlError::MissingMandatoryField {
                field: "reps/weight",
            });
        }

        // Resolve the exercise only once the row is otherwise sound, so a
        // rejected row never registers a catalog entry.
        let raw_exercise = entry
            .exercise_name
            .as_deref()
            .ok_or(EtlError::MissingMandatoryField { field: "exercise" })?;
        let resolution = mapper.resolve(
            raw_exercise,
            entry.region_hint.as_deref(),
            entry.muscles_primary.as_deref(),
            entry.muscles_secondary.as_deref(),
        );

        Ok(NormalizedRow {
            source_row: entry.source_row,
            session_key: SessionKey {
                date,
                start_time,
                training_name: entry.training_name.clone(),
            },
            exercise: resolution.canonical,
            reps,
            weight_kg,
            skipped,
            notes: entry.notes.clone(),
            series_type_hint: entry.series_type_hint.clone(),
        })
    }

    /// Group rows into sessions, assign positions, and classify each set.
    fn classify_rows(&self, rows: Vec<NormalizedRow>) -> Vec<NormalizedSet> {
        let mut order: Vec<SessionKey> = Vec::new();
        let mut groups: HashMap<SessionKey, Vec<NormalizedRow>> = HashMap::new();
        for row in rows {
            let group = groups.entry(row.session_key.clone()).or_default();
            if group.is_empty() {
                order.push(row.session_key.clone());
            }
            group.push(row);
        }

        let mut sets = Vec::new();
        for key in order {
            let mut group = groups.remove(&key).unwrap_or_default();
            group.sort_by_key(|row| row.source_row);

            let drafts: Vec<SetDraft> = group
                .iter()
                .map(|row| SetDraft {
                    exercise: row.exercise.clone(),
                    weight_kg: row.weight_kg,
                    skipped: row.skipped,
                    series_type_hint: row.series_type_hint.clone(),
                })
                .collect();
            let classified = self.classifier.classify_session(&drafts);

            for (position, (row, class)) in group.into_iter().zip(classified).enumerate() {
                sets.push(NormalizedSet {
                    session_key: row.session_key,
                    exercise: row.exercise,
                    series_type: class.series_type,
                    classification: class.source,
                    reps: row.reps,
                    weight_kg: row.weight_kg,
                    skipped: row.skipped,
                    notes: row.notes,
                    position: position as u32 + 1,
                });
            }
        }
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryWorkoutStore;
    use rackline_core::models::SeriesType;

    const HEADER: &str = "Date,Entraînement,Heure,Exercice,Région,Groupes musculaires (Primaires),Groupes musculaires (Secondaires),Série / Série d'échauffement / Série de récupération,Répétitions / Temps,Poids / Distance,Notes,Sautée";

    fn pipeline(store: Arc<MemoryWorkoutStore>) -> EtlPipeline {
        EtlPipeline::new(EtlConfig::default(), store)
    }

    fn csv_row(date: &str, exercise: &str, reps: &str, weight: &str) -> String {
        format!("{date},Push A,18:30,{exercise},,,,,\"{reps}\",\"{weight}\",,Non\n")
    }

    #[tokio::test]
    async fn malformed_row_does_not_fail_batch() {
        // 10 rows, one with a non-numeric weight: 9 import, 1 reported.
        let mut input = format!("{HEADER}\n");
        for i in 0..9 {
            input.push_str(&csv_row("27/03/2025", "Squat", "5", &format!("10{i},5 kg")));
        }
        input.push_str(&csv_row("27/03/2025", "Squat", "5", "beaucoup kg"));

        let store = Arc::new(MemoryWorkoutStore::new());
        let report = pipeline(store.clone())
            .import_bytes(InputFormat::Csv, input.as_bytes(), ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.inserted, 9);
        assert_eq!(report.rejected_malformed, 1);
        assert_eq!(report.row_errors.len(), 1);
        assert_eq!(report.row_errors[0].row, 10);
        assert!(matches!(
            report.row_errors[0].error,
            EtlError::MalformedNumber { .. }
        ));
        assert_eq!(store.set_count().await, 9);
    }

    #[tokio::test]
    async fn importing_same_bytes_twice_is_idempotent() {
        let input = format!(
            "{HEADER}\n{}{}",
            csv_row("27/03/2025", "Squat", "5", "100 kg"),
            csv_row("27/03/2025", "Squat", "5", "100 kg"),
        );
        let store = Arc::new(MemoryWorkoutStore::new());
        let pipeline = pipeline(store.clone());

        let first = pipeline
            .import_bytes(InputFormat::Csv, input.as_bytes(), ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(first.inserted, 2);

        let second = pipeline
            .import_bytes(InputFormat::Csv, input.as_bytes(), ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_duplicate, 2);
        assert_eq!(store.set_count().await, 2);
    }

    #[tokio::test]
    async fn warmup_ramp_is_classified_within_session() {
        let input = format!(
            "{HEADER}\n{}{}{}{}",
            csv_row("27/03/2025", "Développé couché", "10", "40,0 kg"),
            csv_row("27/03/2025", "Développé couché", "8", "60,0 kg"),
            csv_row("27/03/2025", "Développé couché", "5", "80,0 kg"),
            csv_row("27/03/2025", "Développé couché", "5", "80,0 kg"),
        );
        let store = Arc::new(MemoryWorkoutStore::new());
        pipeline(store.clone())
            .import_bytes(InputFormat::Csv, input.as_bytes(), ImportOptions::default())
            .await
            .unwrap();

        let sessions = store.list_session_sets(None, None).await.unwrap();
        assert_eq!(sessions.len(), 1);
        let types: Vec<SeriesType> = sessions[0].sets.iter().map(|s| s.series_type).collect();
        assert_eq!(
            types,
            vec![
                SeriesType::Warmup,
                SeriesType::Warmup,
                SeriesType::Working,
                SeriesType::Working,
            ]
        );
        // alias resolution happened on the way through
        assert!(sessions[0].sets.iter().all(|s| s.exercise == "bench-press"));
    }

    #[tokio::test]
    async fn incremental_window_filters_old_and_known_dates() {
        let store = Arc::new(MemoryWorkoutStore::new());
        let pipeline = pipeline(store.clone());

        // seed one session on the 27th
        let seed = format!("{HEADER}\n{}", csv_row("27/03/2025", "Squat", "5", "100 kg"));
        pipeline
            .import_bytes(InputFormat::Csv, seed.as_bytes(), ImportOptions::default())
            .await
            .unwrap();

        // incremental run: the 27th exists, the 1st is out of window, the 29th is new
        let input = format!(
            "{HEADER}\n{}{}{}",
            csv_row("27/03/2025", "Squat", "5", "102,5 kg"),
            csv_row("01/03/2025", "Squat", "5", "95 kg"),
            csv_row("29/03/2025", "Squat", "5", "105 kg"),
        );
        let report = pipeline
            .import_bytes(
                InputFormat::Csv,
                input.as_bytes(),
                ImportOptions {
                    incremental: true,
                    reference_date: NaiveDate::from_ymd_opt(2025, 3, 30),
                },
            )
            .await
            .unwrap();

        assert_eq!(report.filtered_incremental, 2);
        assert_eq!(report.inserted, 1);
        let dates = store.list_session_dates().await.unwrap();
        assert_eq!(dates.len(), 2);
    }

    #[tokio::test]
    async fn xml_and_csv_converge_to_the_same_shape() {
        let xml = "<logs><log><date>27/03/2025</date><workout>Pull A</workout>\
                   <time>18:30</time><exercise>Traction</exercise><reps>10</reps>\
                   <weight>0,00 kg</weight></log></logs>";
        let store = Arc::new(MemoryWorkoutStore::new());
        pipeline(store.clone())
            .import_bytes(InputFormat::Xml, xml.as_bytes(), ImportOptions::default())
            .await
            .unwrap();

        let sessions = store.list_session_sets(Some("pull-up"), None).await.unwrap();
        assert_eq!(sessions.len(), 1);
        let set = &sessions[0].sets[0];
        // explicit zero weight: a valid body-weight working set
        assert_eq!(set.weight_kg, Some(0.0));
        assert_eq!(set.series_type, SeriesType::Working);
        assert!(!set.skipped);
    }

    #[tokio::test]
    async fn non_skipped_row_missing_both_reps_and_weight_is_rejected() {
        let input = format!("{HEADER}\n27/03/2025,Push A,,Squat,,,,,,,,Non\n");
        let store = Arc::new(MemoryWorkoutStore::new());
        let report = pipeline(store)
            .import_bytes(InputFormat::Csv, input.as_bytes(), ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.rejected_malformed, 1);
        assert!(matches!(
            report.row_errors[0].error,
            EtlError::MissingMandatoryField {
                field: "reps/weight"
            }
        ));
    }
}
