// ABOUTME: CSV reader for French workout-log exports with header-name matching
// ABOUTME: Tolerates column reordering and rejects bad rows without aborting the batch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! CSV record parser.
//!
//! Columns are located by header name, not position, against the column
//! spellings the source app has been observed to export (French headers
//! with the occasional English re-export). A header without the mandatory
//! `Date` and `Exercice` columns is structural and fails the batch; a data
//! row missing those values is rejected into the error list.

use csv::ReaderBuilder;
use tracing::debug;

use rackline_core::errors::{EtlError, EtlResult, RowError};
use rackline_core::models::RawLogEntry;

use super::{InputFormat, LogParser, ParsedBatch};
use crate::normalize::{clean_text, opt_text};

/// Accepted header spellings per logical column, most common first
const COLUMN_ALIASES: &[(Column, &[&str])] = &[
    (Column::Date, &["Date"]),
    (
        Column::Training,
        &["Entraînement", "Entrainement", "Training", "Workout"],
    ),
    (Column::Time, &["Heure", "Time", "Hour"]),
    (Column::Exercise, &["Exercice", "Exercise"]),
    (Column::Region, &["Région", "Region", "Zone"]),
    (
        Column::MusclesPrimary,
        &[
            "Groupes musculaires (Primaires)",
            "Muscles primaires",
            "muscles_primary",
            "primary_muscles",
        ],
    ),
    (
        Column::MusclesSecondary,
        &[
            "Groupes musculaires (Secondaires)",
            "Muscles secondaires",
            "muscles_secondary",
            "secondary_muscles",
        ],
    ),
    (
        Column::SeriesType,
        &[
            "Série / Série d'échauffement / Série de récupération",
            "Type de série",
            "series_type",
            "set_type",
        ],
    ),
    (
        Column::Reps,
        &["Répétitions / Temps", "Répétitions", "Reps", "Repetitions"],
    ),
    (Column::Weight, &["Poids / Distance", "Poids", "Weight"]),
    (Column::Notes, &["Notes", "Commentaires"]),
    (Column::Skipped, &["Sautée", "Sautee", "Skipped", "Skip"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Date,
    Training,
    Time,
    Exercise,
    Region,
    MusclesPrimary,
    MusclesSecondary,
    SeriesType,
    Reps,
    Weight,
    Notes,
    Skipped,
}

/// Resolved header positions for one file
#[derive(Debug, Default)]
struct ColumnMap {
    date: Option<usize>,
    training: Option<usize>,
    time: Option<usize>,
    exercise: Option<usize>,
    region: Option<usize>,
    muscles_primary: Option<usize>,
    muscles_secondary: Option<usize>,
    series_type: Option<usize>,
    reps: Option<usize>,
    weight: Option<usize>,
    notes: Option<usize>,
    skipped: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> EtlResult<Self> {
        let cleaned: Vec<String> = headers
            .iter()
            .map(|h| clean_text(h).to_lowercase())
            .collect();

        let mut map = Self::default();
        for (column, aliases) in COLUMN_ALIASES {
            let position = cleaned
                .iter()
                .position(|header| aliases.iter().any(|alias| alias.to_lowercase() == *header));
            match column {
                Column::Date => map.date = position,
                Column::Training => map.training = position,
                Column::Time => map.time = position,
                Column::Exercise => map.exercise = position,
                Column::Region => map.region = position,
                Column::MusclesPrimary => map.muscles_primary = position,
                Column::MusclesSecondary => map.muscles_secondary = position,
                Column::SeriesType => map.series_type = position,
                Column::Reps => map.reps = position,
                Column::Weight => map.weight = position,
                Column::Notes => map.notes = position,
                Column::Skipped => map.skipped = position,
            }
        }

        if map.date.is_none() || map.exercise.is_none() {
            return Err(EtlError::InvalidStructure {
                format: "csv",
                reason: format!("header lacks mandatory Date/Exercice columns: {cleaned:?}"),
            });
        }
        Ok(map)
    }
}

/// CSV parser for French workout-log exports
#[derive(Debug, Default)]
pub struct CsvLogParser;

impl CsvLogParser {
    /// Create a CSV parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn field(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
        index.and_then(|i| record.get(i)).and_then(opt_text)
    }
}

impl LogParser for CsvLogParser {
    fn format(&self) -> InputFormat {
        InputFormat::Csv
    }

    fn parse(&self, input: &[u8]) -> EtlResult<ParsedBatch> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| EtlError::InvalidStructure {
                format: "csv",
                reason: format!("unreadable header row: {e}"),
            })?
            .clone();
        let columns = ColumnMap::resolve(&headers)?;

        let mut batch = ParsedBatch::default();
        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    batch.errors.push(RowError::new(
                        row,
                        EtlError::InvalidStructure {
                            format: "csv",
                            reason: e.to_string(),
                        },
                    ));
                    continue;
                }
            };

            let entry = RawLogEntry {
                source_row: row,
                date: Self::field(&record, columns.date),
                training_name: Self::field(&record, columns.training),
                time: Self::field(&record, columns.time),
                exercise_name: Self::field(&record, columns.exercise),
                region_hint: Self::field(&record, columns.region),
                muscles_primary: Self::field(&record, columns.muscles_primary),
                muscles_secondary: Self::field(&record, columns.muscles_secondary),
                series_type_hint: Self::field(&record, columns.series_type),
                reps: Self::field(&record, columns.reps),
                weight: Self::field(&record, columns.weight),
                notes: Self::field(&record, columns.notes),
                skipped_flag: Self::field(&record, columns.skipped),
            };

            if entry.is_empty() {
                debug!(row, "skipping blank row");
                continue;
            }
            if entry.date.is_none() {
                batch.errors.push(RowError::new(
                    row,
                    EtlError::MissingMandatoryField { field: "date" },
                ));
                continue;
            }
            if entry.exercise_name.is_none() {
                batch.errors.push(RowError::new(
                    row,
                    EtlError::MissingMandatoryField { field: "exercise" },
                ));
                continue;
            }
            batch.entries.push(entry);
        }

        debug!(
            entries = batch.entries.len(),
            rejected = batch.errors.len(),
            "csv batch parsed"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date,Entraînement,Heure,Exercice,Région,Groupes musculaires (Primaires),Groupes musculaires (Secondaires),Série / Série d'échauffement / Série de récupération,Répétitions / Temps,Poids / Distance,Notes,Sautée";

    fn parse(input: &str) -> ParsedBatch {
        CsvLogParser::new().parse(input.as_bytes()).unwrap()
    }

    #[test]
    fn parses_full_french_rows() {
        let input = format!(
            "{HEADER}\n27/03/2025,Push A,18h30,Développé couché,Pectoraux,\"Pectoraux, Triceps\",Épaules,Série,\"8 répétitions\",\"80,5 kg\",solide,Non\n"
        );
        let batch = parse(&input);
        assert_eq!(batch.entries.len(), 1);
        assert!(batch.errors.is_empty());

        let entry = &batch.entries[0];
        assert_eq!(entry.date.as_deref(), Some("27/03/2025"));
        assert_eq!(entry.exercise_name.as_deref(), Some("Développé couché"));
        assert_eq!(entry.weight.as_deref(), Some("80,5 kg"));
        assert_eq!(entry.skipped_flag.as_deref(), Some("Non"));
    }

    #[test]
    fn matches_columns_by_name_not_position() {
        let input = "Exercice,Poids,Date,Répétitions\nSquat,\"100,0 kg\",27/03/2025,5\n";
        let batch = parse(input);
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.entries[0].exercise_name.as_deref(), Some("Squat"));
        assert_eq!(batch.entries[0].weight.as_deref(), Some("100,0 kg"));
        assert_eq!(batch.entries[0].date.as_deref(), Some("27/03/2025"));
    }

    #[test]
    fn rejects_rows_missing_mandatory_values_without_failing_batch() {
        let input = format!(
            "{HEADER}\n27/03/2025,Push A,,Squat,,,,,5,\"100 kg\",,Non\n,Push A,,Squat,,,,,5,\"100 kg\",,Non\n28/03/2025,Push A,,,,,,,5,\"100 kg\",,Non\n"
        );
        let batch = parse(&input);
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.errors.len(), 2);
        assert_eq!(batch.errors[0].row, 2);
        assert!(matches!(
            batch.errors[0].error,
            EtlError::MissingMandatoryField { field: "date" }
        ));
        assert!(matches!(
            batch.errors[1].error,
            EtlError::MissingMandatoryField { field: "exercise" }
        ));
    }

    #[test]
    fn missing_mandatory_header_is_structural() {
        let result = CsvLogParser::new().parse(b"Poids,Notes\n\"80 kg\",x\n");
        assert!(matches!(
            result,
            Err(EtlError::InvalidStructure { format: "csv", .. })
        ));
    }

    #[test]
    fn header_with_bom_and_nbsp_still_matches() {
        let input = "\u{feff}Date,Exercice\u{00a0}\n27/03/2025,Squat\n";
        let batch = parse(input);
        assert_eq!(batch.entries.len(), 1);
    }
}
