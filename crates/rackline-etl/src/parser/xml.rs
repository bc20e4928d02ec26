// ABOUTME: XML reader walking logs/log structures with tag-alias mapping
// ABOUTME: Missing optional children default to None; wrong root fails the batch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! XML record parser.
//!
//! Walks a `<logs><log>…</log></logs>` document event by event. The source
//! app has also been seen exporting `<workouts><workout>` and
//! `<sessions><session>` roots; all three are accepted. Child elements are
//! mapped through the same alias table the CSV headers use, and a `<log>`
//! missing optional children simply yields `None` fields.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use rackline_core::errors::{EtlError, EtlResult, RowError};
use rackline_core::models::RawLogEntry;

use super::{InputFormat, LogParser, ParsedBatch};
use crate::normalize::{clean_text, opt_text};

/// Root elements the source app exports
const ACCEPTED_ROOTS: &[&str] = &["logs", "workouts", "sessions"];

/// Record elements underneath an accepted root
const RECORD_TAGS: &[&str] = &["log", "workout", "session", "set", "entry"];

/// Accepted tag spellings per logical field
const TAG_ALIASES: &[(Field, &[&str])] = &[
    (Field::Date, &["date"]),
    (
        Field::Training,
        &["training", "workout", "entraînement", "entrainement"],
    ),
    (Field::Time, &["time", "heure", "hour", "start_time"]),
    (Field::Exercise, &["exercise", "exercice"]),
    (Field::Region, &["region", "région", "zone", "muscle_group"]),
    (
        Field::MusclesPrimary,
        &["muscles_primary", "primary_muscles", "muscles_primaires"],
    ),
    (
        Field::MusclesSecondary,
        &["muscles_secondary", "secondary_muscles", "muscles_secondaires"],
    ),
    (
        Field::SeriesType,
        &["series_type", "set_type", "type_serie", "type"],
    ),
    (Field::Reps, &["reps", "repetitions", "répétitions", "rep"]),
    (Field::Weight, &["weight", "poids", "load", "charge"]),
    (
        Field::Notes,
        &["notes", "comment", "commentaire", "remarks"],
    ),
    (Field::Skipped, &["skipped", "sautee", "sautée", "skip"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
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

fn field_for_tag(tag: &str) -> Option<Field> {
    let cleaned = clean_text(tag).to_lowercase();
    TAG_ALIASES.iter().find_map(|(field, aliases)| {
        aliases
            .iter()
            .any(|alias| *alias == cleaned)
            .then_some(*field)
    })
}

fn assign(entry: &mut RawLogEntry, field: Field, value: String) {
    let value = opt_text(&value);
    match field {
        Field::Date => entry.date = value,
        Field::Training => entry.training_name = value,
        Field::Time => entry.time = value,
        Field::Exercise => entry.exercise_name = value,
        Field::Region => entry.region_hint = value,
        Field::MusclesPrimary => entry.muscles_primary = value,
        Field::MusclesSecondary => entry.muscles_secondary = value,
        Field::SeriesType => entry.series_type_hint = value,
        Field::Reps => entry.reps = value,
        Field::Weight => entry.weight = value,
        Field::Notes => entry.notes = value,
        Field::Skipped => entry.skipped_flag = value,
    }
}

/// XML parser for `<logs><log>` workout exports
#[derive(Debug, Default)]
pub struct XmlLogParser;

impl XmlLogParser {
    /// Create an XML parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LogParser for XmlLogParser {
    fn format(&self) -> InputFormat {
        InputFormat::Xml
    }

    fn parse(&self, input: &[u8]) -> EtlResult<ParsedBatch> {
        let text = String::from_utf8_lossy(input);
        let mut reader = Reader::from_reader(text.as_bytes());

        let mut batch = ParsedBatch::default();
        let mut root_seen = false;
        let mut current: Option<RawLogEntry> = None;
        let mut current_field: Option<Field> = None;
        let mut field_text = String::new();
        let mut record_count = 0usize;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    if !root_seen {
                        if !ACCEPTED_ROOTS.contains(&name.as_str()) {
                            return Err(EtlError::InvalidStructure {
                                format: "xml",
                                reason: format!("unexpected root element <{name}>"),
                            });
                        }
                        root_seen = true;
                    } else if current.is_none() {
                        if RECORD_TAGS.contains(&name.as_str()) {
                            record_count += 1;
                            current = Some(RawLogEntry {
                                source_row: record_count,
                                ..RawLogEntry::default()
                            });
                        }
                    } else {
                        current_field = field_for_tag(&name);
                        field_text.clear();
                    }
                }
                Ok(Event::Text(e)) => {
                    if current_field.is_some() {
                        match e.unescape() {
                            Ok(text) => field_text.push_str(&text),
                            Err(e) => {
                                return Err(EtlError::InvalidStructure {
                                    format: "xml",
                                    reason: e.to_string(),
                                })
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    if let Some(field) = current_field.take() {
                        if let Some(entry) = current.as_mut() {
                            assign(entry, field, std::mem::take(&mut field_text));
                        }
                    } else if RECORD_TAGS.contains(&name.as_str()) {
                        if let Some(entry) = current.take() {
                            if entry.is_empty() {
                                debug!(row = entry.source_row, "skipping empty record element");
                            } else if entry.date.is_none() {
                                batch.errors.push(RowError::new(
                                    entry.source_row,
                                    EtlError::MissingMandatoryField { field: "date" },
                                ));
                            } else if entry.exercise_name.is_none() {
                                batch.errors.push(RowError::new(
                                    entry.source_row,
                                    EtlError::MissingMandatoryField { field: "exercise" },
                                ));
                            } else {
                                batch.entries.push(entry);
                            }
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    // A self-closing root is an empty export; a self-closing
                    // record element carries no payload and is skipped.
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    if !root_seen && ACCEPTED_ROOTS.contains(&name.as_str()) {
                        root_seen = true;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(EtlError::InvalidStructure {
                        format: "xml",
                        reason: e.to_string(),
                    })
                }
                Ok(_) => {}
            }
            buf.clear();
        }

        if !root_seen {
            return Err(EtlError::InvalidStructure {
                format: "xml",
                reason: "document has no root element".to_owned(),
            });
        }
        if current.is_some() || current_field.is_some() {
            return Err(EtlError::InvalidStructure {
                format: "xml",
                reason: "unexpected end of document inside a record".to_owned(),
            });
        }

        debug!(
            entries = batch.entries.len(),
            rejected = batch.errors.len(),
            "xml batch parsed"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ParsedBatch {
        XmlLogParser::new().parse(input.as_bytes()).unwrap()
    }

    #[test]
    fn parses_logs_structure() {
        let batch = parse(
            "<logs>\
               <log><date>27/03/2025</date><workout>Pull A</workout><time>18:30</time>\
                    <exercise>Traction</exercise><reps>10</reps><weight>0,00 kg</weight>\
                    <notes>strict</notes></log>\
               <log><date>27/03/2025</date><exercise>Curl</exercise><reps>12</reps>\
                    <weight>14 kg</weight></log>\
             </logs>",
        );
        assert_eq!(batch.entries.len(), 2);
        assert!(batch.errors.is_empty());
        assert_eq!(batch.entries[0].training_name.as_deref(), Some("Pull A"));
        assert_eq!(batch.entries[0].weight.as_deref(), Some("0,00 kg"));
        // optional children default to None
        assert_eq!(batch.entries[1].training_name, None);
        assert_eq!(batch.entries[1].notes, None);
    }

    #[test]
    fn accepts_alias_roots_and_tags() {
        let batch = parse(
            "<workouts><workout><date>01/04/2025</date><exercice>Squat</exercice>\
             <charge>120 kg</charge><répétitions>3</répétitions></workout></workouts>",
        );
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.entries[0].weight.as_deref(), Some("120 kg"));
        assert_eq!(batch.entries[0].reps.as_deref(), Some("3"));
    }

    #[test]
    fn missing_mandatory_children_reject_row_only() {
        let batch = parse(
            "<logs>\
               <log><date>01/04/2025</date><exercise>Squat</exercise></log>\
               <log><exercise>Squat</exercise><reps>5</reps></log>\
             </logs>",
        );
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.errors.len(), 1);
        assert!(matches!(
            batch.errors[0].error,
            EtlError::MissingMandatoryField { field: "date" }
        ));
    }

    #[test]
    fn wrong_root_is_structural() {
        let result = XmlLogParser::new().parse(b"<data><log><date>x</date></log></data>");
        assert!(matches!(
            result,
            Err(EtlError::InvalidStructure { format: "xml", .. })
        ));
    }

    #[test]
    fn truncated_document_is_structural() {
        let result = XmlLogParser::new().parse(b"<logs><log><date>01/04/2025");
        assert!(result.is_err());
    }
}
