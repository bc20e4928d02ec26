// ABOUTME: Polymorphic record-parser capability shared by the CSV and XML readers
// ABOUTME: ParsedBatch partial-failure contract and input-format detection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Record parsers.
//!
//! Both readers produce the same [`RawLogEntry`] shape under the same
//! partial-failure contract: a batch returns the successfully parsed
//! entries alongside a list of `(row, error)` pairs rather than aborting on
//! the first bad row. Only structural problems (unreadable input, missing
//! header, wrong root element) fail the whole batch.

use std::path::Path;

use rackline_core::errors::{EtlError, EtlResult, RowError};
use rackline_core::models::RawLogEntry;

/// CSV reader with header-name column matching
pub mod csv;

/// XML reader walking `<logs><log>` structures
pub mod xml;

pub use self::csv::CsvLogParser;
pub use self::xml::XmlLogParser;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Delimited export with French column headers
    Csv,
    /// `<logs><log>…</log></logs>` export
    Xml,
}

/// Result of parsing one file: successes plus attributed row failures
#[derive(Debug, Default)]
pub struct ParsedBatch {
    /// Entries that parsed cleanly, in source order
    pub entries: Vec<RawLogEntry>,
    /// Rows that were rejected, with their 1-based source index
    pub errors: Vec<RowError>,
}

/// A format-specific reader producing the shared raw-entry shape.
///
/// Implementations must uphold the partial-failure contract: row-level
/// problems accumulate into [`ParsedBatch::errors`], and only structural
/// unreadability returns `Err`.
pub trait LogParser: Send + Sync {
    /// The format this parser reads
    fn format(&self) -> InputFormat;

    /// Parse raw file bytes into a batch.
    ///
    /// # Errors
    /// Returns a structural [`EtlError`] when the input as a whole is
    /// unreadable (bad header set, wrong root element, undecodable bytes).
    fn parse(&self, input: &[u8]) -> EtlResult<ParsedBatch>;
}

/// Pick a parser format from a file extension.
///
/// # Errors
/// Returns [`EtlError::UnsupportedFormat`] for anything but `.csv`/`.xml`.
pub fn detect_format(path: &Path) -> EtlResult<InputFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match extension.as_str() {
        "csv" => Ok(InputFormat::Csv),
        "xml" => Ok(InputFormat::Xml),
        _ => Err(EtlError::UnsupportedFormat { extension }),
    }
}

/// Instantiate the parser for a detected format.
#[must_use]
pub fn parser_for(format: InputFormat) -> Box<dyn LogParser> {
    match format {
        InputFormat::Csv => Box::new(CsvLogParser::new()),
        InputFormat::Xml => Box::new(XmlLogParser::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_case_insensitively() {
        assert_eq!(
            detect_format(Path::new("export.CSV")).unwrap(),
            InputFormat::Csv
        );
        assert_eq!(
            detect_format(Path::new("logs.xml")).unwrap(),
            InputFormat::Xml
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(matches!(
            detect_format(Path::new("export.xlsx")),
            Err(EtlError::UnsupportedFormat { .. })
        ));
    }
}
