// ABOUTME: Error taxonomies for ETL normalization and persistence operations
// ABOUTME: Defines EtlError row/batch errors and StoreError with structured context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Error taxonomy for the import pipeline.
//!
//! Row-level errors (`MalformedNumber`, `MalformedDate`, ...) accumulate in
//! [`RowError`] lists and never abort a batch. Structural errors (unreadable
//! file, invalid root element) are fatal to the whole batch and surfaced
//! immediately as a plain `Err(EtlError)`.

use std::path::PathBuf;

/// Result alias for ETL operations
pub type EtlResult<T> = Result<T, EtlError>;

/// Result alias for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while parsing and normalizing training-log exports
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// A numeric field contained non-numeric residue after unit stripping
    #[error("Malformed number '{value}': {reason}")]
    MalformedNumber {
        /// Raw token that failed to convert
        value: String,
        /// Why the conversion failed
        reason: &'static str,
    },

    /// A date field did not match any accepted format or was out of range
    #[error("Malformed date '{value}'")]
    MalformedDate {
        /// Raw token that failed to parse
        value: String,
    },

    /// A time-of-day field did not match any accepted format
    #[error("Malformed time '{value}'")]
    MalformedTime {
        /// Raw token that failed to parse
        value: String,
    },

    /// A mandatory field (date, exercise) was absent from a row
    #[error("Missing mandatory field '{field}'")]
    MissingMandatoryField {
        /// Name of the missing field
        field: &'static str,
    },

    /// A series-type label was present but not recognized (recoverable:
    /// the classifier heuristic takes over)
    #[error("Unrecognized series type '{value}'")]
    UnrecognizedSeriesType {
        /// The unrecognized label
        value: String,
    },

    /// Multiple catalog entries matched a free-text exercise name within
    /// the edit-distance threshold (recoverable: conservative fallback)
    #[error("Ambiguous exercise match for '{name}': candidates {candidates:?}")]
    AmbiguousExerciseMatch {
        /// The free-text name being resolved
        name: String,
        /// Canonical candidates that tied
        candidates: Vec<String>,
    },

    /// The input file extension maps to no known parser
    #[error("Unsupported input format '{extension}'")]
    UnsupportedFormat {
        /// Extension of the rejected file
        extension: String,
    },

    /// The input is structurally unreadable (fatal to the whole batch)
    #[error("Invalid {format} structure: {reason}")]
    InvalidStructure {
        /// Input format name ("csv" or "xml")
        format: &'static str,
        /// What made the structure unreadable
        reason: String,
    },

    /// The input file could not be read
    #[error("Cannot read {path}")]
    Io {
        /// Path of the unreadable file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Persistence failure surfaced by the store (triggers rollback of the
    /// affected session only)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EtlError {
    /// Whether this error aborts the whole batch rather than a single row
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. } | Self::InvalidStructure { .. } | Self::Io { .. }
        )
    }
}

/// A row-level error, attributed to its 1-based position in the source file
#[derive(Debug, thiserror::Error)]
#[error("row {row}: {error}")]
pub struct RowError {
    /// 1-based row index in the source file (header excluded for CSV)
    pub row: usize,
    /// The error raised for this row
    pub error: EtlError,
}

impl RowError {
    /// Attribute an error to a source row
    #[must_use]
    pub const fn new(row: usize, error: EtlError) -> Self {
        Self { row, error }
    }
}

/// Errors raised by the persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to open or connect to the backing database
    #[error("Store connection failed: {context}")]
    Connection {
        /// Connection failure details
        context: String,
    },

    /// A query failed to execute
    #[error("Store query failed: {context}")]
    Query {
        /// Query failure details
        context: String,
    },

    /// A scoped operation was invoked without an active transaction scope
    #[error("No active transaction scope for '{operation}'")]
    NoActiveScope {
        /// The operation that required a scope
        operation: &'static str,
    },

    /// A stored value could not be decoded into its model type
    #[error("Corrupt stored value in {column}: {context}")]
    Corrupt {
        /// Column holding the undecodable value
        column: &'static str,
        /// Decode failure details
        context: String,
    },
}
