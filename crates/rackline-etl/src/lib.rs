// ABOUTME: Format-tolerant ingestion for heterogeneous workout-log exports
// ABOUTME: Parsers, locale normalizers, set classifier, exercise mapper, import coordinator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

#![deny(unsafe_code)]

//! # Rackline ETL
//!
//! Ingestion pipeline turning heterogeneous workout-log exports (CSV and
//! XML, French locale conventions) into canonical, query-ready records.
//!
//! Data flow: raw file → [`parser`] → [`RawLogEntry`]s → [`classifier`] +
//! [`mapper`] → [`import`] (dedup + persistence handoff through the
//! [`store::WorkoutStore`] contract).
//!
//! [`RawLogEntry`]: rackline_core::models::RawLogEntry

// Re-export rackline-core modules so downstream code can use one crate root.
pub use rackline_core::config;
pub use rackline_core::errors;
pub use rackline_core::models;

/// Locale-aware field normalizers (decimal commas, DD/MM/YYYY dates, units)
pub mod normalize;

/// Record parsers producing the format-agnostic raw entry shape
pub mod parser;

/// Warm-up / working / recovery set classification
pub mod classifier;

/// Free-text exercise name resolution against the canonical catalog
pub mod mapper;

/// Persistence contract and the in-memory staging store
pub mod store;

/// Incremental, idempotent batch import with per-session atomicity
pub mod import;

/// File-to-report orchestration of the full pipeline
pub mod pipeline;

pub use classifier::SetClassifier;
pub use import::{ImportCoordinator, ImportReport};
pub use mapper::{ExerciseMapper, Resolution, ResolutionOutcome};
pub use parser::{detect_format, InputFormat, LogParser, ParsedBatch};
pub use pipeline::{EtlPipeline, ImportOptions};
pub use store::{MemoryWorkoutStore, SessionId, WorkoutStore};
