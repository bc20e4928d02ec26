// ABOUTME: Canonical data models for the Rackline training-log pipeline
// ABOUTME: Raw entries, normalized sets, sessions, catalog entries, derived features
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Canonical data models.
//!
//! Data flows `RawLogEntry` → `NormalizedSet` (grouped under a [`Session`])
//! → derived [`DerivedFeatureRecord`]s. Raw entries are format-agnostic and
//! discarded after normalization; derived features are ephemeral and
//! recomputed on demand.

/// Source-format-agnostic raw log entries produced by the record parsers
pub mod entry;

/// Normalized sets, sessions, and classification metadata
pub mod set;

/// Exercise catalog entries (canonical names and muscle groups)
pub mod catalog;

/// Ephemeral derived-feature records consumed by analytics collaborators
pub mod features;

pub use catalog::ExerciseCatalogEntry;
pub use entry::RawLogEntry;
pub use features::{DerivedFeatureRecord, FeatureWindow, Metric};
pub use set::{
    ClassificationSource, NormalizedSet, SeriesType, Session, SessionKey, SessionSets, SetDedupKey,
};
