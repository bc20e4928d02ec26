// ABOUTME: Rackline - workout-log ETL and training-feature analytics platform
// ABOUTME: Root crate wiring the ETL pipeline to the SQLite reference store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

#![deny(unsafe_code)]

//! # Rackline
//!
//! Ingests heterogeneous workout-log exports (CSV and XML, French locale
//! conventions) into a canonical relational shape and derives the training
//! features downstream analytics depend on.
//!
//! The workspace splits along the data flow:
//!
//! - `rackline-core`: canonical models, error taxonomy, configuration
//! - `rackline-etl`: parsers, normalizers, classifier, mapper, import
//!   coordinator, and the `WorkoutStore` persistence contract
//! - `rackline-intelligence`: volume, estimated 1RM, rolling progression
//! - this crate: the SQLite reference implementation of the store contract
//!   and the `rackline-import` command-line importer

/// SQLite implementation of the `WorkoutStore` persistence contract
pub mod store;

pub use rackline_core::{config, errors, models};
pub use rackline_etl::{
    classifier, import, mapper, normalize, parser, pipeline, EtlPipeline, ImportCoordinator,
    ImportOptions, ImportReport, MemoryWorkoutStore, WorkoutStore,
};
pub use rackline_intelligence::{calculator, one_rm, progression, volume, FeatureCalculator};
pub use store::SqliteWorkoutStore;
