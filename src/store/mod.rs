// ABOUTME: Reference persistence backends for the WorkoutStore contract
// ABOUTME: SQLite via sqlx; the in-memory store lives with the contract itself
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Store implementations.
//!
//! The ETL crate defines the narrow `WorkoutStore` contract; this module
//! provides the durable SQLite backend used by the CLI and integration
//! tests.

/// SQLite-backed store
pub mod sqlite;

pub use sqlite::SqliteWorkoutStore;
