// ABOUTME: Training-feature derivation engine: volume, estimated 1RM, progression
// ABOUTME: Read-only and side-effect-free; parallelizable across exercises
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

#![deny(unsafe_code)]

//! # Rackline Intelligence
//!
//! Derived training features consumed by analytics and API collaborators:
//! per-set/per-session volume, estimated one-rep-max via published
//! regression formulas, and rolling progression indicators that advance
//! session-by-session to tolerate irregular training frequency.
//!
//! Everything here reads persisted records and computes; nothing mutates.
//! Derived values are ephemeral: recomputed on demand, never treated as a
//! source of truth.

pub use rackline_core::config;
pub use rackline_core::models;

/// Estimated one-rep-max formulas (Epley, Brzycki, Lander, O'Conner)
pub mod one_rm;

/// Set- and session-level volume
pub mod volume;

/// Rolling windows, progression series, and the plateau signal
pub mod progression;

/// Query facade emitting `DerivedFeatureRecord`s per exercise
pub mod calculator;

pub use calculator::FeatureCalculator;
pub use one_rm::OneRmFormula;
