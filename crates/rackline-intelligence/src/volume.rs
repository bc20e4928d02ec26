// ABOUTME: Set- and session-level training volume (weight × reps)
// ABOUTME: Skipped sets contribute zero and are excluded from session sums
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Volume metrics.
//!
//! Volume per set is `weight_kg × reps`, zero when the set was skipped or
//! either value is missing. A body-weight set (`weight_kg = 0`) therefore
//! has zero load volume while still counting as a performed set.

use rackline_core::models::{NormalizedSet, SessionSets};

/// Volume of one set: `weight × reps`, `0` when skipped or incomplete
#[must_use]
pub fn set_volume(set: &NormalizedSet) -> f64 {
    if set.skipped {
        return 0.0;
    }
    set.weight_kg.unwrap_or(0.0) * f64::from(set.reps.unwrap_or(0))
}

/// Total volume of one session over its non-skipped sets
#[must_use]
pub fn session_volume(session: &SessionSets) -> f64 {
    session
        .sets
        .iter()
        .filter(|set| !set.skipped)
        .map(set_volume)
        .sum()
}

/// Volume one session contributed to one exercise
#[must_use]
pub fn session_exercise_volume(session: &SessionSets, exercise: &str) -> f64 {
    session
        .sets
        .iter()
        .filter(|set| !set.skipped && set.exercise == exercise)
        .map(set_volume)
        .sum()
}
