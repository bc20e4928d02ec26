// ABOUTME: Exercise catalog entry model keyed by canonical name
// ABOUTME: Carries main region and primary/secondary muscle-group sets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One entry in the exercise catalog.
///
/// Populated by the exercise mapper and shared read-only with the feature
/// calculator. Free-text names that resolve to no known entry are registered
/// here with an unknown region rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseCatalogEntry {
    /// Canonical name; unique key of the catalog
    pub canonical_name: String,
    /// Main muscle region, `None` for auto-registered unknowns
    pub main_region: Option<String>,
    /// Primary muscle groups
    pub muscles_primary: BTreeSet<String>,
    /// Secondary muscle groups
    pub muscles_secondary: BTreeSet<String>,
}

impl ExerciseCatalogEntry {
    /// Create a catalog entry with an unknown region and no muscle data
    #[must_use]
    pub fn unknown(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            main_region: None,
            muscles_primary: BTreeSet::new(),
            muscles_secondary: BTreeSet::new(),
        }
    }
}
