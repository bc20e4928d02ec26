// ABOUTME: Explicit configuration structures for classifier, mapper, dedup, features
// ABOUTME: Passed at construction time; no component reads ambient environment state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Pipeline configuration.
//!
//! Every tunable the pipeline uses is an explicit field here, injected at
//! construction. Environment and CLI-flag resolution happens in the binary
//! layer, never inside pipeline components.

use serde::{Deserialize, Serialize};

/// Warm-up classification tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Sets below this fraction of the session max for the same exercise
    /// are warm-ups regardless of ramp shape
    pub warmup_fraction: f64,
    /// Upper bound on heuristic warm-up sets per (session, exercise),
    /// `None` for no bound
    pub max_warmup_sets: Option<u32>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            warmup_fraction: 0.60,
            max_warmup_sets: None,
        }
    }
}

/// Exercise-name resolution tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Maximum edit distance for fuzzy catalog candidates
    pub edit_distance_threshold: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            edit_distance_threshold: 2,
        }
    }
}

/// Duplicate-detection tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Include the within-session position ordinal in the dedup key.
    /// When false, repeated identical sets within one session collapse.
    pub use_position: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { use_position: true }
    }
}

/// Incremental-import tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalConfig {
    /// Only sessions within this many days of the reference date are
    /// considered by an incremental import
    pub days_threshold: i64,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self { days_threshold: 7 }
    }
}

/// Feature-calculator tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// 1RM formulas are applied only to working sets at or below this rep
    /// count; all published formulas degrade beyond it
    pub one_rm_max_reps: u32,
    /// Window (in sessions) for the sessions-since-improvement plateau series
    pub plateau_window_sessions: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            one_rm_max_reps: 10,
            plateau_window_sessions: 5,
        }
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Warm-up classification tunables
    pub classifier: ClassifierConfig,
    /// Exercise-name resolution tunables
    pub mapper: MapperConfig,
    /// Duplicate-detection tunables
    pub dedup: DedupConfig,
    /// Incremental-import tunables
    pub incremental: IncrementalConfig,
    /// Feature-calculator tunables
    pub features: FeatureConfig,
}
