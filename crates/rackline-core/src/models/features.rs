// ABOUTME: Ephemeral derived-feature records consumed by analytics collaborators
// ABOUTME: Metric name enum, computation window, and the record shape itself
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Names of the derived metrics the feature calculator emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Sum of weight × reps over a session's non-skipped sets
    SessionVolume,
    /// Trailing 7-day volume sum, advancing session by session
    RollingVolume7d,
    /// Trailing 30-day volume sum, advancing session by session
    RollingVolume30d,
    /// Percentage change between consecutive trailing-7-day windows
    RollingVolumeChangePct,
    /// Best estimated 1RM within one session
    SessionBestOneRm,
    /// Maximum estimated 1RM across all historical sets
    BestOneRm,
    /// Best estimated 1RM in the most recent session with the exercise
    CurrentOneRm,
}

impl Metric {
    /// Stable string form of the metric name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionVolume => "session_volume",
            Self::RollingVolume7d => "rolling_volume_7d",
            Self::RollingVolume30d => "rolling_volume_30d",
            Self::RollingVolumeChangePct => "rolling_volume_change_pct",
            Self::SessionBestOneRm => "session_best_one_rm",
            Self::BestOneRm => "best_one_rm",
            Self::CurrentOneRm => "current_one_rm",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Date window a feature was computed over (inclusive bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureWindow {
    /// First date covered
    pub start: NaiveDate,
    /// Last date covered
    pub end: NaiveDate,
}

impl FeatureWindow {
    /// Window covering a single day
    #[must_use]
    pub const fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }
}

/// One derived feature value.
///
/// Ephemeral by design: recomputed on demand, never persisted as a source
/// of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatureRecord {
    /// Canonical exercise name the feature describes
    pub exercise: String,
    /// Which metric this record carries
    pub metric: Metric,
    /// Metric value
    pub value: f64,
    /// Window the value was computed over
    pub window: FeatureWindow,
}
