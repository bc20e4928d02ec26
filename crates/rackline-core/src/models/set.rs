// ABOUTME: Normalized set and session models with classification metadata
// ABOUTME: SessionKey identity tuple, SeriesType labels, structural dedup keys
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Canonical series type of a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    /// Ramp-up set below training intensity
    Warmup,
    /// Set performed at training intensity ("principale" in the source app)
    Working,
    /// Back-off / recovery set
    Recovery,
}

impl SeriesType {
    /// Stable string form used for storage and dedup keys
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Working => "working",
            Self::Recovery => "recovery",
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SeriesType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warmup" => Ok(Self::Warmup),
            "working" => Ok(Self::Working),
            "recovery" => Ok(Self::Recovery),
            other => Err(format!("unknown series type: {other}")),
        }
    }
}

/// How a set's series type was decided.
///
/// Callers and tests can distinguish "classified with heuristic" from
/// "explicit source label"; fallback marks an unrecognized explicit label
/// that was handed to the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    /// The source carried a recognized series-type label
    Explicit,
    /// No usable label; the warm-up heuristic decided
    Heuristic,
    /// A label was present but unrecognized; the heuristic decided
    Fallback,
}

impl ClassificationSource {
    /// Stable string form used for storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Heuristic => "heuristic",
            Self::Fallback => "fallback",
        }
    }
}

impl std::str::FromStr for ClassificationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit" => Ok(Self::Explicit),
            "heuristic" => Ok(Self::Heuristic),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown classification source: {other}")),
        }
    }
}

/// Identity tuple grouping sets into one training session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Session date (ISO, already normalized)
    pub date: NaiveDate,
    /// Session start time, when the export carried one
    pub start_time: Option<NaiveTime>,
    /// Workout name, when the export carried one
    pub training_name: Option<String>,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        match self.start_time {
            Some(t) => write!(f, "/{}", t.format("%H:%M"))?,
            None => f.write_str("/-")?,
        }
        write!(f, "/{}", self.training_name.as_deref().unwrap_or("-"))
    }
}

/// A training session; owns zero-or-more normalized sets.
///
/// Never mutated after creation except notes append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session date
    pub date: NaiveDate,
    /// Start time, if known
    pub start_time: Option<NaiveTime>,
    /// Workout name, if known
    pub training_name: Option<String>,
    /// Session-level notes
    pub notes: Option<String>,
}

impl Session {
    /// The identity tuple for this session
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey {
            date: self.date,
            start_time: self.start_time,
            training_name: self.training_name.clone(),
        }
    }
}

/// A session together with its persisted sets, as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSets {
    /// The owning session
    pub session: Session,
    /// Sets in position order
    pub sets: Vec<NormalizedSet>,
}

/// A fully normalized set, ready for import.
///
/// Invariant: `weight_kg` and `reps` are `None` only when `skipped` is true
/// or the set is explicitly body-weight; `Some(0.0)` is a valid weight and
/// distinct from `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSet {
    /// Identity of the owning session
    pub session_key: SessionKey,
    /// Catalog-resolved canonical exercise name
    pub exercise: String,
    /// Classified series type
    pub series_type: SeriesType,
    /// Provenance of the classification
    pub classification: ClassificationSource,
    /// Repetition count; `None` means missing, not zero
    pub reps: Option<u32>,
    /// Weight in kilograms; `Some(0.0)` marks a body-weight set
    pub weight_kg: Option<f64>,
    /// Whether the set was skipped (excluded from aggregates, kept for audit)
    pub skipped: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// Ordinal of this set within its session, in source order
    pub position: u32,
}

impl NormalizedSet {
    /// Structural dedup key: an exact duplicate within the same session is
    /// skipped on import, while identical values in a different session are
    /// distinct records.
    #[must_use]
    pub fn dedup_key(&self, use_position: bool) -> SetDedupKey {
        SetDedupKey {
            exercise: self.exercise.clone(),
            series_type: self.series_type,
            reps: self.reps,
            weight_mg: self.weight_kg.map(weight_to_milligrams),
            position: use_position.then_some(self.position),
        }
    }

    /// Whether the set counts toward volume and 1RM aggregates
    #[must_use]
    pub const fn is_countable(&self) -> bool {
        !self.skipped
    }
}

/// Hashable structural identity of a set within one session.
///
/// Weight is keyed in integer milligrams so that `f64` never enters a hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetDedupKey {
    /// Canonical exercise name
    pub exercise: String,
    /// Series type
    pub series_type: SeriesType,
    /// Repetition count
    pub reps: Option<u32>,
    /// Weight in milligrams, `None` when the set has no weight
    pub weight_mg: Option<i64>,
    /// Position ordinal, `None` when position is excluded from the key
    pub position: Option<u32>,
}

fn weight_to_milligrams(weight_kg: f64) -> i64 {
    (weight_kg * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(weight: Option<f64>, reps: Option<u32>, position: u32) -> NormalizedSet {
        NormalizedSet {
            session_key: SessionKey {
                date: NaiveDate::from_ymd_opt(2025, 3, 27).unwrap(),
                start_time: None,
                training_name: Some("Push A".to_owned()),
            },
            exercise: "bench-press".to_owned(),
            series_type: SeriesType::Working,
            classification: ClassificationSource::Heuristic,
            reps,
            weight_kg: weight,
            skipped: false,
            notes: None,
            position,
        }
    }

    #[test]
    fn dedup_key_distinguishes_position() {
        let a = set(Some(80.0), Some(5), 3);
        let b = set(Some(80.0), Some(5), 4);
        assert_ne!(a.dedup_key(true), b.dedup_key(true));
        assert_eq!(a.dedup_key(false), b.dedup_key(false));
    }

    #[test]
    fn dedup_key_distinguishes_zero_weight_from_missing() {
        let bodyweight = set(Some(0.0), Some(12), 1);
        let missing = set(None, Some(12), 1);
        assert_ne!(bodyweight.dedup_key(true), missing.dedup_key(true));
    }

    #[test]
    fn session_key_display_is_stable() {
        let key = set(Some(80.0), Some(5), 1).session_key;
        assert_eq!(key.to_string(), "2025-03-27/-/Push A");
    }
}
