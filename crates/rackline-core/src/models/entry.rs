// ABOUTME: Source-format-agnostic raw log entry produced by the record parsers
// ABOUTME: Carries untyped field tokens plus the source row index for error reporting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

/// One raw row/element from a workout-log export, before normalization.
///
/// Both the CSV and XML parsers produce this shape; nothing downstream of
/// the parsing boundary sees format-specific types. All fields keep their
/// source text verbatim (aside from non-breaking-space cleanup) so that
/// normalization failures can be reported against the original token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogEntry {
    /// 1-based row index in the source file, for error attribution
    pub source_row: usize,
    /// Session date in source format (e.g. "27/03/2025")
    pub date: Option<String>,
    /// Free-text workout name (e.g. "Push A")
    pub training_name: Option<String>,
    /// Session start time in source format (e.g. "18h30")
    pub time: Option<String>,
    /// Free-text exercise name, resolved later by the exercise mapper
    pub exercise_name: Option<String>,
    /// Muscle-region hint from the source, if any
    pub region_hint: Option<String>,
    /// Comma-separated primary muscle groups, if exported
    pub muscles_primary: Option<String>,
    /// Comma-separated secondary muscle groups, if exported
    pub muscles_secondary: Option<String>,
    /// Explicit series-type label from the source, if any
    pub series_type_hint: Option<String>,
    /// Repetition count in source format (e.g. "12 répétitions")
    pub reps: Option<String>,
    /// Weight in source format (e.g. "80,5 kg")
    pub weight: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Skipped-set flag in source format (e.g. "Oui")
    pub skipped_flag: Option<String>,
}

impl RawLogEntry {
    /// Whether the entry carries no usable payload at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.exercise_name.is_none()
            && self.reps.is_none()
            && self.weight.is_none()
    }
}
