// ABOUTME: Warm-up / working / recovery classification for parsed sets
// ABOUTME: Explicit source labels win; otherwise a ramp-to-max heuristic decides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Set classification.
//!
//! Priority order: an explicit, recognized series-type label from the
//! source wins outright. Otherwise sets preceding the heaviest set of the
//! same exercise in the session are warm-ups when they sit below the
//! configured fraction of that maximum, or when they form the ascending
//! ramp leading up to it; everything from the first maximum-weight set
//! onward is working. Skipped sets bypass classification entirely and are
//! excluded from aggregates but retained for audit. A zero-weight set for a
//! body-weight exercise is a valid working set, not missing data.
//!
//! Every result carries a [`ClassificationSource`] so callers can
//! distinguish "classified with heuristic" from "explicit source label".

use std::collections::HashMap;

use tracing::debug;

use rackline_core::config::ClassifierConfig;
use rackline_core::errors::EtlError;
use rackline_core::models::{ClassificationSource, SeriesType};

use crate::normalize::fold_accents;

/// Input to classification: one parsed set before its series type is known
#[derive(Debug, Clone)]
pub struct SetDraft {
    /// Canonical exercise name (already mapped)
    pub exercise: String,
    /// Weight in kilograms, if the source carried one
    pub weight_kg: Option<f64>,
    /// Whether the set was skipped
    pub skipped: bool,
    /// Raw series-type label from the source, if any
    pub series_type_hint: Option<String>,
}

/// Classification result for one set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    /// Assigned series type
    pub series_type: SeriesType,
    /// How the assignment was made
    pub source: ClassificationSource,
}

/// Heuristic set classifier, configured at construction
#[derive(Debug, Clone)]
pub struct SetClassifier {
    config: ClassifierConfig,
}

impl Default for SetClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl SetClassifier {
    /// Create a classifier with the given tunables
    #[must_use]
    pub const fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Recognize an explicit series-type label from the source vocabulary
    /// (French and English spellings). Warm-up and recovery wordings are
    /// checked before the bare "série", which the source app also uses as
    /// its generic working-set label.
    #[must_use]
    pub fn parse_explicit(label: &str) -> Option<SeriesType> {
        let folded = fold_accents(label);
        if folded.is_empty() {
            return None;
        }
        if folded.contains("echauffement") || folded.contains("warm") {
            return Some(SeriesType::Warmup);
        }
        if folded.contains("recuperation")
            || folded.contains("recovery")
            || folded.contains("cooldown")
        {
            return Some(SeriesType::Recovery);
        }
        if folded.contains("principale") || folded.contains("working") || folded.contains("serie") {
            return Some(SeriesType::Working);
        }
        None
    }

    /// Classify all sets of one session, in source order.
    ///
    /// Returns one [`Classified`] per draft, index-aligned with the input.
    #[must_use]
    pub fn classify_session(&self, drafts: &[SetDraft]) -> Vec<Classified> {
        let mut results: Vec<Option<Classified>> = vec![None; drafts.len()];

        // Explicit labels and skipped sets are settled before the heuristic.
        for (index, draft) in drafts.iter().enumerate() {
            match draft.series_type_hint.as_deref() {
                Some(label) => match Self::parse_explicit(label) {
                    Some(series_type) => {
                        results[index] = Some(Classified {
                            series_type,
                            source: ClassificationSource::Explicit,
                        });
                    }
                    None => {
                        // Recoverable: the heuristic takes over, flagged as
                        // a fallback so the provenance stays observable.
                        let error = EtlError::UnrecognizedSeriesType {
                            value: label.to_owned(),
                        };
                        debug!(%error, "using heuristic for unrecognized label");
                        if draft.skipped {
                            results[index] = Some(Classified {
                                series_type: SeriesType::Working,
                                source: ClassificationSource::Fallback,
                            });
                        }
                    }
                },
                None if draft.skipped => {
                    // Skipped sets bypass classification; they are retained
                    // for audit with a nominal working label.
                    results[index] = Some(Classified {
                        series_type: SeriesType::Working,
                        source: ClassificationSource::Heuristic,
                    });
                }
                None => {}
            }
        }

        // Group the remaining sets by exercise, preserving session order.
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, draft) in drafts.iter().enumerate() {
            if !draft.skipped {
                groups.entry(draft.exercise.as_str()).or_default().push(index);
            }
        }

        for indexes in groups.values() {
            self.classify_group(drafts, indexes, &mut results);
        }

        results
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    // A labeled-but-unrecognized, non-skipped set whose group
                    // heuristic could not run (no usable weights).
                    let fallback = drafts[index].series_type_hint.is_some();
                    Classified {
                        series_type: SeriesType::Working,
                        source: if fallback {
                            ClassificationSource::Fallback
                        } else {
                            ClassificationSource::Heuristic
                        },
                    }
                })
            })
            .collect()
    }

    /// Apply the warm-up heuristic to one (session, exercise) group.
    fn classify_group(
        &self,
        drafts: &[SetDraft],
        indexes: &[usize],
        results: &mut [Option<Classified>],
    ) {
        let weights: Vec<f64> = indexes
            .iter()
            .map(|&i| drafts[i].weight_kg.unwrap_or(0.0))
            .collect();
        let max_weight = weights.iter().copied().fold(0.0_f64, f64::max);
        let first_max = weights
            .iter()
            .position(|&w| (w - max_weight).abs() < f64::EPSILON)
            .unwrap_or(0);
        let threshold = self.config.warmup_fraction * max_weight;

        let mut warmups_assigned = 0u32;
        let mut previous_weight = 0.0_f64;
        for (ordinal, &index) in indexes.iter().enumerate() {
            let weight = weights[ordinal];
            if results[index].is_none() {
                let capped = self
                    .config
                    .max_warmup_sets
                    .is_some_and(|cap| warmups_assigned >= cap);
                let before_top_set = ordinal < first_max;
                let below_threshold = weight < threshold;
                let ascending_ramp = weight < max_weight && weight >= previous_weight;
                let series_type = if before_top_set
                    && !capped
                    && (below_threshold || ascending_ramp)
                {
                    SeriesType::Warmup
                } else {
                    SeriesType::Working
                };
                if series_type == SeriesType::Warmup {
                    warmups_assigned += 1;
                }
                let fallback = drafts[index].series_type_hint.is_some();
                results[index] = Some(Classified {
                    series_type,
                    source: if fallback {
                        ClassificationSource::Fallback
                    } else {
                        ClassificationSource::Heuristic
                    },
                });
            }
            previous_weight = weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(exercise: &str, weight: Option<f64>) -> SetDraft {
        SetDraft {
            exercise: exercise.to_owned(),
            weight_kg: weight,
            skipped: false,
            series_type_hint: None,
        }
    }

    #[test]
    fn ramp_to_top_set_is_warmup_then_working() {
        // 40kg×10, 60kg×8, 80kg×5, 80kg×5 -> warmup, warmup, working, working
        let classifier = SetClassifier::default();
        let drafts = vec![
            draft("bench-press", Some(40.0)),
            draft("bench-press", Some(60.0)),
            draft("bench-press", Some(80.0)),
            draft("bench-press", Some(80.0)),
        ];
        let classified = classifier.classify_session(&drafts);
        let types: Vec<SeriesType> = classified.iter().map(|c| c.series_type).collect();
        assert_eq!(
            types,
            vec![
                SeriesType::Warmup,
                SeriesType::Warmup,
                SeriesType::Working,
                SeriesType::Working,
            ]
        );
        assert!(classified
            .iter()
            .all(|c| c.source == ClassificationSource::Heuristic));
    }

    #[test]
    fn explicit_label_wins_over_heuristic() {
        let classifier = SetClassifier::default();
        let mut light = draft("squat", Some(40.0));
        light.series_type_hint = Some("Série".to_owned());
        let drafts = vec![light, draft("squat", Some(100.0))];
        let classified = classifier.classify_session(&drafts);
        assert_eq!(classified[0].series_type, SeriesType::Working);
        assert_eq!(classified[0].source, ClassificationSource::Explicit);
    }

    #[test]
    fn warmup_wording_beats_generic_serie_substring() {
        assert_eq!(
            SetClassifier::parse_explicit("Série d'échauffement"),
            Some(SeriesType::Warmup)
        );
        assert_eq!(
            SetClassifier::parse_explicit("Série de récupération"),
            Some(SeriesType::Recovery)
        );
        assert_eq!(
            SetClassifier::parse_explicit("Série"),
            Some(SeriesType::Working)
        );
        assert_eq!(SetClassifier::parse_explicit("pyramide"), None);
    }

    #[test]
    fn unrecognized_label_falls_back_to_heuristic_with_flag() {
        let classifier = SetClassifier::default();
        let mut odd = draft("squat", Some(100.0));
        odd.series_type_hint = Some("pyramide".to_owned());
        let classified = classifier.classify_session(&[odd]);
        assert_eq!(classified[0].series_type, SeriesType::Working);
        assert_eq!(classified[0].source, ClassificationSource::Fallback);
    }

    #[test]
    fn skipped_sets_bypass_classification() {
        let classifier = SetClassifier::default();
        let mut skipped = draft("deadlift", Some(40.0));
        skipped.skipped = true;
        let drafts = vec![skipped, draft("deadlift", Some(180.0))];
        let classified = classifier.classify_session(&drafts);
        // The skipped 40kg set must not count as the warm-up ramp.
        assert_eq!(classified[1].series_type, SeriesType::Working);
    }

    #[test]
    fn bodyweight_zero_weight_sets_are_working() {
        let classifier = SetClassifier::default();
        let drafts = vec![
            draft("pull-up", Some(0.0)),
            draft("pull-up", Some(0.0)),
            draft("pull-up", Some(0.0)),
        ];
        let classified = classifier.classify_session(&drafts);
        assert!(classified
            .iter()
            .all(|c| c.series_type == SeriesType::Working));
    }

    #[test]
    fn descending_set_above_threshold_is_working() {
        // 70, 60, 80: 60 breaks the ascending ramp and sits above 60% of 80.
        let classifier = SetClassifier::default();
        let drafts = vec![
            draft("row", Some(70.0)),
            draft("row", Some(60.0)),
            draft("row", Some(80.0)),
        ];
        let classified = classifier.classify_session(&drafts);
        assert_eq!(classified[0].series_type, SeriesType::Warmup);
        assert_eq!(classified[1].series_type, SeriesType::Working);
        assert_eq!(classified[2].series_type, SeriesType::Working);
    }

    #[test]
    fn warmup_cap_limits_heuristic_assignments() {
        let classifier = SetClassifier::new(ClassifierConfig {
            warmup_fraction: 0.60,
            max_warmup_sets: Some(1),
        });
        let drafts = vec![
            draft("press", Some(20.0)),
            draft("press", Some(30.0)),
            draft("press", Some(60.0)),
        ];
        let classified = classifier.classify_session(&drafts);
        assert_eq!(classified[0].series_type, SeriesType::Warmup);
        assert_eq!(classified[1].series_type, SeriesType::Working);
    }
}
