// ABOUTME: Query facade emitting DerivedFeatureRecords per exercise and date range
// ABOUTME: Read-only over persisted sessions; fans out across exercises with rayon
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Feature calculator.
//!
//! The analytics/API collaborator queries by exercise name and date range
//! and receives [`DerivedFeatureRecord`]s. All functions are pure over the
//! session slice handed in (as returned by the store, ordered by date and
//! start time); per-exercise computation is independent, so the all-exercise
//! sweep runs on rayon.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use rackline_core::config::FeatureConfig;
use rackline_core::models::{DerivedFeatureRecord, FeatureWindow, Metric, SessionSets};

use crate::progression::{
    one_rm_series, rolling_windows, sessions_since_improvement, series_max, volume_series,
    SeriesPoint,
};
use crate::volume::session_volume;

/// Read-only derived-feature queries over persisted sessions
#[derive(Debug, Clone, Default)]
pub struct FeatureCalculator {
    config: FeatureConfig,
}

impl FeatureCalculator {
    /// Create a calculator with the given tunables
    #[must_use]
    pub const fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// All derived features for one exercise.
    ///
    /// Emits per-session volume and best-1RM points, trailing 7- and 30-day
    /// volume windows with their percentage change, and the historical
    /// best / current 1RM summary records.
    #[must_use]
    pub fn exercise_features(
        &self,
        sessions: &[SessionSets],
        exercise: &str,
    ) -> Vec<DerivedFeatureRecord> {
        let mut records = Vec::new();

        let volumes = volume_series(sessions, exercise);
        for point in &volumes {
            records.push(record(
                exercise,
                Metric::SessionVolume,
                point.value,
                FeatureWindow::single_day(point.date),
            ));
        }

        for (metric, days) in [(Metric::RollingVolume7d, 7), (Metric::RollingVolume30d, 30)] {
            for rolled in rolling_windows(&volumes, days) {
                let window = FeatureWindow {
                    start: rolled
                        .date
                        .checked_sub_days(chrono::Days::new(days))
                        .unwrap_or(rolled.date),
                    end: rolled.date,
                };
                records.push(record(exercise, metric, rolled.window_sum, window));
                if metric == Metric::RollingVolume7d {
                    if let Some(pct) = rolled.change_pct {
                        records.push(record(exercise, Metric::RollingVolumeChangePct, pct, window));
                    }
                }
            }
        }

        let one_rms = one_rm_series(sessions, exercise, self.config.one_rm_max_reps);
        for point in &one_rms {
            records.push(record(
                exercise,
                Metric::SessionBestOneRm,
                point.value,
                FeatureWindow::single_day(point.date),
            ));
        }
        if let (Some(first), Some(last)) = (one_rms.first(), one_rms.last()) {
            let full_range = FeatureWindow {
                start: first.date,
                end: last.date,
            };
            if let Some(best) = series_max(&one_rms) {
                records.push(record(exercise, Metric::BestOneRm, best, full_range));
            }
            // current 1RM: the computation restricted to the most recent
            // session containing this exercise
            records.push(record(
                exercise,
                Metric::CurrentOneRm,
                last.value,
                FeatureWindow::single_day(last.date),
            ));
        }

        debug!(
            exercise,
            records = records.len(),
            "derived exercise features"
        );
        records
    }

    /// The per-session best-1RM time series consumed by the plateau/alerting
    /// collaborator, which owns the classification threshold.
    #[must_use]
    pub fn plateau_series(&self, sessions: &[SessionSets], exercise: &str) -> Vec<SeriesPoint> {
        one_rm_series(sessions, exercise, self.config.one_rm_max_reps)
    }

    /// Sessions since the exercise's best 1RM last improved
    #[must_use]
    pub fn plateau_age(&self, sessions: &[SessionSets], exercise: &str) -> usize {
        sessions_since_improvement(&self.plateau_series(sessions, exercise))
    }

    /// Whether the best 1RM has failed to improve for at least the
    /// configured window of sessions. The alerting collaborator may apply
    /// its own threshold to [`FeatureCalculator::plateau_age`] instead.
    #[must_use]
    pub fn is_plateaued(&self, sessions: &[SessionSets], exercise: &str) -> bool {
        self.plateau_age(sessions, exercise) >= self.config.plateau_window_sessions
    }

    /// Total session volumes (all exercises), one record per session
    #[must_use]
    pub fn session_volumes(sessions: &[SessionSets]) -> Vec<(SessionSets, f64)> {
        sessions
            .iter()
            .map(|session| (session.clone(), session_volume(session)))
            .collect()
    }

    /// Derived features for every exercise present in the sessions.
    ///
    /// Feature derivation is read-only and independent per exercise, so the
    /// sweep fans out across a rayon pool.
    #[must_use]
    pub fn all_features(&self, sessions: &[SessionSets]) -> Vec<DerivedFeatureRecord> {
        let exercises: BTreeSet<&str> = sessions
            .iter()
            .flat_map(|session| session.sets.iter().map(|set| set.exercise.as_str()))
            .collect();

        exercises
            .into_par_iter()
            .flat_map(|exercise| self.exercise_features(sessions, exercise))
            .collect()
    }
}

fn record(exercise: &str, metric: Metric, value: f64, window: FeatureWindow) -> DerivedFeatureRecord {
    DerivedFeatureRecord {
        exercise: exercise.to_owned(),
        metric,
        value,
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rackline_core::models::{
        ClassificationSource, NormalizedSet, SeriesType, Session, SessionKey,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn session_with(
        d: u32,
        sets: Vec<(&str, SeriesType, Option<f64>, Option<u32>, bool)>,
    ) -> SessionSets {
        let date = day(d);
        let key = SessionKey {
            date,
            start_time: None,
            training_name: Some("Push".to_owned()),
        };
        SessionSets {
            session: Session {
                date,
                start_time: None,
                training_name: Some("Push".to_owned()),
                notes: None,
            },
            sets: sets
                .into_iter()
                .enumerate()
                .map(|(i, (exercise, series_type, weight, reps, skipped))| NormalizedSet {
                    session_key: key.clone(),
                    exercise: exercise.to_owned(),
                    series_type,
                    classification: ClassificationSource::Heuristic,
                    reps,
                    weight_kg: weight,
                    skipped,
                    notes: None,
                    position: i as u32 + 1,
                })
                .collect(),
        }
    }

    fn history() -> Vec<SessionSets> {
        vec![
            session_with(
                1,
                vec![
                    ("bench-press", SeriesType::Warmup, Some(40.0), Some(10), false),
                    ("bench-press", SeriesType::Working, Some(80.0), Some(8), false),
                ],
            ),
            session_with(
                8,
                vec![
                    ("bench-press", SeriesType::Working, Some(82.5), Some(8), false),
                    ("bench-press", SeriesType::Working, Some(82.5), Some(8), true),
                ],
            ),
            session_with(
                15,
                vec![("bench-press", SeriesType::Working, Some(80.0), Some(8), false)],
            ),
        ]
    }

    #[test]
    fn best_and_current_one_rm_differ_after_regression() {
        let calc = FeatureCalculator::default();
        let records = calc.exercise_features(&history(), "bench-press");

        let best = records
            .iter()
            .find(|r| r.metric == Metric::BestOneRm)
            .unwrap();
        let current = records
            .iter()
            .find(|r| r.metric == Metric::CurrentOneRm)
            .unwrap();
        // best came from the 82.5kg session; current from the last (80kg) one
        assert!(best.value > current.value);
        assert_eq!(current.window.end, day(15));
    }

    #[test]
    fn skipped_sets_never_enter_aggregates() {
        let calc = FeatureCalculator::default();
        let sessions = vec![session_with(
            1,
            vec![
                ("squat", SeriesType::Working, Some(100.0), Some(5), false),
                ("squat", SeriesType::Working, Some(200.0), Some(5), true),
            ],
        )];
        let records = calc.exercise_features(&sessions, "squat");

        let volume = records
            .iter()
            .find(|r| r.metric == Metric::SessionVolume)
            .unwrap();
        assert!((volume.value - 500.0).abs() < f64::EPSILON);

        // the skipped 200kg set must not inflate the 1RM either
        let best = records.iter().find(|r| r.metric == Metric::BestOneRm).unwrap();
        assert!(best.value < 150.0);
    }

    #[test]
    fn warmups_are_excluded_from_one_rm_but_counted_in_volume() {
        let calc = FeatureCalculator::default();
        let sessions = vec![session_with(
            1,
            vec![
                ("bench-press", SeriesType::Warmup, Some(40.0), Some(10), false),
                ("bench-press", SeriesType::Working, Some(80.0), Some(8), false),
            ],
        )];
        let records = calc.exercise_features(&sessions, "bench-press");

        let volume = records
            .iter()
            .find(|r| r.metric == Metric::SessionVolume)
            .unwrap();
        // 40×10 + 80×8
        assert!((volume.value - 1040.0).abs() < f64::EPSILON);

        let one_rm = records
            .iter()
            .find(|r| r.metric == Metric::SessionBestOneRm)
            .unwrap();
        // mean of the four formulas at 80×8 is just under 100kg; a warm-up
        // derived estimate from 40×10 would sit near 53
        assert!(one_rm.value > 95.0 && one_rm.value < 105.0);
    }

    #[test]
    fn rolling_records_cover_both_windows() {
        let calc = FeatureCalculator::default();
        let records = calc.all_features(&history());
        assert!(records.iter().any(|r| r.metric == Metric::RollingVolume7d));
        assert!(records.iter().any(|r| r.metric == Metric::RollingVolume30d));
        assert!(records
            .iter()
            .any(|r| r.metric == Metric::RollingVolumeChangePct));
    }

    #[test]
    fn plateau_age_counts_sessions_without_new_best() {
        let calc = FeatureCalculator::default();
        // bests: session 1 ~99.7, session 8 ~102.8, session 15 ~99.7
        assert_eq!(calc.plateau_age(&history(), "bench-press"), 1);
        // one stale session is below the default window of five
        assert!(!calc.is_plateaued(&history(), "bench-press"));

        let strict = FeatureCalculator::new(rackline_core::config::FeatureConfig {
            one_rm_max_reps: 10,
            plateau_window_sessions: 1,
        });
        assert!(strict.is_plateaued(&history(), "bench-press"));
    }
}
