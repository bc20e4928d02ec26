// ABOUTME: Rolling progression indicators advancing session-by-session
// ABOUTME: Trailing volume windows, pct change, 1RM series and plateau signal
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Progression features.
//!
//! Rolling windows advance session-by-session, not calendar-day-by-day, so
//! irregular training frequency does not punch holes in the series: each
//! point is anchored at a session date and sums the trailing window ending
//! there. The plateau signal only exposes the per-session best-1RM time
//! series and a sessions-since-improvement count; classification thresholds
//! belong to the alerting collaborator.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use rackline_core::models::SessionSets;

use crate::one_rm::{average_estimate, eligible_lift};
use crate::volume::session_exercise_volume;

/// One point of a per-session series for an exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Session date anchoring the point
    pub date: NaiveDate,
    /// Value at this session
    pub value: f64,
}

/// One point of a trailing-window series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Session date the window ends at (inclusive)
    pub date: NaiveDate,
    /// Sum over the trailing window
    pub window_sum: f64,
    /// Percentage change against the previous session's window, `None` for
    /// the first point or a zero previous window
    pub change_pct: Option<f64>,
}

/// Per-session volume for one exercise, in session order.
///
/// Sessions where the exercise does not appear are omitted; `sessions` must
/// already be ordered by (date, `start_time`), as the store returns them.
#[must_use]
pub fn volume_series(sessions: &[SessionSets], exercise: &str) -> Vec<SeriesPoint> {
    sessions
        .iter()
        .filter_map(|session| {
            let volume = session_exercise_volume(session, exercise);
            session
                .sets
                .iter()
                .any(|set| set.exercise == exercise && !set.skipped)
                .then_some(SeriesPoint {
                    date: session.session.date,
                    value: volume,
                })
        })
        .collect()
}

/// Trailing `window_days` sums over a per-session series, advancing one
/// session at a time, with the percentage change between consecutive
/// windows.
#[must_use]
pub fn rolling_windows(series: &[SeriesPoint], window_days: u64) -> Vec<RollingPoint> {
    let mut points: Vec<RollingPoint> = Vec::with_capacity(series.len());
    for (index, point) in series.iter().enumerate() {
        let window_start = point
            .date
            .checked_sub_days(Days::new(window_days))
            .unwrap_or(point.date);
        // inclusive of the anchor date, exclusive of the day `window_days` back
        let window_sum: f64 = series[..=index]
            .iter()
            .filter(|p| p.date > window_start && p.date <= point.date)
            .map(|p| p.value)
            .sum();
        let change_pct = points.last().and_then(|previous: &RollingPoint| {
            (previous.window_sum.abs() > f64::EPSILON)
                .then(|| (window_sum / previous.window_sum - 1.0) * 100.0)
        });
        points.push(RollingPoint {
            date: point.date,
            window_sum,
            change_pct,
        });
    }
    points
}

/// Per-session best estimated 1RM for one exercise (mean of the defined
/// formulas, over eligible working sets only). Sessions without an eligible
/// set are omitted.
#[must_use]
pub fn one_rm_series(sessions: &[SessionSets], exercise: &str, max_reps: u32) -> Vec<SeriesPoint> {
    sessions
        .iter()
        .filter_map(|session| {
            let best = session
                .sets
                .iter()
                .filter(|set| set.exercise == exercise)
                .filter_map(|set| eligible_lift(set, max_reps))
                .filter_map(|(weight, reps)| average_estimate(weight, reps))
                .fold(None, |best: Option<f64>, estimate| {
                    Some(best.map_or(estimate, |b| b.max(estimate)))
                });
            best.map(|value| SeriesPoint {
                date: session.session.date,
                value,
            })
        })
        .collect()
}

/// Highest value across a series
#[must_use]
pub fn series_max(series: &[SeriesPoint]) -> Option<f64> {
    series
        .iter()
        .map(|point| point.value)
        .fold(None, |best, value| {
            Some(best.map_or(value, |b: f64| b.max(value)))
        })
}

/// Number of sessions since the running maximum last increased.
///
/// `0` means the latest session set a new best; a count of `k` means the
/// last `k` sessions failed to improve it. The alerting collaborator
/// compares this against its own configured window.
#[must_use]
pub fn sessions_since_improvement(series: &[SeriesPoint]) -> usize {
    let mut running_max = f64::NEG_INFINITY;
    let mut since = 0usize;
    for point in series {
        if point.value > running_max {
            running_max = point.value;
            since = 0;
        } else {
            since += 1;
        }
    }
    since
}
