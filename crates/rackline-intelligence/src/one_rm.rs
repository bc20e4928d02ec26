// ABOUTME: Estimated one-rep-max formulas with their published domain limits
// ABOUTME: Epley, Brzycki, Lander, O'Conner plus mean and weighted aggregates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! One-rep-max estimation.
//!
//! Four published regression formulas. Brzycki is undefined from 37 reps
//! (zero/negative denominator) and Lander from 38; those sets simply drop
//! out of the affected formula rather than producing a nonsense estimate.
//! Callers restrict input to working sets at low rep counts: all of these
//! formulas degrade well before 37 reps, which is why the feature
//! calculator caps eligibility at a configured maximum (default 10).

use rackline_core::models::{NormalizedSet, SeriesType};

/// A published 1RM estimation formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneRmFormula {
    /// `weight × (1 + reps/30)`
    Epley,
    /// `weight × 36 / (37 − reps)`, undefined at 37+ reps
    Brzycki,
    /// `100 × weight / (101.3 − 2.67123 × reps)`, undefined at 38+ reps
    Lander,
    /// `weight × (1 + 0.025 × reps)`
    OConner,
}

impl OneRmFormula {
    /// All formulas, in the order aggregates average them
    pub const ALL: [Self; 4] = [Self::Epley, Self::Brzycki, Self::Lander, Self::OConner];

    /// Estimate the 1RM for a lift of `weight_kg` × `reps`.
    ///
    /// Returns `None` outside the formula's domain (zero reps, zero or
    /// negative weight, or a rep count past the formula's pole).
    #[must_use]
    pub fn estimate(self, weight_kg: f64, reps: u32) -> Option<f64> {
        if weight_kg <= 0.0 || reps == 0 {
            return None;
        }
        let r = f64::from(reps);
        match self {
            Self::Epley => Some(weight_kg * (1.0 + r / 30.0)),
            Self::Brzycki => (reps < 37).then(|| weight_kg * 36.0 / (37.0 - r)),
            Self::Lander => (reps < 38).then(|| 100.0 * weight_kg / (101.3 - 2.67123 * r)),
            Self::OConner => Some(weight_kg * (1.0 + 0.025 * r)),
        }
    }
}

/// Mean of the formulas defined at this rep count.
#[must_use]
pub fn average_estimate(weight_kg: f64, reps: u32) -> Option<f64> {
    let estimates: Vec<f64> = OneRmFormula::ALL
        .iter()
        .filter_map(|formula| formula.estimate(weight_kg, reps))
        .collect();
    if estimates.is_empty() {
        None
    } else {
        Some(estimates.iter().sum::<f64>() / estimates.len() as f64)
    }
}

/// Weighted average favoring the two most reliable formulas:
/// `0.4 × Epley + 0.4 × Brzycki + 0.2 × mean(Lander, O'Conner)`.
/// Defined only where all four formulas are.
#[must_use]
pub fn weighted_estimate(weight_kg: f64, reps: u32) -> Option<f64> {
    let epley = OneRmFormula::Epley.estimate(weight_kg, reps)?;
    let brzycki = OneRmFormula::Brzycki.estimate(weight_kg, reps)?;
    let lander = OneRmFormula::Lander.estimate(weight_kg, reps)?;
    let oconner = OneRmFormula::OConner.estimate(weight_kg, reps)?;
    Some(0.4 * epley + 0.4 * brzycki + 0.2 * (lander + oconner) / 2.0)
}

/// The (weight, reps) pair of a set that may enter 1RM aggregates: a
/// non-skipped working set with positive weight at or below the rep cap.
#[must_use]
pub fn eligible_lift(set: &NormalizedSet, max_reps: u32) -> Option<(f64, u32)> {
    if set.skipped || set.series_type != SeriesType::Working {
        return None;
    }
    let weight = set.weight_kg.filter(|w| *w > 0.0)?;
    let reps = set.reps.filter(|r| (1..=max_reps).contains(r))?;
    Some((weight, reps))
}
