// ABOUTME: Locale-aware field normalizers for French workout-log exports
// ABOUTME: Comma decimals, DD/MM/YYYY dates, unit suffixes, Oui/Non booleans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Pure conversion functions from locale-specific raw tokens to canonical
//! typed values.
//!
//! The source app exports French conventions: comma decimal separators,
//! non-breaking spaces around values, `DD/MM/YYYY` dates, unit suffixes
//! ("80,5 kg", "12 répétitions"), and `Oui`/`Non` booleans. Everything here
//! is a free function with no I/O so normalization failures stay attributable
//! to a single field of a single row.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use tracing::warn;

use crate::errors::{EtlError, EtlResult};

/// Date formats the source app has been observed to emit, tried in order
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

/// Time formats, including the French "18h30" spelling
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%H.%M"];

/// Replace non-breaking spaces (ordinary and narrow) and trim.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.replace(['\u{00a0}', '\u{202f}', '\u{feff}'], " ")
        .trim()
        .to_owned()
}

/// Clean a free-text field; empty and whitespace-only input becomes `None`.
#[must_use]
pub fn opt_text(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Convert a French-locale decimal token to `f64`.
///
/// Strips whitespace (including non-breaking spaces) and trailing unit
/// suffixes, then converts the comma decimal separator: `"80,5 kg"` → `80.5`.
/// A value with several commas keeps the first two segments (`"12,5,5"` →
/// `12.5`), matching the source app's occasional double-comma exports.
///
/// # Errors
/// Returns [`EtlError::MalformedNumber`] on empty input, non-numeric
/// residue, or a negative value.
pub fn normalize_decimal(raw: &str) -> EtlResult<f64> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Err(malformed_number(raw, "empty value"));
    }

    // Collapse internal whitespace (thousands separators in French exports),
    // then drop the trailing unit word: "80,5kg" -> "80,5".
    let compact: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
    let stripped = compact.trim_end_matches(|c: char| c.is_alphabetic());
    if stripped.is_empty() {
        return Err(malformed_number(raw, "no numeric part"));
    }

    let mut segments = stripped.split(',');
    let int_part = segments.next().unwrap_or_default();
    let dotted = match segments.next() {
        Some(frac) => format!(
            "{}.{}",
            if int_part.is_empty() { "0" } else { int_part },
            if frac.is_empty() { "0" } else { frac }
        ),
        None => int_part.to_owned(),
    };

    let value: f64 = dotted
        .parse()
        .map_err(|_| malformed_number(raw, "non-numeric residue"))?;
    if value < 0.0 {
        return Err(malformed_number(raw, "negative value"));
    }
    Ok(value)
}

/// Format a decimal the way the source app does (comma separator, two
/// fraction digits). Inverse of [`normalize_decimal`] for values with at
/// most two fraction digits.
#[must_use]
pub fn format_decimal(value: f64) -> String {
    format!("{value:.2}").replace('.', ",")
}

/// Parse a source date (`DD/MM/YYYY` and tolerated variants) into a
/// canonical [`NaiveDate`].
///
/// # Errors
/// Returns [`EtlError::MalformedDate`] when no accepted format matches,
/// including out-of-range day or month components.
pub fn normalize_date(raw: &str) -> EtlResult<NaiveDate> {
    let cleaned = clean_text(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .ok_or_else(|| EtlError::MalformedDate {
            value: raw.to_owned(),
        })
}

/// Parse a source time-of-day (`HH:MM`, `HH:MM:SS`, `HH.MM`, or the French
/// `18h30` spelling).
///
/// # Errors
/// Returns [`EtlError::MalformedTime`] when no accepted format matches.
pub fn normalize_time(raw: &str) -> EtlResult<NaiveTime> {
    let cleaned = clean_text(raw);
    // "18h30" is the spelled-out French form; rewrite it once rather than
    // carrying a dedicated format string.
    let candidate = if cleaned.chars().filter(|c| *c == 'h').count() == 1
        && cleaned.chars().all(|c| c.is_ascii_digit() || c == 'h')
    {
        cleaned.replace('h', ":")
    } else {
        cleaned
    };

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&candidate, fmt).ok())
        .ok_or_else(|| EtlError::MalformedTime {
            value: raw.to_owned(),
        })
}

/// Parse a repetition count.
///
/// Empty or whitespace-only input is `Ok(None)` (missing reps, never an
/// error). Digits with a textual suffix keep the leading run:
/// `"12 répétitions"` → `Some(12)`.
///
/// # Errors
/// Returns [`EtlError::MalformedNumber`] only for non-numeric non-empty
/// input.
pub fn normalize_int(raw: &str) -> EtlResult<Option<u32>> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Ok(None);
    }

    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return Err(malformed_number(raw, "no digits"));
    }
    digits
        .parse()
        .map(Some)
        .map_err(|_| malformed_number(raw, "value out of range"))
}

/// Parse a French boolean token (`Oui`/`Non`, plus the English and numeric
/// spellings the source app tolerates). Unrecognized non-empty tokens read
/// as `false` with a warning rather than failing the row.
#[must_use]
pub fn normalize_bool(raw: &str) -> bool {
    let cleaned = clean_text(raw).to_lowercase();
    match cleaned.as_str() {
        "oui" | "yes" | "true" | "vrai" | "1" => true,
        "" | "non" | "no" | "false" | "faux" | "0" => false,
        other => {
            warn!(token = other, "unrecognized boolean token, reading as false");
            false
        }
    }
}

/// Split a comma-separated muscle-group list into a cleaned set.
#[must_use]
pub fn normalize_muscle_list(raw: &str) -> BTreeSet<String> {
    clean_text(raw)
        .split(',')
        .filter_map(opt_text)
        .collect()
}

/// Lowercase and strip French diacritics for insensitive comparisons
/// ("Développé Couché" → "developpe couche").
#[must_use]
pub fn fold_accents(raw: &str) -> String {
    clean_text(raw)
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'ç' => 'c',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ÿ' => 'y',
            'œ' => 'o',
            other => other,
        })
        .collect()
}

fn malformed_number(raw: &str, reason: &'static str) -> EtlError {
    EtlError::MalformedNumber {
        value: raw.to_owned(),
        reason,
    }
}
