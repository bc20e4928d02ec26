// ABOUTME: Free-text exercise name resolution against the canonical catalog
// ABOUTME: Exact, accent-insensitive, alias, and edit-distance rungs with conservative fallback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Exercise mapper.
//!
//! Resolution ladder: exact catalog match → case/accent-insensitive match →
//! alias table → edit-distance candidates (ambiguity broken by longest
//! common prefix, ties logged for manual review and sent to the fallback) →
//! registration of a new catalog entry with unknown region. A set is never
//! dropped because its exercise name is unrecognized.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use rackline_core::config::MapperConfig;
use rackline_core::errors::EtlError;
use rackline_core::models::ExerciseCatalogEntry;

use crate::normalize::{clean_text, fold_accents, normalize_muscle_list};

/// Alias spellings the source app uses for catalog exercises (folded form)
const ALIAS_TABLE: &[(&str, &str)] = &[
    ("traction a la barre fixe", "pull-up"),
    ("tractions barre fixe", "pull-up"),
    ("traction", "pull-up"),
    ("tractions", "pull-up"),
    ("pull-up", "pull-up"),
    ("developpe couche", "bench-press"),
    ("bench press", "bench-press"),
    ("developpe", "bench-press"),
    ("squat a la barre", "squat"),
    ("squat arriere", "back-squat"),
    ("souleve de terre", "deadlift"),
    ("developpe militaire", "overhead-press"),
    ("overhead press", "overhead-press"),
    ("curl biceps", "bicep-curl"),
    ("curl halteres", "bicep-curl"),
    ("curl", "bicep-curl"),
    ("pompes", "push-up"),
    ("push-up", "push-up"),
];

/// Region spellings mapped to canonical regions (folded substring match)
const REGION_TABLE: &[(&str, &str)] = &[
    ("dos", "Back"),
    ("back", "Back"),
    ("pectoraux", "Chest"),
    ("chest", "Chest"),
    ("pecs", "Chest"),
    ("jambes", "Legs"),
    ("legs", "Legs"),
    ("quadriceps", "Legs"),
    ("ischio", "Legs"),
    ("epaules", "Shoulders"),
    ("shoulders", "Shoulders"),
    ("deltoides", "Shoulders"),
    ("bras", "Arms"),
    ("arms", "Arms"),
    ("biceps", "Arms"),
    ("triceps", "Arms"),
    ("abdominaux", "Core"),
    ("core", "Core"),
    ("abs", "Core"),
];

/// Catalog exercises seeded for a fresh install, matching the alias targets
const SEED_CATALOG: &[(&str, &str)] = &[
    ("pull-up", "Back"),
    ("bench-press", "Chest"),
    ("squat", "Legs"),
    ("back-squat", "Legs"),
    ("deadlift", "Back"),
    ("overhead-press", "Shoulders"),
    ("bicep-curl", "Arms"),
    ("dips", "Chest"),
    ("push-up", "Chest"),
];

/// Which rung of the ladder resolved a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Verbatim catalog hit
    Exact,
    /// Case/accent-insensitive catalog hit
    Insensitive,
    /// Alias-table hit
    Alias,
    /// Single edit-distance candidate (or prefix-disambiguated)
    Fuzzy,
    /// No match; a new catalog entry was registered
    Registered,
}

/// A resolved exercise name with its resolution provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical catalog name
    pub canonical: String,
    /// Which ladder rung produced it
    pub outcome: ResolutionOutcome,
}

/// Exercise-name resolver over an in-memory catalog view.
///
/// The catalog is loaded from the store at pipeline start; entries
/// registered during a run are retrieved with [`ExerciseMapper::take_new_entries`]
/// and persisted by the pipeline.
#[derive(Debug)]
pub struct ExerciseMapper {
    config: MapperConfig,
    /// Canonical name → entry
    catalog: BTreeMap<String, ExerciseCatalogEntry>,
    /// Folded alias → canonical name
    aliases: HashMap<String, String>,
    /// Canonical names registered during this run, in first-seen order
    new_entries: Vec<String>,
}

impl ExerciseMapper {
    /// Create a mapper over an existing catalog
    #[must_use]
    pub fn new(config: MapperConfig, entries: Vec<ExerciseCatalogEntry>) -> Self {
        let catalog = entries
            .into_iter()
            .map(|e| (e.canonical_name.clone(), e))
            .collect();
        let aliases = ALIAS_TABLE
            .iter()
            .map(|&(alias, canonical)| (alias.to_owned(), canonical.to_owned()))
            .collect();
        Self {
            config,
            catalog,
            aliases,
            new_entries: Vec::new(),
        }
    }

    /// Create a mapper with the seed catalog used on fresh installs
    #[must_use]
    pub fn with_seed_catalog(config: MapperConfig) -> Self {
        let entries = SEED_CATALOG
            .iter()
            .map(|&(name, region)| ExerciseCatalogEntry {
                canonical_name: name.to_owned(),
                main_region: Some(region.to_owned()),
                muscles_primary: std::collections::BTreeSet::new(),
                muscles_secondary: std::collections::BTreeSet::new(),
            })
            .collect();
        Self::new(config, entries)
    }

    /// Resolve a free-text exercise name, registering it when unknown.
    ///
    /// The region hint and muscle lists are only used when a new entry has
    /// to be registered; known catalog entries are never mutated here.
    pub fn resolve(
        &mut self,
        raw_name: &str,
        region_hint: Option<&str>,
        muscles_primary: Option<&str>,
        muscles_secondary: Option<&str>,
    ) -> Resolution {
        let cleaned = clean_text(raw_name);
        let folded = fold_accents(&cleaned);

        if self.catalog.contains_key(&cleaned) {
            return Resolution {
                canonical: cleaned,
                outcome: ResolutionOutcome::Exact,
            };
        }

        if let Some(name) = self
            .catalog
            .keys()
            .find(|name| fold_accents(name) == folded)
        {
            return Resolution {
                canonical: name.clone(),
                outcome: ResolutionOutcome::Insensitive,
            };
        }

        if let Some(canonical) = self.aliases.get(&folded) {
            return Resolution {
                canonical: canonical.clone(),
                outcome: ResolutionOutcome::Alias,
            };
        }

        if let Some(canonical) = self.fuzzy_match(&cleaned, &folded) {
            return Resolution {
                canonical,
                outcome: ResolutionOutcome::Fuzzy,
            };
        }

        Resolution {
            canonical: self.register(&cleaned, &folded, region_hint, muscles_primary, muscles_secondary),
            outcome: ResolutionOutcome::Registered,
        }
    }

    /// Candidates within the edit-distance threshold; ambiguity is broken by
    /// longest common prefix, and unresolved ties go to the conservative
    /// fallback (logged, never auto-resolved).
    fn fuzzy_match(&self, cleaned: &str, folded: &str) -> Option<String> {
        let threshold = self.config.edit_distance_threshold;
        let candidates: Vec<&String> = self
            .catalog
            .keys()
            .filter(|name| levenshtein(&fold_accents(name), folded) <= threshold)
            .collect();

        match candidates.as_slice() {
            [] => None,
            [single] => {
                debug!(raw = cleaned, canonical = %single, "fuzzy exercise match");
                Some((*single).clone())
            }
            many => {
                let best_len = many
                    .iter()
                    .map(|name| common_prefix_len(&fold_accents(name), folded))
                    .max()
                    .unwrap_or(0);
                let best: Vec<&&String> = many
                    .iter()
                    .filter(|name| common_prefix_len(&fold_accents(name), folded) == best_len)
                    .collect();
                if let [winner] = best.as_slice() {
                    debug!(
                        raw = cleaned,
                        canonical = %winner,
                        "ambiguous match resolved by longest common prefix"
                    );
                    Some((**winner).clone())
                } else {
                    // Recoverable: logged for manual review, never
                    // auto-resolved.
                    let error = EtlError::AmbiguousExerciseMatch {
                        name: cleaned.to_owned(),
                        candidates: many.iter().map(|name| (**name).clone()).collect(),
                    };
                    warn!(%error, "left for manual review");
                    None
                }
            }
        }
    }

    /// Register an unknown name as a new catalog entry.
    fn register(
        &mut self,
        cleaned: &str,
        folded: &str,
        region_hint: Option<&str>,
        muscles_primary: Option<&str>,
        muscles_secondary: Option<&str>,
    ) -> String {
        let canonical = slugify(folded);
        if !self.catalog.contains_key(&canonical) {
            debug!(raw = cleaned, canonical, "registering unknown exercise");
            let entry = ExerciseCatalogEntry {
                canonical_name: canonical.clone(),
                main_region: region_hint.and_then(normalize_region),
                muscles_primary: muscles_primary.map(normalize_muscle_list).unwrap_or_default(),
                muscles_secondary: muscles_secondary
                    .map(normalize_muscle_list)
                    .unwrap_or_default(),
            };
            self.catalog.insert(canonical.clone(), entry);
            self.new_entries.push(canonical.clone());
        }
        // Remember the raw spelling so re-sightings resolve without another
        // trip down the ladder.
        self.aliases.insert(folded.to_owned(), canonical.clone());
        canonical
    }

    /// Entries registered since the last call, for persistence by the caller
    pub fn take_new_entries(&mut self) -> Vec<ExerciseCatalogEntry> {
        std::mem::take(&mut self.new_entries)
            .into_iter()
            .filter_map(|name| self.catalog.get(&name).cloned())
            .collect()
    }

    /// Read-only view of the current catalog
    pub fn catalog(&self) -> impl Iterator<Item = &ExerciseCatalogEntry> {
        self.catalog.values()
    }
}

/// Map a region hint onto the canonical region vocabulary; unknown regions
/// keep a cleaned title-case form rather than being discarded.
#[must_use]
pub fn normalize_region(raw: &str) -> Option<String> {
    let folded = fold_accents(raw);
    if folded.is_empty() {
        return None;
    }
    for (pattern, canonical) in REGION_TABLE {
        if folded.contains(pattern) {
            return Some((*canonical).to_owned());
        }
    }
    let mut chars = folded.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().collect::<String>() + chars.as_str())
}

/// Collapse a folded free-text name into a catalog slug
/// ("rowing menton" → "rowing-menton").
fn slugify(folded: &str) -> String {
    let mut slug = String::with_capacity(folded.len());
    let mut last_dash = true;
    for c in folded.chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "unknown".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Classic two-row Levenshtein distance over characters
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
