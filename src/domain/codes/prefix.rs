//! Category -> prefix resolution.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use super::registry::Registry;
use crate::domain::value_objects::{CodePrefix, PrefixError};

/// Stands in for characters a short category name does not have.
pub const PAD: char = 'X';

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Categories whose prefix is fixed ahead of time.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("Accesorios", "AC"),
    ("Mods Digitales", "MD"),
    ("Peluches", "PE"),
    ("Figuras", "FI"),
    ("Ropa", "RO"),
    ("Decoracion", "DE"),
];

/// How a prefix was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixSource {
    /// Taken from the known-category table.
    Known,
    /// First and second, or first and third, characters of the name.
    Derived,
    /// First free pair from the A..Z x A..Z enumeration.
    Swept,
    /// Nothing free; the prefix may be shared with another category.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrefix {
    pub prefix: CodePrefix,
    pub source: PrefixSource,
}

/// Known category -> prefix table.
#[derive(Debug, Clone, Default)]
pub struct KnownPrefixes {
    by_group: HashMap<String, CodePrefix>,
}

#[derive(Debug, Error)]
pub enum KnownPrefixesError {
    #[error("entry {0:?} is not of the form Name=PREFIX")]
    MissingSeparator(String),
    #[error("entry {0:?} has an empty category name")]
    EmptyName(String),
    #[error(transparent)]
    Prefix(#[from] PrefixError),
}

impl KnownPrefixes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        let by_group = DEFAULT_PREFIXES
            .iter()
            .map(|(group, prefix)| (group.to_string(), CodePrefix::derived(prefix.to_string())))
            .collect();
        Self { by_group }
    }

    /// Parses `Name=PF,Other Name=OT`. Blank entries are skipped.
    pub fn parse(spec: &str) -> Result<Self, KnownPrefixesError> {
        let mut known = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (group, prefix) = entry
                .split_once('=')
                .ok_or_else(|| KnownPrefixesError::MissingSeparator(entry.to_string()))?;
            let group = group.trim();
            if group.is_empty() {
                return Err(KnownPrefixesError::EmptyName(entry.to_string()));
            }
            known.insert(group, CodePrefix::new(prefix)?);
        }
        Ok(known)
    }

    pub fn insert(&mut self, group: impl Into<String>, prefix: CodePrefix) -> Option<CodePrefix> {
        self.by_group.insert(group.into(), prefix)
    }

    pub fn get(&self, group: &str) -> Option<&CodePrefix> {
        self.by_group.get(group)
    }

    pub fn len(&self) -> usize {
        self.by_group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_group.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CodePrefix)> {
        self.by_group.iter().map(|(g, p)| (g.as_str(), p))
    }

    /// Adds `extra` entries for categories this table does not already fix.
    pub fn merged<I>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (String, CodePrefix)>,
    {
        let mut merged = self.clone();
        for (group, prefix) in extra {
            merged.by_group.entry(group).or_insert(prefix);
        }
        merged
    }

    /// True if some known category's prefix overlaps `candidate`.
    fn claims(&self, candidate: &str) -> bool {
        self.by_group
            .values()
            .any(|p| p.as_str().starts_with(candidate) || candidate.starts_with(p.as_str()))
    }
}

impl From<&HashMap<String, String>> for KnownPrefixes {
    fn from(table: &HashMap<String, String>) -> Self {
        let by_group = table
            .iter()
            .map(|(group, prefix)| (group.clone(), CodePrefix::derived(prefix.clone())))
            .collect();
        Self { by_group }
    }
}

/// Maps a category name to the prefix its codes should carry.
///
/// Known categories keep their table prefix unconditionally. Other names try
/// their first two non-blank characters, then their first and third, then every
/// two-letter pair; a candidate is free when it is alphabetic, no issued code
/// starts with it and no known category owns an overlapping prefix.
pub fn resolve_prefix(group: &str, registry: &Registry<'_>, known: &KnownPrefixes) -> ResolvedPrefix {
    if let Some(prefix) = known.get(group) {
        return ResolvedPrefix { prefix: prefix.clone(), source: PrefixSource::Known };
    }

    let chars: Vec<char> = group.chars().filter(|c| !c.is_whitespace()).take(3).map(upper).collect();
    let first = chars.first().copied().unwrap_or(PAD);
    let second = chars.get(1).copied().unwrap_or(PAD);
    let is_free = |candidate: &str| {
        candidate.chars().all(char::is_alphabetic) && !registry.has_prefix(candidate) && !known.claims(candidate)
    };
    let derived = |prefix: String, source| ResolvedPrefix { prefix: CodePrefix::derived(prefix), source };

    let candidate1: String = [first, second].iter().collect();
    if is_free(candidate1.as_str()) {
        return derived(candidate1, PrefixSource::Derived);
    }

    if let Some(&third) = chars.get(2) {
        let candidate2: String = [first, third].iter().collect();
        if is_free(candidate2.as_str()) {
            return derived(candidate2, PrefixSource::Derived);
        }
    }

    if let Some(swept) = sweep(first).find(|c| is_free(c.as_str())) {
        return derived(swept, PrefixSource::Swept);
    }

    let fallback: String = candidate1.chars().map(|c| if c.is_alphabetic() { c } else { PAD }).collect();
    derived(format!("{fallback}{PAD}"), PrefixSource::Exhausted)
}

/// All 676 letter pairs, starting at `first`'s row when it is an ASCII letter.
fn sweep(first: char) -> impl Iterator<Item = String> {
    let start = if first.is_ascii_uppercase() { usize::from(first as u8 - b'A') } else { 0 };
    (0..ALPHABET.len())
        .map(move |row| ALPHABET[(start + row) % ALPHABET.len()])
        .flat_map(|a| ALPHABET.iter().map(move |&b| [a as char, b as char].iter().collect::<String>()))
}

fn upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}
