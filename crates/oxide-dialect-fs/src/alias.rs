//! Dialect alias table.
//!
//! Maps free-form dialect spellings (`postgresql`, `pg`, `sqlite3`, ...) to a
//! canonical dialect name. Every canonical name also maps to itself, so
//! [`AliasTable::normalize`] is idempotent.

use indexmap::IndexMap;
use serde::Serialize;

/// Built-in aliases, in the order used to probe dialect directories.
pub const DEFAULT_DIALECT_ALIASES: &[(&str, &str)] = &[
    ("postgres", "postgres"),
    ("postgresql", "postgres"),
    ("pg", "postgres"),
    ("pgdialect", "postgres"),
    ("sqlite", "sqlite"),
    ("sqlite3", "sqlite"),
    ("sqldialect", "sqlite"),
];

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Lower-cased alias to lower-cased canonical dialect mapping.
///
/// Insertion order is preserved; it decides the order in which alias
/// directories are probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: IndexMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AliasTable {
    /// Creates a table holding a fresh copy of [`DEFAULT_DIALECT_ALIASES`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        table.extend(DEFAULT_DIALECT_ALIASES.iter().copied());
        table
    }

    /// Creates a table with no aliases.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Adds or overrides an alias.
    ///
    /// Blank aliases or targets are ignored. The canonical target gains a
    /// self-alias if it does not already have an entry. Returns whether the
    /// entry was applied.
    pub fn insert(&mut self, alias: &str, canonical: &str) -> bool {
        let alias = fold(alias);
        let canonical = fold(canonical);
        if alias.is_empty() || canonical.is_empty() {
            return false;
        }
        self.entries
            .entry(canonical.clone())
            .or_insert_with(|| canonical.clone());
        self.entries.insert(alias, canonical);
        true
    }

    /// Adds or overrides several aliases.
    pub fn extend<I, A, C>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        for (alias, canonical) in overrides {
            self.insert(alias.as_ref(), canonical.as_ref());
        }
    }

    /// Normalizes a dialect name.
    ///
    /// Trims and lower-cases the input, then maps it through the table.
    /// Unknown names are returned lower-cased; blank input yields an empty
    /// string, meaning "no dialect".
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        let name = fold(name);
        if name.is_empty() {
            return name;
        }
        match self.entries.get(&name) {
            Some(canonical) => canonical.clone(),
            None => name,
        }
    }

    /// Returns the directory names to probe for a dialect.
    ///
    /// The canonical name comes first, followed by every alias mapping to
    /// it in table order, without duplicates.
    #[must_use]
    pub fn candidate_directories(&self, name: &str) -> Vec<String> {
        let canonical = self.normalize(name);
        if canonical.is_empty() {
            return Vec::new();
        }
        let mut dirs = vec![canonical.clone()];
        for (alias, target) in &self.entries {
            if *target == canonical && !dirs.contains(alias) {
                dirs.push(alias.clone());
            }
        }
        dirs
    }

    /// Returns the canonical target of an alias, if present.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(&fold(alias)).map(String::as_str)
    }

    /// Iterates over `(alias, canonical)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    /// Returns the number of aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
