//! In-file dialect annotations.
//!
//! A script opts into specific dialects with a marker line:
//!
//! ```sql
//! ---bun:dialect:postgres,sqlite
//! CREATE TABLE users (id BIGINT PRIMARY KEY);
//! ```
//!
//! The marker is matched case-insensitively after trimming the line. A
//! script without any marker applies to every dialect.

use crate::alias::AliasTable;

/// Marker prefix for dialect annotation lines.
pub const DIALECT_ANNOTATION_PREFIX: &str = "---bun:dialect:";

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ';' | ' ' | '\t')
}

fn annotation_value(line: &str) -> Option<&str> {
    let line = line.trim();
    let prefix = line.get(..DIALECT_ANNOTATION_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(DIALECT_ANNOTATION_PREFIX) {
        return None;
    }
    Some(&line[DIALECT_ANNOTATION_PREFIX.len()..])
}

/// Extracts the canonical dialects a script is annotated with.
///
/// Returns names in order of first appearance, without duplicates. An empty
/// result means the script is not scoped to any dialect.
#[must_use]
pub fn extract_dialects(data: &[u8], aliases: &AliasTable) -> Vec<String> {
    let text = String::from_utf8_lossy(data);
    let mut dialects: Vec<String> = Vec::new();
    for value in text.lines().filter_map(annotation_value) {
        for field in value.split(is_separator) {
            let normalized = aliases.normalize(field);
            if !normalized.is_empty() && !dialects.contains(&normalized) {
                dialects.push(normalized);
            }
        }
    }
    dialects
}

/// Returns whether a script applies to `dialect`.
///
/// Unannotated scripts apply to every dialect; annotated scripts only to
/// the dialects they list.
#[must_use]
pub fn applies_to(data: &[u8], dialect: &str, aliases: &AliasTable) -> bool {
    let dialects = extract_dialects(data, aliases);
    dialects.is_empty() || dialects.iter().any(|d| d == dialect)
}
