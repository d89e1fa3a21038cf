//! Migration layers and the per-layer collector.
//!
//! A layer is one directory of scripts (common, root, or dialect-specific).
//! Collecting a layer walks its directory, keeps the `.sql` files that apply
//! to the target dialect, and always yields a [`LayerDiagnostic`], even when
//! the directory is missing or nothing matched.

use std::fmt;
use std::io;

use serde::Serialize;
use tracing::debug;

use crate::alias::AliasTable;
use crate::annotation::applies_to;
use crate::error::{MigrateError, Result};
use crate::vfs::{MemFs, ROOT, SourceFs, join};

/// File extension of migration scripts (matched case-insensitively).
pub const SQL_FILE_EXTENSION: &str = ".sql";

/// Reason recorded when a layer directory does not exist.
pub const DIRECTORY_NOT_FOUND: &str = "directory not found";

/// Source layer of a migration script.
///
/// Variants are declared in application order: common scripts first, then
/// root scripts, then dialect-specific scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationLayer {
    /// The `common/` subdirectory, merged for every dialect.
    Common,
    /// Loose files directly under the registration root.
    Root,
    /// The directory named after the dialect or one of its aliases.
    Dialect,
}

impl MigrationLayer {
    /// All layers in application order.
    pub const ALL: [Self; 3] = [Self::Common, Self::Root, Self::Dialect];

    /// Returns the display name of this layer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Root => "root",
            Self::Dialect => "dialect-specific",
        }
    }
}

impl fmt::Display for MigrationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of collecting one layer, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerDiagnostic {
    /// The layer that was collected.
    pub layer: MigrationLayer,
    /// Directory name (or dialect name when no directory was found).
    pub name: String,
    /// Number of scripts included for the dialect.
    pub files: usize,
    /// Number of `.sql` files seen before dialect filtering.
    pub candidates: usize,
    /// Why the layer contributed nothing, if it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LayerDiagnostic {
    /// Creates an empty diagnostic for a layer.
    pub fn new(layer: MigrationLayer, name: impl Into<String>) -> Self {
        Self {
            layer,
            name: name.into(),
            files: 0,
            candidates: 0,
            reason: None,
        }
    }

    /// Sets the reason (builder style).
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns the label used in reports: the directory name, or the layer
    /// name when the directory name is blank.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.layer.as_str()
        } else {
            &self.name
        }
    }

    /// Returns how many scripts were skipped because they were annotated
    /// for other dialects.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.candidates.saturating_sub(self.files)
    }
}

/// What a layer contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOutcome {
    /// At least one script matched.
    Found(MemFs),
    /// The layer directory does not exist.
    NotFound,
    /// The directory exists but no script matched the dialect.
    Empty,
}

/// A collected layer: its outcome plus its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedLayer {
    /// What the layer contributed.
    pub outcome: LayerOutcome,
    /// Diagnostic for reporting.
    pub diagnostic: LayerDiagnostic,
}

impl CollectedLayer {
    /// Creates a not-found layer.
    #[must_use]
    pub fn not_found(diagnostic: LayerDiagnostic) -> Self {
        Self {
            outcome: LayerOutcome::NotFound,
            diagnostic,
        }
    }

    /// Returns the matched scripts, if any.
    #[must_use]
    pub fn into_fs(self) -> Option<MemFs> {
        match self.outcome {
            LayerOutcome::Found(fs) => Some(fs),
            LayerOutcome::NotFound | LayerOutcome::Empty => None,
        }
    }
}

enum WalkError {
    NotFound,
    Io { path: String, source: io::Error },
}

impl WalkError {
    /// Only a missing layer root means the layer is absent. A path that
    /// vanishes deeper in the walk is a hard error.
    fn at(path: &str, source: io::Error) -> Self {
        if path == ROOT && source.kind() == io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Collects the scripts of one layer for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct LayerCollector<'a> {
    dialect: &'a str,
    aliases: &'a AliasTable,
}

impl<'a> LayerCollector<'a> {
    /// Creates a collector for a canonical dialect name.
    #[must_use]
    pub fn new(dialect: &'a str, aliases: &'a AliasTable) -> Self {
        Self { dialect, aliases }
    }

    /// Returns the target dialect.
    #[must_use]
    pub fn dialect(&self) -> &str {
        self.dialect
    }

    /// Walks `fsys` and collects the scripts that apply to the dialect.
    ///
    /// With `skip_subdirs` only files directly under the root are visited.
    /// A missing layer directory yields [`LayerOutcome::NotFound`]; any
    /// other I/O failure, including a file that disappears mid-walk, is
    /// returned as an error.
    pub fn collect(
        &self,
        fsys: &dyn SourceFs,
        layer: MigrationLayer,
        name: &str,
        skip_subdirs: bool,
    ) -> Result<CollectedLayer> {
        let mut diagnostic = LayerDiagnostic::new(layer, name);
        let mut files = MemFs::new();

        match self.walk(fsys, ROOT, skip_subdirs, &mut diagnostic, &mut files) {
            Ok(()) => {}
            Err(WalkError::NotFound) => {
                debug!(layer = %layer, dir = name, "Layer directory not found");
                return Ok(CollectedLayer::not_found(
                    diagnostic.with_reason(DIRECTORY_NOT_FOUND),
                ));
            }
            Err(WalkError::Io { path, source }) => {
                return Err(MigrateError::io(path, source));
            }
        }

        diagnostic.files = files.len();
        debug!(
            layer = %layer,
            dir = name,
            dialect = self.dialect,
            files = diagnostic.files,
            candidates = diagnostic.candidates,
            "Collected layer"
        );

        if files.is_empty() {
            let reason = if diagnostic.candidates == 0 {
                format!("no SQL files found in {name}")
            } else {
                format!("SQL files exist but none match dialect \"{}\"", self.dialect)
            };
            return Ok(CollectedLayer {
                outcome: LayerOutcome::Empty,
                diagnostic: diagnostic.with_reason(reason),
            });
        }

        Ok(CollectedLayer {
            outcome: LayerOutcome::Found(files),
            diagnostic,
        })
    }

    fn walk(
        &self,
        fsys: &dyn SourceFs,
        dir: &str,
        skip_subdirs: bool,
        diagnostic: &mut LayerDiagnostic,
        files: &mut MemFs,
    ) -> std::result::Result<(), WalkError> {
        let entries = fsys.read_dir(dir).map_err(|e| WalkError::at(dir, e))?;
        for entry in entries {
            let path = join(dir, &entry.name);
            if entry.is_dir() {
                if !skip_subdirs {
                    self.walk(fsys, &path, skip_subdirs, diagnostic, files)?;
                }
                continue;
            }
            if !path.to_lowercase().ends_with(SQL_FILE_EXTENSION) {
                continue;
            }

            diagnostic.candidates += 1;
            let data = fsys.read_file(&path).map_err(|e| WalkError::at(&path, e))?;
            if applies_to(&data, self.dialect, self.aliases) {
                files.insert(&path, data);
            }
        }
        Ok(())
    }
}
