//! Dialect filesystem assembly.
//!
//! Merges the common, root, and dialect-specific layers of a source tree
//! into an ordered list of in-memory trees for one dialect.

use tracing::debug;

use crate::alias::AliasTable;
use crate::error::{MigrateError, Result};
use crate::layer::{CollectedLayer, LayerCollector, LayerDiagnostic, MigrationLayer};
use crate::vfs::{MemFs, SourceFs, open_sub};

/// Name of the dialect-neutral subdirectory.
pub const COMMON_DIR_NAME: &str = "common";

/// Label of the root layer. Root scripts live directly under the source
/// root, not in a directory of this name.
pub const ROOT_LAYER_NAME: &str = "root";

/// A resolved layer: which layer it came from and its matched scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFs {
    /// Source layer.
    pub layer: MigrationLayer,
    /// Layer label: the subdirectory the scripts were collected from, or
    /// [`ROOT_LAYER_NAME`] for scripts directly under the source root.
    pub dir: String,
    /// Matched scripts, keyed by path relative to `dir`.
    pub fs: MemFs,
}

/// One script in a build result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFile<'a> {
    /// Source layer.
    pub layer: MigrationLayer,
    /// Layer label, see [`LayerFs::dir`].
    pub dir: &'a str,
    /// Path relative to the layer directory.
    pub path: &'a str,
    /// Script contents.
    pub data: &'a [u8],
}

/// The merged view of a source tree for one dialect.
///
/// Recomputed on every build; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectBuildResult {
    dialect: String,
    layers: Vec<LayerFs>,
    diagnostics: Vec<LayerDiagnostic>,
}

impl DialectBuildResult {
    fn new(dialect: &str) -> Self {
        Self {
            dialect: dialect.to_string(),
            layers: Vec::with_capacity(3),
            diagnostics: Vec::with_capacity(3),
        }
    }

    fn push(&mut self, dir: &str, collected: CollectedLayer) {
        let layer = collected.diagnostic.layer;
        self.diagnostics.push(collected.diagnostic.clone());
        if let Some(fs) = collected.into_fs() {
            self.layers.push(LayerFs {
                layer,
                dir: dir.to_string(),
                fs,
            });
        }
    }

    /// Returns the dialect this result was built for.
    #[must_use]
    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Returns the non-empty layers in application order.
    #[must_use]
    pub fn layers(&self) -> &[LayerFs] {
        &self.layers
    }

    /// Returns the in-memory trees in application order.
    pub fn file_systems(&self) -> impl Iterator<Item = &MemFs> {
        self.layers.iter().map(|l| &l.fs)
    }

    /// Consumes the result, returning its layers.
    #[must_use]
    pub fn into_layers(self) -> Vec<LayerFs> {
        self.layers
    }

    /// Returns one diagnostic per attempted layer, in application order.
    #[must_use]
    pub fn diagnostics(&self) -> &[LayerDiagnostic] {
        &self.diagnostics
    }

    /// Iterates over every matched script, layer by layer, each layer in
    /// lexical path order.
    pub fn files(&self) -> impl Iterator<Item = ResolvedFile<'_>> {
        self.layers.iter().flat_map(|l| {
            l.fs.iter().map(move |(path, data)| ResolvedFile {
                layer: l.layer,
                dir: &l.dir,
                path,
                data,
            })
        })
    }

    /// Returns whether any layer contributed at least one script.
    #[must_use]
    pub fn has_sql(&self) -> bool {
        self.diagnostics.iter().any(|d| d.files > 0)
    }
}

/// Builds the merged layers of one source tree for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct DialectFsBuilder<'a> {
    root: &'a dyn SourceFs,
    dialect: &'a str,
    aliases: &'a AliasTable,
}

impl<'a> DialectFsBuilder<'a> {
    /// Creates a builder for a canonical dialect name.
    #[must_use]
    pub fn new(root: &'a dyn SourceFs, dialect: &'a str, aliases: &'a AliasTable) -> Self {
        Self {
            root,
            dialect,
            aliases,
        }
    }

    fn collector(&self) -> LayerCollector<'a> {
        LayerCollector::new(self.dialect, self.aliases)
    }

    /// Collects the common, root, and dialect layers, in that order.
    ///
    /// Stops at the first I/O error. Missing or empty layers only produce
    /// diagnostics.
    pub fn build(&self) -> Result<DialectBuildResult> {
        let mut result = DialectBuildResult::new(self.dialect);

        let common = self.build_common_layer()?;
        result.push(COMMON_DIR_NAME, common);

        let root = self.build_root_layer()?;
        result.push(ROOT_LAYER_NAME, root);

        let (dir, dialect) = self.build_dialect_layer()?;
        result.push(&dir, dialect);

        debug!(
            dialect = self.dialect,
            layers = result.layers.len(),
            has_sql = result.has_sql(),
            "Built dialect filesystem"
        );
        Ok(result)
    }

    fn build_common_layer(&self) -> Result<CollectedLayer> {
        let sub = open_sub(self.root, COMMON_DIR_NAME)
            .map_err(|e| MigrateError::io(COMMON_DIR_NAME, e))?;
        match sub {
            Some(sub) => self.collector().collect(
                &sub,
                MigrationLayer::Common,
                COMMON_DIR_NAME,
                false,
            ),
            None => Ok(CollectedLayer::not_found(
                LayerDiagnostic::new(MigrationLayer::Common, COMMON_DIR_NAME)
                    .with_reason(crate::layer::DIRECTORY_NOT_FOUND),
            )),
        }
    }

    fn build_root_layer(&self) -> Result<CollectedLayer> {
        self.collector()
            .collect(self.root, MigrationLayer::Root, ROOT_LAYER_NAME, true)
    }

    fn build_dialect_layer(&self) -> Result<(String, CollectedLayer)> {
        let candidates = self.aliases.candidate_directories(self.dialect);
        for candidate in &candidates {
            let sub = open_sub(self.root, candidate).map_err(|e| MigrateError::io(candidate, e))?;
            if let Some(sub) = sub {
                let collected = self.collector().collect(
                    &sub,
                    MigrationLayer::Dialect,
                    candidate,
                    false,
                )?;
                return Ok((candidate.clone(), collected));
            }
        }

        let reason = if candidates.is_empty() {
            "no dialect directory configured".to_string()
        } else {
            format!(
                "no dialect-specific directory found (searched: {})",
                candidates.join(", ")
            )
        };
        Ok((
            self.dialect.to_string(),
            CollectedLayer::not_found(
                LayerDiagnostic::new(MigrationLayer::Dialect, self.dialect).with_reason(reason),
            ),
        ))
    }
}
