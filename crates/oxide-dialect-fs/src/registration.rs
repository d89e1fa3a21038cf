//! A source tree bound to its dialect options.

use std::sync::Arc;

use crate::builder::{DialectBuildResult, DialectFsBuilder};
use crate::error::Result;
use crate::options::DialectOptions;
use crate::resolver::{self, DialectConnection};
use crate::validation;
use crate::vfs::SourceFs;

/// One dialect-aware source registration.
///
/// Every operation re-reads the source tree, so scripts edited between
/// calls are picked up.
#[derive(Debug, Clone)]
pub struct DialectRegistration {
    root: Arc<dyn SourceFs>,
    options: DialectOptions,
}

impl DialectRegistration {
    /// Creates a registration.
    pub fn new(root: Arc<dyn SourceFs>, options: DialectOptions) -> Self {
        Self { root, options }
    }

    /// Returns the source tree.
    #[must_use]
    pub fn root(&self) -> &dyn SourceFs {
        self.root.as_ref()
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &DialectOptions {
        &self.options
    }

    /// Resolves the dialect this registration applies to.
    pub async fn resolve_dialect(&self, conn: Option<&dyn DialectConnection>) -> Result<String> {
        resolver::resolve_dialect(&self.options, conn).await
    }

    /// Builds the merged layers for a dialect name (or any of its aliases).
    pub fn build_for_dialect(&self, name: &str) -> Result<DialectBuildResult> {
        let dialect = self.options.normalize(name);
        DialectFsBuilder::new(self.root.as_ref(), &dialect, self.options.aliases()).build()
    }

    /// Resolves the dialect, then builds its merged layers.
    pub async fn build_file_systems(
        &self,
        conn: Option<&dyn DialectConnection>,
    ) -> Result<DialectBuildResult> {
        let dialect = self.resolve_dialect(conn).await?;
        self.build_for_dialect(&dialect)
    }

    /// Validates dialect coverage; `index` identifies the registration in
    /// reports.
    pub async fn validate(&self, conn: Option<&dyn DialectConnection>, index: usize) -> Result<()> {
        validation::validate(self, conn, index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::vfs::MemFs;

    fn registration(fs: MemFs, options: DialectOptions) -> DialectRegistration {
        DialectRegistration::new(Arc::new(fs), options)
    }

    #[test]
    fn test_build_for_alias_name() {
        let reg = registration(
            MemFs::new().with_file("sqlite/001.up.sql", ""),
            DialectOptions::default(),
        );
        let result = reg.build_for_dialect("SQLite3").unwrap();
        assert_eq!(result.dialect(), "sqlite");
        assert!(result.has_sql());
    }

    #[tokio::test]
    async fn test_build_file_systems_uses_resolved_dialect() {
        let reg = registration(
            MemFs::new()
                .with_file("postgres/001.up.sql", "")
                .with_file("sqlite/001.up.sql", ""),
            DialectOptions::builder().default_dialect("sqlite").build(),
        );
        let result = reg.build_file_systems(None).await.unwrap();
        assert_eq!(result.dialect(), "sqlite");
        assert_eq!(result.layers()[0].dir, "sqlite");
    }

    #[tokio::test]
    async fn test_validate_without_targets_is_noop() {
        let reg = registration(MemFs::new(), DialectOptions::default());
        reg.validate(None, 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_missing_postgres() {
        let reg = registration(
            MemFs::new().with_file("sqlite/001.up.sql", "CREATE TABLE t;"),
            DialectOptions::builder()
                .validation_targets(["postgres"])
                .source_label("app")
                .build(),
        );

        let err = reg.validate(None, 3).await.unwrap_err();
        assert!(matches!(err, MigrateError::MissingCoverage { .. }));
        assert!(err.to_string().contains("postgres"));
        assert!(err.to_string().contains("registration #3"));

        let result = err.validation_result().unwrap();
        assert_eq!(result.checked_dialects, vec!["postgres"]);
        assert_eq!(result.missing_dialects.len(), 1);
        assert_eq!(result.missing_dialects["postgres"].len(), 3);
    }

    #[tokio::test]
    async fn test_validate_default_uses_resolved_dialect() {
        let reg = registration(
            MemFs::new().with_file("sqlite/001.up.sql", ""),
            DialectOptions::builder()
                .default_dialect("sqlite")
                .validation_targets(Vec::<String>::new())
                .build(),
        );
        reg.validate(None, 0).await.unwrap();
    }
}
