//! Migration source registry.
//!
//! [`Migrations`] collects the source trees an application registers and,
//! at migration time, turns them into the ordered list of trees handed to
//! the migration runner. Plain trees are used as-is; dialect-aware trees are
//! resolved to their common, root, and dialect layers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::Result;
use crate::options::DialectOptions;
use crate::registration::DialectRegistration;
use crate::resolver::DialectConnection;
use crate::vfs::SourceFs;

#[derive(Debug, Default)]
struct Registry {
    files: Vec<Arc<dyn SourceFs>>,
    dialect: Vec<DialectRegistration>,
}

/// Registered migration sources.
///
/// Registration may happen from several threads; resolution works on a
/// snapshot taken under the lock.
#[derive(Debug, Default)]
pub struct Migrations {
    registry: Mutex<Registry>,
}

impl Migrations {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> (Vec<Arc<dyn SourceFs>>, Vec<DialectRegistration>) {
        let registry = self.lock();
        (registry.files.clone(), registry.dialect.clone())
    }

    /// Adds plain SQL source trees, used without dialect filtering.
    pub fn register_sql_migrations<I>(&self, sources: I) -> &Self
    where
        I: IntoIterator<Item = Arc<dyn SourceFs>>,
    {
        self.lock().files.extend(sources);
        self
    }

    /// Adds a dialect-aware source tree.
    ///
    /// Its registration index (used in validation reports) is its position
    /// among dialect registrations.
    pub fn register_dialect_migrations(
        &self,
        root: Arc<dyn SourceFs>,
        options: DialectOptions,
    ) -> &Self {
        let mut registry = self.lock();
        debug!(
            source = options.source_label(),
            index = registry.dialect.len(),
            "Registered dialect migrations"
        );
        registry
            .dialect
            .push(DialectRegistration::new(root, options));
        self
    }

    /// Returns a snapshot of the dialect registrations.
    #[must_use]
    pub fn dialect_registrations(&self) -> Vec<DialectRegistration> {
        self.lock().dialect.clone()
    }

    /// Returns the total number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        let registry = self.lock();
        registry.files.len() + registry.dialect.len()
    }

    /// Returns whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves every registration into the trees to hand to the runner.
    ///
    /// Plain trees come first, in registration order, followed by the
    /// non-empty layers of each dialect registration.
    pub async fn resolve(
        &self,
        conn: Option<&dyn DialectConnection>,
    ) -> Result<Vec<Arc<dyn SourceFs>>> {
        let (files, registrations) = self.snapshot();
        let mut resolved = files;

        for (index, registration) in registrations.iter().enumerate() {
            let build = registration.build_file_systems(conn).await?;
            info!(
                source = registration.options().source_label(),
                index,
                dialect = build.dialect(),
                layers = build.layers().len(),
                files = build.files().count(),
                "Resolved dialect migrations"
            );
            for layer in build.into_layers() {
                resolved.push(Arc::new(layer.fs));
            }
        }

        Ok(resolved)
    }

    /// Validates dialect coverage for every dialect registration, in order.
    ///
    /// Stops at the first registration whose validator reports an error.
    pub async fn validate_dialects(&self, conn: Option<&dyn DialectConnection>) -> Result<()> {
        let registrations = self.dialect_registrations();
        for (index, registration) in registrations.iter().enumerate() {
            registration.validate(conn, index).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::vfs::MemFs;

    fn tree(files: &[(&str, &str)]) -> Arc<dyn SourceFs> {
        Arc::new(files.iter().copied().collect::<MemFs>())
    }

    fn listing(sources: &[Arc<dyn SourceFs>]) -> Vec<Vec<String>> {
        sources
            .iter()
            .map(|fs| {
                fs.read_dir(".")
                    .unwrap()
                    .into_iter()
                    .map(|e| e.name)
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_resolve_orders_plain_then_layers() {
        let migrations = Migrations::new();
        migrations
            .register_dialect_migrations(
                tree(&[
                    ("common/0.up.sql", ""),
                    ("1.up.sql", ""),
                    ("sqlite/2.up.sql", ""),
                ]),
                DialectOptions::builder().dialect_name("sqlite").build(),
            )
            .register_sql_migrations([tree(&[("legacy.up.sql", "")])]);

        assert_eq!(migrations.len(), 2);
        let resolved = migrations.resolve(None).await.unwrap();
        assert_eq!(
            listing(&resolved),
            vec![
                vec!["legacy.up.sql"],
                vec!["0.up.sql"],
                vec!["1.up.sql"],
                vec!["2.up.sql"],
            ]
        );
    }

    #[tokio::test]
    async fn test_validate_dialects_reports_index() {
        let migrations = Migrations::new();
        migrations
            .register_dialect_migrations(
                tree(&[("postgres/1.up.sql", "")]),
                DialectOptions::builder().validation_targets(["pg"]).build(),
            )
            .register_dialect_migrations(
                tree(&[("postgres/1.up.sql", "")]),
                DialectOptions::builder()
                    .validation_targets(["postgres", "sqlite"])
                    .build(),
            );

        let err = migrations.validate_dialects(None).await.unwrap_err();
        let result = err.validation_result().unwrap();
        assert_eq!(result.registration_index, 1);
        assert_eq!(result.checked_dialects, vec!["postgres", "sqlite"]);
        assert_eq!(result.missing_dialects.keys().collect::<Vec<_>>(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let migrations = Migrations::new();
        assert!(migrations.is_empty());
        assert!(migrations.resolve(None).await.unwrap().is_empty());
        migrations.validate_dialects(None).await.unwrap();
    }

    #[test]
    fn test_concurrent_registration() {
        let migrations = Arc::new(Migrations::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let migrations = Arc::clone(&migrations);
                std::thread::spawn(move || {
                    let name = format!("{i:03}.up.sql");
                    migrations.register_sql_migrations([tree(&[(name.as_str(), "")])]);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(migrations.len(), 10);
    }

    #[test]
    fn test_resolve_error_propagates() {
        let migrations = Migrations::new();
        migrations.register_dialect_migrations(
            tree(&[]),
            DialectOptions::builder()
                .resolver(crate::resolver::resolver_fn(|_| async {
                    Err::<String, crate::error::BoxError>("no database".into())
                }))
                .build(),
        );
        let err = tokio_test::block_on(migrations.resolve(None)).unwrap_err();
        assert!(matches!(err, MigrateError::Resolver(_)));
    }
}
