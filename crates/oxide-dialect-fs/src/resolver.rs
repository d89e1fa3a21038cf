//! Dialect resolution.
//!
//! Decides which dialect a registration resolves to, in order:
//!
//! 1. the dialect forced in [`DialectOptions`]
//! 2. the caller-supplied [`DialectResolver`]
//! 3. the live connection's own dialect
//! 4. the configured default dialect
//! 5. [`DEFAULT_DIALECT_NAME`]

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::error::{BoxError, MigrateError, Result};
use crate::options::{DEFAULT_DIALECT_NAME, DialectOptions};

/// A boxed future for async resolver callbacks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A live database handle that knows its own dialect.
pub trait DialectConnection: Send + Sync {
    /// Returns the dialect name reported by the connection.
    fn dialect_name(&self) -> &str;
}

impl DialectConnection for SqlitePool {
    fn dialect_name(&self) -> &str {
        "sqlite"
    }
}

/// Resolves the active dialect at runtime.
///
/// An error aborts resolution. An empty or blank name is treated as no
/// answer, and resolution falls through to the connection and defaults.
///
/// # Example
///
/// ```ignore
/// struct EnvResolver;
///
/// impl DialectResolver for EnvResolver {
///     fn resolve<'a>(
///         &'a self,
///         _conn: Option<&'a dyn DialectConnection>,
///     ) -> BoxFuture<'a, Result<String, BoxError>> {
///         Box::pin(async move { Ok(std::env::var("APP_DIALECT").unwrap_or_default()) })
///     }
/// }
/// ```
pub trait DialectResolver: Send + Sync {
    /// Returns the dialect name to use.
    fn resolve<'a>(
        &'a self,
        conn: Option<&'a dyn DialectConnection>,
    ) -> BoxFuture<'a, std::result::Result<String, BoxError>>;
}

/// A [`DialectResolver`] backed by a closure returning a future.
pub struct FnResolver<F> {
    f: F,
}

impl<F> fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

impl<F, Fut> DialectResolver for FnResolver<F>
where
    F: Fn(Option<&dyn DialectConnection>) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<String, BoxError>> + Send + 'static,
{
    fn resolve<'a>(
        &'a self,
        conn: Option<&'a dyn DialectConnection>,
    ) -> BoxFuture<'a, std::result::Result<String, BoxError>> {
        Box::pin((self.f)(conn))
    }
}

/// Wraps a closure as a [`DialectResolver`].
///
/// The closure is called with the live connection, if any. The returned
/// future must not borrow it; copy out what it needs first.
///
/// ```ignore
/// let resolver = resolver_fn(|conn| {
///     let name = conn.map(|c| c.dialect_name().to_string());
///     async move { Ok(name.unwrap_or_default()) }
/// });
/// ```
pub fn resolver_fn<F, Fut>(f: F) -> FnResolver<F>
where
    F: Fn(Option<&dyn DialectConnection>) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<String, BoxError>> + Send + 'static,
{
    FnResolver { f }
}

/// Resolves the canonical dialect for a registration.
pub async fn resolve_dialect(
    options: &DialectOptions,
    conn: Option<&dyn DialectConnection>,
) -> Result<String> {
    if let Some(explicit) = options.explicit_dialect() {
        debug!(dialect = explicit, source = "explicit", "Resolved dialect");
        return Ok(explicit.to_string());
    }

    if let Some(resolver) = options.resolver() {
        let name = resolver.resolve(conn).await.map_err(MigrateError::Resolver)?;
        let normalized = options.normalize(&name);
        if !normalized.is_empty() {
            debug!(dialect = %normalized, source = "resolver", "Resolved dialect");
            return Ok(normalized);
        }
        debug!(raw = %name, "Dialect resolver returned no dialect");
    }

    if let Some(conn) = conn {
        let normalized = options.normalize(conn.dialect_name());
        if !normalized.is_empty() {
            debug!(dialect = %normalized, source = "connection", "Resolved dialect");
            return Ok(normalized);
        }
    }

    let default = options.default_dialect();
    if !default.is_empty() {
        debug!(dialect = default, source = "default", "Resolved dialect");
        return Ok(default.to_string());
    }

    Ok(DEFAULT_DIALECT_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Conn(&'static str);

    impl DialectConnection for Conn {
        fn dialect_name(&self) -> &str {
            self.0
        }
    }

    struct EchoResolver;

    impl DialectResolver for EchoResolver {
        fn resolve<'a>(
            &'a self,
            conn: Option<&'a dyn DialectConnection>,
        ) -> BoxFuture<'a, std::result::Result<String, BoxError>> {
            Box::pin(async move {
                Ok(conn.map(|c| format!("{}3", c.dialect_name())).unwrap_or_default())
            })
        }
    }

    #[tokio::test]
    async fn test_explicit_dialect_wins() {
        let options = DialectOptions::builder()
            .dialect_name("PostgreSQL")
            .resolver(resolver_fn(|_| async { Ok("sqlite".to_string()) }))
            .build();
        let resolved = resolve_dialect(&options, Some(&Conn("sqlite"))).await.unwrap();
        assert_eq!(resolved, "postgres");
    }

    #[tokio::test]
    async fn test_resolver_before_connection() {
        let options = DialectOptions::builder()
            .resolver(resolver_fn(|_| async { Ok("sqlite3".to_string()) }))
            .build();
        let resolved = resolve_dialect(&options, Some(&Conn("pg"))).await.unwrap();
        assert_eq!(resolved, "sqlite");
    }

    #[tokio::test]
    async fn test_resolver_sees_connection() {
        let options = DialectOptions::builder().resolver(EchoResolver).build();
        let resolved = resolve_dialect(&options, Some(&Conn("sqlite"))).await.unwrap();
        assert_eq!(resolved, "sqlite");
    }

    #[tokio::test]
    async fn test_blank_resolver_answer_falls_through() {
        let options = DialectOptions::builder()
            .resolver(resolver_fn(|_| async { Ok("  ".to_string()) }))
            .build();
        let resolved = resolve_dialect(&options, Some(&Conn("sqlite"))).await.unwrap();
        assert_eq!(resolved, "sqlite");
    }

    #[tokio::test]
    async fn test_resolver_error_is_wrapped() {
        let options = DialectOptions::builder()
            .resolver(resolver_fn(|_| async {
                Err::<String, BoxError>("boom".into())
            }))
            .build();
        let err = resolve_dialect(&options, None).await.unwrap_err();
        assert!(matches!(err, MigrateError::Resolver(_)));
        assert_eq!(err.to_string(), "dialect resolver failed: boom");
    }

    #[tokio::test]
    async fn test_connection_then_default() {
        let options = DialectOptions::builder().default_dialect("sqlite3").build();
        assert_eq!(
            resolve_dialect(&options, Some(&Conn("PG"))).await.unwrap(),
            "postgres"
        );
        assert_eq!(resolve_dialect(&options, Some(&Conn(""))).await.unwrap(), "sqlite");
        assert_eq!(resolve_dialect(&options, None).await.unwrap(), "sqlite");
    }

    #[tokio::test]
    async fn test_ultimate_fallback() {
        let options = DialectOptions::default();
        assert_eq!(resolve_dialect(&options, None).await.unwrap(), DEFAULT_DIALECT_NAME);
    }

    #[tokio::test]
    async fn test_sqlite_pool_reports_sqlite() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy("sqlite::memory:")
            .expect("Failed to create lazy SQLite pool");
        let options = DialectOptions::default();
        assert_eq!(resolve_dialect(&options, Some(&pool)).await.unwrap(), "sqlite");
    }

    #[tokio::test]
    async fn test_closure_resolver_sees_connection() {
        let options = DialectOptions::builder()
            .resolver(resolver_fn(|conn| {
                let name = conn.map(|c| format!("{}3", c.dialect_name()));
                async move { Ok(name.unwrap_or_default()) }
            }))
            .build();
        let resolved = resolve_dialect(&options, Some(&Conn("sqlite"))).await.unwrap();
        assert_eq!(resolved, "sqlite");

        // Without a connection the closure answers blank and the default applies.
        assert_eq!(resolve_dialect(&options, None).await.unwrap(), "postgres");
    }
}
