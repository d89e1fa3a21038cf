//! Dialect-aware SQL migration sources for Rust.
//!
//! `oxide-dialect-fs` decides which SQL migration scripts apply to a given
//! database dialect when one source tree mixes dialect-neutral and
//! dialect-specific files:
//! - `common/` scripts apply to every dialect
//! - loose scripts at the root apply to every dialect unless annotated
//! - `postgres/`, `pg/`, `sqlite/`, ... scripts apply to that dialect only
//!
//! # Architecture
//!
//! - **Alias table** - Normalizes dialect spellings (`pg` -> `postgres`)
//! - **Annotations** - `---bun:dialect:` marker lines scoping single scripts
//! - **Layer collector** - Walks one directory and filters its scripts
//! - **Builder** - Merges common, root, and dialect layers in that order
//! - **Resolver** - Picks the dialect: explicit, callback, connection, default
//! - **Validation** - Reports dialects without any matching scripts
//! - **Registry** - Holds registrations and hands resolved trees to a runner
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oxide_dialect_fs::prelude::*;
//!
//! let migrations = Migrations::new();
//! migrations.register_dialect_migrations(
//!     Arc::new(DirFs::new("migrations")),
//!     DialectOptions::builder()
//!         .validation_targets(["postgres", "sqlite"])
//!         .source_label("app migrations")
//!         .build(),
//! );
//!
//! // Fails with an aggregated report if a dialect has no scripts.
//! migrations.validate_dialects(Some(&pool)).await?;
//! let sources = migrations.resolve(Some(&pool)).await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Show the scripts that apply to SQLite
//! oxide-dialect-fs --source migrations resolve --dialect sqlite
//!
//! # Check that every dialect has coverage
//! oxide-dialect-fs --source migrations validate --target postgres --target sqlite
//! ```

pub mod alias;
pub mod annotation;
pub mod builder;
pub mod error;
pub mod layer;
pub mod migrations;
pub mod options;
pub mod registration;
pub mod resolver;
pub mod validation;
pub mod vfs;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::alias::AliasTable;
    pub use crate::builder::{DialectBuildResult, DialectFsBuilder, LayerFs, ResolvedFile};
    pub use crate::error::{BoxError, MigrateError, Result};
    pub use crate::layer::{LayerDiagnostic, MigrationLayer};
    pub use crate::migrations::Migrations;
    pub use crate::options::{DialectOptions, DialectOptionsBuilder};
    pub use crate::registration::DialectRegistration;
    pub use crate::resolver::{
        BoxFuture, DialectConnection, DialectResolver, FnResolver, resolver_fn,
    };
    pub use crate::validation::{
        DialectValidationResult, DialectValidator, FailFastValidator, WarnOnlyValidator,
    };
    pub use crate::vfs::{DirFs, MemFs, SourceFs};
}
