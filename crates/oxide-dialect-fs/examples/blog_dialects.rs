//! Example: Blog Application Dialect Migrations
//!
//! This example shows how one migration tree serves both PostgreSQL and
//! SQLite: shared scripts live in `common/`, engine-specific scripts in
//! `postgres/` and `sqlite/`, and single scripts can opt into dialects with
//! an annotation line.
//!
//! Run with: cargo run --example blog_dialects -p oxide-dialect-fs

use std::sync::Arc;

use oxide_dialect_fs::prelude::*;

// =============================================================================
// Migration Tree
// =============================================================================

fn blog_tree() -> MemFs {
    MemFs::new()
        .with_file(
            "common/0001_create_users.up.sql",
            "CREATE TABLE users (id BIGINT PRIMARY KEY, username VARCHAR(100) NOT NULL);",
        )
        .with_file(
            "0002_create_posts.up.sql",
            "CREATE TABLE posts (id BIGINT PRIMARY KEY, user_id BIGINT NOT NULL, title TEXT);",
        )
        .with_file(
            "0003_posts_search.up.sql",
            "---bun:dialect:pg\nCREATE INDEX posts_title_idx ON posts USING gin (to_tsvector('english', title));",
        )
        .with_file(
            "postgres/0004_comments.up.sql",
            "CREATE TABLE comments (id BIGSERIAL PRIMARY KEY, body JSONB);",
        )
        .with_file(
            "sqlite/0004_comments.up.sql",
            "CREATE TABLE comments (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT);",
        )
}

fn print_build(result: &DialectBuildResult) {
    println!("\n{} migrations:", result.dialect());
    for file in result.files() {
        println!("  [{:<16}] {}/{}", file.layer, file.dir, file.path);
    }
    for diag in result.diagnostics() {
        if let Some(reason) = &diag.reason {
            println!("  ({} layer: {})", diag.layer, reason);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let tree: Arc<dyn SourceFs> = Arc::new(blog_tree());

    let registration = DialectRegistration::new(
        Arc::clone(&tree),
        DialectOptions::builder().source_label("blog").build(),
    );
    print_build(&registration.build_for_dialect("postgresql")?);
    print_build(&registration.build_for_dialect("sqlite3")?);

    // MySQL has no dialect directory, but the shared scripts still apply.
    let migrations = Migrations::new();
    migrations.register_dialect_migrations(
        tree,
        DialectOptions::builder()
            .source_label("blog")
            .validation_targets(["postgres", "sqlite", "mysql"])
            .validator(WarnOnlyValidator)
            .build(),
    );
    migrations.validate_dialects(None).await?;

    let sources = migrations.resolve(None).await?;
    println!("\nResolved {} source trees for the default dialect.", sources.len());

    Ok(())
}
