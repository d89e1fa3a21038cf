//! oxide-dialect-fs CLI
//!
//! Command-line tool for inspecting dialect-aware migration sources.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_dialect_fs::prelude::*;

/// Dialect-aware SQL migration sources.
#[derive(Parser)]
#[command(name = "oxide-dialect-fs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Migrations source directory.
    #[arg(short, long, default_value = "migrations")]
    source: PathBuf,

    /// Database URL used to detect the dialect (SQLite).
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Fallback dialect when detection fails.
    #[arg(long)]
    default_dialect: Option<String>,

    /// Extra dialect alias, may be repeated.
    #[arg(short, long = "alias", value_name = "ALIAS=DIALECT")]
    aliases: Vec<String>,

    /// Label used in validation reports.
    #[arg(short, long)]
    label: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the scripts that apply to the resolved dialect.
    Resolve {
        /// Dialect to resolve for (detected if not specified).
        #[arg(long)]
        dialect: Option<String>,
    },

    /// Check that every target dialect has at least one script.
    Validate {
        /// Dialect to validate, may be repeated (resolved dialect if none).
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Also validate the resolved dialect when targets are given.
        #[arg(long)]
        validate_default: bool,

        /// Report missing coverage as warnings instead of failing.
        #[arg(long)]
        warn_only: bool,
    },

    /// Show the effective dialect alias table.
    Aliases,
}

#[derive(Serialize)]
struct ResolvedEntry<'a> {
    layer: MigrationLayer,
    dir: &'a str,
    path: &'a str,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    dialect: &'a str,
    files: Vec<ResolvedEntry<'a>>,
    diagnostics: &'a [LayerDiagnostic],
}

fn parse_alias(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((alias, canonical)) if !alias.trim().is_empty() && !canonical.trim().is_empty() => {
            Ok((alias.trim().to_string(), canonical.trim().to_string()))
        }
        _ => Err(MigrateError::InvalidAlias(raw.to_string())),
    }
}

fn base_options(cli: &Cli) -> Result<DialectOptionsBuilder> {
    let aliases = cli
        .aliases
        .iter()
        .map(|raw| parse_alias(raw))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = DialectOptions::builder().aliases(aliases);
    if let Some(default) = &cli.default_dialect {
        builder = builder.default_dialect(default.clone());
    }
    let label = cli
        .label
        .clone()
        .unwrap_or_else(|| cli.source.display().to_string());
    Ok(builder.source_label(label))
}

async fn connect(cli: &Cli) -> Result<Option<SqlitePool>> {
    match &cli.database {
        Some(url) => {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await?;
            Ok(Some(pool))
        }
        None => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let root: Arc<dyn SourceFs> = Arc::new(DirFs::new(&cli.source));
    let pool = connect(&cli).await?;
    let conn = pool.as_ref().map(|p| p as &dyn DialectConnection);

    match &cli.command {
        Commands::Resolve { dialect } => {
            let mut builder = base_options(&cli)?;
            if let Some(dialect) = dialect {
                builder = builder.dialect_name(dialect.clone());
            }
            let registration = DialectRegistration::new(root, builder.build());
            let build = registration.build_file_systems(conn).await?;

            if cli.format == Format::Json {
                print_json(&ResolveReport {
                    dialect: build.dialect(),
                    files: build
                        .files()
                        .map(|f| ResolvedEntry {
                            layer: f.layer,
                            dir: f.dir,
                            path: f.path,
                        })
                        .collect(),
                    diagnostics: build.diagnostics(),
                })?;
            } else {
                println!("\nDialect: {}", build.dialect());
                println!("{:-<60}", "");
                for file in build.files() {
                    println!(" [{}] {}/{}", file.layer, file.dir, file.path);
                }
                println!("\nLayers:");
                for diag in build.diagnostics() {
                    match &diag.reason {
                        Some(reason) => {
                            println!(" {:<18} {}: {}", diag.layer, diag.label(), reason);
                        }
                        None => println!(
                            " {:<18} {}: {} file(s), {} excluded",
                            diag.layer,
                            diag.label(),
                            diag.files,
                            diag.excluded()
                        ),
                    }
                }
                println!();
            }
        }

        Commands::Validate {
            targets,
            validate_default,
            warn_only,
        } => {
            let mut builder = base_options(&cli)?.validation_targets(targets.clone());
            if *validate_default {
                builder = builder.validate_default(true);
            }
            if *warn_only {
                builder = builder.validator(WarnOnlyValidator);
            }
            let registration = DialectRegistration::new(root, builder.build());

            match registration.validate(conn, 0).await {
                Ok(()) => info!(source = %cli.source.display(), "Dialect validation finished"),
                Err(err) => {
                    if cli.format == Format::Json {
                        if let Some(result) = err.validation_result() {
                            print_json(result)?;
                        }
                    }
                    return Err(err.into());
                }
            }
        }

        Commands::Aliases => {
            let options = base_options(&cli)?.build();
            if cli.format == Format::Json {
                print_json(options.aliases())?;
            } else {
                for (alias, canonical) in options.aliases().iter() {
                    println!("{alias:<16} -> {canonical}");
                }
            }
        }
    }

    Ok(())
}
