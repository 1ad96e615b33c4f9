//! CLI entry point for dbforge-codegen

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dbforge::Context;
use dbforge_codegen::config::{parse_dialect, CodegenConfig};
use dbforge_codegen::{Generator, Schema};

#[derive(Parser)]
#[command(name = "dbforge-codegen")]
#[command(about = "Generate Rust models and DAOs from a live MySQL, PostgreSQL or SQLite catalog")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database dialect: mysql, postgres or sqlite (overrides config)
    #[arg(short, long)]
    dialect: Option<String>,

    /// Connection string (overrides config)
    #[arg(long)]
    dsn: Option<String>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Package name for generated file headers (overrides config)
    #[arg(short, long)]
    package: Option<String>,

    /// Table patterns to include, e.g. `user*` (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Table patterns to exclude, e.g. `*_log` (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Dry run - render everything, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Abort catalog queries after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the configured targets (default)
    Generate,
    /// Show the parsed catalog without generating anything
    Inspect,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = CodegenConfig::load(cli.config.as_deref())?;

    // Initialize logging
    // Priority: RUST_LOG env var > config.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = config.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    // Apply CLI overrides
    if let Some(dialect) = &cli.dialect {
        config.dialect = parse_dialect(dialect)?;
    }
    if let Some(dsn) = cli.dsn {
        config.dsn = dsn;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(package) = cli.package {
        config.package = package;
    }
    if !cli.include.is_empty() {
        config.filter.include = cli.include;
    }
    if !cli.exclude.is_empty() {
        config.filter.exclude = cli.exclude;
    }
    if cli.dry_run {
        config.dry_run = true;
    }

    // Validate configuration before touching the database
    config.validate()?;
    if config.dsn.is_empty() {
        anyhow::bail!("no connection string: pass --dsn or set `dsn` in the config");
    }

    let ctx = match cli.timeout {
        Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };

    info!("Connecting to {} database", config.dialect);
    let conn = dbforge::connect(config.dialect, &config.dsn)
        .await
        .with_context(|| format!("failed to connect to {} database", config.dialect))?;

    let output_dir = config.output_dir.clone();
    let generator = Generator::from_config(config)?;
    let schema = generator.parse(&ctx, conn.as_ref()).await?;

    match cli.command {
        Some(Commands::Inspect) => {
            print_schema(&schema);
        }
        Some(Commands::Generate) | None => {
            let written = generator.generate(&ctx, &schema, &output_dir).await?;
            if generator.config().dry_run {
                println!("Dry run mode - would generate:");
                for path in &written {
                    println!("  {}", path.display());
                }
            }
            println!(
                "Generated {} files from {} tables",
                written.len(),
                schema.tables.len()
            );
            print_failures(&schema);
            info!("Code generation completed successfully");
        }
    }

    Ok(())
}

fn print_schema(schema: &Schema) {
    println!(
        "Parsed {} tables from {} database `{}`:\n",
        schema.tables.len(),
        schema.dialect,
        schema.name
    );
    for table in &schema.tables {
        println!("Table: {}", table.name);
        if !table.comment.is_empty() {
            println!("  Comment: {}", table.comment);
        }
        println!("  Columns:");
        for col in &table.columns {
            let nullable = if col.nullable { "NULL" } else { "NOT NULL" };
            let auto_inc = if col.is_auto_increment {
                " AUTO_INCREMENT"
            } else {
                ""
            };
            println!(
                "    - {} {} {}{} -> {}",
                col.name, col.raw_type, nullable, auto_inc, col.rust_type
            );
        }
        if !table.primary_key.is_empty() {
            println!("  Primary Key: {:?}", table.primary_key);
        }
        if !table.indexes.is_empty() {
            println!("  Indexes:");
            for idx in &table.indexes {
                let unique = if idx.unique { "UNIQUE " } else { "" };
                println!("    - {}INDEX {} ({:?})", unique, idx.name, idx.columns);
            }
        }
        if !table.foreign_keys.is_empty() {
            println!("  Foreign Keys:");
            for fk in &table.foreign_keys {
                println!(
                    "    - {} -> {}.{} ON DELETE {}",
                    fk.column, fk.referenced_table, fk.referenced_column, fk.on_delete
                );
            }
        }
        println!();
    }

    print_failures(schema);
}

fn print_failures(schema: &Schema) {
    if !schema.failures.is_empty() {
        println!("Skipped {} tables:", schema.failures.len());
        for failure in &schema.failures {
            println!("  - {}", failure.describe());
        }
    }
}
