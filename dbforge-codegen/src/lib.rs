//! dbforge-codegen: translate between live database schemas and Rust source
//!
//! Reverse direction: read the catalog of a MySQL, PostgreSQL or SQLite
//! database and generate:
//!
//! - entity structs with `serde` (and optionally `sqlx`) attributes
//! - `sqlx`-based record-access objects (`find_by_*`, `create`, `update`, `delete`)
//! - column enums for building type-checked column lists
//! - a `schema.sql` migration script
//!
//! Forward direction: turn a struct described with `#[derive(SqlModel)]`
//! into `CREATE TABLE`, insert, select, update and delete statements for
//! any of the three dialects (see [`sqlgen`]).
//!
//! # Programmatic use
//!
//! ```rust,ignore
//! use dbforge::{Context, Dialect};
//! use dbforge_codegen::{CodegenBuilder, Target};
//!
//! let conn = dbforge::connect(Dialect::Sqlite, "sqlite://app.db").await?;
//! let written = CodegenBuilder::new(Dialect::Sqlite)
//!     .output_dir("src/generated")
//!     .targets(&[Target::Entity, Target::Dao])
//!     .exclude_tables(&["*_log"])
//!     .generate(&Context::background(), conn.as_ref())
//!     .await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! dbforge-codegen --dialect postgres --dsn postgres://localhost/app --output ./src/generated generate
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod naming;
pub mod parser;
pub mod sqlgen;
pub mod template;
pub mod types;
pub mod writer;

use std::path::{Path, PathBuf};

use dbforge::{Connection, Context, Dialect};
use tracing::warn;

pub use config::{CodegenConfig, Target};
pub use error::{CodegenError, Result};
pub use generator::Generator;
pub use naming::{ColumnNameRule, TableNameRule};
pub use parser::Schema;

/// Parse the catalog behind `conn` and generate everything `config` asks for.
pub async fn generate(
    ctx: &Context,
    conn: &dyn Connection,
    config: CodegenConfig,
) -> Result<Vec<PathBuf>> {
    let generator = Generator::from_config(config)?;
    let schema = generator.parse(ctx, conn).await?;
    if !schema.failures.is_empty() {
        warn!(
            "{} tables could not be parsed and were skipped",
            schema.failures.len()
        );
        for failure in &schema.failures {
            warn!("Skipped {}", failure.describe());
        }
    }
    let output_dir = generator.config().output_dir.clone();
    generator.generate(ctx, &schema, &output_dir).await
}

/// Builder for programmatic configuration
pub struct CodegenBuilder {
    config: CodegenConfig,
}

impl CodegenBuilder {
    /// A builder with defaults for the given dialect
    pub fn new(dialect: Dialect) -> Self {
        Self {
            config: CodegenConfig::for_dialect(dialect),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: CodegenConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn package(mut self, name: &str) -> Self {
        self.config.package = name.to_string();
        self
    }

    /// MySQL database or PostgreSQL schema to read
    pub fn schema(mut self, name: &str) -> Self {
        self.config.schema = Some(name.to_string());
        self
    }

    pub fn targets(mut self, targets: &[Target]) -> Self {
        self.config.targets = targets.to_vec();
        self
    }

    /// Table name patterns to include (`users`, `user*`, `*_log`, `*audit*`)
    pub fn include_tables(mut self, patterns: &[&str]) -> Self {
        self.config.filter.include = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Table name patterns to exclude
    pub fn exclude_tables(mut self, patterns: &[&str]) -> Self {
        self.config.filter.exclude = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn table_naming(mut self, rule: TableNameRule) -> Self {
        self.config.table_naming = rule;
        self
    }

    pub fn column_naming(mut self, rule: ColumnNameRule) -> Self {
        self.config.column_naming = rule;
        self
    }

    /// Directory of `<name>.tpl` template overrides
    pub fn template_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.template_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Write `mod.rs` files for the generated directories
    pub fn module_files(mut self, enabled: bool) -> Self {
        self.config.module_files = enabled;
        self
    }

    /// Enable dry run mode (render without writing files)
    pub fn dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    /// The configuration built so far
    pub fn build(self) -> CodegenConfig {
        self.config
    }

    /// Generate the code
    pub async fn generate(self, ctx: &Context, conn: &dyn Connection) -> Result<Vec<PathBuf>> {
        generate(ctx, conn, self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::testing::{sqlite_users_posts, sqlite_users_posts_with, ScriptedConnection};

    #[test]
    fn test_builder() {
        let config = CodegenBuilder::new(Dialect::Postgres)
            .output_dir("out")
            .package("app")
            .schema("billing")
            .targets(&[Target::Entity, Target::Query])
            .include_tables(&["user*"])
            .exclude_tables(&["*_log"])
            .table_naming(TableNameRule::Original)
            .dry_run()
            .build();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.schema.as_deref(), Some("billing"));
        assert_eq!(config.filter.include, vec!["user*"]);
        assert_eq!(config.table_naming, TableNameRule::Original);
        assert!(config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_builder_generate() {
        let dir = tempfile::tempdir().unwrap();
        let written = CodegenBuilder::new(Dialect::Sqlite)
            .output_dir(dir.path())
            .targets(&[Target::Entity, Target::Query])
            .include_tables(&["users"])
            .generate(&Context::background(), &sqlite_users_posts())
            .await
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("models/users.rs").is_file());
        assert!(dir.path().join("query/users_query.rs").is_file());
    }

    #[tokio::test]
    async fn test_generate_skips_unreadable_table() {
        let dir = tempfile::tempdir().unwrap();
        let conn = sqlite_users_posts_with(ScriptedConnection::new(Dialect::Sqlite).fail(
            "table_info(\"posts\")",
            dbforge::Error::Query("database disk image is malformed".into()),
        ));
        let written = CodegenBuilder::new(Dialect::Sqlite)
            .output_dir(dir.path())
            .targets(&[Target::Entity])
            .generate(&Context::background(), &conn)
            .await
            .unwrap();
        assert_eq!(written, vec![dir.path().join("models/users.rs")]);
        assert!(!dir.path().join("models/posts.rs").exists());
    }
}
