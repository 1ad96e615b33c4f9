//! Configuration settings for dbforge-codegen

use config::{Config, Environment, File};
use dbforge::Dialect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use crate::error::{CodegenError, Result};
use crate::naming::{ColumnNameRule, TableNameRule};

/// An artifact kind the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// `models/<table>.rs`
    Entity,
    /// `dao/<table>_dao.rs`
    Dao,
    /// `query/<table>_query.rs`
    Query,
    /// `schema.sql`
    Migration,
}

impl Target {
    pub const ALL: [Target; 4] = [Target::Entity, Target::Dao, Target::Query, Target::Migration];
}

/// Include/exclude table patterns.
///
/// Patterns support a leading `*`, a trailing `*`, or both; anything else is
/// an exact name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Allow-list; empty means every table
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Conventional column names the generated DAO code reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Tables with this column get a soft delete
    #[serde(default = "default_soft_delete_field")]
    pub soft_delete_field: String,

    #[serde(default = "default_created_at_field")]
    pub created_at_field: String,

    /// Assigned `CURRENT_TIMESTAMP` on update
    #[serde(default = "default_updated_at_field")]
    pub updated_at_field: String,

    /// Tables with this column get optimistic locking
    #[serde(default = "default_version_field")]
    pub version_field: String,
}

/// Which serialization attributes entity fields carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default = "default_serde_tags")]
    pub serde: bool,

    #[serde(default = "default_sqlx_tags")]
    pub sqlx: bool,
}

/// Main configuration struct for code generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Database dialect (mysql, postgres, sqlite)
    #[serde(default = "default_dialect")]
    pub dialect: Dialect,

    /// Connection string, used by the CLI to open the catalog connection
    #[serde(default)]
    pub dsn: String,

    /// MySQL database or PostgreSQL schema to read (SQLite ignores it)
    #[serde(default)]
    pub schema: Option<String>,

    /// Root directory of generated files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Package name recorded in generated file headers
    #[serde(default = "default_package")]
    pub package: String,

    #[serde(default)]
    pub table_naming: TableNameRule,

    #[serde(default)]
    pub column_naming: ColumnNameRule,

    /// Artifacts to generate
    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub tags: TagConfig,

    /// Directory of `<name>.tpl` files overriding the built-in templates
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Write `mod.rs` files for the generated directories
    #[serde(default = "default_module_files")]
    pub module_files: bool,

    /// Pretty-print generated Rust
    #[serde(default = "default_format_output")]
    pub format_output: bool,

    /// Dry run mode - render everything, write nothing
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

// Default value functions for serde
fn default_dialect() -> Dialect {
    defaults::DIALECT.parse().unwrap_or(Dialect::MySql)
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(defaults::OUTPUT_DIR)
}
fn default_package() -> String {
    defaults::PACKAGE.to_string()
}
fn default_targets() -> Vec<Target> {
    vec![Target::Entity, Target::Dao]
}
fn default_soft_delete_field() -> String {
    defaults::SOFT_DELETE_FIELD.to_string()
}
fn default_created_at_field() -> String {
    defaults::CREATED_AT_FIELD.to_string()
}
fn default_updated_at_field() -> String {
    defaults::UPDATED_AT_FIELD.to_string()
}
fn default_version_field() -> String {
    defaults::VERSION_FIELD.to_string()
}
fn default_serde_tags() -> bool {
    defaults::SERDE_TAGS
}
fn default_sqlx_tags() -> bool {
    defaults::SQLX_TAGS
}
fn default_module_files() -> bool {
    defaults::MODULE_FILES
}
fn default_format_output() -> bool {
    defaults::FORMAT_OUTPUT
}
fn default_dry_run() -> bool {
    defaults::DRY_RUN
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            soft_delete_field: default_soft_delete_field(),
            created_at_field: default_created_at_field(),
            updated_at_field: default_updated_at_field(),
            version_field: default_version_field(),
        }
    }
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            serde: default_serde_tags(),
            sqlx: default_sqlx_tags(),
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            dsn: String::new(),
            schema: None,
            output_dir: default_output_dir(),
            package: default_package(),
            table_naming: TableNameRule::default(),
            column_naming: ColumnNameRule::default(),
            targets: default_targets(),
            filter: FilterConfig::default(),
            features: FeatureConfig::default(),
            tags: TagConfig::default(),
            template_dir: None,
            module_files: default_module_files(),
            format_output: default_format_output(),
            dry_run: default_dry_run(),
            log_level: None,
        }
    }
}

impl CodegenConfig {
    /// Create a default config for the given dialect
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CodegenConfig = toml::from_str(&content).map_err(|e| {
            CodegenError::config(
                "config",
                format!("failed to parse config file {}: {}", path.display(), e),
            )
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    ///
    /// Environment variables use a double underscore between the prefix and
    /// nested keys: `DBFORGE__OUTPUT_DIR`, `DBFORGE__FILTER__EXCLUDE=a,b`.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from config file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            // Try default locations
            builder = builder.add_source(File::with_name("dbforge").required(false));
        }

        // Override with environment variables (DBFORGE__*)
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("targets")
                .with_list_parse_key("filter.include")
                .with_list_parse_key("filter.exclude")
                .try_parsing(true),
        );

        let config: CodegenConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Whether an artifact kind is requested
    pub fn has_target(&self, target: Target) -> bool {
        self.targets.contains(&target)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CodegenError::config("output_dir", "must not be empty"));
        }

        if self.package.trim().is_empty() {
            return Err(CodegenError::config("package", "must not be empty"));
        }

        if self.targets.is_empty() {
            return Err(CodegenError::config(
                "targets",
                "at least one of entity, dao, query, migration is required",
            ));
        }

        if self.has_target(Target::Dao) && !self.has_target(Target::Entity) {
            return Err(CodegenError::config(
                "targets",
                "dao requires entity (DAOs depend on the entity structs)",
            ));
        }

        for (field, patterns) in [
            ("filter.include", &self.filter.include),
            ("filter.exclude", &self.filter.exclude),
        ] {
            if patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(CodegenError::config(field, "patterns must not be empty"));
            }
        }

        let features = &self.features;
        for (field, value) in [
            ("features.soft_delete_field", &features.soft_delete_field),
            ("features.created_at_field", &features.created_at_field),
            ("features.updated_at_field", &features.updated_at_field),
            ("features.version_field", &features.version_field),
        ] {
            if value.trim().is_empty() {
                return Err(CodegenError::config(field, "must not be empty"));
            }
        }

        Ok(())
    }
}

/// Parse a dialect tag given on the command line or in code.
pub fn parse_dialect(tag: &str) -> Result<Dialect> {
    tag.parse()
        .map_err(|_| CodegenError::config("dialect", format!("unsupported dialect `{}`", tag)))
}
