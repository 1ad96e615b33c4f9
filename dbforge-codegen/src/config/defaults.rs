//! Default configuration values - single source of truth

/// Default dialect tag
pub const DIALECT: &str = "mysql";

/// Default output directory
pub const OUTPUT_DIR: &str = "./generated";

/// Default package name, used in generated file headers
pub const PACKAGE: &str = "models";

/// Default soft-delete marker column
pub const SOFT_DELETE_FIELD: &str = "deleted_at";

/// Default creation timestamp column
pub const CREATED_AT_FIELD: &str = "created_at";

/// Default last-modified timestamp column
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Default optimistic-lock version column
pub const VERSION_FIELD: &str = "version";

/// Whether to emit `#[serde(...)]` attributes by default
pub const SERDE_TAGS: bool = true;

/// Whether to emit `#[sqlx(...)]` attributes by default
pub const SQLX_TAGS: bool = false;

/// Whether to write `mod.rs` files for the generated directories
pub const MODULE_FILES: bool = false;

/// Whether to pretty-print generated Rust
pub const FORMAT_OUTPUT: bool = true;

/// Whether to run in dry-run mode by default
pub const DRY_RUN: bool = false;

/// Prefix of environment variable overrides (`DBFORGE__OUTPUT_DIR=...`)
pub const ENV_PREFIX: &str = "DBFORGE";
