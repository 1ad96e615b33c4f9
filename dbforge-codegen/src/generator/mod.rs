//! Generation orchestrator
//!
//! [`Generator`] ties the pieces together: a [`SchemaParser`] reads the
//! catalog, the [`TableFilter`] narrows it, the [`TemplateEngine`] renders
//! per-table artifacts from [`TemplateData`] and the [`FileWriter`] puts
//! them in place. Generation is fail-fast: the first table that fails to
//! render or write aborts the run.

mod data;
pub mod ddl;
mod filter;

pub use data::{ColumnData, TemplateData};
pub use filter::TableFilter;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dbforge::{Connection, Context};
use tracing::{debug, info};

use crate::config::{CodegenConfig, Target};
use crate::error::{CodegenError, Result};
use crate::parser::{parser_for, Schema, SchemaParser, Table};
use crate::sqlgen::{generator_with, Conventions, SqlGenerator};
use crate::template::{self, TemplateEngine, TemplateError};
use crate::writer::FileWriter;

/// Per-table artifacts: target, template, directory and file suffix.
const ARTIFACTS: [(Target, &str, &str, &str); 3] = [
    (Target::Entity, template::ENTITY, "models", ""),
    (Target::Dao, template::DAO, "dao", "_dao"),
    (Target::Query, template::QUERY, "query", "_query"),
];

/// Parses a catalog and generates source files from it.
pub struct Generator {
    config: CodegenConfig,
    parser: Box<dyn SchemaParser>,
    engine: TemplateEngine,
    filter: TableFilter,
    sql: Box<dyn SqlGenerator>,
    writer: FileWriter,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("dialect", &self.parser.dialect())
            .field("engine", &self.engine)
            .finish()
    }
}

fn template_error(table: &str, path: &Path, err: TemplateError) -> CodegenError {
    CodegenError::Generate {
        table: Some(table.to_string()),
        path: Some(path.to_path_buf()),
        message: "failed to render template".to_string(),
        source: Some(Box::new(err)),
    }
}

fn aborted(table: &str, err: dbforge::Error) -> CodegenError {
    CodegenError::Generate {
        table: Some(table.to_string()),
        path: None,
        message: "generation aborted".to_string(),
        source: Some(Box::new(err)),
    }
}

impl Generator {
    /// A generator over explicit collaborators. The configuration is
    /// validated before anything else happens.
    pub fn new(
        config: CodegenConfig,
        parser: Box<dyn SchemaParser>,
        engine: TemplateEngine,
    ) -> Result<Self> {
        config.validate()?;
        if parser.dialect() != config.dialect {
            return Err(CodegenError::config(
                "dialect",
                format!(
                    "parser reads {} but the configuration is for {}",
                    parser.dialect(),
                    config.dialect
                ),
            ));
        }
        Ok(Self {
            filter: TableFilter::new(&config.filter),
            sql: generator_with(config.dialect, Conventions::from(&config.features)),
            writer: FileWriter::new(),
            config,
            parser,
            engine,
        })
    }

    /// A generator with the configured dialect's parser and the built-in
    /// templates, overridden from `template_dir` when set.
    pub fn from_config(config: CodegenConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = TemplateEngine::new();
        if let Some(dir) = &config.template_dir {
            let loaded = engine.load_dir(dir).map_err(|e| CodegenError::Generate {
                table: None,
                path: Some(dir.clone()),
                message: "failed to load templates".to_string(),
                source: Some(Box::new(e)),
            })?;
            info!("Loaded {} template override(s) from {}", loaded.len(), dir.display());
        }
        let parser = parser_for(config.dialect, config.schema.clone());
        Self::new(config, parser, engine)
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Read the catalog and apply the table filter.
    pub async fn parse(&self, ctx: &Context, conn: &dyn Connection) -> Result<Schema> {
        if conn.dialect() != self.config.dialect {
            return Err(CodegenError::config(
                "dialect",
                format!(
                    "connection is {} but the configuration is for {}",
                    conn.dialect(),
                    self.config.dialect
                ),
            ));
        }

        let mut schema = self.parser.parse_database(ctx, conn).await?;
        let total = schema.tables.len();
        schema.tables.retain(|t| self.filter.matches(&t.name));
        schema.failures.retain(|f| self.filter.matches(&f.table));
        info!(
            "Selected {} of {} tables from `{}`",
            schema.tables.len(),
            total,
            schema.name
        );
        Ok(schema)
    }

    /// Generate every requested artifact for the schema's tables under
    /// `output_dir`, returning the paths written (or, in a dry run, the
    /// paths that would have been written).
    pub async fn generate(
        &self,
        ctx: &Context,
        schema: &Schema,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if schema.dialect != self.config.dialect {
            return Err(CodegenError::config(
                "dialect",
                format!(
                    "schema was read from {} but the configuration is for {}",
                    schema.dialect, self.config.dialect
                ),
            ));
        }

        let tables: Vec<&Table> = schema
            .tables
            .iter()
            .filter(|t| self.filter.matches(&t.name))
            .collect();
        info!(
            "Generating {:?} for {} tables into {}",
            self.config.targets,
            tables.len(),
            output_dir.display()
        );

        let mut written = Vec::new();
        // Directory -> module names, for `mod.rs`
        let mut modules: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
        for table in &tables {
            let paths = self.generate_table(ctx, table, output_dir).await?;
            for path in &paths {
                if let (Some(dir), Some(stem)) =
                    (path.parent(), path.file_stem().and_then(|s| s.to_str()))
                {
                    modules.entry(dir.to_path_buf()).or_default().push(stem.to_string());
                }
            }
            written.extend(paths);
        }

        if self.config.module_files {
            for (dir, mut stems) in modules {
                stems.sort();
                let mut content = String::from("//! Generated by dbforge-codegen. Do not edit by hand.\n\n");
                for stem in stems {
                    content.push_str(&format!("pub mod {};\n", stem));
                }
                let path = dir.join("mod.rs");
                self.emit(&path, content.as_bytes())?;
                written.push(path);
            }
        }

        if self.config.has_target(Target::Migration) {
            if let Some(err) = ctx.err() {
                return Err(aborted(ddl::SCHEMA_FILE, err));
            }
            let filtered = Schema {
                tables: tables.into_iter().cloned().collect(),
                ..schema.clone()
            };
            let path = output_dir.join(ddl::SCHEMA_FILE);
            let script = ddl::render_schema(&filtered, self.sql.as_ref());
            self.emit(&path, script.as_bytes())?;
            written.push(path);
        }

        info!("Generated {} files", written.len());
        Ok(written)
    }

    /// Render and write the per-table artifacts of one table.
    ///
    /// The table must have columns and a primary key made of its own
    /// columns. Every artifact is rendered and checked before any is written.
    pub async fn generate_table(
        &self,
        ctx: &Context,
        table: &Table,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if let Some(err) = ctx.err() {
            return Err(aborted(&table.name, err));
        }

        table.validate().map_err(|e| CodegenError::Generate {
            table: Some(table.name.clone()),
            path: None,
            message: "invalid table".to_string(),
            source: Some(Box::new(e)),
        })?;
        let data = TemplateData::new(table, &self.config, self.sql.as_ref())?;
        let value = serde_json::to_value(&data).map_err(|e| CodegenError::Generate {
            table: Some(table.name.clone()),
            path: None,
            message: "failed to serialize template data".to_string(),
            source: Some(Box::new(e)),
        })?;

        let mut rendered = Vec::new();
        for (target, name, dir, suffix) in ARTIFACTS {
            if !self.config.has_target(target) {
                continue;
            }
            let path = output_dir
                .join(dir)
                .join(format!("{}{}.rs", data.file_stem, suffix));
            let source = self
                .engine
                .render(name, &value)
                .map_err(|e| template_error(&table.name, &path, e))?;
            let source = self.finish_rust(&source).map_err(|e| e.in_table(&table.name))?;
            rendered.push((path, source));
        }

        let mut paths = Vec::with_capacity(rendered.len());
        for (path, source) in rendered {
            self.emit(&path, source.as_bytes())
                .map_err(|e| e.in_table(&table.name))?;
            paths.push(path);
        }
        debug!("Generated {} files for {}", paths.len(), table.name);
        Ok(paths)
    }

    /// Check rendered Rust and pretty-print it when configured.
    fn finish_rust(&self, source: &str) -> Result<String> {
        let file = syn::parse_file(source).map_err(|e| CodegenError::Generate {
            table: None,
            path: None,
            message: format!("generated code is not valid Rust: {}", e),
            source: Some(Box::new(e)),
        })?;
        if self.config.format_output {
            Ok(prettyplease::unparse(&file))
        } else {
            Ok(source.to_string())
        }
    }

    fn emit(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if self.config.dry_run {
            info!("Would write {} ({} bytes)", path.display(), bytes.len());
            return Ok(());
        }
        self.writer.write_atomic(path, bytes)
    }
}
