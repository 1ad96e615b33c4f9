//! Canonical schema model shared by every dialect parser

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dbforge::Dialect;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CodegenError, Result};
use crate::types;

/// A parsed database catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Database (or file) name
    pub name: String,

    pub dialect: Dialect,

    /// Successfully parsed tables, in catalog order
    pub tables: Vec<Table>,

    /// When the catalog was read
    pub parsed_at: DateTime<Utc>,

    /// Tables that were skipped because they could not be parsed
    #[serde(skip_deserializing)]
    pub failures: Vec<TableFailure>,
}

/// A table dropped from a full-database parse, and why.
///
/// The error keeps its source chain down to the driver error; it is
/// serialized as its display text.
#[derive(Debug, Clone, Serialize)]
pub struct TableFailure {
    pub table: String,
    #[serde(serialize_with = "error_text")]
    pub error: Arc<CodegenError>,
}

impl TableFailure {
    pub fn new(table: impl Into<String>, error: CodegenError) -> Self {
        Self {
            table: table.into(),
            error: Arc::new(error),
        }
    }

    /// `table: error: cause: ...`, following the whole source chain.
    pub fn describe(&self) -> String {
        let mut text = format!("{}: {}", self.table, self.error);
        let mut source = std::error::Error::source(self.error.as_ref());
        while let Some(err) = source {
            text.push_str(&format!(": {}", err));
            source = std::error::Error::source(err);
        }
        text
    }
}

fn error_text<S: Serializer>(
    error: &Arc<CodegenError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error.as_ref())
}

/// Metadata for a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,

    /// Table comment (empty if none)
    #[serde(default)]
    pub comment: String,

    pub columns: Vec<Column>,

    /// Primary key column names, in key order
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Indexes, including the primary key index where the catalog reports one
    #[serde(default)]
    pub indexes: Vec<Index>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// Metadata for a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    /// Type as reported by the catalog (e.g. `varchar(255)`, `int(10) unsigned`)
    pub raw_type: String,

    /// Rust type chosen by the type mapper (e.g. `Option<String>`)
    pub rust_type: String,

    /// `use` path the Rust type needs, if any
    #[serde(default)]
    pub import: Option<String>,

    pub nullable: bool,

    /// Default value expression (if any)
    #[serde(default)]
    pub default: Option<String>,

    #[serde(default)]
    pub comment: String,

    #[serde(default)]
    pub is_primary_key: bool,

    #[serde(default)]
    pub is_auto_increment: bool,

    /// Character length for string types
    #[serde(default)]
    pub length: Option<u32>,

    /// Numeric precision
    #[serde(default)]
    pub precision: Option<u32>,

    /// Numeric scale
    #[serde(default)]
    pub scale: Option<u32>,
}

/// Metadata for an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,

    /// Columns in the index (in order)
    pub columns: Vec<String>,

    pub unique: bool,

    /// Whether this index backs the primary key
    pub primary: bool,
}

/// Foreign key constraint (one local column)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,

    /// Column name in this table
    pub column: String,

    pub referenced_table: String,

    pub referenced_column: String,

    /// Normalised referential action, e.g. `CASCADE`
    pub on_delete: String,

    pub on_update: String,
}

impl Schema {
    /// An empty schema stamped with the current time.
    pub fn new(name: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            dialect,
            tables: Vec::new(),
            parsed_at: Utc::now(),
            failures: Vec::new(),
        }
    }

    /// Get a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if a column is part of the primary key
    pub fn is_primary_key_column(&self, column_name: &str) -> bool {
        self.primary_key.iter().any(|c| c == column_name)
    }

    /// Primary key columns, in key order
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.primary_key
            .iter()
            .filter_map(|name| self.get_column(name))
            .collect()
    }

    /// Check the table's invariants: at least one column, and every primary
    /// key name refers to an existing column.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(CodegenError::parse_table(&self.name, "table has no columns"));
        }
        for key in &self.primary_key {
            if self.get_column(key).is_none() {
                return Err(CodegenError::Parse {
                    table: Some(self.name.clone()),
                    column: Some(key.clone()),
                    message: "primary key refers to a missing column".to_string(),
                    source: None,
                });
            }
        }
        Ok(())
    }

    /// Validate and mark the primary key columns.
    pub fn finish(mut self) -> Result<Self> {
        self.validate()?;
        let primary_key = self.primary_key.clone();
        for column in &mut self.columns {
            column.is_primary_key = primary_key.contains(&column.name);
        }
        Ok(self)
    }
}

impl Column {
    /// A column with its Rust type resolved from the raw catalog type.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>, nullable: bool) -> Self {
        let raw_type = raw_type.into();
        let mapped = types::map_type(&raw_type, nullable);
        let (length, precision, scale) = type_modifiers(&raw_type);
        Self {
            name: name.into(),
            raw_type,
            rust_type: mapped.rust_type,
            import: mapped.import.map(str::to_string),
            nullable,
            default: None,
            comment: String::new(),
            is_primary_key: false,
            is_auto_increment: false,
            length,
            precision,
            scale,
        }
    }

    /// Whether the column has a non-empty default value
    pub fn has_default(&self) -> bool {
        self.default.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// Length, precision and scale from a type modifier.
///
/// `varchar(50)` -> length 50; `numeric(10,2)` -> precision 10, scale 2.
pub fn type_modifiers(raw_type: &str) -> (Option<u32>, Option<u32>, Option<u32>) {
    let inner = match (raw_type.find('('), raw_type.find(')')) {
        (Some(open), Some(close)) if open < close => &raw_type[open + 1..close],
        _ => return (None, None, None),
    };
    let parts: Vec<Option<u32>> = inner.split(',').map(|p| p.trim().parse().ok()).collect();
    let key = types::normalize_sql_type(raw_type);
    let numeric = ["decimal", "numeric", "dec", "float", "double", "real"]
        .iter()
        .any(|t| key.starts_with(t));
    match (numeric, parts.as_slice()) {
        (true, [p]) => (None, *p, None),
        (true, [p, s, ..]) => (None, *p, *s),
        (false, [l, ..]) => (*l, None, None),
        _ => (None, None, None),
    }
}

/// Normalise a referential action to upper-case SQL words.
///
/// Accepts catalog spellings (`CASCADE`, `set null`) and PostgreSQL action
/// codes (`a`, `r`, `c`, `n`, `d`).
pub fn normalize_fk_action(action: &str) -> String {
    match action.trim() {
        "a" => "NO ACTION".to_string(),
        "r" => "RESTRICT".to_string(),
        "c" => "CASCADE".to_string(),
        "n" => "SET NULL".to_string(),
        "d" => "SET DEFAULT".to_string(),
        "" => "NO ACTION".to_string(),
        other => other
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(" "),
    }
}
