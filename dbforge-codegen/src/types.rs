//! SQL type <-> Rust type mapping
//!
//! The forward table ([`map_type`]) turns a catalog type string into the Rust
//! type used in generated entities. The inverse ([`sql_type_for`]) turns a Rust
//! type written in an annotated struct into a column type for a dialect.

use dbforge::Dialect;

/// A Rust type chosen for a SQL column, plus the `use` path it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    pub rust_type: String,
    pub import: Option<&'static str>,
}

/// One row of the type table.
#[derive(Debug, Clone, Copy)]
pub struct TypeEntry {
    pub rust_type: &'static str,
    pub import: Option<&'static str>,
    /// Whether a nullable column becomes `Option<T>`; blob and JSON values
    /// already have an empty representation.
    pub has_nullable: bool,
}

const fn entry(rust_type: &'static str) -> TypeEntry {
    TypeEntry {
        rust_type,
        import: None,
        has_nullable: true,
    }
}

const fn imported(rust_type: &'static str, import: &'static str) -> TypeEntry {
    TypeEntry {
        rust_type,
        import: Some(import),
        has_nullable: true,
    }
}

const fn bare(rust_type: &'static str) -> TypeEntry {
    TypeEntry {
        rust_type,
        import: None,
        has_nullable: false,
    }
}

/// Fallback for types not in the table.
pub const DYNAMIC_TYPE: &str = "serde_json::Value";

/// Normalized SQL type name -> Rust type.
pub const TYPE_TABLE: &[(&str, TypeEntry)] = &[
    // integers
    ("tinyint", entry("i8")),
    ("tinyint unsigned", entry("u8")),
    ("smallint", entry("i16")),
    ("smallint unsigned", entry("u16")),
    ("int2", entry("i16")),
    ("smallserial", entry("i16")),
    ("mediumint", entry("i32")),
    ("mediumint unsigned", entry("u32")),
    ("int", entry("i32")),
    ("int unsigned", entry("u32")),
    ("integer", entry("i32")),
    ("integer unsigned", entry("u32")),
    ("int4", entry("i32")),
    ("serial", entry("i32")),
    ("year", entry("i32")),
    ("bigint", entry("i64")),
    ("bigint unsigned", entry("u64")),
    ("int8", entry("i64")),
    ("bigserial", entry("i64")),
    // floating point
    ("float", entry("f32")),
    ("float4", entry("f32")),
    ("real", entry("f64")),
    ("double", entry("f64")),
    ("double precision", entry("f64")),
    ("float8", entry("f64")),
    // fixed point is carried as text to avoid precision loss
    ("decimal", entry("String")),
    ("numeric", entry("String")),
    ("dec", entry("String")),
    ("money", entry("String")),
    // boolean
    ("bool", entry("bool")),
    ("boolean", entry("bool")),
    ("bit", entry("bool")),
    // text
    ("char", entry("String")),
    ("character", entry("String")),
    ("nchar", entry("String")),
    ("varchar", entry("String")),
    ("character varying", entry("String")),
    ("nvarchar", entry("String")),
    ("bpchar", entry("String")),
    ("text", entry("String")),
    ("tinytext", entry("String")),
    ("mediumtext", entry("String")),
    ("longtext", entry("String")),
    ("clob", entry("String")),
    ("citext", entry("String")),
    ("name", entry("String")),
    ("enum", entry("String")),
    ("set", entry("String")),
    ("uuid", entry("String")),
    ("inet", entry("String")),
    ("cidr", entry("String")),
    // binary
    ("binary", bare("Vec<u8>")),
    ("varbinary", bare("Vec<u8>")),
    ("blob", bare("Vec<u8>")),
    ("tinyblob", bare("Vec<u8>")),
    ("mediumblob", bare("Vec<u8>")),
    ("longblob", bare("Vec<u8>")),
    ("bytea", bare("Vec<u8>")),
    // temporal
    ("date", imported("NaiveDate", "chrono::NaiveDate")),
    ("time", imported("NaiveTime", "chrono::NaiveTime")),
    ("time without time zone", imported("NaiveTime", "chrono::NaiveTime")),
    ("datetime", imported("NaiveDateTime", "chrono::NaiveDateTime")),
    ("timestamp", imported("NaiveDateTime", "chrono::NaiveDateTime")),
    (
        "timestamp without time zone",
        imported("NaiveDateTime", "chrono::NaiveDateTime"),
    ),
    ("timestamptz", imported("DateTime<Utc>", "chrono::{DateTime, Utc}")),
    (
        "timestamp with time zone",
        imported("DateTime<Utc>", "chrono::{DateTime, Utc}"),
    ),
    // JSON-like
    ("json", bare("serde_json::Value")),
    ("jsonb", bare("serde_json::Value")),
];

/// Lowercase, drop every parenthesised modifier and collapse whitespace.
///
/// `VARCHAR(255)` -> `varchar`, `int(10) unsigned` -> `int unsigned`.
pub fn normalize_sql_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look up the table entry for a raw SQL type.
pub fn lookup(raw: &str) -> Option<&'static TypeEntry> {
    let key = normalize_sql_type(raw);
    TYPE_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, entry)| entry)
}

const TINYINT_BOOL: TypeEntry = entry("bool");

fn is_tinyint_bool(raw: &str) -> bool {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("tinyint(1)")
}

/// Map a raw catalog type to a Rust type. Never fails.
///
/// Unknown types degrade to `serde_json::Value`.
pub fn map_type(raw: &str, nullable: bool) -> MappedType {
    let entry = if is_tinyint_bool(raw) {
        Some(&TINYINT_BOOL)
    } else {
        lookup(raw)
    };

    match entry {
        Some(entry) => {
            let rust_type = if nullable && entry.has_nullable {
                format!("Option<{}>", entry.rust_type)
            } else {
                entry.rust_type.to_string()
            };
            MappedType {
                rust_type,
                import: entry.import,
            }
        }
        None => MappedType {
            rust_type: DYNAMIC_TYPE.to_string(),
            import: None,
        },
    }
}

/// Split `Option<T>` into `(T, true)`; anything else is `(ty, false)`.
pub fn strip_option(rust_type: &str) -> (&str, bool) {
    let compact = rust_type.trim();
    match compact
        .strip_prefix("Option<")
        .or_else(|| compact.strip_prefix("std::option::Option<"))
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(inner) => (inner.trim(), true),
        None => (compact, false),
    }
}

/// Last path segment without generics: `chrono::DateTime<Utc>` -> `DateTime`.
fn base_name(rust_type: &str) -> &str {
    let head = rust_type.split('<').next().unwrap_or(rust_type);
    head.rsplit("::").next().unwrap_or(head).trim()
}

/// SQL column type for a Rust type in the given dialect.
///
/// `size` only affects string columns. Unknown Rust types become the
/// dialect's text type.
pub fn sql_type_for(rust_type: &str, dialect: Dialect, size: Option<u32>) -> String {
    let (inner, _) = strip_option(rust_type);
    let compact: String = inner.chars().filter(|c| !c.is_whitespace()).collect();
    let base = match compact.as_str() {
        "Vec<u8>" | "&[u8]" | "Box<[u8]>" => "bytes",
        "&str" | "&'staticstr" => "String",
        other => base_name(other),
    };

    match dialect {
        Dialect::MySql => match base {
            "i8" => "TINYINT".into(),
            "u8" => "TINYINT UNSIGNED".into(),
            "i16" => "SMALLINT".into(),
            "u16" => "SMALLINT UNSIGNED".into(),
            "i32" => "INT".into(),
            "u32" => "INT UNSIGNED".into(),
            "i64" | "isize" => "BIGINT".into(),
            "u64" | "usize" => "BIGINT UNSIGNED".into(),
            "f32" => "FLOAT".into(),
            "f64" => "DOUBLE".into(),
            "bool" => "TINYINT(1)".into(),
            "String" | "char" => format!("VARCHAR({})", size.unwrap_or(255)),
            "bytes" => "BLOB".into(),
            "Decimal" => "DECIMAL(20,6)".into(),
            "NaiveDate" => "DATE".into(),
            "NaiveTime" => "TIME".into(),
            "NaiveDateTime" => "DATETIME".into(),
            "DateTime" => "TIMESTAMP".into(),
            "Value" => "JSON".into(),
            "Uuid" => "CHAR(36)".into(),
            _ => "TEXT".into(),
        },
        Dialect::Postgres => match base {
            "i8" | "u8" | "i16" => "SMALLINT".into(),
            "u16" | "i32" => "INTEGER".into(),
            "u32" | "i64" | "isize" => "BIGINT".into(),
            "u64" | "usize" => "NUMERIC(20)".into(),
            "f32" => "REAL".into(),
            "f64" => "DOUBLE PRECISION".into(),
            "bool" => "BOOLEAN".into(),
            "String" | "char" => match size {
                Some(n) => format!("VARCHAR({})", n),
                None => "TEXT".into(),
            },
            "bytes" => "BYTEA".into(),
            "Decimal" => "NUMERIC(20,6)".into(),
            "NaiveDate" => "DATE".into(),
            "NaiveTime" => "TIME".into(),
            "NaiveDateTime" => "TIMESTAMP".into(),
            "DateTime" => "TIMESTAMPTZ".into(),
            "Value" => "JSONB".into(),
            "Uuid" => "UUID".into(),
            _ => "TEXT".into(),
        },
        Dialect::Sqlite => match base {
            "i8" | "u8" | "i16" | "u16" | "i32" | "u32" | "i64" | "u64" | "isize" | "usize"
            | "bool" => "INTEGER".into(),
            "f32" | "f64" => "REAL".into(),
            "bytes" => "BLOB".into(),
            "Decimal" => "NUMERIC".into(),
            "NaiveDate" => "DATE".into(),
            "NaiveTime" => "TIME".into(),
            "NaiveDateTime" | "DateTime" => "DATETIME".into(),
            _ => "TEXT".into(),
        },
    }
}

/// Whether a Rust type is an integer (used for auto-increment keys).
pub fn is_integer_type(rust_type: &str) -> bool {
    let (inner, _) = strip_option(rust_type);
    matches!(
        base_name(inner),
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "isize" | "usize"
    )
}

/// Whether a raw SQL type names an integer column.
pub fn is_integer_sql_type(raw: &str) -> bool {
    let key = normalize_sql_type(raw);
    key.contains("int") || key.contains("serial")
}
