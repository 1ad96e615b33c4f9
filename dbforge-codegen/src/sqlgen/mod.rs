//! Forward SQL generation: annotated model -> dialect SQL
//!
//! A [`ModelDescriptor`] (usually from `#[derive(SqlModel)]`) is flattened
//! into a [`TableDef`], and a dialect's [`SqlGenerator`] renders the table
//! definition and the four CRUD statements from it. The DDL renderer reuses
//! the same generators for tables read from a live catalog through
//! [`TableDef::from_table`].
//!
//! ```
//! use dbforge::{Dialect, FieldDescriptor, ModelDescriptor};
//! use dbforge_codegen::sqlgen::{generator_for, SqlGenerator};
//!
//! let model = ModelDescriptor::new("User", "users")
//!     .field(FieldDescriptor::new("id", "i64").tag("pk;auto_increment"))
//!     .field(FieldDescriptor::new("name", "String").tag("size:50;not_null"));
//! let sql = generator_for(Dialect::MySql).generate_sql(&model).unwrap();
//! assert_eq!(sql.insert, "INSERT INTO `users` (`name`) VALUES (?);");
//! ```

mod mysql;
mod postgres;
mod sqlite;
mod tag;
mod validate;

pub use mysql::MySqlGenerator;
pub use postgres::PostgresGenerator;
pub use sqlite::SqliteGenerator;
pub use tag::{FieldTag, TagError};
pub use validate::check_sql;

use dbforge::{Dialect, FieldDescriptor, ModelDescriptor, SqlModel};
use tracing::debug;

use crate::config::{defaults, FeatureConfig};
use crate::error::{CodegenError, Result};
use crate::naming;
use crate::parser::{ForeignKey, Table};
use crate::types;

/// Statements generated for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlResult {
    pub create_table: String,
    pub insert: String,
    pub select: String,
    pub update: String,
    /// Soft- and hard-delete variants; the one not applicable is commented out
    pub delete: String,
}

/// Conventional column names that change update and delete statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Never assigned by an update
    pub created_at: String,
    /// Assigned `CURRENT_TIMESTAMP` by every update
    pub updated_at: String,
    /// Soft-delete marker
    pub deleted_at: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            created_at: defaults::CREATED_AT_FIELD.to_string(),
            updated_at: defaults::UPDATED_AT_FIELD.to_string(),
            deleted_at: defaults::SOFT_DELETE_FIELD.to_string(),
        }
    }
}

impl From<&FeatureConfig> for Conventions {
    fn from(features: &FeatureConfig) -> Self {
        Self {
            created_at: features.created_at_field.clone(),
            updated_at: features.updated_at_field.clone(),
            deleted_at: features.soft_delete_field.clone(),
        }
    }
}

/// A column as the forward generators see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name
    pub name: String,
    /// Column type in the target dialect
    pub sql_type: String,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub index: bool,
    pub not_null: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
    pub size: Option<u32>,
}

impl Field {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
            auto_increment: false,
            unique: false,
            index: false,
            not_null: false,
            default: None,
            comment: None,
            size: None,
        }
    }

    /// Key columns are always `NOT NULL`.
    pub fn is_nullable(&self) -> bool {
        !(self.not_null || self.primary_key)
    }
}

/// A secondary index rendered as its own statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// A table as the forward generators see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub comment: Option<String>,
    pub fields: Vec<Field>,
    pub indexes: Vec<IndexDef>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Flatten a model descriptor for `dialect`.
    ///
    /// Skipped and non-`pub` fields are dropped, embedded models are
    /// flattened recursively, and annotations are applied.
    pub fn from_model(model: &ModelDescriptor, dialect: Dialect) -> Result<Self> {
        let mut fields = Vec::new();
        collect_fields(&model.table, &model.fields, dialect, &mut fields)?;
        if fields.is_empty() {
            return Err(CodegenError::generate_table(
                &model.table,
                format!("model `{}` has no columns", model.name),
            ));
        }

        let indexes = fields
            .iter()
            .filter(|f| f.index && !f.unique && !f.primary_key)
            .map(|f| IndexDef {
                name: format!("idx_{}_{}", model.table, f.name),
                columns: vec![f.name.clone()],
                unique: false,
            })
            .collect();

        debug!("Described model {} as {} columns", model.name, fields.len());
        Ok(Self {
            name: model.table.clone(),
            comment: None,
            fields,
            indexes,
            foreign_keys: Vec::new(),
        })
    }

    /// Convert a parsed catalog table, keeping its raw column types.
    pub fn from_table(table: &Table) -> Self {
        // Single-column unique indexes become column constraints
        let unique_columns: Vec<&str> = table
            .indexes
            .iter()
            .filter(|i| i.unique && !i.primary && i.columns.len() == 1)
            .map(|i| i.columns[0].as_str())
            .collect();

        let fields = table
            .columns
            .iter()
            .map(|c| Field {
                name: c.name.clone(),
                sql_type: c.raw_type.clone(),
                primary_key: table.is_primary_key_column(&c.name),
                auto_increment: c.is_auto_increment,
                unique: unique_columns.contains(&c.name.as_str()),
                index: false,
                not_null: !c.nullable,
                default: c.default.clone().filter(|_| !c.is_auto_increment),
                comment: Some(c.comment.clone()).filter(|s| !s.is_empty()),
                size: c.length,
            })
            .collect();

        let indexes = table
            .indexes
            .iter()
            .filter(|i| !i.primary && !(i.unique && i.columns.len() == 1))
            .map(|i| IndexDef {
                name: i.name.clone(),
                columns: i.columns.clone(),
                unique: i.unique,
            })
            .collect();

        Self {
            name: table.name.clone(),
            comment: Some(table.comment.clone()).filter(|s| !s.is_empty()),
            fields,
            indexes,
            foreign_keys: table.foreign_keys.clone(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Primary key fields in declaration order.
    pub fn primary_key(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }

    /// The key column when the key is a single auto-increment column.
    pub fn auto_key(&self) -> Option<&Field> {
        match self.primary_key().as_slice() {
            [only] if only.auto_increment => Some(*only),
            _ => None,
        }
    }
}

fn collect_fields(
    table: &str,
    descriptors: &[FieldDescriptor],
    dialect: Dialect,
    out: &mut Vec<Field>,
) -> Result<()> {
    for descriptor in descriptors {
        if descriptor.skip || !descriptor.exported {
            continue;
        }
        if let Some(embedded) = &descriptor.embedded {
            collect_fields(table, embedded, dialect, out)?;
            continue;
        }

        let tag = FieldTag::parse(descriptor.tag.as_deref().unwrap_or("")).map_err(|e| {
            CodegenError::Generate {
                table: Some(table.to_string()),
                path: None,
                message: format!("field `{}`: {}", descriptor.name, e),
                source: Some(Box::new(e)),
            }
        })?;

        let name = tag
            .column
            .clone()
            .unwrap_or_else(|| naming::to_snake_case(&descriptor.name));
        if out.iter().any(|f| f.name == name) {
            return Err(CodegenError::generate_table(
                table,
                format!("field `{}`: duplicate column `{}`", descriptor.name, name),
            ));
        }
        let sql_type = tag
            .sql_type
            .clone()
            .unwrap_or_else(|| types::sql_type_for(&descriptor.rust_type, dialect, tag.size));

        out.push(Field {
            name,
            sql_type,
            primary_key: tag.primary_key,
            auto_increment: tag.auto_increment,
            unique: tag.unique,
            index: tag.index,
            not_null: tag.not_null,
            default: tag.default,
            comment: tag.comment,
            size: tag.size,
        });
    }
    Ok(())
}

/// Render a default value: numbers, keywords, quoted literals and
/// expressions pass through, anything else becomes a string literal.
pub fn render_default(value: &str) -> String {
    let value = value.trim();
    let is_number = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        && value.parse::<f64>().is_ok();
    let is_keyword = matches!(
        value.to_ascii_uppercase().as_str(),
        "NULL" | "TRUE" | "FALSE" | "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
            | "LOCALTIMESTAMP"
    );
    if is_number || is_keyword || value.starts_with('\'') || value.contains('(') {
        value.to_string()
    } else {
        quote_literal(value)
    }
}

/// A single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn referential_action(clause: &str, action: &str) -> String {
    match action {
        "" | "NO ACTION" => String::new(),
        other => format!(" {} {}", clause, other),
    }
}

/// Renders one dialect's table definition and CRUD statements.
///
/// Implementations provide the dialect hooks; statement assembly is shared.
pub trait SqlGenerator: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn conventions(&self) -> &Conventions;

    fn quote_ident(&self, name: &str) -> String;

    /// Bind marker for the `n`th parameter (1-based).
    fn placeholder(&self, n: usize) -> String;

    /// One column definition, without the trailing comma.
    fn column_sql(&self, def: &TableDef, field: &Field) -> String;

    /// Whether the primary key is declared inside a column definition.
    fn inline_primary_key(&self, _def: &TableDef) -> bool {
        false
    }

    /// Extra table-level unique constraints.
    fn unique_clauses(&self, _def: &TableDef) -> Vec<String> {
        Vec::new()
    }

    /// Text after the closing parenthesis of `CREATE TABLE`.
    fn table_options(&self, _def: &TableDef) -> String {
        String::new()
    }

    /// Statements attaching comments to the table and its columns.
    fn comment_statements(&self, _def: &TableDef) -> Vec<String> {
        Vec::new()
    }

    /// Suffix of an insert that hands back the generated key.
    fn returning(&self, _def: &TableDef) -> String {
        String::new()
    }

    fn quote_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn create_table_sql(&self, def: &TableDef) -> String {
        let mut lines: Vec<String> = def
            .fields
            .iter()
            .map(|f| format!("    {}", self.column_sql(def, f)))
            .collect();

        let key: Vec<String> = def.primary_key().iter().map(|f| f.name.clone()).collect();
        if !key.is_empty() && !self.inline_primary_key(def) {
            lines.push(format!("    PRIMARY KEY ({})", self.quote_list(&key)));
        }
        lines.extend(self.unique_clauses(def).into_iter().map(|c| format!("    {}", c)));
        for fk in &def.foreign_keys {
            lines.push(format!(
                "    CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}{}",
                self.quote_ident(&fk.name),
                self.quote_ident(&fk.column),
                self.quote_ident(&fk.referenced_table),
                self.quote_ident(&fk.referenced_column),
                referential_action("ON DELETE", &fk.on_delete),
                referential_action("ON UPDATE", &fk.on_update),
            ));
        }

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n){};",
            self.quote_ident(&def.name),
            lines.join(",\n"),
            self.table_options(def)
        );
        for index in &def.indexes {
            sql.push_str(&format!(
                "\nCREATE {}INDEX {} ON {} ({});",
                if index.unique { "UNIQUE " } else { "" },
                self.quote_ident(&index.name),
                self.quote_ident(&def.name),
                self.quote_list(&index.columns)
            ));
        }
        for statement in self.comment_statements(def) {
            sql.push('\n');
            sql.push_str(&statement);
        }
        sql
    }

    /// Insert of every column except an auto-increment key.
    fn insert_sql(&self, def: &TableDef) -> String {
        let columns: Vec<String> = def
            .fields
            .iter()
            .filter(|f| !(f.primary_key && f.auto_increment))
            .map(|f| f.name.clone())
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| self.placeholder(n)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}){};",
            self.quote_ident(&def.name),
            self.quote_list(&columns),
            placeholders.join(", "),
            self.returning(def)
        )
    }

    /// Select by primary key, hiding soft-deleted rows.
    fn select_sql(&self, def: &TableDef) -> String {
        let columns: Vec<String> = def.fields.iter().map(|f| f.name.clone()).collect();
        let mut conditions: Vec<String> = def
            .primary_key()
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = {}", self.quote_ident(&f.name), self.placeholder(i + 1)))
            .collect();
        let deleted_at = &self.conventions().deleted_at;
        if def.field(deleted_at).is_some() {
            conditions.push(format!("{} IS NULL", self.quote_ident(deleted_at)));
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            self.quote_list(&columns),
            self.quote_ident(&def.name)
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(';');
        sql
    }

    /// Update by primary key. Creation and soft-delete timestamps are never
    /// assigned; the last-modified column is set to `CURRENT_TIMESTAMP`.
    ///
    /// Without a key, or with nothing to assign, the result is a comment.
    fn update_sql(&self, def: &TableDef) -> String {
        let key = def.primary_key();
        if key.is_empty() {
            return format!("-- update skipped: `{}` has no primary key", def.name);
        }
        let conventions = self.conventions();
        let immutable = [
            &conventions.created_at,
            &conventions.deleted_at,
            &conventions.updated_at,
        ];

        let mut n = 0;
        let mut assignments: Vec<String> = Vec::new();
        for field in &def.fields {
            if (field.primary_key && field.auto_increment) || immutable.contains(&&field.name) {
                continue;
            }
            n += 1;
            assignments.push(format!("{} = {}", self.quote_ident(&field.name), self.placeholder(n)));
        }
        if def.field(&conventions.updated_at).is_some() {
            assignments.push(format!(
                "{} = CURRENT_TIMESTAMP",
                self.quote_ident(&conventions.updated_at)
            ));
        }
        if assignments.is_empty() {
            return format!("-- update skipped: `{}` has no updatable columns", def.name);
        }

        let conditions: Vec<String> = key
            .iter()
            .map(|f| {
                n += 1;
                format!("{} = {}", self.quote_ident(&f.name), self.placeholder(n))
            })
            .collect();
        format!(
            "UPDATE {} SET {} WHERE {};",
            self.quote_ident(&def.name),
            assignments.join(", "),
            conditions.join(" AND ")
        )
    }

    /// Soft delete when the table has the soft-delete marker, hard delete
    /// otherwise; the other variant follows as a comment.
    fn delete_sql(&self, def: &TableDef) -> String {
        let key = def.primary_key();
        if key.is_empty() {
            return format!("-- delete skipped: `{}` has no primary key", def.name);
        }
        let conditions: Vec<String> = key
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = {}", self.quote_ident(&f.name), self.placeholder(i + 1)))
            .collect();
        let conditions = conditions.join(" AND ");
        let table = self.quote_ident(&def.name);
        let deleted_at = &self.conventions().deleted_at;

        let hard = format!("DELETE FROM {} WHERE {};", table, conditions);
        let soft = format!(
            "UPDATE {} SET {} = CURRENT_TIMESTAMP WHERE {};",
            table,
            self.quote_ident(deleted_at),
            conditions
        );
        if def.field(deleted_at).is_some() {
            format!("-- soft delete\n{}\n-- hard delete\n-- {}", soft, hard)
        } else {
            format!(
                "-- hard delete\n{}\n-- soft delete (needs a `{}` column)\n-- {}",
                hard, deleted_at, soft
            )
        }
    }

    /// All five statements for a flattened table.
    fn generate(&self, def: &TableDef) -> Result<SqlResult> {
        let result = SqlResult {
            create_table: self.create_table_sql(def),
            insert: self.insert_sql(def),
            select: self.select_sql(def),
            update: self.update_sql(def),
            delete: self.delete_sql(def),
        };
        for (kind, sql) in [
            ("create table", &result.create_table),
            ("insert", &result.insert),
            ("select", &result.select),
            ("update", &result.update),
            ("delete", &result.delete),
        ] {
            validate::warn_if_invalid(self.dialect(), &def.name, kind, sql);
        }
        Ok(result)
    }

    /// All five statements for a model descriptor.
    fn generate_sql(&self, model: &ModelDescriptor) -> Result<SqlResult> {
        let def = TableDef::from_model(model, self.dialect())?;
        self.generate(&def)
    }
}

/// The generator for a dialect with the default conventions.
pub fn generator_for(dialect: Dialect) -> Box<dyn SqlGenerator> {
    generator_with(dialect, Conventions::default())
}

/// The generator for a dialect with custom conventional column names.
pub fn generator_with(dialect: Dialect, conventions: Conventions) -> Box<dyn SqlGenerator> {
    match dialect {
        Dialect::MySql => Box::new(MySqlGenerator::new(conventions)),
        Dialect::Postgres => Box::new(PostgresGenerator::new(conventions)),
        Dialect::Sqlite => Box::new(SqliteGenerator::new(conventions)),
    }
}

/// Generate SQL for a type implementing [`SqlModel`].
pub fn generate_model<M: SqlModel>(dialect: Dialect) -> Result<SqlResult> {
    generator_for(dialect).generate_sql(&M::describe())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{account, article};
    use super::*;
    use crate::parser::{Column, Index};

    #[test]
    fn test_from_model_flattens_and_skips() {
        let def = TableDef::from_model(&article(), Dialect::MySql).unwrap();
        let names: Vec<&str> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "slug", "author_id", "body", "created_at", "updated_at", "deleted_at"]
        );
        assert_eq!(def.indexes.len(), 1);
        assert_eq!(def.indexes[0].name, "idx_articles_author_id");
        assert_eq!(def.auto_key().unwrap().name, "id");
    }

    #[test]
    fn test_from_model_column_name() {
        let def = TableDef::from_model(&account(), Dialect::Sqlite).unwrap();
        assert_eq!(def.fields[0].name, "id");
        assert_eq!(def.fields[1].sql_type, "TEXT");
        assert_eq!(def.fields[2].default.as_deref(), Some("1"));
    }

    #[test]
    fn test_type_and_column_override_win() {
        let model = ModelDescriptor::new("Country", "countries").field(
            FieldDescriptor::new("code", "String").tag("pk;type:CHAR(2);column:iso_code"),
        );
        let def = TableDef::from_model(&model, Dialect::Postgres).unwrap();
        assert_eq!(def.fields[0].name, "iso_code");
        assert_eq!(def.fields[0].sql_type, "CHAR(2)");
    }

    #[test]
    fn test_unknown_tag_names_field() {
        let model = ModelDescriptor::new("Bad", "bads")
            .field(FieldDescriptor::new("id", "i64").tag("pk;nullable"));
        let err = TableDef::from_model(&model, Dialect::MySql).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("`id`"), "{}", text);
        assert!(text.contains("nullable"), "{}", text);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let model = ModelDescriptor::new("Dup", "dups")
            .field(FieldDescriptor::new("name", "String"))
            .field(FieldDescriptor::new("label", "String").tag("column:name"));
        assert!(TableDef::from_model(&model, Dialect::MySql).is_err());
    }

    #[test]
    fn test_empty_model_rejected() {
        let model = ModelDescriptor::new("Empty", "empties")
            .field(FieldDescriptor::new("hidden", "i32").exported(false));
        assert!(TableDef::from_model(&model, Dialect::MySql).is_err());
    }

    #[test]
    fn test_render_default() {
        assert_eq!(render_default("1"), "1");
        assert_eq!(render_default("-2.5"), "-2.5");
        assert_eq!(render_default("active"), "'active'");
        assert_eq!(render_default("it's"), "'it''s'");
        assert_eq!(render_default("'x'::character varying"), "'x'::character varying");
        assert_eq!(render_default("current_timestamp"), "current_timestamp");
        assert_eq!(render_default("now()"), "now()");
    }

    #[test]
    fn test_update_skips_timestamps_and_sets_modified() {
        let sql = generator_for(Dialect::Sqlite)
            .generate_sql(&article())
            .unwrap();
        assert_eq!(
            sql.update,
            "UPDATE \"articles\" SET \"slug\" = ?, \"author_id\" = ?, \"body\" = ?, \
             \"updated_at\" = CURRENT_TIMESTAMP WHERE \"id\" = ?;"
        );
        assert!(sql.select.ends_with("WHERE \"id\" = ? AND \"deleted_at\" IS NULL;"));
        assert!(sql.delete.starts_with("-- soft delete\nUPDATE \"articles\" SET \"deleted_at\""));
        assert!(sql.delete.contains("-- DELETE FROM \"articles\""));
    }

    #[test]
    fn test_hard_delete_without_marker() {
        let sql = generator_for(Dialect::MySql).generate_sql(&account()).unwrap();
        assert!(sql
            .delete
            .starts_with("-- hard delete\nDELETE FROM `accounts` WHERE `id` = ?;"));
    }

    #[test]
    fn test_keyless_model_keeps_other_statements() {
        let model = ModelDescriptor::new("Log", "logs")
            .field(FieldDescriptor::new("line", "String").tag("not_null"))
            .field(FieldDescriptor::new("level", "i32"));
        for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite] {
            let sql = generator_for(dialect).generate_sql(&model).unwrap();
            assert!(sql.create_table.starts_with("CREATE TABLE"), "{}", sql.create_table);
            assert!(sql.insert.starts_with("INSERT INTO"), "{}", sql.insert);
            assert!(!sql.select.contains("WHERE"), "{}", sql.select);
            assert_eq!(sql.update, "-- update skipped: `logs` has no primary key");
            assert_eq!(sql.delete, "-- delete skipped: `logs` has no primary key");
        }
    }

    #[test]
    fn test_key_only_model_has_no_update() {
        let model = ModelDescriptor::new("Tag", "tags")
            .field(FieldDescriptor::new("id", "i64").tag("primary_key;auto_increment"));
        let sql = generator_for(Dialect::Sqlite).generate_sql(&model).unwrap();
        assert_eq!(sql.update, "-- update skipped: `tags` has no updatable columns");
        assert!(sql.delete.starts_with("-- hard delete\nDELETE FROM \"tags\""));
    }

    #[test]
    fn test_non_auto_key_is_inserted() {
        let model = ModelDescriptor::new("Setting", "settings")
            .field(FieldDescriptor::new("key", "String").tag("pk"))
            .field(FieldDescriptor::new("value", "String"));
        let sql = generator_for(Dialect::Postgres).generate_sql(&model).unwrap();
        assert_eq!(
            sql.insert,
            "INSERT INTO \"settings\" (\"key\", \"value\") VALUES ($1, $2);"
        );
        assert_eq!(
            sql.update,
            "UPDATE \"settings\" SET \"key\" = $1, \"value\" = $2 WHERE \"key\" = $3;"
        );
    }

    #[test]
    fn test_custom_conventions() {
        let model = ModelDescriptor::new("Note", "notes")
            .field(FieldDescriptor::new("id", "i64").tag("pk;auto_increment"))
            .field(FieldDescriptor::new("removed_at", "Option<NaiveDateTime>"));
        let conventions = Conventions {
            deleted_at: "removed_at".into(),
            ..Default::default()
        };
        let sql = generator_with(Dialect::MySql, conventions)
            .generate_sql(&model)
            .unwrap();
        assert!(sql.delete.starts_with("-- soft delete"));
    }

    #[test]
    fn test_from_table() {
        let mut table = Table::new("users");
        table.columns = vec![
            Column::new("id", "integer", false),
            Column::new("email", "varchar(100)", false),
            Column::new("team", "varchar(20)", true),
        ];
        table.columns[0].is_auto_increment = true;
        table.columns[0].default = Some("nextval('users_id_seq'::regclass)".into());
        table.primary_key = vec!["id".into()];
        table.indexes = vec![
            Index {
                name: "users_email_key".into(),
                columns: vec!["email".into()],
                unique: true,
                primary: false,
            },
            Index {
                name: "idx_team".into(),
                columns: vec!["team".into()],
                unique: false,
                primary: false,
            },
        ];

        let def = TableDef::from_table(&table);
        assert!(def.fields[0].primary_key);
        assert_eq!(def.fields[0].default, None);
        assert!(def.fields[1].unique && def.fields[1].not_null);
        assert_eq!(def.fields[1].size, Some(100));
        assert_eq!(def.indexes.len(), 1);
        assert_eq!(def.indexes[0].name, "idx_team");
    }
}
