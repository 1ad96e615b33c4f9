//! Per-table data handed to the templates

use std::collections::{BTreeMap, BTreeSet};

use dbforge::Dialect;
use serde::Serialize;

use crate::config::{CodegenConfig, Target};
use crate::error::{CodegenError, Result};
use crate::naming::{
    escape_field_name, generate_find_by_method_name, to_entity_name, to_file_stem, to_pascal_case,
    to_serde_key,
};
use crate::parser::{Column, Table};
use crate::sqlgen::SqlGenerator;
use crate::types::strip_option;

/// A column never serialized by generated entities.
const SECRET_COLUMN: &str = "password";

/// Everything the `entity`, `dao` and `query` templates read for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub package: String,
    pub dialect: String,
    pub table_name: String,
    /// Single-line table comment, empty if none
    pub table_comment: String,
    pub entity_name: String,
    pub dao_name: String,
    pub column_enum: String,
    pub file_stem: String,
    /// `use` paths the entity needs
    pub imports: Vec<String>,
    /// `use` paths the key parameters of the DAO need
    pub key_imports: Vec<String>,
    pub derives: Vec<String>,
    pub columns: Vec<ColumnData>,
    /// Key columns, in key order
    pub primary_key: Vec<ColumnData>,

    /// `id: i64, tenant: &str`
    pub key_params: String,
    /// Key parameter names, in bind order
    pub key_args: Vec<String>,
    pub find_method: String,

    /// sqlx database type of the pool
    pub pool_db: String,
    pub find_sql: String,
    pub insert_sql: String,
    /// Entity fields bound by `insert_sql`, in order
    pub insert_binds: Vec<String>,
    /// Insert with `RETURNING` the generated key
    pub create_returning: bool,
    /// Query-result method giving `create`'s return value
    pub create_result: String,
    pub create_type: String,
    /// Empty when the table has no key or nothing to assign
    pub update_sql: String,
    pub update_binds: Vec<String>,
    pub delete_sql: String,
    pub soft_delete: bool,
    pub soft_delete_field: String,
    pub has_version: bool,
    pub version_field: String,
}

/// One column as the templates see it.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnData {
    pub name: String,
    /// Escaped Rust field name
    pub field_name: String,
    pub rust_type: String,
    /// Type of a by-key lookup parameter
    pub param_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub comment: String,
    /// Contents of `#[serde(...)]`, empty for none
    pub serde_attr: String,
    /// Contents of `#[sqlx(...)]`, empty for none
    pub sqlx_attr: String,
    /// Variant name in the column enum
    pub variant: String,
    /// Column name quoted for the dialect
    pub quoted_name: String,
}

/// Collapse a comment onto one line.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A field name without its `r#` prefix, as serde and sqlx see it.
fn unraw(field_name: &str) -> &str {
    field_name.strip_prefix("r#").unwrap_or(field_name)
}

fn param_type(rust_type: &str) -> String {
    match rust_type {
        "String" => "&str".to_string(),
        "Vec<u8>" => "&[u8]".to_string(),
        "serde_json::Value" => "&serde_json::Value".to_string(),
        other => other.to_string(),
    }
}

fn variant_name(column: &str, taken: &mut BTreeSet<String>) -> String {
    let mut base = to_pascal_case(column);
    if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
        base = format!("C{}", base);
    }
    if base == "Self" {
        base = "SelfColumn".to_string();
    }
    let mut variant = base.clone();
    let mut n = 2;
    while !taken.insert(variant.clone()) {
        variant = format!("{}{}", base, n);
        n += 1;
    }
    variant
}

fn serde_attr(column: &Column, field_name: &str, key: &str) -> String {
    let mut parts = Vec::new();
    if key != unraw(field_name) {
        parts.push(format!("rename = {:?}", key));
    }
    if column.name.eq_ignore_ascii_case(SECRET_COLUMN) {
        parts.push("skip_serializing".to_string());
    } else if column.nullable && column.rust_type.starts_with("Option<") {
        parts.push("skip_serializing_if = \"Option::is_none\"".to_string());
    }
    parts.join(", ")
}

impl TemplateData {
    /// Build the data for `table`. `sql` supplies identifier quoting and bind
    /// markers for the configured dialect.
    ///
    /// Fails when two columns map to the same Rust field name.
    pub fn new(table: &Table, config: &CodegenConfig, sql: &dyn SqlGenerator) -> Result<Self> {
        check_field_names(table)?;
        let entity_name = to_entity_name(&table.name, config.table_naming);
        let use_sqlx = config.tags.sqlx || config.has_target(Target::Dao);
        let mut variants = BTreeSet::new();

        let columns: Vec<ColumnData> = table
            .columns
            .iter()
            .map(|c| {
                let field_name = escape_field_name(&c.name);
                let key = to_serde_key(&c.name, config.column_naming);
                let (base, _) = strip_option(&c.rust_type);
                ColumnData {
                    name: c.name.clone(),
                    rust_type: c.rust_type.clone(),
                    param_type: param_type(base),
                    nullable: c.nullable,
                    is_primary_key: table.is_primary_key_column(&c.name),
                    is_auto_increment: c.is_auto_increment,
                    comment: one_line(&c.comment),
                    serde_attr: if config.tags.serde {
                        serde_attr(c, &field_name, &key)
                    } else {
                        String::new()
                    },
                    sqlx_attr: if use_sqlx && unraw(&field_name) != c.name {
                        format!("rename = {:?}", c.name)
                    } else {
                        String::new()
                    },
                    variant: variant_name(&c.name, &mut variants),
                    quoted_name: sql.quote_ident(&c.name),
                    field_name,
                }
            })
            .collect();

        let primary_key: Vec<ColumnData> = table
            .primary_key
            .iter()
            .filter_map(|name| columns.iter().find(|c| &c.name == name).cloned())
            .collect();

        let imports: BTreeSet<String> = table
            .columns
            .iter()
            .filter_map(|c| c.import.clone())
            .collect();
        let key_imports: BTreeSet<String> = table
            .primary_key_columns()
            .into_iter()
            .filter_map(|c| c.import.clone())
            .collect();

        let mut derives = vec!["Debug".to_string(), "Clone".to_string(), "PartialEq".to_string()];
        let mut all_imports: Vec<String> = imports.into_iter().collect();
        if config.tags.serde {
            derives.push("Serialize".to_string());
            derives.push("Deserialize".to_string());
            all_imports.push("serde::{Deserialize, Serialize}".to_string());
        }
        if use_sqlx {
            derives.push("sqlx::FromRow".to_string());
        }
        all_imports.sort();

        let features = &config.features;
        let soft_delete = table.get_column(&features.soft_delete_field).is_some();
        let has_version = table.get_column(&features.version_field).is_some();
        let statements = Statements {
            table,
            sql,
            config,
            soft_delete,
            has_version,
        };

        let key_params = primary_key
            .iter()
            .map(|c| format!("{}: {}", c.field_name, c.param_type))
            .collect::<Vec<_>>()
            .join(", ");
        let key_args = primary_key.iter().map(|c| c.field_name.clone()).collect();
        let find_method = generate_find_by_method_name(&table.primary_key);

        let auto_key = match primary_key.as_slice() {
            [only] if only.is_auto_increment => Some(only),
            _ => None,
        };
        let (create_returning, create_result, create_type) = match (auto_key, config.dialect) {
            (Some(key), Dialect::Postgres) => (
                true,
                String::new(),
                strip_option(&key.rust_type).0.to_string(),
            ),
            (Some(_), Dialect::MySql) => (false, "last_insert_id".to_string(), "u64".to_string()),
            (Some(_), Dialect::Sqlite) => (false, "last_insert_rowid".to_string(), "i64".to_string()),
            (None, _) => (false, "rows_affected".to_string(), "u64".to_string()),
        };

        let (insert_sql, insert_binds) = statements.insert(auto_key.is_some() && create_returning);
        let (update_sql, update_binds) = statements.update();

        Ok(Self {
            package: config.package.clone(),
            dialect: config.dialect.to_string(),
            table_name: table.name.clone(),
            table_comment: one_line(&table.comment),
            dao_name: format!("{}Dao", entity_name),
            column_enum: format!("{}Column", entity_name),
            entity_name,
            file_stem: to_file_stem(&table.name),
            imports: all_imports,
            key_imports: key_imports.into_iter().collect(),
            derives,
            key_params,
            key_args,
            find_method,
            pool_db: pool_db(config.dialect).to_string(),
            find_sql: statements.find(),
            insert_sql,
            insert_binds,
            create_returning,
            create_result,
            create_type,
            update_sql,
            update_binds,
            delete_sql: statements.delete(),
            soft_delete,
            soft_delete_field: features.soft_delete_field.clone(),
            has_version,
            version_field: features.version_field.clone(),
            columns,
            primary_key,
        })
    }
}

/// Reject tables whose columns escape to the same field name.
fn check_field_names(table: &Table) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for column in &table.columns {
        let field = escape_field_name(&column.name);
        if let Some(first) = seen.insert(field.clone(), &column.name) {
            return Err(CodegenError::generate_table(
                &table.name,
                format!(
                    "columns `{}` and `{}` both map to field `{}`",
                    first, column.name, field
                ),
            ));
        }
    }
    Ok(())
}

fn pool_db(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySql => "MySql",
        Dialect::Postgres => "Postgres",
        Dialect::Sqlite => "Sqlite",
    }
}

/// The DAO's SQL, without trailing semicolons.
struct Statements<'a> {
    table: &'a Table,
    sql: &'a dyn SqlGenerator,
    config: &'a CodegenConfig,
    soft_delete: bool,
    has_version: bool,
}

impl Statements<'_> {
    fn q(&self, name: &str) -> String {
        self.sql.quote_ident(name)
    }

    fn select_list(&self) -> String {
        self.table
            .columns
            .iter()
            .map(|c| self.q(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `"id" = $n AND ...`, numbering from `first`.
    fn key_predicate(&self, first: usize) -> String {
        self.table
            .primary_key
            .iter()
            .enumerate()
            .map(|(i, k)| format!("{} = {}", self.q(k), self.sql.placeholder(first + i)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn live_only(&self) -> String {
        if self.soft_delete {
            format!(" AND {} IS NULL", self.q(&self.config.features.soft_delete_field))
        } else {
            String::new()
        }
    }

    fn find(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {}{}",
            self.select_list(),
            self.q(&self.table.name),
            self.key_predicate(1),
            self.live_only()
        )
    }

    fn insert(&self, returning: bool) -> (String, Vec<String>) {
        let columns: Vec<&Column> = self
            .table
            .columns
            .iter()
            .filter(|c| !(c.is_auto_increment && self.table.is_primary_key_column(&c.name)))
            .collect();
        let binds = columns.iter().map(|c| escape_field_name(&c.name)).collect();
        let table = self.q(&self.table.name);

        let mut sql = if columns.is_empty() {
            match self.config.dialect {
                Dialect::MySql => format!("INSERT INTO {} () VALUES ()", table),
                _ => format!("INSERT INTO {} DEFAULT VALUES", table),
            }
        } else {
            let names: Vec<String> = columns.iter().map(|c| self.q(&c.name)).collect();
            let marks: Vec<String> = (1..=columns.len()).map(|n| self.sql.placeholder(n)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                names.join(", "),
                marks.join(", ")
            )
        };
        if returning {
            sql.push_str(&format!(" RETURNING {}", self.q(&self.table.primary_key[0])));
        }
        (sql, binds)
    }

    fn update(&self) -> (String, Vec<String>) {
        if self.table.primary_key.is_empty() {
            return (String::new(), Vec::new());
        }
        let features = &self.config.features;
        let reserved = [
            features.created_at_field.as_str(),
            features.updated_at_field.as_str(),
            features.soft_delete_field.as_str(),
            features.version_field.as_str(),
        ];

        let assigned: Vec<&Column> = self
            .table
            .columns
            .iter()
            .filter(|c| !self.table.is_primary_key_column(&c.name) && !reserved.contains(&c.name.as_str()))
            .collect();

        let mut sets: Vec<String> = assigned
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", self.q(&c.name), self.sql.placeholder(i + 1)))
            .collect();
        if self.table.get_column(&features.updated_at_field).is_some() {
            sets.push(format!("{} = CURRENT_TIMESTAMP", self.q(&features.updated_at_field)));
        }
        if self.has_version {
            let version = self.q(&features.version_field);
            sets.push(format!("{} = {} + 1", version, version));
        }
        if sets.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut binds: Vec<String> = assigned.iter().map(|c| escape_field_name(&c.name)).collect();
        let mut sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.q(&self.table.name),
            sets.join(", "),
            self.key_predicate(assigned.len() + 1)
        );
        binds.extend(self.table.primary_key.iter().map(|k| escape_field_name(k)));
        if self.has_version {
            sql.push_str(&format!(
                " AND {} = {}",
                self.q(&features.version_field),
                self.sql.placeholder(binds.len() + 1)
            ));
            binds.push(escape_field_name(&features.version_field));
        }
        sql.push_str(&self.live_only());
        (sql, binds)
    }

    fn delete(&self) -> String {
        if self.table.primary_key.is_empty() {
            return String::new();
        }
        let table = self.q(&self.table.name);
        if self.soft_delete {
            format!(
                "UPDATE {} SET {} = CURRENT_TIMESTAMP WHERE {}{}",
                table,
                self.q(&self.config.features.soft_delete_field),
                self.key_predicate(1),
                self.live_only()
            )
        } else {
            format!("DELETE FROM {} WHERE {}", table, self.key_predicate(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlgen::generator_for;
    use crate::types::map_type;

    fn column(name: &str, raw: &str, nullable: bool) -> Column {
        let mapped = map_type(raw, nullable);
        Column {
            name: name.to_string(),
            raw_type: raw.to_string(),
            rust_type: mapped.rust_type,
            import: mapped.import.map(str::to_string),
            nullable,
            default: None,
            comment: String::new(),
            is_primary_key: false,
            is_auto_increment: false,
            length: None,
            precision: None,
            scale: None,
        }
    }

    fn accounts() -> Table {
        let mut id = column("id", "bigint", false);
        id.is_auto_increment = true;
        let mut table = Table::new("accounts");
        table.comment = "Customer\naccounts".to_string();
        table.columns = vec![
            id,
            column("userName", "varchar(64)", false),
            column("password", "varchar(255)", false),
            column("bio", "text", true),
            column("type", "int", false),
            column("created_at", "datetime", false),
            column("updated_at", "datetime", true),
            column("deleted_at", "datetime", true),
            column("version", "int", false),
        ];
        table.primary_key = vec!["id".to_string()];
        table
    }

    fn data(dialect: Dialect, table: &Table) -> TemplateData {
        let mut config = CodegenConfig::for_dialect(dialect);
        config.targets = vec![Target::Entity, Target::Dao];
        TemplateData::new(table, &config, generator_for(dialect).as_ref()).unwrap()
    }

    fn col<'a>(data: &'a TemplateData, name: &str) -> &'a ColumnData {
        data.columns.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_names_and_imports() {
        let data = data(Dialect::MySql, &accounts());
        assert_eq!(data.entity_name, "Account");
        assert_eq!(data.dao_name, "AccountDao");
        assert_eq!(data.file_stem, "accounts");
        assert_eq!(data.table_comment, "Customer accounts");
        assert_eq!(
            data.imports,
            vec!["chrono::NaiveDateTime", "serde::{Deserialize, Serialize}"]
        );
        assert!(data.derives.contains(&"sqlx::FromRow".to_string()));
        assert_eq!(data.find_method, "find_by_id");
        assert_eq!(data.key_params, "id: i64");
    }

    #[test]
    fn test_serde_attributes() {
        let data = data(Dialect::MySql, &accounts());
        assert_eq!(col(&data, "id").serde_attr, "");
        assert_eq!(col(&data, "password").serde_attr, "skip_serializing");
        assert_eq!(
            col(&data, "bio").serde_attr,
            "skip_serializing_if = \"Option::is_none\""
        );
        // snake_case key differs from the column, field keeps the Rust name
        assert_eq!(col(&data, "userName").field_name, "user_name");
        assert_eq!(col(&data, "userName").serde_attr, "");
        assert_eq!(col(&data, "userName").sqlx_attr, "rename = \"userName\"");
        assert_eq!(col(&data, "type").field_name, "r#type");
        assert_eq!(col(&data, "type").sqlx_attr, "");
    }

    #[test]
    fn test_mysql_statements() {
        let data = data(Dialect::MySql, &accounts());
        assert!(data.find_sql.ends_with("WHERE `id` = ? AND `deleted_at` IS NULL"));
        assert!(data.insert_sql.starts_with("INSERT INTO `accounts` (`userName`, `password`"));
        assert!(!data.insert_binds.contains(&"id".to_string()));
        assert_eq!(data.create_result, "last_insert_id");
        assert_eq!(
            data.update_sql,
            "UPDATE `accounts` SET `userName` = ?, `password` = ?, `bio` = ?, `type` = ?, \
             `updated_at` = CURRENT_TIMESTAMP, `version` = `version` + 1 \
             WHERE `id` = ? AND `version` = ? AND `deleted_at` IS NULL"
        );
        assert_eq!(
            data.update_binds,
            vec!["user_name", "password", "bio", "r#type", "id", "version"]
        );
        assert!(data.soft_delete);
        assert!(data.delete_sql.starts_with("UPDATE `accounts` SET `deleted_at` = CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_postgres_numbering_and_returning() {
        let data = data(Dialect::Postgres, &accounts());
        assert!(data.create_returning);
        assert_eq!(data.create_type, "i64");
        assert!(data.insert_sql.ends_with("RETURNING \"id\""));
        assert!(data.update_sql.contains("\"type\" = $4"));
        assert!(data.update_sql.contains("WHERE \"id\" = $5 AND \"version\" = $6"));
        assert_eq!(data.pool_db, "Postgres");
    }

    #[test]
    fn test_plain_table_hard_delete() {
        let mut table = Table::new("tags");
        table.columns = vec![column("name", "text", false)];
        table.primary_key = vec!["name".to_string()];
        let data = data(Dialect::Sqlite, &table);
        assert_eq!(data.delete_sql, "DELETE FROM \"tags\" WHERE \"name\" = ?");
        // Nothing but the key: no update
        assert_eq!(data.update_sql, "");
        assert_eq!(data.create_result, "rows_affected");
        assert_eq!(data.key_params, "name: &str");
    }

    #[test]
    fn test_keyless_table() {
        let mut table = Table::new("events");
        table.columns = vec![column("payload", "json", true)];
        let data = data(Dialect::Sqlite, &table);
        assert!(data.primary_key.is_empty());
        assert_eq!(data.update_sql, "");
        assert_eq!(data.delete_sql, "");
    }

    #[test]
    fn test_variant_names() {
        let mut taken = BTreeSet::new();
        assert_eq!(variant_name("user_id", &mut taken), "UserId");
        assert_eq!(variant_name("userId", &mut taken), "UserId2");
        assert_eq!(variant_name("2fa", &mut taken), "C2fa");
        assert_eq!(variant_name("self", &mut taken), "SelfColumn");
    }

    #[test]
    fn test_colliding_field_names() {
        let mut table = Table::new("members");
        table.columns = vec![
            column("userName", "varchar(64)", false),
            column("user_name", "varchar(64)", false),
        ];
        let config = CodegenConfig::for_dialect(Dialect::MySql);
        let err = TemplateData::new(&table, &config, generator_for(Dialect::MySql).as_ref())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`userName`"), "{}", message);
        assert!(message.contains("`user_name`"), "{}", message);
        assert!(matches!(err, CodegenError::Generate { table: Some(t), .. } if t == "members"));
    }

    #[test]
    fn test_path_keyword_columns() {
        let mut table = Table::new("nodes");
        table.columns = vec![column("self", "int", false), column("super", "int", true)];
        table.primary_key = vec!["self".to_string()];
        let data = data(Dialect::Postgres, &table);
        assert_eq!(col(&data, "self").field_name, "self_");
        assert_eq!(col(&data, "self").sqlx_attr, "rename = \"self\"");
        assert_eq!(data.key_params, "self_: i32");
        assert_eq!(data.update_binds, vec!["super_", "self_"]);
    }
}
