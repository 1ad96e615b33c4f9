//! SQLite catalog parser (introspection pragmas)

use async_trait::async_trait;
use dbforge::{Connection, Context, Dialect};

use super::{
    fetch, field, group_indexes, normalize_fk_action, opt_field, Column, ForeignKey, SchemaParser,
    Table,
};
use crate::error::{CodegenError, Result};
use crate::types;

/// Parses a single-file SQLite database through `PRAGMA` queries.
///
/// SQLite has no schemas and no comments. An integer-typed single-column
/// primary key is an alias of the rowid and is treated as auto-increment.
#[derive(Debug, Clone, Default)]
pub struct SqliteParser;

impl SqliteParser {
    pub fn new() -> Self {
        Self
    }
}

/// Quote an identifier for use inside a pragma argument.
fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl SchemaParser for SqliteParser {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn database_name(&self, ctx: &Context, conn: &dyn Connection) -> Result<String> {
        let rows = fetch(ctx, conn, None, "database list", "PRAGMA database_list", vec![]).await?;
        let file = rows
            .iter()
            .find(|r| r.get::<String>("name").map(|n| n == "main").unwrap_or(false))
            .map(|r| opt_field(r, "", "file"))
            .transpose()?
            .flatten()
            .unwrap_or_default();
        let stem = std::path::Path::new(&file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        Ok(if stem.is_empty() { "main".to_string() } else { stem.to_string() })
    }

    async fn list_tables(&self, ctx: &Context, conn: &dyn Connection) -> Result<Vec<String>> {
        let rows = fetch(
            ctx,
            conn,
            None,
            "table list",
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            vec![],
        )
        .await?;
        rows.iter().map(|r| field(r, "sqlite_master", "name")).collect()
    }

    async fn parse_table(&self, ctx: &Context, conn: &dyn Connection, name: &str) -> Result<Table> {
        let mut table = Table::new(name);

        // Columns; `pk` is the 1-based position in the primary key, 0 otherwise
        let sql = format!("PRAGMA table_info({})", quoted(name));
        let rows = fetch(ctx, conn, Some(name), "columns", &sql, vec![]).await?;
        let mut key: Vec<(i64, String)> = Vec::new();
        for row in &rows {
            let column_name: String = field(row, name, "name")?;
            let raw_type = opt_field(row, name, "type")?.unwrap_or_default();
            let not_null: bool = field(row, name, "notnull")?;
            let pk: i64 = field(row, name, "pk")?;
            if pk > 0 {
                key.push((pk, column_name.clone()));
            }
            // Key columns never hold NULL in practice even without NOT NULL
            let mut column = Column::new(column_name, raw_type, !not_null && pk == 0);
            column.default = opt_field(row, name, "dflt_value")?;
            table.columns.push(column);
        }
        key.sort_by_key(|(position, _)| *position);
        table.primary_key = key.into_iter().map(|(_, c)| c).collect();

        if let [only] = table.primary_key.as_slice() {
            if let Some(column) = table.columns.iter_mut().find(|c| &c.name == only) {
                column.is_auto_increment = types::is_integer_sql_type(&column.raw_type);
            }
        }

        // Indexes
        let sql = format!("PRAGMA index_list({})", quoted(name));
        let index_rows = fetch(ctx, conn, Some(name), "indexes", &sql, vec![]).await?;
        let mut members = Vec::new();
        for row in &index_rows {
            let index_name: String = field(row, name, "name")?;
            let unique: bool = field(row, name, "unique")?;
            let primary = opt_field(row, name, "origin")?.as_deref() == Some("pk");
            let sql = format!("PRAGMA index_info({})", quoted(&index_name));
            let info = fetch(ctx, conn, Some(name), "index columns", &sql, vec![]).await?;
            for col in &info {
                // Expression indexes report a NULL column name
                if let Some(column) = opt_field(col, name, "name")? {
                    members.push((index_name.clone(), column, unique, primary));
                }
            }
        }
        table.indexes = group_indexes(members);

        // Foreign keys; a NULL `to` means the referenced table's primary key
        let sql = format!("PRAGMA foreign_key_list({})", quoted(name));
        let fk_rows = fetch(ctx, conn, Some(name), "foreign keys", &sql, vec![]).await?;
        for row in &fk_rows {
            let column: String = field(row, name, "from")?;
            let referenced_table: String = field(row, name, "table")?;
            let referenced_column = match opt_field(row, name, "to")? {
                Some(to) => to,
                None => referenced_key(ctx, conn, name, &referenced_table).await?,
            };
            let on_delete = opt_field(row, name, "on_delete")?.unwrap_or_default();
            let on_update = opt_field(row, name, "on_update")?.unwrap_or_default();
            table.foreign_keys.push(ForeignKey {
                name: format!("fk_{}_{}", name, column),
                column,
                referenced_table,
                referenced_column,
                on_delete: normalize_fk_action(&on_delete),
                on_update: normalize_fk_action(&on_update),
            });
        }

        table.finish()
    }
}

async fn referenced_key(
    ctx: &Context,
    conn: &dyn Connection,
    table: &str,
    referenced: &str,
) -> Result<String> {
    let sql = format!("PRAGMA table_info({})", quoted(referenced));
    let rows = fetch(ctx, conn, Some(table), "referenced key", &sql, vec![]).await?;
    for row in &rows {
        let pk: i64 = field(row, referenced, "pk")?;
        if pk == 1 {
            return field(row, referenced, "name");
        }
    }
    Err(CodegenError::parse_table(
        table,
        format!("foreign key references `{}` which has no primary key", referenced),
    ))
}
