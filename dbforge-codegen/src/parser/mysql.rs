//! MySQL catalog parser (information_schema)

use async_trait::async_trait;
use dbforge::{Connection, Context, Dialect, Value};

use super::{
    fetch, field, group_indexes, normalize_fk_action, opt_field, opt_u32, Column, ForeignKey,
    SchemaParser, Table,
};
use crate::error::{CodegenError, Result};

const TABLES_SQL: &str = "SELECT TABLE_NAME AS table_name \
    FROM information_schema.TABLES \
    WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
    ORDER BY TABLE_NAME";

const TABLE_COMMENT_SQL: &str = "SELECT TABLE_COMMENT AS table_comment \
    FROM information_schema.TABLES \
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

const COLUMNS_SQL: &str = "SELECT COLUMN_NAME AS column_name, COLUMN_TYPE AS column_type, \
    IS_NULLABLE AS is_nullable, COLUMN_DEFAULT AS column_default, \
    COLUMN_COMMENT AS column_comment, EXTRA AS extra, \
    CHARACTER_MAXIMUM_LENGTH AS char_length, NUMERIC_PRECISION AS numeric_precision, \
    NUMERIC_SCALE AS numeric_scale \
    FROM information_schema.COLUMNS \
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
    ORDER BY ORDINAL_POSITION";

const INDEXES_SQL: &str = "SELECT INDEX_NAME AS index_name, COLUMN_NAME AS column_name, \
    NON_UNIQUE AS non_unique \
    FROM information_schema.STATISTICS \
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
    ORDER BY INDEX_NAME = 'PRIMARY' DESC, INDEX_NAME, SEQ_IN_INDEX";

const FOREIGN_KEYS_SQL: &str = "SELECT k.CONSTRAINT_NAME AS constraint_name, \
    k.COLUMN_NAME AS column_name, k.REFERENCED_TABLE_NAME AS referenced_table, \
    k.REFERENCED_COLUMN_NAME AS referenced_column, \
    r.DELETE_RULE AS delete_rule, r.UPDATE_RULE AS update_rule \
    FROM information_schema.KEY_COLUMN_USAGE k \
    JOIN information_schema.REFERENTIAL_CONSTRAINTS r \
      ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
    WHERE k.TABLE_SCHEMA = ? AND k.TABLE_NAME = ? AND k.REFERENCED_TABLE_NAME IS NOT NULL \
    ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION";

/// Parses a MySQL/MariaDB database through `information_schema`.
///
/// Without an explicit schema the connection's current database
/// (`SELECT DATABASE()`) is read.
#[derive(Debug, Clone, Default)]
pub struct MySqlParser {
    schema: Option<String>,
}

impl MySqlParser {
    pub fn new(schema: Option<String>) -> Self {
        Self { schema }
    }

    async fn schema_name(&self, ctx: &Context, conn: &dyn Connection) -> Result<String> {
        if let Some(schema) = &self.schema {
            return Ok(schema.clone());
        }
        let rows = fetch(ctx, conn, None, "current database", "SELECT DATABASE() AS name", vec![])
            .await?;
        rows.first()
            .map(|r| opt_field(r, "", "name"))
            .transpose()?
            .flatten()
            .ok_or_else(|| CodegenError::parse("no database selected and no schema configured"))
    }
}

#[async_trait]
impl SchemaParser for MySqlParser {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn database_name(&self, ctx: &Context, conn: &dyn Connection) -> Result<String> {
        self.schema_name(ctx, conn).await
    }

    async fn list_tables(&self, ctx: &Context, conn: &dyn Connection) -> Result<Vec<String>> {
        let schema = self.schema_name(ctx, conn).await?;
        let rows = fetch(ctx, conn, None, "table list", TABLES_SQL, vec![Value::from(schema)]).await?;
        rows.iter().map(|r| field(r, "TABLES", "table_name")).collect()
    }

    async fn parse_table(&self, ctx: &Context, conn: &dyn Connection, name: &str) -> Result<Table> {
        let schema = self.schema_name(ctx, conn).await?;
        let params = || vec![Value::from(schema.as_str()), Value::from(name)];

        let comment_rows =
            fetch(ctx, conn, Some(name), "table comment", TABLE_COMMENT_SQL, params()).await?;
        let Some(comment_row) = comment_rows.first() else {
            return Err(CodegenError::parse_table(name, "table not found"));
        };

        let mut table = Table::new(name);
        table.comment = opt_field(comment_row, name, "table_comment")?.unwrap_or_default();

        // Columns
        let rows = fetch(ctx, conn, Some(name), "columns", COLUMNS_SQL, params()).await?;
        for row in &rows {
            let column_name: String = field(row, name, "column_name")?;
            let raw_type: String = field(row, name, "column_type")?;
            let nullable: bool = field(row, name, "is_nullable")?;
            let extra = opt_field(row, name, "extra")?.unwrap_or_default();

            let mut column = Column::new(column_name, raw_type, nullable);
            column.default = opt_field(row, name, "column_default")?;
            column.comment = opt_field(row, name, "column_comment")?.unwrap_or_default();
            column.is_auto_increment = extra.to_ascii_lowercase().contains("auto_increment");
            if let Some(length) = opt_u32(row, name, "char_length")? {
                column.length = Some(length);
            }
            if let Some(precision) = opt_u32(row, name, "numeric_precision")? {
                column.precision = Some(precision);
                column.scale = opt_u32(row, name, "numeric_scale")?;
            }
            table.columns.push(column);
        }

        // Indexes; the primary key is the index named PRIMARY
        let rows = fetch(ctx, conn, Some(name), "indexes", INDEXES_SQL, params()).await?;
        let mut members = Vec::with_capacity(rows.len());
        for row in &rows {
            let index_name: String = field(row, name, "index_name")?;
            let column: String = field(row, name, "column_name")?;
            let non_unique: bool = field(row, name, "non_unique")?;
            let primary = index_name == "PRIMARY";
            members.push((index_name, column, !non_unique, primary));
        }
        table.indexes = group_indexes(members);
        if let Some(pk) = table.indexes.iter().find(|i| i.primary) {
            table.primary_key = pk.columns.clone();
        }

        // Foreign keys
        let rows = fetch(ctx, conn, Some(name), "foreign keys", FOREIGN_KEYS_SQL, params()).await?;
        for row in &rows {
            let delete_rule = opt_field(row, name, "delete_rule")?.unwrap_or_default();
            let update_rule = opt_field(row, name, "update_rule")?.unwrap_or_default();
            table.foreign_keys.push(ForeignKey {
                name: field(row, name, "constraint_name")?,
                column: field(row, name, "column_name")?,
                referenced_table: field(row, name, "referenced_table")?,
                referenced_column: field(row, name, "referenced_column")?,
                on_delete: normalize_fk_action(&delete_rule),
                on_update: normalize_fk_action(&update_rule),
            });
        }

        table.finish()
    }
}
