//! PostgreSQL catalog parser (pg_catalog)

use async_trait::async_trait;
use dbforge::{Connection, Context, Dialect, Value};

use super::{
    fetch, field, group_indexes, normalize_fk_action, opt_field, Column, ForeignKey, SchemaParser,
    Table,
};
use crate::error::{CodegenError, Result};

const DEFAULT_SCHEMA: &str = "public";

const TABLES_SQL: &str = "SELECT c.relname::text AS table_name \
    FROM pg_catalog.pg_class c \
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
    WHERE n.nspname = $1 AND c.relkind IN ('r', 'p') \
    ORDER BY c.relname";

const TABLE_COMMENT_SQL: &str = "SELECT COALESCE(obj_description(c.oid, 'pg_class'), '') AS table_comment \
    FROM pg_catalog.pg_class c \
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
    WHERE n.nspname = $1 AND c.relname = $2 AND c.relkind IN ('r', 'p')";

const COLUMNS_SQL: &str = "SELECT a.attname::text AS column_name, \
    pg_catalog.format_type(a.atttypid, a.atttypmod) AS column_type, \
    (NOT a.attnotnull)::bool AS is_nullable, \
    pg_catalog.pg_get_expr(d.adbin, d.adrelid) AS column_default, \
    COALESCE(pg_catalog.col_description(c.oid, a.attnum), '') AS column_comment, \
    (a.attidentity <> '')::bool AS is_identity \
    FROM pg_catalog.pg_attribute a \
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid \
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum \
    WHERE n.nspname = $1 AND c.relname = $2 AND a.attnum > 0 AND NOT a.attisdropped \
    ORDER BY a.attnum";

const INDEXES_SQL: &str = "SELECT i.relname::text AS index_name, a.attname::text AS column_name, \
    ix.indisunique AS is_unique, ix.indisprimary AS is_primary \
    FROM pg_catalog.pg_index ix \
    JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid \
    JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid \
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace \
    CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) \
    JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
    WHERE n.nspname = $1 AND t.relname = $2 \
    ORDER BY ix.indisprimary DESC, i.relname, k.ord";

const FOREIGN_KEYS_SQL: &str = "SELECT con.conname::text AS constraint_name, \
    a.attname::text AS column_name, rt.relname::text AS referenced_table, \
    ra.attname::text AS referenced_column, \
    con.confdeltype::text AS delete_rule, con.confupdtype::text AS update_rule \
    FROM pg_catalog.pg_constraint con \
    JOIN pg_catalog.pg_class t ON t.oid = con.conrelid \
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace \
    JOIN pg_catalog.pg_class rt ON rt.oid = con.confrelid \
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(local_attnum, ref_attnum) \
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.local_attnum \
    JOIN pg_catalog.pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.ref_attnum \
    WHERE con.contype = 'f' AND n.nspname = $1 AND t.relname = $2 \
    ORDER BY con.conname";

/// Parses a PostgreSQL schema through `pg_catalog`.
///
/// Columns whose default draws from a sequence (`nextval(...)`) or that are
/// identity columns are reported as auto-increment.
#[derive(Debug, Clone)]
pub struct PostgresParser {
    schema: String,
}

impl PostgresParser {
    /// Read `schema`, or `public` when none is given.
    pub fn new(schema: Option<String>) -> Self {
        Self {
            schema: schema.unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
        }
    }

    fn params(&self, table: &str) -> Vec<Value> {
        vec![Value::from(self.schema.as_str()), Value::from(table)]
    }
}

impl Default for PostgresParser {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl SchemaParser for PostgresParser {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn database_name(&self, ctx: &Context, conn: &dyn Connection) -> Result<String> {
        let rows = fetch(
            ctx,
            conn,
            None,
            "current database",
            "SELECT current_database()::text AS name",
            vec![],
        )
        .await?;
        rows.first()
            .map(|r| opt_field(r, "", "name"))
            .transpose()?
            .flatten()
            .ok_or_else(|| CodegenError::parse("current_database() returned nothing"))
    }

    async fn list_tables(&self, ctx: &Context, conn: &dyn Connection) -> Result<Vec<String>> {
        let params = vec![Value::from(self.schema.as_str())];
        let rows = fetch(ctx, conn, None, "table list", TABLES_SQL, params).await?;
        rows.iter().map(|r| field(r, "pg_class", "table_name")).collect()
    }

    async fn parse_table(&self, ctx: &Context, conn: &dyn Connection, name: &str) -> Result<Table> {
        let comment_rows = fetch(
            ctx,
            conn,
            Some(name),
            "table comment",
            TABLE_COMMENT_SQL,
            self.params(name),
        )
        .await?;
        let Some(comment_row) = comment_rows.first() else {
            return Err(CodegenError::parse_table(name, "table not found"));
        };

        let mut table = Table::new(name);
        table.comment = opt_field(comment_row, name, "table_comment")?.unwrap_or_default();

        // Columns
        let rows = fetch(ctx, conn, Some(name), "columns", COLUMNS_SQL, self.params(name)).await?;
        for row in &rows {
            let column_name: String = field(row, name, "column_name")?;
            let raw_type: String = field(row, name, "column_type")?;
            let nullable: bool = field(row, name, "is_nullable")?;
            let is_identity: bool = field(row, name, "is_identity")?;
            let default = opt_field(row, name, "column_default")?;

            let mut column = Column::new(column_name, raw_type, nullable);
            column.is_auto_increment =
                is_identity || default.as_deref().is_some_and(|d| d.contains("nextval("));
            column.default = default;
            column.comment = opt_field(row, name, "column_comment")?.unwrap_or_default();
            table.columns.push(column);
        }

        // Indexes
        let rows = fetch(ctx, conn, Some(name), "indexes", INDEXES_SQL, self.params(name)).await?;
        let mut members = Vec::with_capacity(rows.len());
        for row in &rows {
            members.push((
                field(row, name, "index_name")?,
                field(row, name, "column_name")?,
                field(row, name, "is_unique")?,
                field(row, name, "is_primary")?,
            ));
        }
        table.indexes = group_indexes(members);
        if let Some(pk) = table.indexes.iter().find(|i| i.primary) {
            table.primary_key = pk.columns.clone();
        }

        // Foreign keys; actions arrive as single-letter codes
        let rows = fetch(
            ctx,
            conn,
            Some(name),
            "foreign keys",
            FOREIGN_KEYS_SQL,
            self.params(name),
        )
        .await?;
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
