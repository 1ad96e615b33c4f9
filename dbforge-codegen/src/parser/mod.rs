//! Live catalog parsers
//!
//! Each supported dialect has a [`SchemaParser`] that reads the database's
//! system catalog through a [`dbforge::Connection`] and produces the
//! canonical [`Schema`]. A full-database parse is best effort: a table that
//! fails to parse is recorded in [`Schema::failures`] and skipped, while a
//! failure to list tables, or a cancelled context, aborts the parse.

mod model;
mod mysql;
mod postgres;
mod sqlite;

#[cfg(test)]
pub(crate) mod testing;

pub use model::*;
pub use mysql::MySqlParser;
pub use postgres::PostgresParser;
pub use sqlite::SqliteParser;

use async_trait::async_trait;
use dbforge::{Connection, Context, Dialect, FromValue, Row, Value};
use tracing::{debug, info, warn};

use crate::error::{CodegenError, Result};

/// Reads one dialect's system catalog into the canonical schema model.
#[async_trait]
pub trait SchemaParser: Send + Sync {
    /// The dialect this parser understands.
    fn dialect(&self) -> Dialect;

    /// Name of the database being parsed.
    async fn database_name(&self, ctx: &Context, conn: &dyn Connection) -> Result<String>;

    /// Names of all base tables, in catalog order.
    async fn list_tables(&self, ctx: &Context, conn: &dyn Connection) -> Result<Vec<String>>;

    /// Parse a single table.
    async fn parse_table(&self, ctx: &Context, conn: &dyn Connection, name: &str)
        -> Result<Table>;

    /// Parse every table in the database.
    async fn parse_database(&self, ctx: &Context, conn: &dyn Connection) -> Result<Schema> {
        let database = self.database_name(ctx, conn).await?;
        let names = self.list_tables(ctx, conn).await?;
        info!(
            "Parsing {} catalog `{}`: {} tables",
            self.dialect(),
            database,
            names.len()
        );

        let mut schema = Schema::new(database, self.dialect());
        for name in names {
            if let Some(err) = ctx.err() {
                return Err(CodegenError::from_db(Some(&name), "parse aborted", err));
            }
            match self.parse_table(ctx, conn, &name).await {
                Ok(table) => {
                    debug!(
                        "Parsed table {} ({} columns)",
                        table.name,
                        table.columns.len()
                    );
                    schema.tables.push(table);
                }
                Err(err) if err.is_cancellation() => return Err(err),
                Err(err) => {
                    warn!("Skipping table {}: {}", name, err);
                    schema.failures.push(TableFailure::new(name, err));
                }
            }
        }

        info!(
            "Parsed {} tables ({} skipped)",
            schema.tables.len(),
            schema.failures.len()
        );
        Ok(schema)
    }
}

/// The parser for a dialect. `schema` is the MySQL database or PostgreSQL
/// schema to read; SQLite ignores it.
pub fn parser_for(dialect: Dialect, schema: Option<String>) -> Box<dyn SchemaParser> {
    match dialect {
        Dialect::MySql => Box::new(MySqlParser::new(schema)),
        Dialect::Postgres => Box::new(PostgresParser::new(schema)),
        Dialect::Sqlite => Box::new(SqliteParser::new()),
    }
}

/// Run a catalog query, wrapping driver errors as parse errors.
pub(crate) async fn fetch(
    ctx: &Context,
    conn: &dyn Connection,
    table: Option<&str>,
    what: &str,
    sql: &str,
    params: Vec<Value>,
) -> Result<Vec<Row>> {
    conn.fetch_all(ctx, sql, params)
        .await
        .map_err(|e| CodegenError::from_db(table, format!("failed to query {}", what), e))
}

/// Read a typed catalog field.
pub(crate) fn field<T: FromValue>(row: &Row, table: &str, column: &str) -> Result<T> {
    row.get(column).map_err(|e| CodegenError::Parse {
        table: Some(table.to_string()),
        column: Some(column.to_string()),
        message: "unexpected catalog value".to_string(),
        source: Some(e),
    })
}

/// Read an optional text field; NULL and a missing column are both `None`.
pub(crate) fn opt_field(row: &Row, table: &str, column: &str) -> Result<Option<String>> {
    row.get_opt_string(column).map_err(|e| CodegenError::Parse {
        table: Some(table.to_string()),
        column: Some(column.to_string()),
        message: "unexpected catalog value".to_string(),
        source: Some(e),
    })
}

/// Read an optional non-negative number (lengths, precisions).
pub(crate) fn opt_u32(row: &Row, table: &str, column: &str) -> Result<Option<u32>> {
    let value: Option<i64> = match row.get_value(column) {
        Ok(Value::Null) | Err(_) => None,
        Ok(_) => Some(field(row, table, column)?),
    };
    Ok(value.and_then(|v| u32::try_from(v).ok()))
}

/// Group `(index name, column, unique, primary)` rows into indexes,
/// keeping first-seen order of indexes and row order of columns.
pub(crate) fn group_indexes(rows: Vec<(String, String, bool, bool)>) -> Vec<Index> {
    let mut indexes: Vec<Index> = Vec::new();
    for (name, column, unique, primary) in rows {
        match indexes.iter_mut().find(|i| i.name == name) {
            Some(index) => index.columns.push(column),
            None => indexes.push(Index {
                name,
                columns: vec![column],
                unique,
                primary,
            }),
        }
    }
    indexes
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedConnection;
    use super::*;

    #[test]
    fn test_group_indexes() {
        let indexes = group_indexes(vec![
            ("PRIMARY".into(), "id".into(), true, true),
            ("idx_name".into(), "last".into(), false, false),
            ("idx_name".into(), "first".into(), false, false),
        ]);
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[1].columns, vec!["last", "first"]);
        assert!(indexes[0].primary);
    }

    #[test]
    fn test_parser_for() {
        for dialect in Dialect::ALL {
            assert_eq!(parser_for(dialect, None).dialect(), dialect);
        }
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let conn = ScriptedConnection::new(Dialect::Sqlite)
            .on("database_list", vec![Row::new().with("name", "main").with("file", "")])
            .fail("sqlite_master", dbforge::Error::Query("disk I/O error".into()));
        let err = SqliteParser::new()
            .parse_database(&Context::background(), &conn)
            .await
            .unwrap_err();
        assert!(matches!(err, CodegenError::Parse { source: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_cancelled_parse_returns_no_schema() {
        let conn = testing::sqlite_users_posts();
        let (ctx, handle) = Context::cancellable();
        handle.cancel();
        let result = SqliteParser::new().parse_database(&ctx, &conn).await;
        assert!(result.unwrap_err().is_cancellation());
    }
}
