//! SQLite catalog connection (sqlx)

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Row as _, Sqlite, TypeInfo as _, ValueRef as _};
use tracing::trace;

use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::row::Row;
use crate::traits::Connection;
use crate::value::Value;

/// A SQLite catalog connection.
///
/// The pool is capped at one connection so that `sqlite::memory:`
/// databases stay visible across queries.
#[derive(Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl SqliteConnection {
    /// Connect using a `sqlite://path` or `sqlite::memory:` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new().max_connections(1).connect(url).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a script of `;`-separated statements (seeding, fixtures).
    pub async fn execute_script(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_all(&self, ctx: &Context, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        trace!(sql, "sqlite catalog query");
        let query = params.into_iter().fold(sqlx::query(sql), bind_value);
        let rows = ctx.run(query.fetch_all(&self.pool)).await?;
        rows.iter().map(from_sqlite_row).collect()
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(v),
        Value::I64(v) => query.bind(v),
        Value::U64(v) => query.bind(v as i64),
        Value::F64(v) => query.bind(v),
        Value::String(v) => query.bind(v),
        Value::Bytes(v) => query.bind(v),
    }
}

fn from_sqlite_row(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        // Pragma results carry no declared type, so go by the storage class.
        let storage = {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_ascii_uppercase())
            }
        };
        let value = match storage.as_deref() {
            None => Value::Null,
            Some("INTEGER") | Some("INT") | Some("BIGINT") | Some("BOOLEAN") => {
                Value::I64(row.try_get::<i64, _>(i)?)
            }
            Some("REAL") | Some("FLOAT") | Some("DOUBLE") => Value::F64(row.try_get::<f64, _>(i)?),
            Some("BLOB") => Value::Bytes(row.try_get::<Vec<u8>, _>(i)?),
            Some(_) => Value::String(row.try_get::<String, _>(i)?),
        };
        out.push(column.name().to_string(), value);
    }
    Ok(out)
}
