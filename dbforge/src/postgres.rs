//! PostgreSQL catalog connection (sqlx)

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, Postgres, Row as _, TypeInfo as _};
use tracing::trace;

use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::row::Row;
use crate::traits::Connection;
use crate::value::Value;

/// A PostgreSQL catalog connection backed by a small sqlx pool.
#[derive(Clone)]
pub struct PgConnection {
    pool: PgPool,
}

impl PgConnection {
    /// Connect using a `postgres://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(2).connect(url).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Connection for PgConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_all(&self, ctx: &Context, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        trace!(sql, "postgres catalog query");
        let query = params.into_iter().fold(sqlx::query(sql), bind_value);
        let rows = ctx.run(query.fetch_all(&self.pool)).await?;
        rows.iter().map(from_pg_row).collect()
    }
}

fn bind_value(
    query: Query<'_, Postgres, PgArguments>,
    value: Value,
) -> Query<'_, Postgres, PgArguments> {
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

fn from_pg_row(row: &PgRow) -> Result<Row> {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value: Value = match column.type_info().name() {
            "BOOL" => row.try_get::<Option<bool>, _>(i)?.into(),
            "INT2" => row.try_get::<Option<i16>, _>(i)?.map(i64::from).into(),
            "INT4" => row.try_get::<Option<i32>, _>(i)?.map(i64::from).into(),
            "INT8" => row.try_get::<Option<i64>, _>(i)?.into(),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(i)?
                .map(|v| Value::F64(v as f64))
                .unwrap_or(Value::Null),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(i)?
                .map(Value::F64)
                .unwrap_or(Value::Null),
            "BYTEA" => row
                .try_get::<Option<Vec<u8>>, _>(i)?
                .map(Value::Bytes)
                .unwrap_or(Value::Null),
            "\"CHAR\"" => row
                .try_get::<Option<i8>, _>(i)?
                .map(|c| Value::String(((c as u8) as char).to_string()))
                .unwrap_or(Value::Null),
            _ => row.try_get::<Option<String>, _>(i)?.into(),
        };
        out.push(column.name().to_string(), value);
    }
    Ok(out)
}
