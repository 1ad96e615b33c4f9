//! Connection trait for catalog access

use crate::context::Context;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::row::Row;
use crate::value::Value;
use async_trait::async_trait;

/// An open, read-only handle to a database catalog.
///
/// This trait abstracts over the MySQL, PostgreSQL and SQLite drivers so
/// that the schema parsers can issue catalog queries without knowing which
/// driver sits underneath. Implementations must honour the [`Context`]:
/// a cancelled or expired context aborts the in-flight query.
#[async_trait]
pub trait Connection: Send + Sync {
    /// The dialect spoken by this connection.
    fn dialect(&self) -> Dialect;

    /// Fetch all rows produced by `sql` with positional `params`.
    async fn fetch_all(&self, ctx: &Context, sql: &str, params: Vec<Value>) -> Result<Vec<Row>>;

    /// Fetch the first row, if any.
    async fn fetch_optional(
        &self,
        ctx: &Context,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<Row>> {
        Ok(self.fetch_all(ctx, sql, params).await?.into_iter().next())
    }
}

// Implement Connection for boxed connections
#[async_trait]
impl Connection for Box<dyn Connection> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    async fn fetch_all(&self, ctx: &Context, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        (**self).fetch_all(ctx, sql, params).await
    }
}
