//! Well-formedness check of generated SQL

use dbforge::Dialect;
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::{Parser, ParserError};
use tracing::warn;

/// Parse `sql` with the grammar of `dialect`, returning the statement count.
pub fn check_sql(dialect: Dialect, sql: &str) -> Result<usize, ParserError> {
    let statements = match dialect {
        Dialect::MySql => Parser::parse_sql(&MySqlDialect {}, sql)?,
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql)?,
        Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql)?,
    };
    Ok(statements.len())
}

pub(crate) fn warn_if_invalid(dialect: Dialect, table: &str, kind: &str, sql: &str) {
    if let Err(e) = check_sql(dialect, sql) {
        warn!(
            "Generated {} SQL for {} does not parse as {}: {}",
            kind, table, dialect, e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statements() {
        assert_eq!(
            check_sql(Dialect::Sqlite, "SELECT \"id\" FROM \"users\" WHERE \"id\" = ?;").unwrap(),
            1
        );
        assert_eq!(
            check_sql(
                Dialect::Postgres,
                "INSERT INTO \"users\" (\"name\") VALUES ($1) RETURNING \"id\";"
            )
            .unwrap(),
            1
        );
    }

    #[test]
    fn test_commented_variant_is_ignored() {
        let sql = "-- hard delete\nDELETE FROM `users` WHERE `id` = ?;\n-- UPDATE `users` SET x = 1;";
        assert_eq!(check_sql(Dialect::MySql, sql).unwrap(), 1);
    }

    #[test]
    fn test_invalid_statement() {
        assert!(check_sql(Dialect::MySql, "CREATE TABEL users (id INT)").is_err());
    }
}
