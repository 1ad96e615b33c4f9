//! PostgreSQL flavour: double quotes, `$n`, serial keys, `COMMENT ON`

use dbforge::Dialect;

use super::{quote_literal, render_default, Conventions, Field, SqlGenerator, TableDef};
use crate::types;

#[derive(Debug, Clone, Default)]
pub struct PostgresGenerator {
    conventions: Conventions,
}

impl PostgresGenerator {
    pub fn new(conventions: Conventions) -> Self {
        Self { conventions }
    }
}

/// The serial pseudo-type for an auto-increment integer column.
fn serial_type(sql_type: &str) -> Option<&'static str> {
    if !types::is_integer_sql_type(sql_type) {
        return None;
    }
    let key = types::normalize_sql_type(sql_type);
    Some(match key.as_str() {
        "bigint" | "int8" | "bigserial" | "serial8" => "BIGSERIAL",
        "smallint" | "int2" | "smallserial" | "serial2" => "SMALLSERIAL",
        _ => "SERIAL",
    })
}

impl SqlGenerator for PostgresGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, n: usize) -> String {
        format!("${}", n)
    }

    fn column_sql(&self, _def: &TableDef, field: &Field) -> String {
        let serial: Option<&str> = field
            .auto_increment
            .then(|| serial_type(&field.sql_type))
            .flatten();
        let mut sql = format!(
            "{} {}",
            self.quote_ident(&field.name),
            serial.unwrap_or(field.sql_type.as_str())
        );
        if !field.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if let (None, Some(default)) = (serial, &field.default) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(default));
        }
        if field.unique && !field.primary_key {
            sql.push_str(" UNIQUE");
        }
        sql
    }

    fn comment_statements(&self, def: &TableDef) -> Vec<String> {
        let table = self.quote_ident(&def.name);
        let mut statements = Vec::new();
        if let Some(comment) = &def.comment {
            statements.push(format!(
                "COMMENT ON TABLE {} IS {};",
                table,
                quote_literal(comment)
            ));
        }
        for field in &def.fields {
            if let Some(comment) = &field.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {};",
                    table,
                    self.quote_ident(&field.name),
                    quote_literal(comment)
                ));
            }
        }
        statements
    }

    fn returning(&self, def: &TableDef) -> String {
        def.auto_key()
            .map(|key| format!(" RETURNING {}", self.quote_ident(&key.name)))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{account, article};
    use super::*;

    #[test]
    fn test_account_create_table() {
        let sql = PostgresGenerator::default().generate_sql(&account()).unwrap();
        assert_eq!(
            sql.create_table,
            "CREATE TABLE IF NOT EXISTS \"accounts\" (\n\
             \x20   \"id\" BIGSERIAL NOT NULL,\n\
             \x20   \"name\" VARCHAR(50) NOT NULL,\n\
             \x20   \"status\" INTEGER DEFAULT 1,\n\
             \x20   PRIMARY KEY (\"id\")\n\
             );"
        );
        assert_eq!(
            sql.insert,
            "INSERT INTO \"accounts\" (\"name\", \"status\") VALUES ($1, $2) RETURNING \"id\";"
        );
        assert_eq!(
            sql.update,
            "UPDATE \"accounts\" SET \"name\" = $1, \"status\" = $2 WHERE \"id\" = $3;"
        );
    }

    #[test]
    fn test_unique_inline_and_types() {
        let sql = PostgresGenerator::default().generate_sql(&article()).unwrap();
        assert!(sql.create_table.contains("\"slug\" VARCHAR(120) NOT NULL UNIQUE,"));
        assert!(sql.create_table.contains("\"body\" TEXT,"));
        assert!(sql.create_table.contains("\"created_at\" TIMESTAMP,"));
        assert!(!sql.create_table.contains("UNIQUE KEY"));
    }

    #[test]
    fn test_comment_statements() {
        let mut def = TableDef::from_model(&account(), Dialect::Postgres).unwrap();
        def.comment = Some("accounts".into());
        def.fields[2].comment = Some("1 = active".into());
        let sql = PostgresGenerator::default().create_table_sql(&def);
        assert!(sql.contains("\nCOMMENT ON TABLE \"accounts\" IS 'accounts';"));
        assert!(sql.ends_with("COMMENT ON COLUMN \"accounts\".\"status\" IS '1 = active';"));
    }

    #[test]
    fn test_serial_type() {
        assert_eq!(serial_type("integer"), Some("SERIAL"));
        assert_eq!(serial_type("BIGINT"), Some("BIGSERIAL"));
        assert_eq!(serial_type("int2"), Some("SMALLSERIAL"));
        assert_eq!(serial_type("uuid"), None);
    }
}
