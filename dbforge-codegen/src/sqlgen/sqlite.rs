//! SQLite flavour: double quotes, `?`, inline `INTEGER PRIMARY KEY AUTOINCREMENT`

use dbforge::Dialect;

use super::{render_default, Conventions, Field, SqlGenerator, TableDef};
use crate::types;

#[derive(Debug, Clone, Default)]
pub struct SqliteGenerator {
    conventions: Conventions,
}

impl SqliteGenerator {
    pub fn new(conventions: Conventions) -> Self {
        Self { conventions }
    }
}

impl SqlGenerator for SqliteGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    // AUTOINCREMENT is only valid on a lone INTEGER PRIMARY KEY column
    fn inline_primary_key(&self, def: &TableDef) -> bool {
        def.auto_key()
            .is_some_and(|key| types::is_integer_sql_type(&key.sql_type))
    }

    fn column_sql(&self, def: &TableDef, field: &Field) -> String {
        let name = self.quote_ident(&field.name);
        if field.primary_key && self.inline_primary_key(def) {
            return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name);
        }
        let mut sql = format!("{} {}", name, field.sql_type);
        if !field.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &field.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(default));
        }
        if field.unique && !field.primary_key {
            sql.push_str(" UNIQUE");
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{account, article};
    use super::*;
    use dbforge::{FieldDescriptor, ModelDescriptor};

    #[test]
    fn test_account_create_table() {
        let sql = SqliteGenerator::default().generate_sql(&account()).unwrap();
        assert_eq!(
            sql.create_table,
            "CREATE TABLE IF NOT EXISTS \"accounts\" (\n\
             \x20   \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n\
             \x20   \"name\" TEXT NOT NULL,\n\
             \x20   \"status\" INTEGER DEFAULT 1\n\
             );"
        );
        assert_eq!(
            sql.insert,
            "INSERT INTO \"accounts\" (\"name\", \"status\") VALUES (?, ?);"
        );
    }

    #[test]
    fn test_composite_key_is_table_constraint() {
        let model = ModelDescriptor::new("Membership", "memberships")
            .field(FieldDescriptor::new("user_id", "i64").tag("pk"))
            .field(FieldDescriptor::new("group_id", "i64").tag("pk"))
            .field(FieldDescriptor::new("role", "String").tag("default:member"));
        let sql = SqliteGenerator::default().generate_sql(&model).unwrap();
        assert!(sql
            .create_table
            .contains("PRIMARY KEY (\"user_id\", \"group_id\")"));
        assert!(sql.create_table.contains("\"role\" TEXT DEFAULT 'member'"));
        assert_eq!(
            sql.delete.lines().nth(1),
            Some("DELETE FROM \"memberships\" WHERE \"user_id\" = ? AND \"group_id\" = ?;")
        );
    }

    #[test]
    fn test_unique_inline() {
        let sql = SqliteGenerator::default().generate_sql(&article()).unwrap();
        assert!(sql.create_table.contains("\"slug\" TEXT NOT NULL UNIQUE,"));
        assert!(sql.create_table.contains("\"body\" TEXT,"));
    }
}
