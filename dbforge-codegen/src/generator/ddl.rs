//! Migration script rendering for a parsed schema

use crate::parser::{Schema, Table};
use crate::sqlgen::{SqlGenerator, TableDef};

/// Name of the migration script inside the output directory.
pub const SCHEMA_FILE: &str = "schema.sql";

/// One `CREATE TABLE` block per table, referenced tables first.
pub fn render_schema(schema: &Schema, sql: &dyn SqlGenerator) -> String {
    let mut out = format!(
        "-- Generated by dbforge-codegen\n-- Dialect: {}\n-- Database: {}\n",
        sql.dialect(),
        schema.name
    );
    for table in dependency_order(&schema.tables) {
        out.push_str(&format!("\n-- Table: {}\n", table.name));
        out.push_str(&sql.create_table_sql(&TableDef::from_table(table)));
        out.push('\n');
    }
    out
}

/// Tables ordered so each comes after the tables it references.
///
/// Catalog order is kept where there is no constraint; tables in a
/// reference cycle keep their catalog order.
fn dependency_order(tables: &[Table]) -> Vec<&Table> {
    let mut ordered: Vec<&Table> = Vec::with_capacity(tables.len());
    let mut pending: Vec<&Table> = tables.iter().collect();

    while !pending.is_empty() {
        let ready = pending.iter().position(|t| {
            t.foreign_keys.iter().all(|fk| {
                fk.referenced_table == t.name
                    || !pending.iter().any(|p| p.name == fk.referenced_table)
            })
        });
        // A cycle: take the first pending table as is
        let next = ready.unwrap_or(0);
        ordered.push(pending.remove(next));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Column, ForeignKey};
    use crate::sqlgen::generator_for;
    use dbforge::Dialect;

    fn table(name: &str, refs: &[&str]) -> Table {
        let mut t = Table::new(name);
        t.columns = vec![Column::new("id", "integer", false)];
        t.primary_key = vec!["id".to_string()];
        t.foreign_keys = refs
            .iter()
            .map(|r| ForeignKey {
                name: format!("fk_{}_{}", name, r),
                column: format!("{}_id", r),
                referenced_table: r.to_string(),
                referenced_column: "id".to_string(),
                on_delete: "CASCADE".to_string(),
                on_update: "NO ACTION".to_string(),
            })
            .collect();
        t
    }

    #[test]
    fn test_referenced_tables_first() {
        let tables = vec![
            table("comments", &["posts", "users"]),
            table("posts", &["users"]),
            table("users", &[]),
        ];
        let names: Vec<&str> = dependency_order(&tables)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["users", "posts", "comments"]);
    }

    #[test]
    fn test_cycles_and_self_references_terminate() {
        let tables = vec![
            table("a", &["b"]),
            table("b", &["a"]),
            table("tree", &["tree"]),
        ];
        assert_eq!(dependency_order(&tables).len(), 3);
    }

    #[test]
    fn test_render_schema() {
        let mut schema = Schema::new("app", Dialect::Sqlite);
        schema.tables = vec![table("posts", &["users"]), table("users", &[])];
        let script = render_schema(&schema, generator_for(Dialect::Sqlite).as_ref());

        assert!(script.starts_with("-- Generated by dbforge-codegen\n-- Dialect: sqlite\n"));
        let users = script.find("-- Table: users").unwrap();
        let posts = script.find("-- Table: posts").unwrap();
        assert!(users < posts);
        assert!(script.contains("CREATE TABLE IF NOT EXISTS \"posts\""));
        assert!(script.contains("REFERENCES \"users\" (\"id\") ON DELETE CASCADE"));
    }
}
