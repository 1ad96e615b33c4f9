//! MySQL flavour: backticks, `?`, `AUTO_INCREMENT`, InnoDB table options

use dbforge::Dialect;

use super::{quote_literal, render_default, Conventions, Field, SqlGenerator, TableDef};

#[derive(Debug, Clone, Default)]
pub struct MySqlGenerator {
    conventions: Conventions,
}

impl MySqlGenerator {
    pub fn new(conventions: Conventions) -> Self {
        Self { conventions }
    }
}

impl SqlGenerator for MySqlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _n: usize) -> String {
        "?".to_string()
    }

    fn column_sql(&self, _def: &TableDef, field: &Field) -> String {
        let mut sql = format!("{} {}", self.quote_ident(&field.name), field.sql_type);
        if !field.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if field.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(default) = &field.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(default));
        }
        if let Some(comment) = &field.comment {
            sql.push_str(" COMMENT ");
            sql.push_str(&quote_literal(comment));
        }
        sql
    }

    fn unique_clauses(&self, def: &TableDef) -> Vec<String> {
        def.fields
            .iter()
            .filter(|f| f.unique && !f.primary_key)
            .map(|f| {
                format!(
                    "UNIQUE KEY {} ({})",
                    self.quote_ident(&format!("uk_{}_{}", def.name, f.name)),
                    self.quote_ident(&f.name)
                )
            })
            .collect()
    }

    fn table_options(&self, def: &TableDef) -> String {
        let mut options = " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4".to_string();
        if let Some(comment) = &def.comment {
            options.push_str(" COMMENT=");
            options.push_str(&quote_literal(comment));
        }
        options
    }
}
