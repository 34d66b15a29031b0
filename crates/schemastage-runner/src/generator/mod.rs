//! SQL generators.
//!
//! Each generator renders one [`Expression`] as SQL text for its dialect.
//! Capabilities a dialect lacks are reported as
//! [`ProcessorError::Unsupported`] rather than rendered as comments.

mod mysql;
mod sqlite;

pub use mysql::MySqlGenerator;
pub use sqlite::SqliteGenerator;

use schemastage_core::{
    ColumnDefinition, ColumnType, CreateIndexExpression, CreateTableExpression, DbType,
    DefaultValue, Expression, ForeignKeyDefinition,
};

use crate::error::{ProcessorError, Result};

/// Trait for dialect-specific SQL generation.
pub trait MigrationGenerator {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Rewrites a batch of expressions before rendering, for dialects that
    /// must merge some of them. The default keeps the batch as is.
    fn prepare(&self, expressions: &[Expression]) -> Vec<Expression> {
        expressions.to_vec()
    }

    /// Renders one expression.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::Unsupported`] when the dialect cannot express
    /// the change, and [`ProcessorError::InvalidExpression`] when a column has
    /// no type.
    fn generate(&self, expression: &Expression) -> Result<String>;

    /// Returns the SQL type for a logical type.
    fn type_name(&self, db_type: DbType, size: Option<u32>, precision: Option<u32>) -> String;

    /// Keyword making a column an identity column, if the dialect allows one
    /// here.
    fn identity_keyword(&self, primary_key: bool) -> Option<&'static str>;

    /// SQL for the current date and time.
    fn current_date_time(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    /// SQL producing a new GUID.
    fn new_guid(&self) -> &'static str;

    /// Quote an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Quotes `name`, prefixed by its schema when one is set.
    fn qualified_name(&self, schema: Option<&str>, name: &str) -> String {
        match schema {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(name)
            ),
            None => self.quote_identifier(name),
        }
    }

    /// Renders a default value.
    fn default_value(&self, value: &DefaultValue) -> String {
        match value {
            DefaultValue::Null => "NULL".to_string(),
            DefaultValue::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            DefaultValue::Integer(n) => n.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::CurrentDateTime => self.current_date_time().to_string(),
            DefaultValue::NewGuid => self.new_guid().to_string(),
            DefaultValue::Raw(sql) => sql.clone(),
        }
    }

    /// Generates column definition SQL.
    ///
    /// `inline_primary_key` is false when the table declares its primary key
    /// as a separate constraint.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::InvalidExpression`] if the column has no type.
    fn column_definition(
        &self,
        column: &ColumnDefinition,
        inline_primary_key: bool,
    ) -> Result<String> {
        let type_name = match &column.column_type {
            Some(ColumnType::Db(db_type)) => {
                self.type_name(*db_type, column.size, column.precision)
            }
            Some(ColumnType::Custom(custom)) => custom.clone(),
            None => {
                return Err(ProcessorError::InvalidExpression {
                    kind: "CreateColumn",
                    errors: vec![format!("column '{}' has no type", column.name)],
                })
            }
        };
        let mut parts = vec![self.quote_identifier(&column.name), type_name];

        let primary_key = column.is_primary_key && inline_primary_key;
        if primary_key {
            if let Some(name) = &column.primary_key_name {
                parts.push(format!("CONSTRAINT {}", self.quote_identifier(name)));
            }
            parts.push("PRIMARY KEY".to_string());
        }

        if column.is_identity {
            if let Some(keyword) = self.identity_keyword(primary_key) {
                parts.push(keyword.to_string());
            }
        }

        if !column.is_nullable && !primary_key {
            parts.push("NOT NULL".to_string());
        }

        if column.is_unique && !primary_key {
            parts.push("UNIQUE".to_string());
        }

        if let Some(default) = &column.default_value {
            parts.push(format!("DEFAULT {}", self.default_value(default)));
        }

        Ok(parts.join(" "))
    }

    /// Quoted, comma separated column names.
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Name of the referenced table inside a `REFERENCES` clause.
    fn referenced_table(&self, fk: &ForeignKeyDefinition) -> String {
        self.qualified_name(fk.foreign_table_schema.as_deref(), &fk.foreign_table)
    }

    /// Renders `CONSTRAINT .. FOREIGN KEY .. REFERENCES ..` with its rules.
    fn foreign_key_constraint(&self, fk: &ForeignKeyDefinition) -> String {
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(&fk.name),
            self.column_list(&fk.primary_columns),
            self.referenced_table(fk),
            self.column_list(&fk.foreign_columns)
        );
        if let Some(rule) = fk.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(rule.as_sql());
        }
        if let Some(rule) = fk.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(rule.as_sql());
        }
        sql
    }

    /// Generates SQL for creating a table.
    ///
    /// A single unnamed primary key column is declared inline; anything else
    /// becomes a table constraint. Foreign keys carried by the expression
    /// follow the primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if a column has no type.
    fn create_table_sql(&self, expr: &CreateTableExpression) -> Result<String> {
        let primary_key: Vec<&ColumnDefinition> =
            expr.columns.iter().filter(|c| c.is_primary_key).collect();
        let inline = primary_key.len() == 1 && primary_key[0].primary_key_name.is_none();

        let mut definitions = expr
            .columns
            .iter()
            .map(|c| self.column_definition(c, inline))
            .collect::<Result<Vec<_>>>()?;

        if !inline && !primary_key.is_empty() {
            let quoted: Vec<String> = primary_key
                .iter()
                .map(|c| self.quote_identifier(&c.name))
                .collect();
            let constraint = primary_key
                .iter()
                .find_map(|c| c.primary_key_name.as_deref())
                .map(|name| format!("CONSTRAINT {} ", self.quote_identifier(name)))
                .unwrap_or_default();
            definitions.push(format!("{constraint}PRIMARY KEY ({})", quoted.join(", ")));
        }

        definitions.extend(expr.foreign_keys.iter().map(|fk| self.foreign_key_constraint(fk)));

        Ok(format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
            definitions.join(",\n  ")
        ))
    }

    /// Generates the column list of an index.
    fn index_columns_sql(&self, expr: &CreateIndexExpression) -> String {
        expr.index
            .columns
            .iter()
            .map(|c| format!("{} {}", self.quote_identifier(&c.name), c.direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Generates SQL for renaming a column.
    fn rename_column_sql(&self, table: &str, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {table} RENAME COLUMN {} TO {}",
            self.quote_identifier(old_name),
            self.quote_identifier(new_name)
        )
    }
}
