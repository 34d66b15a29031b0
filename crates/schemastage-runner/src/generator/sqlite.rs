//! SQLite generator.
//!
//! SQLite has limited ALTER TABLE support: foreign keys can only be declared
//! when a table is created, and schemas are attached database files rather
//! than objects that can be created with SQL. A foreign key whose table is
//! created earlier in the same batch is folded into that CREATE TABLE.

use schemastage_core::{
    CreateColumnExpression, CreateIndexExpression, DbType, Expression, ForeignKeyDefinition,
    RenameTableExpression,
};

use super::MigrationGenerator;
use crate::error::{ProcessorError, Result};

/// SQLite SQL generator.
#[derive(Debug, Clone, Default)]
pub struct SqliteGenerator;

impl SqliteGenerator {
    /// Creates a new SQLite generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn unsupported(operation: &str) -> ProcessorError {
        ProcessorError::unsupported("sqlite", operation)
    }

    /// Generates SQL for adding a column.
    fn add_column_sql(&self, expr: &CreateColumnExpression) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
            self.column_definition(&expr.column, true)?
        ))
    }

    /// Generates SQL for creating an index. The schema qualifies the index,
    /// the table is always in that same schema.
    fn create_index_sql(&self, expr: &CreateIndexExpression) -> String {
        let index = &expr.index;
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.is_unique { "UNIQUE " } else { "" },
            self.qualified_name(index.schema_name.as_deref(), &index.name),
            self.quote_identifier(&index.table_name),
            self.index_columns_sql(expr)
        )
    }

    /// Generates SQL for renaming a table.
    fn rename_table_sql(&self, expr: &RenameTableExpression) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.qualified_name(expr.schema_name.as_deref(), &expr.old_name),
            self.quote_identifier(&expr.new_name)
        )
    }
}

impl MigrationGenerator for SqliteGenerator {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn prepare(&self, expressions: &[Expression]) -> Vec<Expression> {
        fold_foreign_keys(expressions)
    }

    fn generate(&self, expression: &Expression) -> Result<String> {
        match expression {
            Expression::CreateSchema(_) => Err(Self::unsupported("create schema")),
            Expression::DeleteSchema(_) => Err(Self::unsupported("delete schema")),
            Expression::CreateForeignKey(_) => Err(Self::unsupported(
                "add foreign key to an existing table",
            )),
            Expression::DeleteForeignKey(_) => Err(Self::unsupported("delete foreign key")),

            Expression::CreateTable(expr) => self.create_table_sql(expr),

            Expression::CreateColumn(expr) => self.add_column_sql(expr),

            Expression::CreateIndex(expr) => Ok(self.create_index_sql(expr)),

            Expression::DeleteTable(expr) => Ok(format!(
                "DROP TABLE {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.table_name)
            )),

            // SQLite 3.35.0+
            Expression::DeleteColumn(expr) => Ok(format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
                self.quote_identifier(&expr.column_name)
            )),

            Expression::DeleteIndex(expr) => Ok(format!(
                "DROP INDEX {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.name)
            )),

            Expression::RenameTable(expr) => Ok(self.rename_table_sql(expr)),

            // SQLite 3.25.0+
            Expression::RenameColumn(expr) => Ok(self.rename_column_sql(
                &self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
                &expr.old_name,
                &expr.new_name,
            )),

            Expression::ExecuteSql(expr) => Ok(expr.sql.clone()),
        }
    }

    fn type_name(&self, db_type: DbType, _size: Option<u32>, _precision: Option<u32>) -> String {
        match db_type {
            DbType::Boolean
            | DbType::Byte
            | DbType::Int16
            | DbType::Int32
            | DbType::Int64 => "INTEGER",
            DbType::AnsiString
            | DbType::AnsiStringFixedLength
            | DbType::String
            | DbType::StringFixedLength
            | DbType::Xml
            | DbType::Guid => "TEXT",
            DbType::Date => "DATE",
            DbType::DateTime => "DATETIME",
            DbType::Time => "TIME",
            DbType::Single | DbType::Double => "REAL",
            DbType::Decimal | DbType::Currency => "NUMERIC",
            DbType::Binary => "BLOB",
        }
        .to_string()
    }

    fn identity_keyword(&self, primary_key: bool) -> Option<&'static str> {
        primary_key.then_some("AUTOINCREMENT")
    }

    fn new_guid(&self) -> &'static str {
        "(lower(hex(randomblob(16))))"
    }

    // REFERENCES never takes a schema prefix in SQLite.
    fn referenced_table(&self, fk: &ForeignKeyDefinition) -> String {
        self.quote_identifier(&fk.foreign_table)
    }
}

/// Moves each foreign key into the CREATE TABLE of its owning table when that
/// table is created earlier in `expressions` and already declares the
/// constrained columns. Other foreign keys are kept.
fn fold_foreign_keys(expressions: &[Expression]) -> Vec<Expression> {
    let mut folded: Vec<Expression> = Vec::with_capacity(expressions.len());
    for expression in expressions {
        if let Expression::CreateForeignKey(expr) = expression {
            let fk = &expr.foreign_key;
            let owner = folded.iter_mut().rev().find_map(|e| match e {
                Expression::CreateTable(table)
                    if table.table_name == fk.primary_table
                        && table.schema_name == fk.primary_table_schema
                        && fk
                            .primary_columns
                            .iter()
                            .all(|name| table.columns.iter().any(|c| &c.name == name)) =>
                {
                    Some(table)
                }
                _ => None,
            });
            if let Some(table) = owner {
                table.foreign_keys.push(fk.clone());
                continue;
            }
        }
        folded.push(expression.clone());
    }
    folded
}
