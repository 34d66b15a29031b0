//! MySQL generator.

use schemastage_core::{
    CreateColumnExpression, CreateForeignKeyExpression, CreateIndexExpression, DbType,
    Expression,
};

use super::MigrationGenerator;
use crate::error::Result;

/// MySQL SQL generator.
#[derive(Debug, Clone, Default)]
pub struct MySqlGenerator;

impl MySqlGenerator {
    /// Creates a new MySQL generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates SQL for adding a column.
    fn add_column_sql(&self, expr: &CreateColumnExpression) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
            self.column_definition(&expr.column, true)?
        ))
    }

    /// Generates SQL for adding a foreign key constraint.
    fn add_foreign_key_sql(&self, expr: &CreateForeignKeyExpression) -> String {
        let fk = &expr.foreign_key;
        format!(
            "ALTER TABLE {} ADD {}",
            self.qualified_name(fk.primary_table_schema.as_deref(), &fk.primary_table),
            self.foreign_key_constraint(fk)
        )
    }

    /// Generates SQL for creating an index.
    fn create_index_sql(&self, expr: &CreateIndexExpression) -> String {
        let index = &expr.index;
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.is_unique { "UNIQUE " } else { "" },
            self.quote_identifier(&index.name),
            self.qualified_name(index.schema_name.as_deref(), &index.table_name),
            self.index_columns_sql(expr)
        )
    }
}

impl MigrationGenerator for MySqlGenerator {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn generate(&self, expression: &Expression) -> Result<String> {
        let sql = match expression {
            Expression::CreateSchema(expr) => {
                format!("CREATE SCHEMA {}", self.quote_identifier(&expr.schema_name))
            }
            Expression::DeleteSchema(expr) => {
                format!("DROP SCHEMA {}", self.quote_identifier(&expr.schema_name))
            }
            Expression::CreateTable(expr) => {
                format!("{} ENGINE = INNODB", self.create_table_sql(expr)?)
            }
            Expression::CreateColumn(expr) => self.add_column_sql(expr)?,
            Expression::CreateForeignKey(expr) => self.add_foreign_key_sql(expr),
            Expression::CreateIndex(expr) => self.create_index_sql(expr),
            Expression::DeleteTable(expr) => format!(
                "DROP TABLE {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.table_name)
            ),
            Expression::DeleteColumn(expr) => format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
                self.quote_identifier(&expr.column_name)
            ),
            Expression::DeleteForeignKey(expr) => format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
                self.quote_identifier(&expr.name)
            ),
            Expression::DeleteIndex(expr) => format!(
                "DROP INDEX {} ON {}",
                self.quote_identifier(&expr.name),
                self.qualified_name(expr.schema_name.as_deref(), &expr.table_name)
            ),
            Expression::RenameTable(expr) => format!(
                "RENAME TABLE {} TO {}",
                self.qualified_name(expr.schema_name.as_deref(), &expr.old_name),
                self.qualified_name(expr.schema_name.as_deref(), &expr.new_name)
            ),
            Expression::RenameColumn(expr) => self.rename_column_sql(
                &self.qualified_name(expr.schema_name.as_deref(), &expr.table_name),
                &expr.old_name,
                &expr.new_name,
            ),
            Expression::ExecuteSql(expr) => expr.sql.clone(),
        };
        Ok(sql)
    }

    fn type_name(&self, db_type: DbType, size: Option<u32>, precision: Option<u32>) -> String {
        let sized = |name: &str, fallback: &str| match size {
            Some(size) => format!("{name}({size})"),
            None => fallback.to_string(),
        };
        match db_type {
            DbType::AnsiString => sized("VARCHAR", "TEXT") + " CHARACTER SET latin1",
            DbType::AnsiStringFixedLength => sized("CHAR", "CHAR(255)") + " CHARACTER SET latin1",
            DbType::String => sized("VARCHAR", "TEXT"),
            DbType::StringFixedLength => sized("CHAR", "CHAR(255)"),
            DbType::Binary => sized("VARBINARY", "LONGBLOB"),
            DbType::Boolean => "TINYINT(1)".to_string(),
            DbType::Byte => "TINYINT UNSIGNED".to_string(),
            DbType::Currency => "DECIMAL(19,4)".to_string(),
            DbType::Date => "DATE".to_string(),
            DbType::DateTime => "DATETIME".to_string(),
            DbType::Decimal => format!(
                "DECIMAL({},{})",
                size.unwrap_or(19),
                precision.unwrap_or(5)
            ),
            DbType::Double => "DOUBLE".to_string(),
            DbType::Single => "FLOAT".to_string(),
            DbType::Guid => "CHAR(36)".to_string(),
            DbType::Int16 => "SMALLINT".to_string(),
            DbType::Int32 => "INTEGER".to_string(),
            DbType::Int64 => "BIGINT".to_string(),
            DbType::Time => "TIME".to_string(),
            DbType::Xml => "LONGTEXT".to_string(),
        }
    }

    fn identity_keyword(&self, _primary_key: bool) -> Option<&'static str> {
        Some("AUTO_INCREMENT")
    }

    fn new_guid(&self) -> &'static str {
        "(UUID())"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}
