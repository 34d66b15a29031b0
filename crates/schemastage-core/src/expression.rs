//! Schema change expressions.
//!
//! Each expression is a self-contained description of one schema change and
//! carries everything a generator needs to render it as SQL.

use serde::{Deserialize, Serialize};

use crate::model::{ColumnDefinition, ForeignKeyDefinition, IndexDefinition};

/// A single schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// CREATE SCHEMA.
    CreateSchema(CreateSchemaExpression),
    /// CREATE TABLE.
    CreateTable(CreateTableExpression),
    /// Add a column to an existing table.
    CreateColumn(CreateColumnExpression),
    /// Add a foreign key constraint.
    CreateForeignKey(CreateForeignKeyExpression),
    /// CREATE INDEX.
    CreateIndex(CreateIndexExpression),
    /// DROP SCHEMA.
    DeleteSchema(DeleteSchemaExpression),
    /// DROP TABLE.
    DeleteTable(DeleteTableExpression),
    /// Drop a column.
    DeleteColumn(DeleteColumnExpression),
    /// Drop a foreign key constraint.
    DeleteForeignKey(DeleteForeignKeyExpression),
    /// DROP INDEX.
    DeleteIndex(DeleteIndexExpression),
    /// Rename a table.
    RenameTable(RenameTableExpression),
    /// Rename a column.
    RenameColumn(RenameColumnExpression),
    /// Raw SQL, passed through untouched.
    ExecuteSql(ExecuteSqlExpression),
}

/// Create schema expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSchemaExpression {
    /// Schema name.
    pub schema_name: String,
}

/// Create table expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTableExpression {
    /// Table name.
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
    /// Column definitions, in declaration order.
    pub columns: Vec<ColumnDefinition>,
    /// Foreign keys declared with the table rather than added afterwards.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
}

/// Create column expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateColumnExpression {
    /// Table receiving the column.
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
    /// The column itself.
    pub column: ColumnDefinition,
}

/// Create foreign key expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateForeignKeyExpression {
    /// The relationship.
    pub foreign_key: ForeignKeyDefinition,
}

/// Create index expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexExpression {
    /// The index.
    pub index: IndexDefinition,
}

/// Delete schema expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSchemaExpression {
    /// Schema name.
    pub schema_name: String,
}

/// Delete table expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTableExpression {
    /// Table name.
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
}

/// Delete column expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteColumnExpression {
    /// Table name.
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
    /// Column to drop.
    pub column_name: String,
}

/// Delete foreign key expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteForeignKeyExpression {
    /// Table owning the constraint.
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
    /// Constraint name.
    pub name: String,
}

/// Delete index expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteIndexExpression {
    /// Indexed table (MySQL needs it, SQLite ignores it).
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
    /// Index name.
    pub name: String,
}

/// Rename table expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTableExpression {
    /// Schema name.
    pub schema_name: Option<String>,
    /// Current name.
    pub old_name: String,
    /// New name.
    pub new_name: String,
}

/// Rename column expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameColumnExpression {
    /// Table name.
    pub table_name: String,
    /// Schema name.
    pub schema_name: Option<String>,
    /// Current column name.
    pub old_name: String,
    /// New column name.
    pub new_name: String,
}

/// Raw SQL expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSqlExpression {
    /// Fully rendered SQL text.
    pub sql: String,
}

macro_rules! impl_into_expression {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(expr: $ty) -> Self {
                    Self::$variant(expr)
                }
            }
        )*
    };
}

impl_into_expression! {
    CreateSchemaExpression => CreateSchema,
    CreateTableExpression => CreateTable,
    CreateColumnExpression => CreateColumn,
    CreateForeignKeyExpression => CreateForeignKey,
    CreateIndexExpression => CreateIndex,
    DeleteSchemaExpression => DeleteSchema,
    DeleteTableExpression => DeleteTable,
    DeleteColumnExpression => DeleteColumn,
    DeleteForeignKeyExpression => DeleteForeignKey,
    DeleteIndexExpression => DeleteIndex,
    RenameTableExpression => RenameTable,
    RenameColumnExpression => RenameColumn,
    ExecuteSqlExpression => ExecuteSql,
}

fn require(errors: &mut Vec<String>, value: &str, what: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{what} cannot be empty"));
    }
}

fn check_column(errors: &mut Vec<String>, column: &ColumnDefinition) {
    require(errors, &column.name, "Column name");
    if column.column_type.is_none() {
        errors.push(format!("Column '{}' has no type", column.name));
    }
}

fn check_foreign_key(errors: &mut Vec<String>, fk: &ForeignKeyDefinition) {
    require(errors, &fk.name, "Foreign key name");
    require(errors, &fk.primary_table, "Primary table name");
    require(errors, &fk.foreign_table, "Foreign table name");
    if fk.primary_columns.is_empty() || fk.foreign_columns.is_empty() {
        errors.push(format!("Foreign key '{}' has no columns", fk.name));
    } else if fk.primary_columns.len() != fk.foreign_columns.len() {
        errors.push(format!(
            "Foreign key '{}' maps {} column(s) onto {}",
            fk.name,
            fk.primary_columns.len(),
            fk.foreign_columns.len()
        ));
    }
}

impl Expression {
    /// Returns a stable name for this kind of expression.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateSchema(_) => "CreateSchema",
            Self::CreateTable(_) => "CreateTable",
            Self::CreateColumn(_) => "CreateColumn",
            Self::CreateForeignKey(_) => "CreateForeignKey",
            Self::CreateIndex(_) => "CreateIndex",
            Self::DeleteSchema(_) => "DeleteSchema",
            Self::DeleteTable(_) => "DeleteTable",
            Self::DeleteColumn(_) => "DeleteColumn",
            Self::DeleteForeignKey(_) => "DeleteForeignKey",
            Self::DeleteIndex(_) => "DeleteIndex",
            Self::RenameTable(_) => "RenameTable",
            Self::RenameColumn(_) => "RenameColumn",
            Self::ExecuteSql(_) => "ExecuteSql",
        }
    }

    /// Collects problems that would make this expression impossible to render.
    ///
    /// Builders never check this; it is left to whoever turns expressions into
    /// SQL.
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self {
            Self::CreateSchema(e) => require(&mut errors, &e.schema_name, "Schema name"),
            Self::DeleteSchema(e) => require(&mut errors, &e.schema_name, "Schema name"),
            Self::CreateTable(e) => {
                require(&mut errors, &e.table_name, "Table name");
                if e.columns.is_empty() {
                    errors.push(format!("Table '{}' has no columns", e.table_name));
                }
                for column in &e.columns {
                    check_column(&mut errors, column);
                }
                for fk in &e.foreign_keys {
                    check_foreign_key(&mut errors, fk);
                }
            }
            Self::CreateColumn(e) => {
                require(&mut errors, &e.table_name, "Table name");
                check_column(&mut errors, &e.column);
            }
            Self::CreateForeignKey(e) => check_foreign_key(&mut errors, &e.foreign_key),
            Self::CreateIndex(e) => {
                require(&mut errors, &e.index.name, "Index name");
                require(&mut errors, &e.index.table_name, "Table name");
                if e.index.columns.is_empty() {
                    errors.push(format!("Index '{}' has no columns", e.index.name));
                }
            }
            Self::DeleteTable(e) => require(&mut errors, &e.table_name, "Table name"),
            Self::DeleteColumn(e) => {
                require(&mut errors, &e.table_name, "Table name");
                require(&mut errors, &e.column_name, "Column name");
            }
            Self::DeleteForeignKey(e) => {
                require(&mut errors, &e.table_name, "Table name");
                require(&mut errors, &e.name, "Foreign key name");
            }
            Self::DeleteIndex(e) => require(&mut errors, &e.name, "Index name"),
            Self::RenameTable(e) => {
                require(&mut errors, &e.old_name, "Old table name");
                require(&mut errors, &e.new_name, "New table name");
            }
            Self::RenameColumn(e) => {
                require(&mut errors, &e.table_name, "Table name");
                require(&mut errors, &e.old_name, "Old column name");
                require(&mut errors, &e.new_name, "New column name");
            }
            Self::ExecuteSql(_) => {}
        }
        errors
    }

    /// Returns the expression that undoes this one, if it can be derived.
    ///
    /// Deletes and raw SQL cannot be reversed without knowing what was there
    /// before.
    #[must_use]
    pub fn reverse(&self) -> Option<Self> {
        match self {
            Self::CreateSchema(e) => Some(
                DeleteSchemaExpression {
                    schema_name: e.schema_name.clone(),
                }
                .into(),
            ),
            Self::CreateTable(e) => Some(
                DeleteTableExpression {
                    table_name: e.table_name.clone(),
                    schema_name: e.schema_name.clone(),
                }
                .into(),
            ),
            Self::CreateColumn(e) => Some(
                DeleteColumnExpression {
                    table_name: e.table_name.clone(),
                    schema_name: e.schema_name.clone(),
                    column_name: e.column.name.clone(),
                }
                .into(),
            ),
            Self::CreateForeignKey(e) => Some(
                DeleteForeignKeyExpression {
                    table_name: e.foreign_key.primary_table.clone(),
                    schema_name: e.foreign_key.primary_table_schema.clone(),
                    name: e.foreign_key.name.clone(),
                }
                .into(),
            ),
            Self::CreateIndex(e) => Some(
                DeleteIndexExpression {
                    table_name: e.index.table_name.clone(),
                    schema_name: e.index.schema_name.clone(),
                    name: e.index.name.clone(),
                }
                .into(),
            ),
            Self::RenameTable(e) => Some(
                RenameTableExpression {
                    schema_name: e.schema_name.clone(),
                    old_name: e.new_name.clone(),
                    new_name: e.old_name.clone(),
                }
                .into(),
            ),
            Self::RenameColumn(e) => Some(
                RenameColumnExpression {
                    table_name: e.table_name.clone(),
                    schema_name: e.schema_name.clone(),
                    old_name: e.new_name.clone(),
                    new_name: e.old_name.clone(),
                }
                .into(),
            ),
            Self::DeleteSchema(_)
            | Self::DeleteTable(_)
            | Self::DeleteColumn(_)
            | Self::DeleteForeignKey(_)
            | Self::DeleteIndex(_)
            | Self::ExecuteSql(_) => None,
        }
    }
}
