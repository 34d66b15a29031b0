//! Plain value records describing columns, foreign keys and indexes.
//!
//! These types carry no behavior beyond small conveniences. Builders fill
//! them in, generators read them.

use serde::{Deserialize, Serialize};

/// Logical column types understood by every generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbType {
    /// Variable-length non-unicode string.
    AnsiString,
    /// Fixed-length non-unicode string.
    AnsiStringFixedLength,
    /// Variable-length unicode string.
    String,
    /// Fixed-length unicode string.
    StringFixedLength,
    /// Binary data.
    Binary,
    /// Boolean.
    Boolean,
    /// Unsigned 8-bit integer.
    Byte,
    /// Monetary value.
    Currency,
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Exact numeric with size and precision.
    Decimal,
    /// Double precision floating point.
    Double,
    /// Single precision floating point.
    Single,
    /// Globally unique identifier.
    Guid,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Time of day.
    Time,
    /// XML document.
    Xml,
}

/// The type of a column: either a logical type or a raw, dialect-specific one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// A logical type mapped by the generator.
    Db(DbType),
    /// A raw type string emitted verbatim.
    Custom(String),
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// The database's current date and time.
    CurrentDateTime,
    /// A freshly generated GUID.
    NewGuid,
    /// Raw SQL expression, emitted verbatim.
    Raw(String),
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A single column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name, unique within its table.
    pub name: String,
    /// Column type. `None` until one of the `as_*` builder methods ran.
    pub column_type: Option<ColumnType>,
    /// Length for strings and binaries, total digits for decimals.
    pub size: Option<u32>,
    /// Digits after the decimal point (decimal types only).
    pub precision: Option<u32>,
    /// Default value.
    pub default_value: Option<DefaultValue>,
    /// Whether the column accepts NULL.
    pub is_nullable: bool,
    /// Whether the column is (part of) the primary key.
    pub is_primary_key: bool,
    /// Whether the column is an identity / auto-increment column.
    pub is_identity: bool,
    /// Whether the column participates in a foreign key.
    pub is_foreign_key: bool,
    /// Whether the column should be indexed.
    pub is_indexed: bool,
    /// Whether the column carries a unique constraint.
    pub is_unique: bool,
    /// Explicit primary key constraint name.
    pub primary_key_name: Option<String>,
}

impl ColumnDefinition {
    /// Creates an untyped column with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the logical type, if the column has one.
    #[must_use]
    pub fn db_type(&self) -> Option<DbType> {
        match self.column_type {
            Some(ColumnType::Db(db_type)) => Some(db_type),
            _ => None,
        }
    }

    /// Returns the custom type string, if the column has one.
    #[must_use]
    pub fn custom_type(&self) -> Option<&str> {
        match &self.column_type {
            Some(ColumnType::Custom(custom)) => Some(custom),
            _ => None,
        }
    }
}

/// Referential action for ON DELETE / ON UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForeignKeyRule {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyRule {
    /// Returns the SQL representation of the rule.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key relationship.
///
/// The primary side is the table owning the constrained columns, the
/// foreign side is the referenced table. `primary_columns[i]` corresponds
/// to `foreign_columns[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    /// Constraint name.
    pub name: String,
    /// Table owning the constrained columns.
    pub primary_table: String,
    /// Schema of the primary table.
    pub primary_table_schema: Option<String>,
    /// Referenced table.
    pub foreign_table: String,
    /// Schema of the referenced table.
    pub foreign_table_schema: Option<String>,
    /// Constrained columns.
    pub primary_columns: Vec<String>,
    /// Referenced columns.
    pub foreign_columns: Vec<String>,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyRule>,
    /// Action on update.
    pub on_update: Option<ForeignKeyRule>,
}

/// Sort direction of an indexed column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending (default).
    #[default]
    Ascending,
    /// Descending.
    Descending,
}

impl SortDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumnDefinition {
    /// Column name.
    pub name: String,
    /// Sort direction.
    pub direction: SortDirection,
}

/// An index over one or more columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name.
    pub name: String,
    /// Indexed table.
    pub table_name: String,
    /// Schema of the indexed table.
    pub schema_name: Option<String>,
    /// Whether this is a unique index.
    pub is_unique: bool,
    /// Indexed columns, in order.
    pub columns: Vec<IndexColumnDefinition>,
}
