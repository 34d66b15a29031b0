//! Staged column builder.
//!
//! Used both for `create().column(..)` (adding a column to an existing table)
//! and for the columns of `create().table(..)`. The target marker decides
//! which of the two the builder writes into and which extra methods exist.

use std::marker::PhantomData;

use super::{AcceptsType, AsTypeOrInSchemaStage, AsTypeStage, OnTableStage, OptionStage};
use crate::context::MigrationContext;
use crate::expression::{CreateForeignKeyExpression, Expression};
use crate::model::{ColumnDefinition, ColumnType, DbType, DefaultValue, ForeignKeyDefinition};

/// Target: a column added to an existing table.
#[derive(Debug, Clone, Copy)]
pub struct Standalone;

/// Target: a column of a table being created.
#[derive(Debug, Clone, Copy)]
pub struct InTable;

#[derive(Debug, Clone, Copy)]
enum ColumnSlot {
    Standalone { expression: usize },
    InTable { expression: usize, column: usize },
}

/// Table, schema and column name of the column being defined.
struct ColumnOwner {
    table: String,
    schema: Option<String>,
    column: String,
}

/// Type-safe builder for a single column.
///
/// `Stage` is one of [`OnTableStage`], [`AsTypeOrInSchemaStage`],
/// [`AsTypeStage`] or [`OptionStage`]; `Target` is [`Standalone`] or
/// [`InTable`].
///
/// # Example
///
/// ```rust
/// use schemastage_core::{DbType, Expression, MigrationContext};
///
/// let context = MigrationContext::new();
/// context
///     .create()
///     .column("age")
///     .on_table("people")
///     .as_int32()
///     .not_nullable();
///
/// let Expression::CreateColumn(expr) = &context.expressions()[0] else {
///     unreachable!()
/// };
/// assert_eq!(expr.table_name, "people");
/// assert_eq!(expr.column.db_type(), Some(DbType::Int32));
/// assert!(!expr.column.is_nullable);
/// ```
///
/// Setting a type twice does not compile:
///
/// ```rust,compile_fail
/// use schemastage_core::MigrationContext;
///
/// let context = MigrationContext::new();
/// context.create().column("age").on_table("people").as_int32().as_int64();
/// ```
#[derive(Debug)]
pub struct ColumnExpressionBuilder<'a, Stage, Target> {
    context: &'a MigrationContext,
    slot: ColumnSlot,
    _state: PhantomData<(Stage, Target)>,
}

impl<'a, Stage, Target> ColumnExpressionBuilder<'a, Stage, Target> {
    fn advance<Next>(self) -> ColumnExpressionBuilder<'a, Next, Target> {
        ColumnExpressionBuilder {
            context: self.context,
            slot: self.slot,
            _state: PhantomData,
        }
    }

    fn update_column(&self, f: impl FnOnce(&mut ColumnDefinition)) {
        match self.slot {
            ColumnSlot::Standalone { expression } => self.context.update(expression, |expr| {
                if let Expression::CreateColumn(e) = expr {
                    f(&mut e.column);
                }
            }),
            ColumnSlot::InTable { expression, column } => {
                self.context.update(expression, |expr| {
                    if let Expression::CreateTable(e) = expr {
                        if let Some(col) = e.columns.get_mut(column) {
                            f(col);
                        }
                    }
                });
            }
        }
    }

    fn owner(&self) -> Option<ColumnOwner> {
        match self.slot {
            ColumnSlot::Standalone { expression } => {
                self.context.inspect(expression, |expr| match expr {
                    Expression::CreateColumn(e) => Some(ColumnOwner {
                        table: e.table_name.clone(),
                        schema: e.schema_name.clone(),
                        column: e.column.name.clone(),
                    }),
                    _ => None,
                })
            }
            ColumnSlot::InTable { expression, column } => {
                self.context.inspect(expression, |expr| match expr {
                    Expression::CreateTable(e) => e.columns.get(column).map(|col| ColumnOwner {
                        table: e.table_name.clone(),
                        schema: e.schema_name.clone(),
                        column: col.name.clone(),
                    }),
                    _ => None,
                })
            }
        }
    }

    fn set_type(
        self,
        db_type: DbType,
        size: Option<u32>,
        precision: Option<u32>,
    ) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.update_column(|col| {
            col.column_type = Some(ColumnType::Db(db_type));
            if size.is_some() {
                col.size = size;
            }
            if precision.is_some() {
                col.precision = precision;
            }
        });
        self.advance()
    }
}

impl<'a> ColumnExpressionBuilder<'a, OnTableStage, Standalone> {
    pub(crate) const fn standalone(context: &'a MigrationContext, expression: usize) -> Self {
        Self {
            context,
            slot: ColumnSlot::Standalone { expression },
            _state: PhantomData,
        }
    }

    /// Sets the table receiving the column.
    #[must_use]
    pub fn on_table(
        self,
        name: impl Into<String>,
    ) -> ColumnExpressionBuilder<'a, AsTypeOrInSchemaStage, Standalone> {
        let name = name.into();
        if let ColumnSlot::Standalone { expression } = self.slot {
            self.context.update(expression, |expr| {
                if let Expression::CreateColumn(e) = expr {
                    e.table_name = name;
                }
            });
        }
        self.advance()
    }
}

impl<'a> ColumnExpressionBuilder<'a, AsTypeOrInSchemaStage, Standalone> {
    /// Sets the schema of the table receiving the column.
    #[must_use]
    pub fn in_schema(
        self,
        schema_name: impl Into<String>,
    ) -> ColumnExpressionBuilder<'a, AsTypeStage, Standalone> {
        let schema_name = schema_name.into();
        if let ColumnSlot::Standalone { expression } = self.slot {
            self.context.update(expression, |expr| {
                if let Expression::CreateColumn(e) = expr {
                    e.schema_name = Some(schema_name);
                }
            });
        }
        self.advance()
    }
}

impl<'a> ColumnExpressionBuilder<'a, AsTypeStage, InTable> {
    pub(crate) const fn in_table(
        context: &'a MigrationContext,
        expression: usize,
        column: usize,
    ) -> Self {
        Self {
            context,
            slot: ColumnSlot::InTable { expression, column },
            _state: PhantomData,
        }
    }
}

// =============================================================================
// Column Types
// =============================================================================

impl<'a, Stage: AcceptsType, Target> ColumnExpressionBuilder<'a, Stage, Target> {
    /// Non-unicode variable-length string.
    pub fn as_ansi_string(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::AnsiString, None, None)
    }

    /// Non-unicode variable-length string with a maximum length.
    pub fn as_ansi_string_sized(
        self,
        size: u32,
    ) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::AnsiString, Some(size), None)
    }

    /// Binary data.
    pub fn as_binary(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Binary, None, None)
    }

    /// Binary data with a maximum length.
    pub fn as_binary_sized(self, size: u32) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Binary, Some(size), None)
    }

    /// Boolean.
    pub fn as_boolean(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Boolean, None, None)
    }

    /// Unsigned byte.
    pub fn as_byte(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Byte, None, None)
    }

    /// Monetary value.
    pub fn as_currency(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Currency, None, None)
    }

    /// Date.
    pub fn as_date(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Date, None, None)
    }

    /// Date and time.
    pub fn as_date_time(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::DateTime, None, None)
    }

    /// Decimal with the dialect's default size and precision.
    pub fn as_decimal(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Decimal, None, None)
    }

    /// Decimal with explicit size and precision.
    pub fn as_decimal_sized(
        self,
        size: u32,
        precision: u32,
    ) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Decimal, Some(size), Some(precision))
    }

    /// Double precision float.
    pub fn as_double(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Double, None, None)
    }

    /// Fixed-length unicode string.
    pub fn as_fixed_length_string(
        self,
        size: u32,
    ) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::StringFixedLength, Some(size), None)
    }

    /// Fixed-length non-unicode string.
    pub fn as_fixed_length_ansi_string(
        self,
        size: u32,
    ) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::AnsiStringFixedLength, Some(size), None)
    }

    /// Single precision float.
    pub fn as_float(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Single, None, None)
    }

    /// GUID.
    pub fn as_guid(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Guid, None, None)
    }

    /// 16-bit integer.
    pub fn as_int16(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Int16, None, None)
    }

    /// 32-bit integer.
    pub fn as_int32(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Int32, None, None)
    }

    /// 64-bit integer.
    pub fn as_int64(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Int64, None, None)
    }

    /// Unicode variable-length string.
    pub fn as_string(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::String, None, None)
    }

    /// Unicode variable-length string with a maximum length.
    pub fn as_string_sized(self, size: u32) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::String, Some(size), None)
    }

    /// Time of day.
    pub fn as_time(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Time, None, None)
    }

    /// XML.
    pub fn as_xml(self) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Xml, None, None)
    }

    /// XML with a maximum length.
    pub fn as_xml_sized(self, size: u32) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        self.set_type(DbType::Xml, Some(size), None)
    }

    /// Raw dialect-specific type, emitted verbatim by generators.
    pub fn as_custom(
        self,
        custom_type: impl Into<String>,
    ) -> ColumnExpressionBuilder<'a, OptionStage, Target> {
        let custom_type = custom_type.into();
        self.update_column(|col| col.column_type = Some(ColumnType::Custom(custom_type)));
        self.advance()
    }
}

// =============================================================================
// Column Options
// =============================================================================

impl<'a, Target> ColumnExpressionBuilder<'a, OptionStage, Target> {
    /// Sets the default value. Calling it again replaces the previous one.
    pub fn with_default_value(self, value: impl Into<DefaultValue>) -> Self {
        let value = value.into();
        self.update_column(|col| col.default_value = Some(value));
        self
    }

    /// Marks the column as taking part in a foreign key.
    pub fn foreign_key(self) -> Self {
        self.update_column(|col| col.is_foreign_key = true);
        self
    }

    /// Marks the column as an identity (auto-increment) column.
    pub fn identity(self) -> Self {
        self.update_column(|col| col.is_identity = true);
        self
    }

    /// Marks the column as indexed.
    pub fn indexed(self) -> Self {
        self.update_column(|col| col.is_indexed = true);
        self
    }

    /// Marks the column as primary key.
    pub fn primary_key(self) -> Self {
        self.update_column(|col| col.is_primary_key = true);
        self
    }

    /// Marks the column as primary key with an explicit constraint name.
    pub fn primary_key_named(self, primary_key_name: impl Into<String>) -> Self {
        let primary_key_name = primary_key_name.into();
        self.update_column(|col| {
            col.is_primary_key = true;
            col.primary_key_name = Some(primary_key_name);
        });
        self
    }

    /// Allows NULL. The last of `nullable`/`not_nullable` wins.
    pub fn nullable(self) -> Self {
        self.update_column(|col| col.is_nullable = true);
        self
    }

    /// Forbids NULL. The last of `nullable`/`not_nullable` wins.
    pub fn not_nullable(self) -> Self {
        self.update_column(|col| col.is_nullable = false);
        self
    }

    /// Adds a unique constraint.
    pub fn unique(self) -> Self {
        self.update_column(|col| col.is_unique = true);
        self
    }

    /// Enqueues a foreign key from this column to `foreign_table`.
    ///
    /// The relationship is added to the context as its own
    /// `CreateForeignKey` expression; this column is left untouched. Use
    /// [`Self::foreign_key`] to flag the column itself.
    pub fn references<I, S>(
        self,
        foreign_key_name: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.enqueue_reference(
            foreign_key_name.into(),
            None,
            foreign_table.into(),
            foreign_column_names,
        )
    }

    /// Same as [`Self::references`] with an explicit schema for the
    /// referenced table.
    pub fn references_in_schema<I, S>(
        self,
        foreign_key_name: impl Into<String>,
        foreign_table_schema: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign_column_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.enqueue_reference(
            foreign_key_name.into(),
            Some(foreign_table_schema.into()),
            foreign_table.into(),
            foreign_column_names,
        )
    }

    fn enqueue_reference<I, S>(
        self,
        name: String,
        foreign_table_schema: Option<String>,
        foreign_table: String,
        foreign_column_names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(owner) = self.owner() {
            self.context.push(CreateForeignKeyExpression {
                foreign_key: ForeignKeyDefinition {
                    name,
                    primary_table: owner.table,
                    primary_table_schema: owner.schema,
                    foreign_table,
                    foreign_table_schema,
                    primary_columns: vec![owner.column],
                    foreign_columns: foreign_column_names
                        .into_iter()
                        .map(|c| c.as_ref().to_string())
                        .collect(),
                    on_delete: None,
                    on_update: None,
                },
            });
        }
        self
    }
}

impl<'a> ColumnExpressionBuilder<'a, OptionStage, InTable> {
    /// Starts the next column of the table.
    #[must_use]
    pub fn with_column(
        self,
        name: impl Into<String>,
    ) -> ColumnExpressionBuilder<'a, AsTypeStage, InTable> {
        let (ColumnSlot::InTable { expression, .. } | ColumnSlot::Standalone { expression }) =
            self.slot;
        super::table::push_column(self.context, expression, name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{CreateColumnExpression, CreateForeignKeyExpression};

    fn column_expr(context: &MigrationContext, index: usize) -> CreateColumnExpression {
        match &context.expressions()[index] {
            Expression::CreateColumn(e) => e.clone(),
            other => panic!("Expected CreateColumn, got {other:?}"),
        }
    }

    fn foreign_key_expr(context: &MigrationContext, index: usize) -> CreateForeignKeyExpression {
        match &context.expressions()[index] {
            Expression::CreateForeignKey(e) => e.clone(),
            other => panic!("Expected CreateForeignKey, got {other:?}"),
        }
    }

    #[test]
    fn test_not_nullable_int_column() {
        let context = MigrationContext::new();
        context.create().column("age").on_table("people").as_int32().not_nullable();

        let expr = column_expr(&context, 0);
        assert_eq!(expr.table_name, "people");
        assert_eq!(expr.schema_name, None);
        assert_eq!(expr.column.name, "age");
        assert_eq!(expr.column.db_type(), Some(DbType::Int32));
        assert!(!expr.column.is_nullable);
    }

    #[test]
    fn test_in_schema_then_type() {
        let context = MigrationContext::new();
        context.create().column("name").on_table("people").in_schema("crm").as_string_sized(100);

        let expr = column_expr(&context, 0);
        assert_eq!(expr.schema_name.as_deref(), Some("crm"));
        assert_eq!(expr.column.db_type(), Some(DbType::String));
        assert_eq!(expr.column.size, Some(100));
    }

    #[test]
    fn test_decimal_size_and_precision() {
        let context = MigrationContext::new();
        context.create().column("price").on_table("items").as_decimal_sized(10, 2);

        let col = column_expr(&context, 0).column;
        assert_eq!(col.db_type(), Some(DbType::Decimal));
        assert_eq!(col.size, Some(10));
        assert_eq!(col.precision, Some(2));
    }

    #[test]
    fn test_custom_type() {
        let context = MigrationContext::new();
        context.create().column("doc").on_table("items").as_custom("JSON");

        let col = column_expr(&context, 0).column;
        assert_eq!(col.custom_type(), Some("JSON"));
        assert!(col.db_type().is_none());
    }

    #[test]
    fn test_options_last_write_wins() {
        let context = MigrationContext::new();
        context
            .create()
            .column("email")
            .on_table("users")
            .as_ansi_string_sized(255)
            .not_nullable()
            .nullable()
            .unique()
            .unique()
            .with_default_value("a")
            .with_default_value("b");

        let col = column_expr(&context, 0).column;
        assert!(col.is_nullable);
        assert!(col.is_unique);
        assert_eq!(col.default_value, Some(DefaultValue::String("b".into())));
    }

    #[test]
    fn test_all_flags() {
        let context = MigrationContext::new();
        context
            .create()
            .column("id")
            .on_table("users")
            .as_int64()
            .identity()
            .indexed()
            .foreign_key()
            .primary_key_named("PK_users");

        let col = column_expr(&context, 0).column;
        assert!(col.is_identity);
        assert!(col.is_indexed);
        assert!(col.is_foreign_key);
        assert!(col.is_primary_key);
        assert_eq!(col.primary_key_name.as_deref(), Some("PK_users"));
    }

    #[test]
    fn test_references_enqueues_foreign_key() {
        let context = MigrationContext::new();
        context
            .create()
            .column("customer_id")
            .on_table("orders")
            .as_int32()
            .foreign_key()
            .references("FK_orders_customers", "customers", ["id"]);

        assert_eq!(context.len(), 2);
        let col = column_expr(&context, 0);
        assert!(col.column.is_foreign_key);

        let fk = foreign_key_expr(&context, 1).foreign_key;
        assert_eq!(fk.name, "FK_orders_customers");
        assert_eq!(fk.primary_table, "orders");
        assert_eq!(fk.primary_table_schema, None);
        assert_eq!(fk.primary_columns, vec!["customer_id"]);
        assert_eq!(fk.foreign_table, "customers");
        assert_eq!(fk.foreign_table_schema, None);
        assert_eq!(fk.foreign_columns, vec!["id"]);
    }

    #[test]
    fn test_references_does_not_touch_column() {
        let context = MigrationContext::new();
        let builder = context.create().column("owner_id").on_table("pets").as_int32();
        let before = column_expr(&context, 0);
        let _builder = builder.references("FK_pets_people", "people", ["id"]);
        assert_eq!(column_expr(&context, 0), before);
        assert!(!before.column.is_foreign_key);
    }

    #[test]
    fn test_references_in_schema_keeps_both_schemas() {
        let context = MigrationContext::new();
        context
            .create()
            .column("tenant_id")
            .on_table("orders")
            .in_schema("sales")
            .as_guid()
            .references_in_schema(
                "FK_orders_tenants",
                "admin",
                "tenants",
                vec!["id".to_string(), "region".to_string()],
            );

        let fk = foreign_key_expr(&context, 1).foreign_key;
        assert_eq!(fk.primary_table_schema.as_deref(), Some("sales"));
        assert_eq!(fk.foreign_table_schema.as_deref(), Some("admin"));
        assert_eq!(fk.primary_columns.len(), 1);
        assert_eq!(fk.foreign_columns.len(), 2);
    }

    #[test]
    fn test_each_reference_adds_one_expression() {
        let context = MigrationContext::new();
        context
            .create()
            .column("ref")
            .on_table("a")
            .as_int32()
            .references("FK_1", "b", ["id"])
            .references("FK_2", "c", ["id"])
            .not_nullable();

        assert_eq!(context.len(), 3);
        assert_eq!(foreign_key_expr(&context, 2).foreign_key.name, "FK_2");
        assert!(!column_expr(&context, 0).column.is_nullable);
    }
}
