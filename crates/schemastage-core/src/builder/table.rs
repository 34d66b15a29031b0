//! CREATE TABLE builder.

use super::column::{ColumnExpressionBuilder, InTable};
use super::AsTypeStage;
use crate::context::MigrationContext;
use crate::expression::{CreateTableExpression, Expression};
use crate::model::ColumnDefinition;

/// Builder for a new table.
///
/// Columns are started with [`CreateTableBuilder::with_column`] and go
/// through the same type and option stages as a standalone column. Foreign
/// keys declared with `references` are enqueued after the table.
///
/// # Example
///
/// ```rust
/// use schemastage_core::MigrationContext;
///
/// let context = MigrationContext::new();
/// context
///     .create()
///     .table("orders")
///     .with_column("id")
///     .as_int32()
///     .primary_key()
///     .identity()
///     .with_column("customer_id")
///     .as_int32()
///     .foreign_key()
///     .references("FK_orders_customers", "customers", ["id"]);
///
/// assert_eq!(context.len(), 2);
/// ```
#[derive(Debug)]
pub struct CreateTableBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> CreateTableBuilder<'a> {
    pub(crate) fn new(context: &'a MigrationContext, table_name: String) -> Self {
        let expression = context.push(CreateTableExpression {
            table_name,
            ..CreateTableExpression::default()
        });
        Self {
            context,
            expression,
        }
    }

    /// Sets the schema of the table.
    #[must_use]
    pub fn in_schema(self, schema_name: impl Into<String>) -> Self {
        let schema_name = schema_name.into();
        self.context.update(self.expression, |expr| {
            if let Expression::CreateTable(e) = expr {
                e.schema_name = Some(schema_name);
            }
        });
        self
    }

    /// Starts the first column.
    #[must_use]
    pub fn with_column(
        self,
        name: impl Into<String>,
    ) -> ColumnExpressionBuilder<'a, AsTypeStage, InTable> {
        push_column(self.context, self.expression, name.into())
    }
}

/// Appends a column to the table expression at `expression`.
pub(super) fn push_column(
    context: &MigrationContext,
    expression: usize,
    name: String,
) -> ColumnExpressionBuilder<'_, AsTypeStage, InTable> {
    let mut column = 0;
    context.update(expression, |expr| {
        if let Expression::CreateTable(e) = expr {
            e.columns.push(ColumnDefinition::new(name));
            column = e.columns.len() - 1;
        }
    });
    ColumnExpressionBuilder::in_table(context, expression, column)
}
