//! Delete and rename builders.

use crate::context::MigrationContext;
use crate::expression::{
    DeleteColumnExpression, DeleteForeignKeyExpression, DeleteIndexExpression,
    DeleteSchemaExpression, DeleteTableExpression, Expression, RenameColumnExpression,
    RenameTableExpression,
};

/// Final stage shared by delete and rename builders: the schema may be set.
#[derive(Debug)]
pub struct SchemaScopedBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> SchemaScopedBuilder<'a> {
    const fn new(context: &'a MigrationContext, expression: usize) -> Self {
        Self {
            context,
            expression,
        }
    }

    /// Sets the schema of the affected table.
    pub fn in_schema(self, schema: impl Into<String>) -> Self {
        let schema = Some(schema.into());
        self.context.update(self.expression, |expr| match expr {
            Expression::DeleteTable(e) => e.schema_name = schema,
            Expression::DeleteColumn(e) => e.schema_name = schema,
            Expression::DeleteForeignKey(e) => e.schema_name = schema,
            Expression::DeleteIndex(e) => e.schema_name = schema,
            Expression::RenameTable(e) => e.schema_name = schema,
            Expression::RenameColumn(e) => e.schema_name = schema,
            _ => {}
        });
        self
    }
}

// =============================================================================
// Delete
// =============================================================================

/// Entry point for delete expressions, obtained from
/// [`MigrationContext::delete`].
#[derive(Debug, Clone, Copy)]
pub struct DeleteExpressionRoot<'a> {
    context: &'a MigrationContext,
}

impl<'a> DeleteExpressionRoot<'a> {
    pub(crate) const fn new(context: &'a MigrationContext) -> Self {
        Self { context }
    }

    /// Drops a table.
    pub fn table(self, name: impl Into<String>) -> SchemaScopedBuilder<'a> {
        let expression = self.context.push(DeleteTableExpression {
            table_name: name.into(),
            schema_name: None,
        });
        SchemaScopedBuilder::new(self.context, expression)
    }

    /// Drops a column; the table follows.
    #[must_use]
    pub fn column(self, name: impl Into<String>) -> DeleteColumnBuilder<'a> {
        let expression = self.context.push(DeleteColumnExpression {
            column_name: name.into(),
            ..DeleteColumnExpression::default()
        });
        DeleteColumnBuilder {
            context: self.context,
            expression,
        }
    }

    /// Drops a foreign key; the owning table follows.
    #[must_use]
    pub fn foreign_key(self, name: impl Into<String>) -> DeleteForeignKeyBuilder<'a> {
        let expression = self.context.push(DeleteForeignKeyExpression {
            name: name.into(),
            ..DeleteForeignKeyExpression::default()
        });
        DeleteForeignKeyBuilder {
            context: self.context,
            expression,
        }
    }

    /// Drops an index; the indexed table follows.
    #[must_use]
    pub fn index(self, name: impl Into<String>) -> DeleteIndexBuilder<'a> {
        let expression = self.context.push(DeleteIndexExpression {
            name: name.into(),
            ..DeleteIndexExpression::default()
        });
        DeleteIndexBuilder {
            context: self.context,
            expression,
        }
    }

    /// Drops a schema.
    pub fn schema(self, name: impl Into<String>) {
        self.context.push(DeleteSchemaExpression {
            schema_name: name.into(),
        });
    }
}

/// Delete column, waiting for its table.
#[derive(Debug)]
pub struct DeleteColumnBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> DeleteColumnBuilder<'a> {
    /// Sets the table the column is dropped from.
    pub fn from_table(self, table: impl Into<String>) -> SchemaScopedBuilder<'a> {
        let table = table.into();
        self.context.update(self.expression, |expr| {
            if let Expression::DeleteColumn(e) = expr {
                e.table_name = table;
            }
        });
        SchemaScopedBuilder::new(self.context, self.expression)
    }
}

/// Delete foreign key, waiting for its table.
#[derive(Debug)]
pub struct DeleteForeignKeyBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> DeleteForeignKeyBuilder<'a> {
    /// Sets the table owning the constraint.
    pub fn on_table(self, table: impl Into<String>) -> SchemaScopedBuilder<'a> {
        let table = table.into();
        self.context.update(self.expression, |expr| {
            if let Expression::DeleteForeignKey(e) = expr {
                e.table_name = table;
            }
        });
        SchemaScopedBuilder::new(self.context, self.expression)
    }
}

/// Delete index, waiting for its table.
#[derive(Debug)]
pub struct DeleteIndexBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> DeleteIndexBuilder<'a> {
    /// Sets the indexed table.
    pub fn on_table(self, table: impl Into<String>) -> SchemaScopedBuilder<'a> {
        let table = table.into();
        self.context.update(self.expression, |expr| {
            if let Expression::DeleteIndex(e) = expr {
                e.table_name = table;
            }
        });
        SchemaScopedBuilder::new(self.context, self.expression)
    }
}

// =============================================================================
// Rename
// =============================================================================

/// Entry point for rename expressions, obtained from
/// [`MigrationContext::rename`].
#[derive(Debug, Clone, Copy)]
pub struct RenameExpressionRoot<'a> {
    context: &'a MigrationContext,
}

impl<'a> RenameExpressionRoot<'a> {
    pub(crate) const fn new(context: &'a MigrationContext) -> Self {
        Self { context }
    }

    /// Renames a table; the new name follows.
    #[must_use]
    pub fn table(self, old_name: impl Into<String>) -> RenameTableBuilder<'a> {
        let expression = self.context.push(RenameTableExpression {
            old_name: old_name.into(),
            ..RenameTableExpression::default()
        });
        RenameTableBuilder {
            context: self.context,
            expression,
        }
    }

    /// Renames a column; the table and the new name follow.
    #[must_use]
    pub fn column(self, old_name: impl Into<String>) -> RenameColumnBuilder<'a> {
        let expression = self.context.push(RenameColumnExpression {
            old_name: old_name.into(),
            ..RenameColumnExpression::default()
        });
        RenameColumnBuilder {
            context: self.context,
            expression,
        }
    }
}

/// Rename table, waiting for the new name.
#[derive(Debug)]
pub struct RenameTableBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> RenameTableBuilder<'a> {
    /// Sets the new table name.
    pub fn to(self, new_name: impl Into<String>) -> SchemaScopedBuilder<'a> {
        let new_name = new_name.into();
        self.context.update(self.expression, |expr| {
            if let Expression::RenameTable(e) = expr {
                e.new_name = new_name;
            }
        });
        SchemaScopedBuilder::new(self.context, self.expression)
    }
}

/// Rename column, waiting for its table.
#[derive(Debug)]
pub struct RenameColumnBuilder<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> RenameColumnBuilder<'a> {
    /// Sets the table owning the column.
    #[must_use]
    pub fn on_table(self, table: impl Into<String>) -> RenameColumnOnTable<'a> {
        let table = table.into();
        self.context.update(self.expression, |expr| {
            if let Expression::RenameColumn(e) = expr {
                e.table_name = table;
            }
        });
        RenameColumnOnTable {
            context: self.context,
            expression: self.expression,
        }
    }
}

/// Rename column, waiting for the new name.
#[derive(Debug)]
pub struct RenameColumnOnTable<'a> {
    context: &'a MigrationContext,
    expression: usize,
}

impl<'a> RenameColumnOnTable<'a> {
    /// Sets the new column name.
    pub fn to(self, new_name: impl Into<String>) -> SchemaScopedBuilder<'a> {
        let new_name = new_name.into();
        self.context.update(self.expression, |expr| {
            if let Expression::RenameColumn(e) = expr {
                e.new_name = new_name;
            }
        });
        SchemaScopedBuilder::new(self.context, self.expression)
    }
}
