//! Staged foreign key builder.

use std::marker::PhantomData;

use super::{FromColumnsStage, FromTableStage, ToColumnsStage};
use crate::context::MigrationContext;
use crate::expression::{CreateForeignKeyExpression, Expression};
use crate::model::{ForeignKeyDefinition, ForeignKeyRule};

/// Builder for a foreign key between two existing tables.
///
/// The stages are: source table, source columns, referenced table,
/// referenced columns and rules.
///
/// # Example
///
/// ```rust
/// use schemastage_core::{ForeignKeyRule, MigrationContext};
///
/// let context = MigrationContext::new();
/// context
///     .create()
///     .foreign_key("FK_orders_customers")
///     .from_table("orders")
///     .column("customer_id")
///     .to_table("customers")
///     .column("id")
///     .on_delete(ForeignKeyRule::Cascade);
///
/// assert_eq!(context.len(), 1);
/// ```
#[derive(Debug)]
pub struct CreateForeignKeyBuilder<'a, Stage> {
    context: &'a MigrationContext,
    expression: usize,
    _state: PhantomData<Stage>,
}

impl<'a, Stage> CreateForeignKeyBuilder<'a, Stage> {
    fn advance<Next>(self) -> CreateForeignKeyBuilder<'a, Next> {
        CreateForeignKeyBuilder {
            context: self.context,
            expression: self.expression,
            _state: PhantomData,
        }
    }

    fn update(&self, f: impl FnOnce(&mut ForeignKeyDefinition)) {
        self.context.update(self.expression, |expr| {
            if let Expression::CreateForeignKey(e) = expr {
                f(&mut e.foreign_key);
            }
        });
    }
}

impl<'a> CreateForeignKeyBuilder<'a, FromTableStage> {
    pub(crate) fn new(context: &'a MigrationContext, name: String) -> Self {
        let expression = context.push(CreateForeignKeyExpression {
            foreign_key: ForeignKeyDefinition {
                name,
                ..ForeignKeyDefinition::default()
            },
        });
        Self {
            context,
            expression,
            _state: PhantomData,
        }
    }

    /// Sets the table owning the constrained columns.
    #[must_use]
    pub fn from_table(
        self,
        table: impl Into<String>,
    ) -> CreateForeignKeyBuilder<'a, FromColumnsStage> {
        let table = table.into();
        self.update(|fk| fk.primary_table = table);
        self.advance()
    }
}

impl<'a> CreateForeignKeyBuilder<'a, FromColumnsStage> {
    /// Sets the schema of the source table.
    #[must_use]
    pub fn in_schema(self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.update(|fk| fk.primary_table_schema = Some(schema));
        self
    }

    /// Adds a constrained column.
    #[must_use]
    pub fn column(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.update(|fk| fk.primary_columns.push(name));
        self
    }

    /// Adds several constrained columns.
    #[must_use]
    pub fn columns<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(|fk| {
            fk.primary_columns
                .extend(names.into_iter().map(|n| n.as_ref().to_string()));
        });
        self
    }

    /// Sets the referenced table.
    #[must_use]
    pub fn to_table(
        self,
        table: impl Into<String>,
    ) -> CreateForeignKeyBuilder<'a, ToColumnsStage> {
        let table = table.into();
        self.update(|fk| fk.foreign_table = table);
        self.advance()
    }
}

impl CreateForeignKeyBuilder<'_, ToColumnsStage> {
    /// Sets the schema of the referenced table.
    pub fn in_schema(self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.update(|fk| fk.foreign_table_schema = Some(schema));
        self
    }

    /// Adds a referenced column.
    pub fn column(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.update(|fk| fk.foreign_columns.push(name));
        self
    }

    /// Adds several referenced columns.
    pub fn columns<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(|fk| {
            fk.foreign_columns
                .extend(names.into_iter().map(|n| n.as_ref().to_string()));
        });
        self
    }

    /// Sets the ON DELETE rule.
    pub fn on_delete(self, rule: ForeignKeyRule) -> Self {
        self.update(|fk| fk.on_delete = Some(rule));
        self
    }

    /// Sets the ON UPDATE rule.
    pub fn on_update(self, rule: ForeignKeyRule) -> Self {
        self.update(|fk| fk.on_update = Some(rule));
        self
    }
}
