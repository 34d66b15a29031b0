//! Staged index builder.

use std::marker::PhantomData;

use super::{IndexColumnOptionStage, IndexColumnsStage, OnTableStage};
use crate::context::MigrationContext;
use crate::expression::{CreateIndexExpression, Expression};
use crate::model::{IndexColumnDefinition, IndexDefinition, SortDirection};

/// Builder for CREATE INDEX.
///
/// # Example
///
/// ```rust
/// use schemastage_core::MigrationContext;
///
/// let context = MigrationContext::new();
/// context
///     .create()
///     .index("IX_users_email")
///     .on_table("users")
///     .on_column("email")
///     .descending()
///     .on_column("id")
///     .unique();
/// ```
#[derive(Debug)]
pub struct CreateIndexBuilder<'a, Stage> {
    context: &'a MigrationContext,
    expression: usize,
    _state: PhantomData<Stage>,
}

impl<'a, Stage> CreateIndexBuilder<'a, Stage> {
    fn advance<Next>(self) -> CreateIndexBuilder<'a, Next> {
        CreateIndexBuilder {
            context: self.context,
            expression: self.expression,
            _state: PhantomData,
        }
    }

    fn update(&self, f: impl FnOnce(&mut IndexDefinition)) {
        self.context.update(self.expression, |expr| {
            if let Expression::CreateIndex(e) = expr {
                f(&mut e.index);
            }
        });
    }

    fn push_column(self, name: String) -> CreateIndexBuilder<'a, IndexColumnOptionStage> {
        self.update(|index| {
            index.columns.push(IndexColumnDefinition {
                name,
                direction: SortDirection::Ascending,
            });
        });
        self.advance()
    }

    fn set_direction(self, direction: SortDirection) -> CreateIndexBuilder<'a, IndexColumnsStage> {
        self.update(|index| {
            if let Some(column) = index.columns.last_mut() {
                column.direction = direction;
            }
        });
        self.advance()
    }
}

impl<'a> CreateIndexBuilder<'a, OnTableStage> {
    pub(crate) fn new(context: &'a MigrationContext, name: String) -> Self {
        let expression = context.push(CreateIndexExpression {
            index: IndexDefinition {
                name,
                ..IndexDefinition::default()
            },
        });
        Self {
            context,
            expression,
            _state: PhantomData,
        }
    }

    /// Sets the indexed table.
    #[must_use]
    pub fn on_table(
        self,
        table: impl Into<String>,
    ) -> CreateIndexBuilder<'a, IndexColumnsStage> {
        let table = table.into();
        self.update(|index| index.table_name = table);
        self.advance()
    }
}

impl<'a> CreateIndexBuilder<'a, IndexColumnsStage> {
    /// Sets the schema of the indexed table.
    pub fn in_schema(self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.update(|index| index.schema_name = Some(schema));
        self
    }

    /// Adds a column, ascending unless a direction follows.
    pub fn on_column(
        self,
        name: impl Into<String>,
    ) -> CreateIndexBuilder<'a, IndexColumnOptionStage> {
        self.push_column(name.into())
    }

    /// Makes the index unique.
    pub fn unique(self) -> Self {
        self.update(|index| index.is_unique = true);
        self
    }
}

impl<'a> CreateIndexBuilder<'a, IndexColumnOptionStage> {
    /// Sorts the last added column ascending.
    pub fn ascending(self) -> CreateIndexBuilder<'a, IndexColumnsStage> {
        self.set_direction(SortDirection::Ascending)
    }

    /// Sorts the last added column descending.
    pub fn descending(self) -> CreateIndexBuilder<'a, IndexColumnsStage> {
        self.set_direction(SortDirection::Descending)
    }

    /// Adds another column, keeping the previous one ascending.
    pub fn on_column(self, name: impl Into<String>) -> Self {
        self.push_column(name.into())
    }

    /// Makes the index unique.
    pub fn unique(self) -> CreateIndexBuilder<'a, IndexColumnsStage> {
        self.update(|index| index.is_unique = true);
        self.advance()
    }
}
