//! Staged expression builders using the typestate pattern.
//!
//! Each builder is generic over a zero-sized stage marker. Only the methods
//! that are valid in the current stage exist on the type, so an invalid call
//! sequence (a column type set twice, a foreign key without a target table,
//! ...) fails to compile instead of failing at runtime.
//!
//! Builders write into the [`MigrationContext`] they were created from as
//! they go; nothing needs to be "built" or "finished" at the end of a chain.

mod column;
mod delete;
mod foreign_key;
mod index;
mod table;

pub use column::{ColumnExpressionBuilder, InTable, Standalone};
pub use delete::{
    DeleteColumnBuilder, DeleteExpressionRoot, DeleteForeignKeyBuilder, DeleteIndexBuilder,
    RenameColumnBuilder, RenameColumnOnTable, RenameExpressionRoot, RenameTableBuilder,
    SchemaScopedBuilder,
};
pub use foreign_key::CreateForeignKeyBuilder;
pub use index::CreateIndexBuilder;
pub use table::CreateTableBuilder;

use crate::context::MigrationContext;
use crate::expression::{CreateColumnExpression, CreateSchemaExpression};
use crate::model::ColumnDefinition;

// =============================================================================
// Stage Markers
// =============================================================================

/// Stage: only the target table can be chosen.
#[derive(Debug, Clone, Copy)]
pub struct OnTableStage;

/// Stage: a schema or a column type can be chosen.
#[derive(Debug, Clone, Copy)]
pub struct AsTypeOrInSchemaStage;

/// Stage: only a column type can be chosen.
#[derive(Debug, Clone, Copy)]
pub struct AsTypeStage;

/// Stage: the column is typed; options may be chained in any order.
#[derive(Debug, Clone, Copy)]
pub struct OptionStage;

/// Stage: the foreign key source table must be chosen.
#[derive(Debug, Clone, Copy)]
pub struct FromTableStage;

/// Stage: source columns of a foreign key are being listed.
#[derive(Debug, Clone, Copy)]
pub struct FromColumnsStage;

/// Stage: referenced columns of a foreign key are being listed.
#[derive(Debug, Clone, Copy)]
pub struct ToColumnsStage;

/// Stage: indexed columns are being listed.
#[derive(Debug, Clone, Copy)]
pub struct IndexColumnsStage;

/// Stage: the column just added to an index may get a direction.
#[derive(Debug, Clone, Copy)]
pub struct IndexColumnOptionStage;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::AsTypeOrInSchemaStage {}
    impl Sealed for super::AsTypeStage {}
}

/// Stages in which a column type may be chosen.
pub trait AcceptsType: sealed::Sealed {}

impl AcceptsType for AsTypeOrInSchemaStage {}
impl AcceptsType for AsTypeStage {}

// =============================================================================
// Roots
// =============================================================================

/// Entry point for create expressions, obtained from
/// [`MigrationContext::create`].
#[derive(Debug, Clone, Copy)]
pub struct CreateExpressionRoot<'a> {
    context: &'a MigrationContext,
}

impl<'a> CreateExpressionRoot<'a> {
    pub(crate) const fn new(context: &'a MigrationContext) -> Self {
        Self { context }
    }

    /// Starts a column to be added to an existing table.
    #[must_use]
    pub fn column(
        self,
        name: impl Into<String>,
    ) -> ColumnExpressionBuilder<'a, OnTableStage, Standalone> {
        let index = self.context.push(CreateColumnExpression {
            column: ColumnDefinition::new(name),
            ..CreateColumnExpression::default()
        });
        ColumnExpressionBuilder::standalone(self.context, index)
    }

    /// Starts a new table.
    #[must_use]
    pub fn table(self, name: impl Into<String>) -> CreateTableBuilder<'a> {
        CreateTableBuilder::new(self.context, name.into())
    }

    /// Starts a foreign key.
    #[must_use]
    pub fn foreign_key(
        self,
        name: impl Into<String>,
    ) -> CreateForeignKeyBuilder<'a, FromTableStage> {
        CreateForeignKeyBuilder::new(self.context, name.into())
    }

    /// Starts an index.
    #[must_use]
    pub fn index(self, name: impl Into<String>) -> CreateIndexBuilder<'a, OnTableStage> {
        CreateIndexBuilder::new(self.context, name.into())
    }

    /// Enqueues a CREATE SCHEMA.
    pub fn schema(self, name: impl Into<String>) {
        self.context.push(CreateSchemaExpression {
            schema_name: name.into(),
        });
    }
}
