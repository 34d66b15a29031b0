//! # schemastage-core
//!
//! Describe database schema changes through a fluent, staged API.
//!
//! This crate provides:
//! - Plain value records for columns, foreign keys and indexes ([`model`])
//! - A closed set of schema change [`Expression`]s
//! - A [`MigrationContext`] collecting the expressions of one migration step
//! - Staged builders that only expose the calls valid at each step
//!
//! ## Staged Building
//!
//! ```rust
//! use schemastage_core::{Expression, MigrationContext};
//!
//! let context = MigrationContext::new();
//! context
//!     .create()
//!     .column("customer_id")
//!     .on_table("orders")
//!     .as_int32()
//!     .not_nullable()
//!     .foreign_key()
//!     .references("FK_orders_customers", "customers", ["id"]);
//!
//! // The foreign key was enqueued as its own expression.
//! let expressions = context.into_expressions();
//! assert!(matches!(expressions[1], Expression::CreateForeignKey(_)));
//! ```
//!
//! Rendering expressions as SQL and running them against a database is the
//! job of `schemastage-runner`.

pub mod builder;
pub mod context;
pub mod expression;
pub mod model;

pub use builder::{
    AsTypeOrInSchemaStage, AsTypeStage, ColumnExpressionBuilder, CreateExpressionRoot,
    CreateForeignKeyBuilder, CreateIndexBuilder, CreateTableBuilder, DeleteExpressionRoot,
    OnTableStage, OptionStage, RenameExpressionRoot,
};
pub use context::MigrationContext;
pub use expression::{
    CreateColumnExpression, CreateForeignKeyExpression, CreateIndexExpression,
    CreateSchemaExpression, CreateTableExpression, DeleteColumnExpression,
    DeleteForeignKeyExpression, DeleteIndexExpression, DeleteSchemaExpression,
    DeleteTableExpression, ExecuteSqlExpression, Expression, RenameColumnExpression,
    RenameTableExpression,
};
pub use model::{
    ColumnDefinition, ColumnType, DbType, DefaultValue, ForeignKeyDefinition, ForeignKeyRule,
    IndexColumnDefinition, IndexDefinition, SortDirection,
};
