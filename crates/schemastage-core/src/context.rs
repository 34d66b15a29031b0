//! The shared, append-only list of expressions for one migration step.

use std::cell::RefCell;

use crate::builder::{CreateExpressionRoot, DeleteExpressionRoot, RenameExpressionRoot};
use crate::expression::{ExecuteSqlExpression, Expression};

/// Ordered expressions collected while defining one migration step.
///
/// Every builder borrows the context it was created from and writes its
/// expression in place, so builders can enqueue sibling expressions (for
/// example a foreign key declared while defining a column) without the caller
/// noticing. Once all builders are gone the context can be consumed with
/// [`MigrationContext::into_expressions`].
///
/// # Example
///
/// ```rust
/// use schemastage_core::MigrationContext;
///
/// let context = MigrationContext::new();
/// context
///     .create()
///     .column("customer_id")
///     .on_table("orders")
///     .as_int32()
///     .foreign_key()
///     .references("FK_orders_customers", "customers", &["id"]);
///
/// let expressions = context.into_expressions();
/// assert_eq!(expressions.len(), 2);
/// assert_eq!(expressions[0].kind(), "CreateColumn");
/// assert_eq!(expressions[1].kind(), "CreateForeignKey");
/// ```
#[derive(Debug, Default)]
pub struct MigrationContext {
    expressions: RefCell<Vec<Expression>>,
}

impl MigrationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an expression and returns its position.
    pub fn push(&self, expression: impl Into<Expression>) -> usize {
        let mut expressions = self.expressions.borrow_mut();
        expressions.push(expression.into());
        expressions.len() - 1
    }

    /// Returns the number of expressions collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expressions.borrow().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expressions.borrow().is_empty()
    }

    /// Returns a snapshot of the expressions collected so far.
    #[must_use]
    pub fn expressions(&self) -> Vec<Expression> {
        self.expressions.borrow().clone()
    }

    /// Consumes the context and returns its expressions in order.
    #[must_use]
    pub fn into_expressions(self) -> Vec<Expression> {
        self.expressions.into_inner()
    }

    /// Entry point for create expressions.
    #[must_use]
    pub const fn create(&self) -> CreateExpressionRoot<'_> {
        CreateExpressionRoot::new(self)
    }

    /// Entry point for delete expressions.
    #[must_use]
    pub const fn delete(&self) -> DeleteExpressionRoot<'_> {
        DeleteExpressionRoot::new(self)
    }

    /// Entry point for rename expressions.
    #[must_use]
    pub const fn rename(&self) -> RenameExpressionRoot<'_> {
        RenameExpressionRoot::new(self)
    }

    /// Enqueues raw SQL.
    pub fn execute_sql(&self, sql: impl Into<String>) {
        self.push(ExecuteSqlExpression { sql: sql.into() });
    }

    /// Mutates the expression at `index` in place.
    pub(crate) fn update(&self, index: usize, f: impl FnOnce(&mut Expression)) {
        if let Some(expression) = self.expressions.borrow_mut().get_mut(index) {
            f(expression);
        }
    }

    /// Reads the expression at `index`.
    pub(crate) fn inspect<R>(
        &self,
        index: usize,
        f: impl FnOnce(&Expression) -> Option<R>,
    ) -> Option<R> {
        self.expressions.borrow().get(index).and_then(f)
    }
}
