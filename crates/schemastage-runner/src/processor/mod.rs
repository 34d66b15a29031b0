//! Processors run rendered SQL and catalog checks against one connection.
//!
//! Every processor owns exactly one `sqlx` connection, opened lazily on the
//! first operation that needs it and closed when the processor is dropped.
//! Operations block the calling thread: each processor drives its own
//! current-thread tokio runtime, so it must not be used from inside another
//! async runtime.

mod dataset;
mod mysql;
mod sqlite;
pub mod template;

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{ConnectOptions, Connection, Database};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

pub use dataset::{DataColumn, DataSet, Value};
pub use mysql::MySqlProcessor;
pub use sqlite::SqliteProcessor;

use crate::announcer::Announcer;
use crate::error::{ProcessorError, Result};
use crate::options::ProcessorOptions;

/// A caller-supplied operation run against the open driver connection.
pub type DbOperation<'o, C> = Box<
    dyn for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, std::result::Result<(), sqlx::Error>> + 'o,
>;

/// Boxes a closure as a [`DbOperation`].
///
/// ```rust
/// use schemastage_runner::processor::{db_operation, DbOperation};
/// use sqlx::sqlite::SqliteConnection;
///
/// let operation: DbOperation<'_, SqliteConnection> = db_operation(|conn: &mut SqliteConnection| {
///     Box::pin(async move {
///         sqlx::query("delete from audit_log").execute(conn).await.map(|_| ())
///     })
/// });
/// # drop(operation);
/// ```
pub fn db_operation<'o, C, F>(operation: F) -> DbOperation<'o, C>
where
    F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, std::result::Result<(), sqlx::Error>> + 'o,
{
    Box::new(operation)
}

/// Runs SQL for one backend.
///
/// The `*_exists` checks and [`Processor::exists`] never fail: any error
/// while running the check is reported as `false`. A connectivity problem
/// therefore looks the same as a missing object.
pub trait Processor {
    /// Low-level connection handed to [`Processor::perform`].
    type Connection;

    /// Dialect name, used in messages.
    fn dialect(&self) -> &'static str;

    /// Options this processor was built with.
    fn options(&self) -> &ProcessorOptions;

    /// Sink receiving SQL and status lines.
    fn announcer(&self) -> &dyn Announcer;

    /// Returns true once the connection has been opened.
    fn is_open(&self) -> bool;

    /// Renders `template` with `args` and runs it, expecting no rows.
    ///
    /// In preview mode the statement is announced instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is invalid or the driver rejects the
    /// statement.
    fn execute(&mut self, template: &str, args: &[&str]) -> Result<()>;

    /// Renders `template` with `args`, runs it and reports whether the first
    /// column of the first row is a count greater than zero.
    fn exists(&mut self, template: &str, args: &[&str]) -> bool {
        match self.read(template, args) {
            Ok(data) => count_is_positive(&data),
            Err(err) => {
                debug!(dialect = self.dialect(), error = %err, "Existence check failed");
                false
            }
        }
    }

    /// Renders `template` with `args` and collects the whole result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is invalid or the query fails.
    fn read(&mut self, template: &str, args: &[&str]) -> Result<DataSet>;

    /// Reads every row of `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn read_table_data(&mut self, table: &str) -> Result<DataSet> {
        self.read("select * from {0}", &[table])
    }

    /// Applies one fully rendered statement.
    ///
    /// The SQL is always announced first. Nothing runs in preview mode or
    /// when `sql` is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    fn process(&mut self, sql: &str) -> Result<()>;

    /// Hands the open connection to `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::Unsupported`] unless the backend overrides
    /// it, and otherwise whatever the operation returns.
    fn perform(&mut self, _operation: DbOperation<'_, Self::Connection>) -> Result<()> {
        Err(ProcessorError::unsupported(self.dialect(), "perform"))
    }

    /// Runs `sql` with `params` bound as query arguments. Returns the number
    /// of affected rows; zero in preview mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the statement.
    fn execute_bound(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Runs `sql` with `params` bound as query arguments and collects the
    /// result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn read_bound(&mut self, sql: &str, params: &[Value]) -> Result<DataSet>;

    /// Whether `table` exists.
    fn table_exists(&mut self, table: &str) -> bool;

    /// Whether `table` has a column called `column`.
    fn column_exists(&mut self, table: &str, column: &str) -> bool;

    /// Whether `table` has a constraint called `constraint`.
    fn constraint_exists(&mut self, table: &str, constraint: &str) -> bool;

    /// Whether `table` has an index called `index`.
    fn index_exists(&mut self, table: &str, index: &str) -> bool;

    /// Whether `schema` exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::Unsupported`] for dialects without schemas.
    fn schema_exists(&mut self, schema: &str) -> Result<bool>;
}

/// First column of the first row, read as a count.
pub(crate) fn count_is_positive(data: &DataSet) -> bool {
    data.rows
        .first()
        .and_then(|row| row.first())
        .and_then(Value::as_count)
        .is_some_and(|count| count > 0)
}

/// Runtime, connect options and the lazily opened connection of a processor.
pub(crate) struct Session<DB: Database> {
    runtime: Runtime,
    connect_options: <DB::Connection as Connection>::Options,
    connection: Option<DB::Connection>,
    timeout: Option<Duration>,
}

impl<DB: Database> Session<DB> {
    pub(crate) fn new(
        connect_options: <DB::Connection as Connection>::Options,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            connect_options,
            connection: None,
            timeout,
        })
    }

    pub(crate) const fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens the connection if needed, then runs `operation` on it.
    pub(crate) fn run<T, F>(&mut self, operation: F) -> Result<T>
    where
        F: for<'c> FnOnce(
            &'c mut DB::Connection,
        ) -> BoxFuture<'c, std::result::Result<T, sqlx::Error>>,
    {
        let Self {
            runtime,
            connect_options,
            connection,
            timeout,
        } = self;

        let connection = match connection {
            Some(connection) => connection,
            None => {
                debug!(database = DB::NAME, "Opening connection");
                connection.insert(block_on(runtime, *timeout, connect_options.connect())?)
            }
        };

        block_on(runtime, *timeout, operation(connection))
    }
}

impl<DB: Database> Drop for Session<DB> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!(database = DB::NAME, "Closing connection");
            if let Err(err) = self.runtime.block_on(connection.close()) {
                warn!(database = DB::NAME, error = %err, "Failed to close connection");
            }
        }
    }
}

/// Drives `future` to completion, bounded by `timeout` when set.
pub(crate) fn block_on<T, F>(runtime: &Runtime, timeout: Option<Duration>, future: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    runtime.block_on(async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| ProcessorError::Timeout(limit))?
                .map_err(ProcessorError::from),
            None => future.await.map_err(ProcessorError::from),
        }
    })
}
