//! Applies recorded expressions through a generator and a processor.

use std::time::Instant;

use schemastage_core::Expression;
use tracing::{debug, info};

use crate::error::{ProcessorError, Result};
use crate::generator::MigrationGenerator;
use crate::processor::Processor;

/// Renders every expression with `generator` and hands the SQL to
/// `processor`, in order.
///
/// The batch first goes through [`MigrationGenerator::prepare`], which may
/// merge expressions. Stops at the first expression that is invalid, cannot
/// be rendered or is rejected by the database. Returns the number of
/// statements processed.
///
/// ```rust
/// use schemastage_core::MigrationContext;
/// use schemastage_runner::{
///     apply_expressions, Processor, ProcessorOptions, RecordingAnnouncer, SqliteGenerator,
///     SqliteProcessor,
/// };
///
/// let context = MigrationContext::new();
/// context
///     .create()
///     .table("people")
///     .with_column("id")
///     .as_int64()
///     .primary_key();
/// context.create().column("age").on_table("people").as_int32().nullable();
///
/// let mut processor = SqliteProcessor::new(
///     "sqlite::memory:".parse()?,
///     RecordingAnnouncer::new(),
///     ProcessorOptions::default(),
/// )?;
/// let expressions = context.into_expressions();
/// let applied = apply_expressions(&expressions, &SqliteGenerator::new(), &mut processor)?;
///
/// assert_eq!(applied, 2);
/// assert!(processor.column_exists("people", "age"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Errors
///
/// Returns [`ProcessorError::InvalidExpression`] for an expression with
/// validation errors, and otherwise whatever the generator or processor
/// returns.
pub fn apply_expressions<G, P>(
    expressions: &[Expression],
    generator: &G,
    processor: &mut P,
) -> Result<usize>
where
    G: MigrationGenerator + ?Sized,
    P: Processor + ?Sized,
{
    let expressions = generator.prepare(expressions);
    info!(
        dialect = processor.dialect(),
        generator = generator.name(),
        count = expressions.len(),
        preview_only = processor.options().preview_only,
        "Applying expressions"
    );

    for (index, expression) in expressions.iter().enumerate() {
        processor
            .announcer()
            .heading(&format!("{}: {}", index + 1, expression.kind()));

        if let Err(err) = apply_one(expression, generator, processor) {
            processor.announcer().error(&err.to_string());
            return Err(err);
        }
    }

    info!(count = expressions.len(), "Expressions applied");
    Ok(expressions.len())
}

fn apply_one<G, P>(expression: &Expression, generator: &G, processor: &mut P) -> Result<()>
where
    G: MigrationGenerator + ?Sized,
    P: Processor + ?Sized,
{
    let errors = expression.validation_errors();
    if !errors.is_empty() {
        return Err(ProcessorError::InvalidExpression {
            kind: expression.kind(),
            errors,
        });
    }

    let sql = generator.generate(expression)?;
    debug!(kind = expression.kind(), sql = %sql, "Rendered expression");

    let started = Instant::now();
    processor.process(&sql)?;
    processor.announcer().elapsed_time(started.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcer::{Announcement, Announcer, RecordingAnnouncer};
    use crate::generator::{MySqlGenerator, SqliteGenerator};
    use crate::options::ProcessorOptions;
    use crate::processor::{db_operation, DataSet, Value};
    use schemastage_core::MigrationContext;

    /// Records processed SQL and fails any statement containing `fail_on`.
    struct FakeProcessor {
        announcer: RecordingAnnouncer,
        options: ProcessorOptions,
        processed: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl FakeProcessor {
        fn new() -> Self {
            Self {
                announcer: RecordingAnnouncer::new(),
                options: ProcessorOptions::default(),
                processed: Vec::new(),
                fail_on: None,
            }
        }
    }

    impl Processor for FakeProcessor {
        type Connection = ();

        fn dialect(&self) -> &'static str {
            "fake"
        }

        fn options(&self) -> &ProcessorOptions {
            &self.options
        }

        fn announcer(&self) -> &dyn Announcer {
            &self.announcer
        }

        fn is_open(&self) -> bool {
            false
        }

        fn execute(&mut self, _template: &str, _args: &[&str]) -> Result<()> {
            Ok(())
        }

        fn read(&mut self, _template: &str, _args: &[&str]) -> Result<DataSet> {
            Ok(DataSet::default())
        }

        fn process(&mut self, sql: &str) -> Result<()> {
            self.announcer.sql(sql);
            if self.fail_on.is_some_and(|needle| sql.contains(needle)) {
                return Err(sqlx::Error::Protocol(format!("rejected: {sql}")).into());
            }
            self.processed.push(sql.to_string());
            Ok(())
        }

        fn execute_bound(&mut self, _sql: &str, _params: &[Value]) -> Result<u64> {
            Ok(0)
        }

        fn read_bound(&mut self, _sql: &str, _params: &[Value]) -> Result<DataSet> {
            Ok(DataSet::default())
        }

        fn table_exists(&mut self, _table: &str) -> bool {
            false
        }

        fn column_exists(&mut self, _table: &str, _column: &str) -> bool {
            false
        }

        fn constraint_exists(&mut self, _table: &str, _constraint: &str) -> bool {
            false
        }

        fn index_exists(&mut self, _table: &str, _index: &str) -> bool {
            false
        }

        fn schema_exists(&mut self, _schema: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_statements_follow_recording_order() {
        let context = MigrationContext::new();
        context
            .create()
            .column("customer_id")
            .on_table("orders")
            .as_int32()
            .foreign_key()
            .references("FK_orders_customers", "customers", ["id"]);
        context.create().index("IX_orders").on_table("orders").on_column("customer_id");

        let mut processor = FakeProcessor::new();
        let count = apply_expressions(
            &context.into_expressions(),
            &MySqlGenerator::new(),
            &mut processor,
        )
        .unwrap();

        assert_eq!(count, 3);
        assert!(processor.processed[0].contains("ADD COLUMN `customer_id`"));
        assert!(processor.processed[1].contains("ADD CONSTRAINT `FK_orders_customers`"));
        assert!(processor.processed[2].starts_with("CREATE INDEX `IX_orders`"));

        let entries = processor.announcer.entries();
        assert_eq!(entries[0], Announcement::Heading("1: CreateColumn".into()));
        assert!(matches!(entries[2], Announcement::ElapsedTime(_)));
    }

    #[test]
    fn test_generator_prepares_the_batch() {
        let context = MigrationContext::new();
        context
            .create()
            .table("orders")
            .with_column("customer_id")
            .as_int64()
            .foreign_key()
            .references("FK_orders_customers", "customers", ["id"]);

        let mut processor = FakeProcessor::new();
        let count = apply_expressions(
            &context.into_expressions(),
            &SqliteGenerator::new(),
            &mut processor,
        )
        .unwrap();

        assert_eq!(count, 1);
        assert!(processor.processed[0].contains("CONSTRAINT \"FK_orders_customers\""));
        assert_eq!(
            processor.announcer.entries()[0],
            Announcement::Heading("1: CreateTable".into())
        );
    }

    #[test]
    fn test_invalid_expression_stops_the_run() {
        let context = MigrationContext::new();
        context.execute_sql("SELECT 1");
        // Left without a type.
        let _ = context.create().column("age").on_table("people");
        context.execute_sql("SELECT 2");

        let mut processor = FakeProcessor::new();
        let err = apply_expressions(
            &context.into_expressions(),
            &SqliteGenerator::new(),
            &mut processor,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ProcessorError::InvalidExpression {
                kind: "CreateColumn",
                ..
            }
        ));
        assert_eq!(processor.processed, vec!["SELECT 1"]);
        assert!(matches!(
            processor.announcer.entries().last(),
            Some(Announcement::Error(_))
        ));
    }

    #[test]
    fn test_unsupported_expression_is_not_processed() {
        let context = MigrationContext::new();
        context.create().schema("archive");

        let mut processor = FakeProcessor::new();
        let err = apply_expressions(
            &context.into_expressions(),
            &SqliteGenerator::new(),
            &mut processor,
        )
        .unwrap_err();

        assert!(matches!(err, ProcessorError::Unsupported { .. }));
        assert!(processor.announcer.sql_statements().is_empty());
    }

    #[test]
    fn test_processor_failure_is_announced() {
        let context = MigrationContext::new();
        context.execute_sql("SELECT 1");
        context.execute_sql("DROP TABLE missing");

        let mut processor = FakeProcessor::new();
        processor.fail_on = Some("missing");
        let err = apply_expressions(
            &context.into_expressions(),
            &SqliteGenerator::new(),
            &mut processor,
        )
        .unwrap_err();

        assert!(matches!(err, ProcessorError::Execution(_)));
        assert_eq!(
            processor.announcer.sql_statements(),
            vec!["SELECT 1", "DROP TABLE missing"]
        );
    }

    #[test]
    fn test_perform_defaults_to_unsupported() {
        let mut processor = FakeProcessor::new();
        let result = processor.perform(db_operation(|_conn: &mut ()| {
            Box::pin(async { Ok(()) })
        }));
        assert!(matches!(
            result,
            Err(ProcessorError::Unsupported {
                dialect: "fake",
                ..
            })
        ));
    }
}
