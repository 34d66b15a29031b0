//! SQLite processor.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::debug;

use super::dataset::{DataColumn, DataSet, Value};
use super::{template, DbOperation, Processor, Session};
use crate::announcer::Announcer;
use crate::error::Result;
use crate::options::ProcessorOptions;

const DIALECT: &str = "sqlite";

const TABLE_EXISTS: &str =
    "select count(*) from sqlite_master where type = 'table' and name = '{0}'";
const COLUMN_EXISTS: &str = "select count(*) from pragma_table_info('{0}') where name = '{1}'";
const CONSTRAINT_EXISTS: &str = "select count(*) from sqlite_master where tbl_name = '{0}' \
     and (name = '{1}' or instr(sql, 'CONSTRAINT \"{1}\"') > 0 \
     or instr(sql, 'CONSTRAINT {1} ') > 0)";
const INDEX_EXISTS: &str =
    "select count(*) from sqlite_master where type = 'index' and tbl_name = '{0}' and name = '{1}'";
const SCHEMA_EXISTS: &str = "select count(*) from pragma_database_list where name = '{0}'";

/// Processor backed by a single SQLite connection.
///
/// Schemas map to attached databases (`main`, `temp` and anything added with
/// `ATTACH`).
///
/// # Example
///
/// ```rust,no_run
/// use std::str::FromStr;
///
/// use schemastage_runner::{Processor, ProcessorOptions, SqliteProcessor, TracingAnnouncer};
/// use sqlx::sqlite::SqliteConnectOptions;
///
/// let options = SqliteConnectOptions::from_str("sqlite://app.db")?.create_if_missing(true);
/// let mut processor =
///     SqliteProcessor::new(options, TracingAnnouncer, ProcessorOptions::default())?;
/// processor.process("CREATE TABLE people (age INTEGER NOT NULL)")?;
/// assert!(processor.table_exists("people"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SqliteProcessor {
    session: Session<Sqlite>,
    announcer: Box<dyn Announcer>,
    options: ProcessorOptions,
}

impl SqliteProcessor {
    /// Creates a processor. No connection is opened until it is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking runtime cannot be created.
    pub fn new(
        connect_options: SqliteConnectOptions,
        announcer: impl Announcer + 'static,
        options: ProcessorOptions,
    ) -> Result<Self> {
        Ok(Self {
            session: Session::new(connect_options, options.timeout)?,
            announcer: Box::new(announcer),
            options,
        })
    }

    fn run_raw(&mut self, sql: String) -> Result<u64> {
        debug!(dialect = DIALECT, sql = %sql, "Executing SQL");
        self.session
            .run(move |conn| Box::pin(async move { execute_raw(conn, &sql).await }))
    }

    fn fetch(&mut self, sql: String, params: Vec<Value>) -> Result<DataSet> {
        debug!(dialect = DIALECT, sql = %sql, "Reading");
        self.session
            .run(move |conn| Box::pin(async move { fetch(conn, &sql, params).await }))
    }
}

impl Processor for SqliteProcessor {
    type Connection = SqliteConnection;

    fn dialect(&self) -> &'static str {
        DIALECT
    }

    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    fn announcer(&self) -> &dyn Announcer {
        self.announcer.as_ref()
    }

    fn is_open(&self) -> bool {
        self.session.is_open()
    }

    fn execute(&mut self, template: &str, args: &[&str]) -> Result<()> {
        let sql = template::render(template, args)?;
        if self.options.preview_only {
            self.announcer.sql(&sql);
            return Ok(());
        }
        self.run_raw(sql).map(|_| ())
    }

    fn read(&mut self, template: &str, args: &[&str]) -> Result<DataSet> {
        let sql = template::render(template, args)?;
        self.fetch(sql, Vec::new())
    }

    fn process(&mut self, sql: &str) -> Result<()> {
        self.announcer.sql(sql);
        if self.options.preview_only || sql.is_empty() {
            return Ok(());
        }
        self.run_raw(sql.to_string()).map(|_| ())
    }

    fn perform(&mut self, operation: DbOperation<'_, SqliteConnection>) -> Result<()> {
        if self.options.preview_only {
            self.announcer.say("Skipping custom operation in preview mode");
            return Ok(());
        }
        debug!(dialect = DIALECT, "Performing custom operation");
        self.session.run(operation)
    }

    fn execute_bound(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        if self.options.preview_only {
            self.announcer.sql(sql);
            return Ok(0);
        }
        debug!(dialect = DIALECT, sql = %sql, params = params.len(), "Executing SQL");
        let sql = sql.to_string();
        let params = params.to_vec();
        self.session.run(move |conn| {
            Box::pin(async move {
                let query = params.into_iter().fold(sqlx::query(&sql), bind);
                query
                    .execute(&mut *conn)
                    .await
                    .map(|result| result.rows_affected())
            })
        })
    }

    fn read_bound(&mut self, sql: &str, params: &[Value]) -> Result<DataSet> {
        self.fetch(sql.to_string(), params.to_vec())
    }

    fn table_exists(&mut self, table: &str) -> bool {
        self.exists(TABLE_EXISTS, &[table])
    }

    fn column_exists(&mut self, table: &str, column: &str) -> bool {
        self.exists(COLUMN_EXISTS, &[table, column])
    }

    fn constraint_exists(&mut self, table: &str, constraint: &str) -> bool {
        self.exists(CONSTRAINT_EXISTS, &[table, constraint])
    }

    fn index_exists(&mut self, table: &str, index: &str) -> bool {
        self.exists(INDEX_EXISTS, &[table, index])
    }

    fn schema_exists(&mut self, schema: &str) -> Result<bool> {
        Ok(self.exists(SCHEMA_EXISTS, &[schema]))
    }
}

async fn execute_raw(
    conn: &mut SqliteConnection,
    sql: &str,
) -> std::result::Result<u64, sqlx::Error> {
    (&mut *conn)
        .execute(sql)
        .await
        .map(|result| result.rows_affected())
}

async fn fetch(
    conn: &mut SqliteConnection,
    sql: &str,
    params: Vec<Value>,
) -> std::result::Result<DataSet, sqlx::Error> {
    let statement = (&mut *conn).prepare(sql).await?;
    let columns = statement
        .columns()
        .iter()
        .map(|column| DataColumn {
            name: column.name().to_string(),
            type_name: column.type_info().name().to_string(),
        })
        .collect();

    let query = params.into_iter().fold(statement.query(), bind);
    let rows = query
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(decode_row)
        .collect::<std::result::Result<_, _>>()?;

    Ok(DataSet { columns, rows })
}

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(n) => query.bind(n),
        Value::Real(r) => query.bind(r),
        Value::Text(s) => query.bind(s),
        Value::Blob(b) => query.bind(b),
    }
}

fn decode_row(row: &SqliteRow) -> std::result::Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

/// Decodes by storage class, which SQLite reports per value.
fn decode_value(row: &SqliteRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();

    let value = match storage.as_str() {
        "INTEGER" | "INT" | "BOOLEAN" => Value::Integer(row.try_get_unchecked(index)?),
        "REAL" => Value::Real(row.try_get_unchecked(index)?),
        "BLOB" => Value::Blob(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::announcer::{Announcement, RecordingAnnouncer};
    use crate::error::ProcessorError;
    use crate::processor::db_operation;

    fn processor(options: ProcessorOptions) -> (SqliteProcessor, RecordingAnnouncer) {
        let recorder = RecordingAnnouncer::new();
        let connect = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let processor = SqliteProcessor::new(connect, recorder.clone(), options).unwrap();
        (processor, recorder)
    }

    #[test]
    fn test_connection_opens_lazily() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        assert!(!processor.is_open());
        processor.execute("create table {0} (id integer)", &["t"]).unwrap();
        assert!(processor.is_open());
    }

    #[test]
    fn test_process_announces_then_runs() {
        let (mut processor, recorder) = processor(ProcessorOptions::default());
        processor
            .process("create table people (age integer not null)")
            .unwrap();

        assert!(processor.table_exists("people"));
        assert!(processor.column_exists("people", "age"));
        assert!(!processor.column_exists("people", "name"));
        assert_eq!(
            recorder.entries(),
            vec![Announcement::Sql(
                "create table people (age integer not null)".into()
            )]
        );
    }

    #[test]
    fn test_process_runs_a_whole_script() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor
            .process(
                "create table people (name text not null); \
                 insert into people (name) values ('Ada'); \
                 insert into people (name) values ('Grace');",
            )
            .unwrap();
        processor
            .execute("delete from {0} where name = '{1}'", &["people", "Ada"])
            .unwrap();

        let data = processor.read_table_data("people").unwrap();
        assert_eq!(data.rows, vec![vec![Value::Text("Grace".into())]]);
    }

    #[test]
    fn test_preview_only_never_connects() {
        let (mut processor, recorder) = processor(ProcessorOptions::new().preview_only(true));
        processor.process("create table people (age integer)").unwrap();
        processor.execute("drop table {0}", &["people"]).unwrap();
        assert_eq!(processor.execute_bound("delete from people", &[]).unwrap(), 0);
        assert!(!processor.is_open());
        assert_eq!(
            recorder.sql_statements(),
            vec![
                "create table people (age integer)",
                "drop table people",
                "delete from people",
            ]
        );
    }

    #[test]
    fn test_empty_sql_never_connects() {
        let (mut processor, recorder) = processor(ProcessorOptions::default());
        processor.process("").unwrap();
        assert!(!processor.is_open());
        assert_eq!(recorder.sql_statements(), vec![String::new()]);
    }

    #[test]
    fn test_execute_propagates_driver_errors() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        let err = processor.execute("not valid sql", &[]).unwrap_err();
        assert!(matches!(err, ProcessorError::Execution(_)));

        let err = processor.process("insert into missing values (1)").unwrap_err();
        assert!(matches!(err, ProcessorError::Execution(_)));
    }

    #[test]
    fn test_execute_rejects_bad_template() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        let err = processor.execute("select {2}", &["a"]).unwrap_err();
        assert!(matches!(err, ProcessorError::Template(_)));
        assert!(!processor.is_open());
    }

    #[test]
    fn test_read_materializes_rows() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor
            .process(
                "create table items (id integer, label text, price real, payload blob);\
                 insert into items values (1, 'pen', 1.5, x'CAFE'), (2, null, 2.0, null);",
            )
            .unwrap();

        let data = processor.read_table_data("items").unwrap();
        assert_eq!(data.row_count(), 2);
        let names: Vec<&str> = data.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "label", "price", "payload"]);
        assert_eq!(data.value(0, "id"), Some(&Value::Integer(1)));
        assert_eq!(data.value(0, "label"), Some(&Value::Text("pen".into())));
        assert_eq!(data.value(0, "price"), Some(&Value::Real(1.5)));
        assert_eq!(data.value(0, "payload"), Some(&Value::Blob(vec![0xCA, 0xFE])));
        assert_eq!(data.value(1, "label"), Some(&Value::Null));
    }

    #[test]
    fn test_exists_is_failure_safe() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor
            .process("create table t (name text); insert into t values ('users');")
            .unwrap();

        assert!(processor.exists("select count(*) from t", &[]));
        assert!(!processor.exists("select count(*) from t where name = 'x'", &[]));
        assert!(!processor.exists("select name from t where 1 = 0", &[]));
        assert!(!processor.exists("select name from t", &[]));
        assert!(!processor.exists("select count(*) from no_such_table", &[]));
        assert!(!processor.exists("select {5}", &[]));
    }

    #[test]
    fn test_catalog_checks() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor
            .process(
                "create table customers (id integer primary key);\
                 create table orders (id integer, customer_id integer, \
                 CONSTRAINT \"FK_orders_customers\" FOREIGN KEY (customer_id) \
                 REFERENCES customers (id));\
                 create index IX_orders_customer on orders (customer_id);",
            )
            .unwrap();

        assert!(processor.constraint_exists("orders", "FK_orders_customers"));
        assert!(!processor.constraint_exists("orders", "FK_missing"));
        assert!(processor.index_exists("orders", "IX_orders_customer"));
        assert!(!processor.index_exists("customers", "IX_orders_customer"));
        assert!(processor.schema_exists("main").unwrap());
        assert!(!processor.schema_exists("archive").unwrap());
    }

    #[test]
    fn test_bound_parameters_are_not_interpolated() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor.process("create table notes (body text)").unwrap();

        let affected = processor
            .execute_bound(
                "insert into notes (body) values (?)",
                &[Value::Text("it's fine".into())],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let data = processor
            .read_bound(
                "select body from notes where body = ?",
                &[Value::Text("it's fine".into())],
            )
            .unwrap();
        assert_eq!(data.value(0, "body"), Some(&Value::Text("it's fine".into())));
    }

    #[test]
    fn test_perform_receives_open_connection() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor.process("create table events (id integer)").unwrap();

        processor
            .perform(db_operation(|conn: &mut SqliteConnection| {
                Box::pin(async move {
                    sqlx::query("insert into events (id) values (1), (2)")
                        .execute(&mut *conn)
                        .await
                        .map(|_| ())
                })
            }))
            .unwrap();

        let data = processor.read("select count(*) as n from {0}", &["events"]).unwrap();
        assert_eq!(data.value(0, "n"), Some(&Value::Integer(2)));
    }
}
