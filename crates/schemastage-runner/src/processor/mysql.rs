//! MySQL processor.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::debug;

use super::dataset::{DataColumn, DataSet, Value};
use super::{template, DbOperation, Processor, Session};
use crate::announcer::Announcer;
use crate::error::{ProcessorError, Result};
use crate::options::ProcessorOptions;

const DIALECT: &str = "mysql";

const TABLE_EXISTS: &str =
    "select count(*) from information_schema.tables where table_name = '{0}'";
const COLUMN_EXISTS: &str = "select count(*) from information_schema.columns \
     where table_name = '{0}' and column_name = '{1}'";
const CONSTRAINT_EXISTS: &str = "select count(*) from information_schema.table_constraints \
     where table_name = '{0}' and constraint_name = '{1}'";
const INDEX_EXISTS: &str = "select count(*) from information_schema.statistics \
     where table_name = '{0}' and index_name = '{1}'";

/// Processor backed by a single MySQL connection.
///
/// MySQL has no schema separate from the database, so
/// [`Processor::schema_exists`] is refused.
pub struct MySqlProcessor {
    session: Session<MySql>,
    announcer: Box<dyn Announcer>,
    options: ProcessorOptions,
}

impl MySqlProcessor {
    /// Creates a processor. No connection is opened until it is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking runtime cannot be created.
    pub fn new(
        connect_options: MySqlConnectOptions,
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

impl Processor for MySqlProcessor {
    type Connection = MySqlConnection;

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

    fn perform(&mut self, operation: DbOperation<'_, MySqlConnection>) -> Result<()> {
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

    fn schema_exists(&mut self, _schema: &str) -> Result<bool> {
        Err(ProcessorError::unsupported(DIALECT, "schema_exists"))
    }
}

async fn execute_raw(
    conn: &mut MySqlConnection,
    sql: &str,
) -> std::result::Result<u64, sqlx::Error> {
    (&mut *conn)
        .execute(sql)
        .await
        .map(|result| result.rows_affected())
}

async fn fetch(
    conn: &mut MySqlConnection,
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
    query: Query<'q, MySql, MySqlArguments>,
    value: Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(n) => query.bind(n),
        Value::Real(r) => query.bind(r),
        Value::Text(s) => query.bind(s),
        Value::Blob(b) => query.bind(b),
    }
}

fn decode_row(row: &MySqlRow) -> std::result::Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

fn decode_value(row: &MySqlRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::Integer(row.try_get_unchecked(index)?)
        }
        unsigned if unsigned.ends_with("UNSIGNED") => {
            let n: u64 = row.try_get(index)?;
            i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Integer)
        }
        "FLOAT" | "DOUBLE" => Value::Real(row.try_get(index)?),
        "DATE" => Value::Text(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "TIME" => Value::Text(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "DATETIME" | "TIMESTAMP" => {
            Value::Text(row.try_get::<NaiveDateTime, _>(index)?.to_string())
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => Value::Blob(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcer::RecordingAnnouncer;

    /// Points at a port nothing listens on; tests below must never connect.
    fn processor(options: ProcessorOptions) -> (MySqlProcessor, RecordingAnnouncer) {
        let recorder = RecordingAnnouncer::new();
        let connect = MySqlConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("migrator")
            .database("app");
        let processor = MySqlProcessor::new(connect, recorder.clone(), options).unwrap();
        (processor, recorder)
    }

    #[test]
    fn test_schema_exists_is_unsupported() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        let err = processor.schema_exists("app").unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::Unsupported {
                dialect: "mysql",
                ..
            }
        ));
        assert!(!processor.is_open());
    }

    #[test]
    fn test_preview_only_never_connects() {
        let (mut processor, recorder) = processor(ProcessorOptions::new().preview_only(true));
        processor
            .process("ALTER TABLE `people` ADD COLUMN `age` INTEGER NOT NULL")
            .unwrap();
        processor.execute("DROP TABLE `{0}`", &["people"]).unwrap();
        assert!(!processor.is_open());
        assert_eq!(
            recorder.sql_statements(),
            vec![
                "ALTER TABLE `people` ADD COLUMN `age` INTEGER NOT NULL",
                "DROP TABLE `people`",
            ]
        );
    }

    #[test]
    fn test_empty_sql_never_connects() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        processor.process("").unwrap();
        assert!(!processor.is_open());
    }

    #[test]
    fn test_unreachable_server() {
        let (mut processor, _) = processor(ProcessorOptions::default());
        assert!(!processor.table_exists("people"));
        assert!(matches!(
            processor.process("SELECT 1"),
            Err(ProcessorError::Execution(_))
        ));
        assert!(!processor.is_open());
    }
}
