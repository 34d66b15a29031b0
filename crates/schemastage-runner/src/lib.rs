//! Applies schemastage expressions to a database.
//!
//! `schemastage-runner` turns the expressions recorded by
//! `schemastage-core` into SQL and runs them, where:
//! - Each dialect has a generator rendering expressions as SQL
//! - Each dialect has a processor owning a single lazily opened connection
//! - Every statement is announced before it runs, and preview mode only
//!   announces
//!
//! # Architecture
//!
//! - **Generator** - Renders one [`schemastage_core::Expression`] as SQL
//! - **Processor** - Runs SQL, reads result sets and answers catalog checks
//! - **Announcer** - Receives headings, SQL and timings
//! - **Pipeline** - Drives expressions through a generator and a processor
//!
//! # Example
//!
//! ```rust
//! use schemastage_runner::{
//!     Processor, ProcessorOptions, RecordingAnnouncer, SqliteProcessor, Value,
//! };
//!
//! let recorder = RecordingAnnouncer::new();
//! let mut processor = SqliteProcessor::new(
//!     "sqlite::memory:".parse()?,
//!     recorder.clone(),
//!     ProcessorOptions::default(),
//! )?;
//!
//! processor.process("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)")?;
//! processor.execute("INSERT INTO {0} (name) VALUES ('{1}')", &["people", "Ada"])?;
//!
//! assert!(processor.table_exists("people"));
//! let data = processor.read_table_data("people")?;
//! assert_eq!(data.value(0, "name"), Some(&Value::Text("Ada".into())));
//! assert_eq!(recorder.sql_statements().len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod announcer;
pub mod error;
pub mod generator;
pub mod options;
pub mod pipeline;
pub mod processor;

pub use announcer::{Announcement, Announcer, RecordingAnnouncer, TracingAnnouncer};
pub use error::{ProcessorError, Result};
pub use generator::{MigrationGenerator, MySqlGenerator, SqliteGenerator};
pub use options::ProcessorOptions;
pub use pipeline::apply_expressions;
pub use processor::{
    db_operation, DataColumn, DataSet, DbOperation, MySqlProcessor, Processor, SqliteProcessor,
    Value,
};
