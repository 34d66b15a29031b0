mod common;

use common::{file_processor, memory_processor};
use schemastage_core::{DefaultValue, MigrationContext};
use schemastage_runner::{
    apply_expressions, Announcement, Processor, ProcessorError, ProcessorOptions,
    SqliteGenerator, Value,
};

fn shop_schema(context: &MigrationContext) {
    context
        .create()
        .table("customers")
        .with_column("id")
        .as_int64()
        .primary_key()
        .identity()
        .with_column("name")
        .as_string_sized(100)
        .not_nullable()
        .with_column("joined_at")
        .as_date_time()
        .with_default_value(DefaultValue::CurrentDateTime);
    context
        .create()
        .table("orders")
        .with_column("id")
        .as_int64()
        .primary_key()
        .identity()
        .with_column("customer_id")
        .as_int64()
        .not_nullable();
    context
        .create()
        .index("IX_orders_customer")
        .on_table("orders")
        .on_column("customer_id");
}

#[test]
fn test_builder_to_database() {
    let (mut processor, recorder) = memory_processor(ProcessorOptions::default());
    let context = MigrationContext::new();
    shop_schema(&context);
    context
        .create()
        .column("age")
        .on_table("customers")
        .as_int32()
        .nullable();
    context
        .rename()
        .column("name")
        .on_table("customers")
        .to("full_name");
    context.execute_sql(
        "CREATE TABLE order_lines (order_id INTEGER NOT NULL, \
         CONSTRAINT FK_lines_orders FOREIGN KEY (order_id) REFERENCES orders (id))",
    );

    let applied = apply_expressions(
        &context.into_expressions(),
        &SqliteGenerator::new(),
        &mut processor,
    )
    .unwrap();

    assert_eq!(applied, 6);
    assert!(processor.table_exists("customers"));
    assert!(processor.column_exists("customers", "age"));
    assert!(processor.column_exists("customers", "full_name"));
    assert!(!processor.column_exists("customers", "name"));
    assert!(processor.index_exists("orders", "IX_orders_customer"));
    assert!(processor.constraint_exists("order_lines", "FK_lines_orders"));
    assert!(!processor.constraint_exists("order_lines", "FK_missing"));
    assert_eq!(recorder.sql_statements().len(), 6);
}

#[test]
fn test_table_reference_is_declared_with_the_table() {
    let (mut processor, recorder) = memory_processor(ProcessorOptions::default());
    let context = MigrationContext::new();
    shop_schema(&context);
    context
        .create()
        .table("invoices")
        .with_column("id")
        .as_int64()
        .primary_key()
        .with_column("customer_id")
        .as_int64()
        .foreign_key()
        .references("FK_invoices_customers", "customers", ["id"]);

    let applied = apply_expressions(
        &context.into_expressions(),
        &SqliteGenerator::new(),
        &mut processor,
    )
    .unwrap();

    assert_eq!(applied, 4);
    assert!(processor.table_exists("invoices"));
    assert!(processor.constraint_exists("invoices", "FK_invoices_customers"));
    assert_eq!(recorder.sql_statements().len(), 4);
}

#[test]
fn test_reference_on_existing_table_stops_after_the_column() {
    let (mut processor, recorder) = memory_processor(ProcessorOptions::default());
    let context = MigrationContext::new();
    shop_schema(&context);
    context
        .create()
        .column("referrer_id")
        .on_table("customers")
        .as_int64()
        .nullable()
        .foreign_key()
        .references("FK_customers_referrer", "customers", ["id"]);

    let err = apply_expressions(
        &context.into_expressions(),
        &SqliteGenerator::new(),
        &mut processor,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        ProcessorError::Unsupported {
            dialect: "sqlite",
            ..
        }
    ));
    assert!(processor.column_exists("customers", "referrer_id"));
    assert!(matches!(
        recorder.entries().last(),
        Some(Announcement::Error(_))
    ));
}

#[test]
fn test_preview_pipeline_announces_without_connecting() {
    let (mut processor, recorder) = memory_processor(ProcessorOptions::new().preview_only(true));
    let context = MigrationContext::new();
    shop_schema(&context);

    let applied = apply_expressions(
        &context.into_expressions(),
        &SqliteGenerator::new(),
        &mut processor,
    )
    .unwrap();

    assert_eq!(applied, 3);
    assert!(!processor.is_open());
    let statements = recorder.sql_statements();
    assert!(statements[0].starts_with("CREATE TABLE \"customers\""));
    assert!(statements[2].starts_with("CREATE INDEX \"IX_orders_customer\""));
}

#[test]
fn test_catalog_templates_interpolate_arguments_verbatim() {
    let (mut processor, _) = memory_processor(ProcessorOptions::default());
    processor
        .process("CREATE TABLE \"o'brien\" (id INTEGER)")
        .unwrap();

    // The quote breaks the rendered query, which reads as "missing".
    assert!(!processor.table_exists("o'brien"));
    // A crafted name rewrites the predicate.
    assert!(processor.table_exists("x' or '1'='1"));
    assert!(!processor.table_exists("x"));
}

#[test]
fn test_bound_values_round_trip() {
    let (mut processor, _) = memory_processor(ProcessorOptions::default());
    processor
        .process("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, score REAL, raw BLOB)")
        .unwrap();

    let inserted = processor
        .execute_bound(
            "INSERT INTO notes (body, score, raw) VALUES (?, ?, ?)",
            &[
                Value::Text("o'brien".into()),
                Value::Real(0.5),
                Value::Blob(vec![0xCA, 0xFE]),
            ],
        )
        .unwrap();
    assert_eq!(inserted, 1);

    let data = processor
        .read_bound(
            "SELECT body, score, raw FROM notes WHERE body = ?",
            &[Value::Text("o'brien".into())],
        )
        .unwrap();
    assert_eq!(data.row_count(), 1);
    assert_eq!(data.value(0, "score"), Some(&Value::Real(0.5)));
    assert_eq!(data.value(0, "raw"), Some(&Value::Blob(vec![0xCA, 0xFE])));
}

#[test]
fn test_changes_persist_across_processors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");

    {
        let (mut processor, _) = file_processor(&path);
        processor
            .process("CREATE TABLE people (name TEXT NOT NULL)")
            .unwrap();
        processor
            .execute("INSERT INTO {0} (name) VALUES ('{1}')", &["people", "Ada"])
            .unwrap();
    }

    let (mut processor, _) = file_processor(&path);
    assert!(processor.table_exists("people"));
    let data = processor.read_table_data("people").unwrap();
    assert_eq!(data.rows, vec![vec![Value::Text("Ada".into())]]);
    assert!(processor.schema_exists("main").unwrap());
}

#[test]
fn test_options_from_json() {
    let options: ProcessorOptions =
        serde_json::from_str(r#"{"preview_only": true, "timeout": 2.5}"#).unwrap();
    let (mut processor, recorder) = memory_processor(options);

    processor.process("DROP TABLE people").unwrap();

    assert!(!processor.is_open());
    assert_eq!(recorder.sql_statements(), vec!["DROP TABLE people"]);
}
