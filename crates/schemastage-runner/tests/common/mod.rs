#![allow(dead_code)]

use std::path::Path;
use std::sync::Once;

use schemastage_runner::{ProcessorOptions, RecordingAnnouncer, SqliteProcessor};
use sqlx::sqlite::SqliteConnectOptions;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .without_time()
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

pub fn memory_processor(options: ProcessorOptions) -> (SqliteProcessor, RecordingAnnouncer) {
    init_tracing();
    let recorder = RecordingAnnouncer::new();
    let connect = "sqlite::memory:"
        .parse::<SqliteConnectOptions>()
        .unwrap_or_else(|e| panic!("Invalid in-memory url: {e}"));
    let processor = SqliteProcessor::new(connect, recorder.clone(), options)
        .unwrap_or_else(|e| panic!("Failed to build processor: {e}"));
    (processor, recorder)
}

pub fn file_processor(path: &Path) -> (SqliteProcessor, RecordingAnnouncer) {
    init_tracing();
    let recorder = RecordingAnnouncer::new();
    let connect = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let processor = SqliteProcessor::new(connect, recorder.clone(), ProcessorOptions::default())
        .unwrap_or_else(|e| panic!("Failed to build processor: {e}"));
    (processor, recorder)
}
