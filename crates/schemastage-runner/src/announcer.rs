//! Sinks for human-readable progress and SQL output.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{error, info};

/// Receives status lines and rendered SQL while a migration runs.
pub trait Announcer: Send {
    /// Announces the start of a new section.
    fn heading(&self, message: &str);

    /// Announces a status line.
    fn say(&self, message: &str);

    /// Announces SQL about to be run (or previewed).
    fn sql(&self, sql: &str);

    /// Announces how long the last step took.
    fn elapsed_time(&self, elapsed: Duration);

    /// Announces a failure.
    fn error(&self, message: &str);
}

/// Forwards announcements to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnnouncer;

impl Announcer for TracingAnnouncer {
    fn heading(&self, message: &str) {
        info!(target: "schemastage::announcer", heading = %message);
    }

    fn say(&self, message: &str) {
        info!(target: "schemastage::announcer", "{message}");
    }

    fn sql(&self, sql: &str) {
        if sql.is_empty() {
            info!(target: "schemastage::announcer", "No SQL statement executed.");
        } else {
            info!(target: "schemastage::announcer", sql = %sql);
        }
    }

    fn elapsed_time(&self, elapsed: Duration) {
        info!(target: "schemastage::announcer", elapsed_ms = elapsed.as_millis());
    }

    fn error(&self, message: &str) {
        error!(target: "schemastage::announcer", "{message}");
    }
}

/// One recorded announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    Heading(String),
    Say(String),
    Sql(String),
    ElapsedTime(Duration),
    Error(String),
}

/// Keeps every announcement in memory.
///
/// Clones share the same buffer, so a handle kept by the caller sees what a
/// processor announced.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnnouncer {
    entries: Arc<Mutex<Vec<Announcement>>>,
}

impl RecordingAnnouncer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Announcement> {
        self.lock().clone()
    }

    /// Returns only the SQL announcements.
    #[must_use]
    pub fn sql_statements(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                Announcement::Sql(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, announcement: Announcement) {
        self.lock().push(announcement);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Announcement>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Announcer for RecordingAnnouncer {
    fn heading(&self, message: &str) {
        self.record(Announcement::Heading(message.to_string()));
    }

    fn say(&self, message: &str) {
        self.record(Announcement::Say(message.to_string()));
    }

    fn sql(&self, sql: &str) {
        self.record(Announcement::Sql(sql.to_string()));
    }

    fn elapsed_time(&self, elapsed: Duration) {
        self.record(Announcement::ElapsedTime(elapsed));
    }

    fn error(&self, message: &str) {
        self.record(Announcement::Error(message.to_string()));
    }
}
