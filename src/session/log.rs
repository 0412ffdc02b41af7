//! Session journal: an ordered record of every stage of one planning session.

use crate::error::PlanError;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide journal counter; keeps names unique within one millisecond.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub title: String,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct SessionLog {
    started: DateTime<Local>,
    sequence: u64,
    entries: Vec<LogEntry>,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
        }
    }

    /// Append an entry. Payloads that fail to serialize are recorded as their error text.
    pub fn record(&mut self, title: impl Into<String>, payload: impl Serialize) {
        let payload = serde_json::to_value(payload)
            .unwrap_or_else(|e| Value::String(format!("unserializable payload: {}", e)));
        self.entries.push(LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            title: title.into(),
            payload,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with the given title, oldest first.
    pub fn find<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.title == title)
    }

    /// `session_<YYYYmmdd_HHMMSS_mmm>_<seq>.json`, from the session start time.
    pub fn file_name(&self) -> String {
        format!(
            "session_{}_{}.json",
            self.started.format("%Y%m%d_%H%M%S_%3f"),
            self.sequence
        )
    }

    /// Write the journal as pretty JSON into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, PlanError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(path)
    }
}
