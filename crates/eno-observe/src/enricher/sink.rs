use std::sync::{Mutex, PoisonError};

use eno_model::{EnoLogMessage, Severity};
use tracing::{debug, error, info, warn};

use crate::enricher::task_logger::LOG_PREFIX;

/// Destination for rendered log lines.
pub trait LogSink: Send + Sync + 'static {
    fn write_line(&self, severity: Severity, line: &str);
}

/// Forwards every line to the process-wide `tracing` subscriber.
///
/// CRITICAL has no `tracing` counterpart and is emitted at `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_line(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Debug => debug!(target: "enochecker", "{line}"),
            Severity::Info => info!(target: "enochecker", "{line}"),
            Severity::Warning => warn!(target: "enochecker", "{line}"),
            Severity::Error | Severity::Critical => error!(target: "enochecker", "{line}"),
        }
    }
}

/// Keeps rendered lines in memory, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    /// Captured lines parsed back into records. Lines without the log prefix are skipped.
    pub fn records(&self) -> Vec<EnoLogMessage> {
        self.lock()
            .iter()
            .filter_map(|(_, line)| line.strip_prefix(LOG_PREFIX))
            .filter_map(|json| serde_json::from_str(json).ok())
            .collect()
    }

    /// Parsed records of the given severity.
    pub fn records_at(&self, severity: Severity) -> Vec<EnoLogMessage> {
        self.records()
            .into_iter()
            .filter(|r| r.severity == severity)
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Severity, String)>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, severity: Severity, line: &str) {
        self.lock().push((severity, line.to_string()));
    }
}
