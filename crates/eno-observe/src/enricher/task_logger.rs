use std::fmt;
use std::sync::Arc;

use eno_model::{
    CheckerIdentity, CheckerTaskMessage, EnoLogMessage, LOG_TYPE_INFRASTRUCTURE, LogContext,
    Severity,
};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::enricher::{
    site::CallSite,
    sink::{LogSink, TracingSink},
};

/// Marker the log pipeline uses to pick checker records out of stdout.
pub const LOG_PREFIX: &str = "##ENOLOGMESSAGE ";

/// Tool name reported before a checker identity is bound.
pub const UNSET_TOOL: &str = "BaseChecker";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// Structured logger handed to checker operations.
///
/// Wraps a [`LogSink`] and stamps every record with the checker identity and,
/// once bound with [`TaskLogger::bind`], the correlation fields of one task.
/// Cloning is cheap; clones share the sink.
///
/// Use the `eno_*!` macros so module and function names come from the caller:
///
/// ```ignore
/// eno_info!(logger, "stored flag at {}", key);
/// ```
#[derive(Clone)]
pub struct TaskLogger {
    sink: Arc<dyn LogSink>,
    identity: Option<Arc<CheckerIdentity>>,
    context: Option<Arc<LogContext>>,
}

impl TaskLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            identity: None,
            context: None,
        }
    }

    /// Logger writing to the global `tracing` subscriber.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn with_identity(mut self, identity: Arc<CheckerIdentity>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Derive a logger whose records carry `task`'s correlation fields.
    pub fn bind(&self, task: &CheckerTaskMessage) -> Self {
        let service_name = self.identity.as_deref().map(|id| id.service_name.as_str());
        Self {
            sink: Arc::clone(&self.sink),
            identity: self.identity.clone(),
            context: Some(Arc::new(LogContext::for_task(task, service_name))),
        }
    }

    pub fn identity(&self) -> Option<&CheckerIdentity> {
        self.identity.as_deref()
    }

    /// Correlation fields of the bound task, if any.
    pub fn context(&self) -> Option<&LogContext> {
        self.context.as_deref()
    }

    pub fn tool(&self) -> String {
        self.identity
            .as_deref()
            .map_or_else(|| UNSET_TOOL.to_string(), CheckerIdentity::checker_name)
    }

    /// Build the record for one log call without emitting it.
    pub fn record(&self, severity: Severity, site: CallSite, message: String) -> EnoLogMessage {
        EnoLogMessage {
            tool: self.tool(),
            kind: LOG_TYPE_INFRASTRUCTURE.to_string(),
            severity,
            severity_level: severity.level(),
            timestamp: format_timestamp(OffsetDateTime::now_utc()),
            message,
            module: site.module.to_string(),
            function: site.function.to_string(),
            context: self.context.as_deref().cloned().unwrap_or_default(),
        }
    }

    pub fn log(&self, severity: Severity, site: CallSite, args: fmt::Arguments<'_>) {
        let record = self.record(severity, site, args.to_string());
        self.sink.write_line(severity, &render_line(&record));
    }

    pub fn debug(&self, site: CallSite, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, site, args);
    }

    pub fn info(&self, site: CallSite, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, site, args);
    }

    pub fn warning(&self, site: CallSite, args: fmt::Arguments<'_>) {
        self.log(Severity::Warning, site, args);
    }

    pub fn error(&self, site: CallSite, args: fmt::Arguments<'_>) {
        self.log(Severity::Error, site, args);
    }

    pub fn critical(&self, site: CallSite, args: fmt::Arguments<'_>) {
        self.log(Severity::Critical, site, args);
    }
}

impl Default for TaskLogger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for TaskLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskLogger")
            .field("tool", &self.tool())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Render a record as one `##ENOLOGMESSAGE {json}` line.
pub fn render_line(record: &EnoLogMessage) -> String {
    match serde_json::to_string(record) {
        Ok(json) => format!("{LOG_PREFIX}{json}"),
        // Only reachable with a broken Serialize impl; keep the message visible.
        Err(_) => format!("{LOG_PREFIX}{}", record.message),
    }
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ` in UTC.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.to_offset(time::UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_default()
}
