use std::fmt::{self, Write as _};

use eno_model::{EnoLogMessage, LOG_TYPE_INFRASTRUCTURE, LogContext, Severity};
use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::registry::LookupSpan;

use crate::enricher::{LOG_PREFIX, UNSET_TOOL, format_timestamp, render_line};

/// Renders every `tracing` event as one `##ENOLOGMESSAGE {json}` line.
///
/// Lines that already carry the prefix (records forwarded by
/// [`TracingSink`](crate::TracingSink)) are written unchanged. Other events
/// become records without task context: `module` is the event's module path,
/// `function` the innermost span name (empty outside spans) and the message is
/// the event message followed by its fields as `key=value`.
#[derive(Debug, Clone)]
pub struct EnoEventFormat {
    tool: String,
}

impl EnoEventFormat {
    pub fn new(tool: Option<&str>) -> Self {
        Self {
            tool: tool.unwrap_or(UNSET_TOOL).to_string(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    fn record(&self, event: &Event<'_>, function: String) -> EnoLogMessage {
        let meta = event.metadata();
        let mut fields = MessageVisitor::default();
        event.record(&mut fields);

        let severity = severity_of(*meta.level());
        EnoLogMessage {
            tool: self.tool.clone(),
            kind: LOG_TYPE_INFRASTRUCTURE.to_string(),
            severity,
            severity_level: severity.level(),
            timestamp: format_timestamp(OffsetDateTime::now_utc()),
            message: fields.finish(),
            module: meta.module_path().unwrap_or(meta.target()).to_string(),
            function,
            context: LogContext::default(),
        }
    }
}

impl Default for EnoEventFormat {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<S, N> FormatEvent<S, N> for EnoEventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if let Some(line) = forwarded_line(event) {
            return writeln!(writer, "{line}");
        }

        let function = ctx
            .lookup_current()
            .map(|span| span.name().to_string())
            .unwrap_or_default();
        writeln!(writer, "{}", render_line(&self.record(event, function)))
    }
}

/// TRACE has no counterpart and is reported as DEBUG.
fn severity_of(level: Level) -> Severity {
    if level == Level::ERROR {
        Severity::Error
    } else if level == Level::WARN {
        Severity::Warning
    } else if level == Level::INFO {
        Severity::Info
    } else {
        Severity::Debug
    }
}

/// The message of an event whose only field is an already rendered record.
fn forwarded_line(event: &Event<'_>) -> Option<String> {
    let mut fields = MessageVisitor::default();
    event.record(&mut fields);
    if fields.extra.is_empty() && fields.message.starts_with(LOG_PREFIX) {
        Some(fields.message)
    } else {
        None
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    extra: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.extra.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.extra,
            (false, false) => format!("{} {}", self.message, self.extra),
        }
    }

    fn push_field(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        let _ = write!(self.extra, "{}={}", field.name(), value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format_args!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::{info, info_span, warn};

    use crate::{MemorySink, TaskLogger, TracingSink, eno_critical};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn capture(format: EnoEventFormat, f: impl FnOnce()) -> Vec<String> {
        let out = Capture::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .event_format(format)
            .with_writer(move || writer.clone())
            .with_max_level(Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        out.lines()
    }

    fn parse(line: &str) -> EnoLogMessage {
        let json = line.strip_prefix(LOG_PREFIX).expect("prefixed line");
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn plain_events_become_records_with_sentinel_tool() {
        let lines = capture(EnoEventFormat::default(), || {
            info!("logger initialized");
            warn!(addr = "0.0.0.0:8000", service = "Echo", "checker listening");
        });

        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with(LOG_PREFIX)));

        let first = parse(&lines[0]);
        assert_eq!(first.tool, "BaseChecker");
        assert_eq!(first.severity, Severity::Info);
        assert_eq!(first.message, "logger initialized");
        assert_eq!(first.module, "eno_observe::logger::event::tests");
        assert_eq!(first.function, "");
        assert!(first.context.is_empty());

        let second = parse(&lines[1]);
        assert_eq!(second.severity_level, 2);
        assert_eq!(second.message, "checker listening addr=0.0.0.0:8000 service=Echo");
    }

    #[test]
    fn configured_tool_and_span_name_are_used() {
        let lines = capture(EnoEventFormat::new(Some("EchoChecker")), || {
            let span = info_span!("serve");
            let _guard = span.enter();
            info!("checker stopped");
        });

        let record = parse(&lines[0]);
        assert_eq!(record.tool, "EchoChecker");
        assert_eq!(record.function, "serve");
    }

    #[test]
    fn forwarded_records_are_not_wrapped_twice() {
        let lines = capture(EnoEventFormat::default(), || {
            let logger = TaskLogger::new(Arc::new(TracingSink));
            eno_critical!(logger, "disk full");
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].matches(LOG_PREFIX).count(), 1);
        let record = parse(&lines[0]);
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.message, "disk full");
        assert_eq!(record.function, "forwarded_records_are_not_wrapped_twice");
    }

    #[test]
    fn rendered_line_matches_task_logger_output() {
        let sink = Arc::new(MemorySink::new());
        let logger = TaskLogger::new(sink.clone());
        crate::eno_info!(logger, "same shape");

        let lines = capture(EnoEventFormat::default(), || {
            info!("same shape");
        });

        let direct = &sink.records()[0];
        let via_tracing = parse(&lines[0]);
        assert_eq!(direct.tool, via_tracing.tool);
        assert_eq!(direct.kind, via_tracing.kind);
        assert_eq!(direct.message, via_tracing.message);
    }
}
