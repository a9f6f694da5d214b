use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::{self, Write as _};

use eno_model::{CheckerResultMessage, CheckerTaskResult};
use thiserror::Error;

/// Failure of a checker operation.
///
/// The variant decides the reported result: [`Offline`](CheckerError::Offline)
/// is `DOWN`, [`Mumble`](CheckerError::Mumble) is `MUMBLE`, anything else is
/// `INTERNAL_ERROR`. Any `anyhow::Error` converts into `Internal` with `?`.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// The service did not respond or was unreachable.
    #[error("{0}")]
    Offline(ServiceFault),
    /// The service responded but violated its protocol.
    #[error("{0}")]
    Mumble(ServiceFault),
    /// Fault inside the checker itself.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type CheckerResult<T = ()> = Result<T, CheckerError>;

/// Payload of a `DOWN` or `MUMBLE` signal.
///
/// The message is what the engine sees. The source chain and the backtrace
/// captured at construction only go to the log.
#[derive(Debug)]
pub struct ServiceFault {
    message: String,
    source: Option<anyhow::Error>,
    backtrace: Backtrace,
}

impl ServiceFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::new(message)
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    pub fn into_message(self) -> String {
        self.message
    }

    fn trace(&self, kind: &str) -> String {
        let mut out = format!("{kind}: {}", self.message);
        if let Some(source) = &self.source {
            out.push_str("\n\nCaused by:");
            for (i, cause) in source.chain().enumerate() {
                let _ = write!(out, "\n    {i}: {cause}");
            }
        }
        if self.backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(out, "\n\nStack backtrace:\n{}", self.backtrace);
        }
        out
    }
}

impl fmt::Display for ServiceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl CheckerError {
    pub fn offline(message: impl Into<String>) -> Self {
        CheckerError::Offline(ServiceFault::new(message))
    }

    pub fn mumble(message: impl Into<String>) -> Self {
        CheckerError::Mumble(ServiceFault::new(message))
    }

    pub fn internal<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        CheckerError::Internal(anyhow::Error::msg(message))
    }

    pub fn task_result(&self) -> CheckerTaskResult {
        match self {
            CheckerError::Offline(_) => CheckerTaskResult::Down,
            CheckerError::Mumble(_) => CheckerTaskResult::Mumble,
            CheckerError::Internal(_) => CheckerTaskResult::InternalError,
        }
    }

    /// Full diagnostic text for logs: message, cause chain, and a backtrace
    /// when one was captured (`RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`).
    pub fn trace(&self) -> String {
        match self {
            CheckerError::Offline(fault) => fault.trace("OfflineError"),
            CheckerError::Mumble(fault) => fault.trace("BrokenServiceError"),
            CheckerError::Internal(err) => {
                let trace = format!("{err:?}");
                if trace.trim().is_empty() {
                    "unspecified internal checker error".to_string()
                } else {
                    trace
                }
            }
        }
    }

    /// Result message sent back to the engine.
    ///
    /// `DOWN` and `MUMBLE` carry only their own text (omitted when empty);
    /// `INTERNAL_ERROR` carries the full trace.
    pub fn into_result_message(self) -> CheckerResultMessage {
        match self {
            CheckerError::Offline(fault) => CheckerResultMessage::down(fault.into_message()),
            CheckerError::Mumble(fault) => CheckerResultMessage::mumble(fault.into_message()),
            internal @ CheckerError::Internal(_) => {
                CheckerResultMessage::internal_error(internal.trace())
            }
        }
    }

    /// `report` is the location and backtrace captured by the panic hook, if any.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>, report: Option<String>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        let err = anyhow::anyhow!("checker operation panicked: {detail}");
        CheckerError::Internal(match report {
            Some(report) => err.context(report),
            None => err,
        })
    }
}

/// Classify errors from service I/O as `DOWN` or `MUMBLE`.
///
/// The result message is `"<message>: <error>"`; the error itself is kept as
/// the source and shows up in the logged trace.
///
/// ```ignore
/// let stream = TcpStream::connect(addr).await.offline("connect failed")?;
/// ```
pub trait ResultExt<T> {
    fn offline(self, message: impl Into<String>) -> CheckerResult<T>;
    fn mumble(self, message: impl Into<String>) -> CheckerResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn offline(self, message: impl Into<String>) -> CheckerResult<T> {
        self.map_err(|e| CheckerError::Offline(classified(message.into(), e.into())))
    }

    fn mumble(self, message: impl Into<String>) -> CheckerResult<T> {
        self.map_err(|e| CheckerError::Mumble(classified(message.into(), e.into())))
    }
}

fn classified(message: String, source: anyhow::Error) -> ServiceFault {
    ServiceFault::with_source(format!("{message}: {source}"), source)
}
