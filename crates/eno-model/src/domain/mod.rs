mod method;
pub use method::CheckerMethod;

mod task;
pub use task::CheckerTaskMessage;

mod result;
pub use result::{CheckerResultMessage, CheckerTaskResult};

mod identity;
pub use identity::{CheckerIdentity, CheckerInfoMessage};

mod severity;
pub use severity::{Severity, severity_level};

mod log;
pub use log::{EnoLogMessage, LOG_TYPE_INFRASTRUCTURE, LogContext};

/// Identifier of a single dispatch attempt (`runId` on the wire, `taskId` in log records).
pub type RunId = u64;

/// Round counter as assigned by the game engine.
pub type RoundId = u64;
