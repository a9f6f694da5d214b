use serde::{Deserialize, Serialize};

use crate::{CheckerTaskMessage, RoundId, RunId, Severity};

/// Value of the `type` field for records emitted by the checker layer.
pub const LOG_TYPE_INFRASTRUCTURE: &str = "infrastructure";

/// One structured log record in the engine's log pipeline format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnoLogMessage {
    /// Emitting checker, e.g. `"EchoChecker"`.
    pub tool: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub severity_level: u8,
    /// UTC, millisecond precision, trailing `Z`.
    pub timestamp: String,
    pub message: String,
    pub module: String,
    pub function: String,
    #[serde(flatten)]
    pub context: LogContext,
}

/// Task correlation fields of a log record.
///
/// Every field is absent (and omitted from JSON) when the record is emitted
/// outside of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round_id: Option<RoundId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_round_id: Option<RoundId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_chain_id: Option<String>,
}

impl LogContext {
    /// Correlation fields for a record emitted while `task` is in flight.
    pub fn for_task(task: &CheckerTaskMessage, service_name: Option<&str>) -> Self {
        Self {
            service_name: service_name.map(str::to_string),
            task_id: Some(task.run_id),
            method: Some(task.method.to_string()),
            team_id: Some(task.team_id.clone()),
            team_name: Some(task.team_name.clone()),
            current_round_id: Some(task.current_round_id),
            related_round_id: Some(task.related_round_id),
            flag: task.flag.clone(),
            flag_index: task.flag_index,
            variant_id: task.variant_id,
            task_chain_id: task.task_chain_id.clone(),
        }
    }

    /// Returns `true` if no correlation field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
