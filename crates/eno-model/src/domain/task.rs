use serde::{Deserialize, Serialize};

use crate::{CheckerMethod, RoundId, RunId};

/// One unit of checker work as sent by the game engine.
///
/// Decoding is strict about the fields it knows: a missing or mistyped
/// required field fails the whole decode. Extra keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerTaskMessage {
    /// Unique per dispatch attempt.
    pub run_id: RunId,
    /// Requested operation.
    pub method: CheckerMethod,
    /// Address of the team's vulnbox running the target service.
    pub address: String,
    pub service_id: String,
    pub service_name: String,
    pub team_id: String,
    pub team_name: String,
    /// Round in which the task is executed.
    pub current_round_id: RoundId,
    /// Round the task refers to (e.g. the round a flag was stored in).
    pub related_round_id: RoundId,
    /// Flag value, present for `putflag`/`getflag`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    /// Index of the flag or noise store within the round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<u64>,
    /// Groups a put task with its matching get task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_chain_id: Option<String>,
}

impl CheckerTaskMessage {
    /// Decode a task from a raw JSON request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "runId": 1,
            "method": "putflag",
            "address": "10.0.7.1",
            "serviceId": "2",
            "serviceName": "echo",
            "teamId": "7",
            "teamName": "team7",
            "currentRoundId": 3,
            "relatedRoundId": 3,
            "flag": "FLAG_X",
            "flagIndex": 0
        })
    }

    #[test]
    fn decodes_camel_case_body() {
        let body = serde_json::to_vec(&sample()).unwrap();
        let task = CheckerTaskMessage::from_slice(&body).unwrap();

        assert_eq!(task.run_id, 1);
        assert_eq!(task.method, CheckerMethod::Putflag);
        assert_eq!(task.team_id, "7");
        assert_eq!(task.current_round_id, 3);
        assert_eq!(task.flag.as_deref(), Some("FLAG_X"));
        assert_eq!(task.flag_index, Some(0));
        assert_eq!(task.variant_id, None);
        assert_eq!(task.task_chain_id, None);
    }

    #[test]
    fn missing_required_field_fails() {
        let mut v = sample();
        v.as_object_mut().unwrap().remove("teamName");
        let body = serde_json::to_vec(&v).unwrap();
        assert!(CheckerTaskMessage::from_slice(&body).is_err());
    }

    #[test]
    fn mistyped_field_fails() {
        let mut v = sample();
        v["runId"] = json!("one");
        let body = serde_json::to_vec(&v).unwrap();
        assert!(CheckerTaskMessage::from_slice(&body).is_err());
    }

    #[test]
    fn snake_case_keys_are_not_accepted() {
        let mut v = sample();
        let obj = v.as_object_mut().unwrap();
        let run_id = obj.remove("runId").unwrap();
        obj.insert("run_id".into(), run_id);
        let body = serde_json::to_vec(&v).unwrap();
        assert!(CheckerTaskMessage::from_slice(&body).is_err());
    }

    #[test]
    fn unknown_method_still_decodes() {
        let mut v = sample();
        v["method"] = json!("exploit");
        let body = serde_json::to_vec(&v).unwrap();
        let task = CheckerTaskMessage::from_slice(&body).unwrap();
        assert_eq!(task.method, CheckerMethod::Unknown("exploit".into()));
    }

    #[test]
    fn optional_fields_omitted_on_encode() {
        let mut v = sample();
        let obj = v.as_object_mut().unwrap();
        obj.remove("flag");
        obj.remove("flagIndex");
        let task: CheckerTaskMessage = serde_json::from_value(v).unwrap();

        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("flag"));
        assert!(!json.contains("taskChainId"));
        assert!(json.contains(r#""currentRoundId":3"#));
    }
}
