use serde::{Deserialize, Serialize};

/// Outcome category reported back to the game engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckerTaskResult {
    /// The service behaved correctly.
    Ok,
    /// The service responded but behaved incorrectly.
    Mumble,
    /// The service could not be reached.
    Down,
    /// The checker itself failed.
    InternalError,
}

impl CheckerTaskResult {
    /// Returns the wire name (`"OK"`, `"MUMBLE"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerTaskResult::Ok => "OK",
            CheckerTaskResult::Mumble => "MUMBLE",
            CheckerTaskResult::Down => "DOWN",
            CheckerTaskResult::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Response body of a task request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerResultMessage {
    pub result: CheckerTaskResult,
    /// Diagnostic text for non-OK results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckerResultMessage {
    pub fn ok() -> Self {
        Self {
            result: CheckerTaskResult::Ok,
            message: None,
        }
    }

    /// Build a non-OK result; an empty message is dropped.
    pub fn with_message(result: CheckerTaskResult, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            result,
            message: (!message.is_empty()).then_some(message),
        }
    }

    pub fn mumble(message: impl Into<String>) -> Self {
        Self::with_message(CheckerTaskResult::Mumble, message)
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self::with_message(CheckerTaskResult::Down, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(CheckerTaskResult::InternalError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_names_on_the_wire() {
        let names: Vec<String> = [
            CheckerTaskResult::Ok,
            CheckerTaskResult::Mumble,
            CheckerTaskResult::Down,
            CheckerTaskResult::InternalError,
        ]
        .iter()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect();

        assert_eq!(
            names,
            vec![r#""OK""#, r#""MUMBLE""#, r#""DOWN""#, r#""INTERNAL_ERROR""#]
        );
        assert_eq!(CheckerTaskResult::InternalError.as_str(), "INTERNAL_ERROR");
    }

    #[test]
    fn ok_has_no_message_field() {
        let json = serde_json::to_string(&CheckerResultMessage::ok()).unwrap();
        assert_eq!(json, r#"{"result":"OK"}"#);
    }

    #[test]
    fn empty_message_is_omitted() {
        let json = serde_json::to_string(&CheckerResultMessage::down("")).unwrap();
        assert_eq!(json, r#"{"result":"DOWN"}"#);
    }

    #[test]
    fn message_is_kept() {
        let msg = CheckerResultMessage::mumble("wrong flag");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"result":"MUMBLE","message":"wrong flag"}"#);

        let back: CheckerResultMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
