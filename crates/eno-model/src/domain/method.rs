use std::fmt;

use serde::{Deserialize, Serialize};

/// Checker operation requested by a task.
///
/// Serialized as its lowercase wire name. Strings outside the five known
/// operations decode into [`CheckerMethod::Unknown`] so the dispatcher can
/// reject them with the task context still attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckerMethod {
    /// Store a flag in the target service.
    Putflag,
    /// Retrieve a previously stored flag.
    Getflag,
    /// Store non-secret filler data.
    Putnoise,
    /// Retrieve previously stored filler data.
    Getnoise,
    /// Exercise the service without flag semantics.
    Havoc,
    /// Any method name this checker does not understand.
    Unknown(String),
}

impl CheckerMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &str {
        match self {
            CheckerMethod::Putflag => "putflag",
            CheckerMethod::Getflag => "getflag",
            CheckerMethod::Putnoise => "putnoise",
            CheckerMethod::Getnoise => "getnoise",
            CheckerMethod::Havoc => "havoc",
            CheckerMethod::Unknown(raw) => raw,
        }
    }

    /// Returns `true` for the five operations a checker can serve.
    pub fn is_known(&self) -> bool {
        !matches!(self, CheckerMethod::Unknown(_))
    }

    /// Returns `true` if tasks of this kind carry a flag value.
    pub fn carries_flag(&self) -> bool {
        matches!(self, CheckerMethod::Putflag | CheckerMethod::Getflag)
    }
}

impl From<String> for CheckerMethod {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "putflag" => CheckerMethod::Putflag,
            "getflag" => CheckerMethod::Getflag,
            "putnoise" => CheckerMethod::Putnoise,
            "getnoise" => CheckerMethod::Getnoise,
            "havoc" => CheckerMethod::Havoc,
            _ => CheckerMethod::Unknown(raw),
        }
    }
}

impl From<&str> for CheckerMethod {
    fn from(raw: &str) -> Self {
        CheckerMethod::from(raw.to_string())
    }
}

impl From<CheckerMethod> for String {
    fn from(method: CheckerMethod) -> Self {
        match method {
            CheckerMethod::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CheckerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
