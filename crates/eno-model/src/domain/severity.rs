use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Numeric level used by the log pipeline.
    pub fn level(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::Error => 3,
            Severity::Warning => 2,
            Severity::Info => 1,
            Severity::Debug => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CRITICAL" => Some(Severity::Critical),
            "ERROR" => Some(Severity::Error),
            "WARNING" => Some(Severity::Warning),
            "INFO" => Some(Severity::Info),
            "DEBUG" => Some(Severity::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric level for a severity name; unrecognized names map to 0.
pub fn severity_level(name: &str) -> u8 {
    Severity::from_name(name).map_or(0, Severity::level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping() {
        assert_eq!(severity_level("CRITICAL"), 4);
        assert_eq!(severity_level("ERROR"), 3);
        assert_eq!(severity_level("WARNING"), 2);
        assert_eq!(severity_level("INFO"), 1);
        assert_eq!(severity_level("DEBUG"), 0);
    }

    #[test]
    fn unknown_names_map_to_zero() {
        assert_eq!(severity_level("NOTICE"), 0);
        assert_eq!(severity_level("warning"), 0);
        assert_eq!(severity_level(""), 0);
    }

    #[test]
    fn name_and_level_agree() {
        for s in [
            Severity::Debug,
            Severity::Info,
            Severity::Warning,
            Severity::Error,
            Severity::Critical,
        ] {
            assert_eq!(severity_level(s.as_str()), s.level());
            assert_eq!(
                serde_json::to_string(&s).unwrap(),
                format!("\"{}\"", s.as_str())
            );
        }
    }
}
