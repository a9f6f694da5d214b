use std::io::IsTerminal;

use crate::logger::format::LoggerFormat;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
    /// `tool` of records rendered by the `eno` format; `BaseChecker` when unset.
    pub tool: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stdout().is_terminal();
        Self {
            format: LoggerFormat::Eno,
            level: "info".to_string(),
            with_targets: true,
            use_color,
            tool: None,
        }
    }
}
