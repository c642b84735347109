use crate::level::Level;
use chrono::{DateTime, Utc};

/// Resolved code location of the logging call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub file: String,
    pub line: u32,
    /// Enclosing function or module path, when the engine can resolve it.
    pub function: Option<String>,
}

/// Immutable snapshot of one log write, produced by the wrapped logging
/// engine and consumed read-only by the enrichment pipeline.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub caller: Option<CallerInfo>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            caller: None,
        }
    }

    pub fn with_caller(
        mut self,
        file: impl Into<String>,
        line: u32,
        function: Option<String>,
    ) -> Self {
        self.caller = Some(CallerInfo {
            file: file.into(),
            line,
            function,
        });
        self
    }
}
