use serde::Serialize;

/// Severity level of a single log write, as understood by the wrapped
/// logging engine. Ordering follows verbosity: `Trace` is the lowest,
/// `Error` the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity vocabulary of the remote ingestion service.
///
/// The full remote set is carried even though the engine-side [`Level`]s
/// only map onto a subset of it; callers constructing [`RemoteEntry`]s
/// by hand may use any member.
///
/// [`RemoteEntry`]: crate::remote::RemoteEntry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// Fixed level-to-severity lookup. Initialized at compile time and never
/// mutated, so concurrent reads need no locking.
const LEVEL_SEVERITY: [(Level, Severity); 5] = [
    (Level::Trace, Severity::Debug),
    (Level::Debug, Severity::Debug),
    (Level::Info, Severity::Info),
    (Level::Warn, Severity::Warning),
    (Level::Error, Severity::Error),
];

/// Map an engine level to the remote service's severity. Levels missing
/// from the table fall back to [`Severity::Default`].
pub fn severity_for(level: Level) -> Severity {
    LEVEL_SEVERITY
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, s)| *s)
        .unwrap_or(Severity::Default)
}
