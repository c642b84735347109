use crate::level::Severity;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;

/// Call-site location in the remote service's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteSourceLocation {
    pub file: String,
    pub line: i64,
    pub function: String,
}

/// One fully structured entry handed to the remote ingestion service.
///
/// The trailing fields exist for wire completeness; this layer always
/// leaves them empty or absent and the remote service fills in defaults.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub payload: BTreeMap<String, Value>,
    pub labels: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location: Option<RemoteSourceLocation>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub insert_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_request: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub log_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub trace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub span_id: String,
    pub trace_sampled: bool,
}

/// Client for the remote log-ingestion service.
///
/// `log` must never block the calling write path on network I/O;
/// transport, queuing and retry live entirely behind this trait.
pub trait RemoteClient: Send + Sync {
    /// Accept one entry. Failures are the client's own business; the
    /// enrichment core neither retries nor observes them.
    fn log(&self, entry: RemoteEntry);

    /// Flush anything queued.
    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>>;
}
