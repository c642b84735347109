use crate::decorate::{decorate, MESSAGE_KEY};
use crate::field::Field;
use crate::labels::{labels_field, split_label_fields, LabelStore};
use crate::level::{severity_for, Level};
use crate::record::LogRecord;
use crate::remote::{RemoteClient, RemoteEntry, RemoteSourceLocation};
use crate::sink::EntrySink;
use crate::value::{normalize, Value};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::sync::Arc;

/// Construction-time configuration of the enrichment core. Immutable
/// after construction, read on every write.
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    /// Attach an error report to every entry at error level or above.
    pub report_all_errors: bool,
    /// Attached as service context to all entries when non-empty, and
    /// used as the error report's service association.
    pub service_name: String,
}

/// The enrichment core: one logger scope with its accumulated labels and
/// fields.
///
/// Wraps an inner [`EntrySink`] and implements the same contract, so any
/// number of decorating layers compose transparently. The permanent label
/// store is shared by reference with every scope derived through
/// [`EntrySink::with`]; the temporary store is private to this instance
/// and cleared after each write.
pub struct DriverCore {
    inner: Arc<dyn EntrySink>,
    remote: Arc<dyn RemoteClient>,
    fields: Vec<Field>,
    perm_labels: Arc<LabelStore>,
    temp_labels: LabelStore,
    config: DriverConfig,
}

impl DriverCore {
    pub fn new(
        inner: Arc<dyn EntrySink>,
        remote: Arc<dyn RemoteClient>,
        config: DriverConfig,
    ) -> Self {
        DriverCore {
            inner,
            remote,
            fields: Vec::new(),
            perm_labels: Arc::new(LabelStore::new()),
            temp_labels: LabelStore::new(),
            config,
        }
    }

    /// Union of permanent and temporary labels; a temporary entry wins on
    /// key collision. Each store is snapshotted under its own lock, the
    /// two snapshots are not required to be mutually consistent.
    fn all_labels(&self) -> HashMap<String, String> {
        let mut union = self.perm_labels.snapshot();
        union.extend(self.temp_labels.snapshot());
        union
    }
}

impl EntrySink for DriverCore {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn EntrySink> {
        let (extracted, ordinary) = split_label_fields(fields);
        self.perm_labels.merge(&extracted);

        let mut accumulated = self.fields.clone();
        accumulated.extend(ordinary.iter().cloned());

        Arc::new(DriverCore {
            inner: self.inner.with(ordinary),
            remote: Arc::clone(&self.remote),
            fields: accumulated,
            perm_labels: Arc::clone(&self.perm_labels),
            temp_labels: LabelStore::new(),
            config: self.config.clone(),
        })
    }

    fn write(
        &self,
        record: &LogRecord,
        fields: Vec<Field>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (extracted, mut fields) = split_label_fields(fields);
        self.temp_labels.merge(&extracted);

        let mut payload = BTreeMap::new();
        for field in &self.fields {
            if let Some(value) = normalize(field) {
                payload.insert(field.key.clone(), value);
            }
        }
        payload.insert(MESSAGE_KEY.to_string(), Value::Str(record.message.clone()));

        let labels = self.all_labels();

        // Fire and forget: the remote client owns queuing and retry, a
        // failure there never fails or delays the local write.
        self.remote.log(RemoteEntry {
            timestamp: record.timestamp,
            severity: severity_for(record.level),
            payload,
            labels: labels.clone(),
            source_location: record.caller.as_ref().map(|c| RemoteSourceLocation {
                file: c.file.clone(),
                line: c.line as i64,
                function: c.function.clone().unwrap_or_default(),
            }),
            insert_id: String::new(),
            http_request: None,
            operation: None,
            log_name: String::new(),
            resource: None,
            trace: String::new(),
            span_id: String::new(),
            trace_sampled: false,
        });

        fields.push(labels_field(&labels));
        let fields = decorate(record, &self.config, fields);

        // Cleared before the local write so a sink failure cannot leak
        // this write's labels into the next one.
        self.temp_labels.reset();

        self.inner.write(record, fields)
    }

    fn sync(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        // The local sink's flush result is the authoritative one.
        let _ = self.remote.flush();
        self.inner.sync()
    }
}
