use crate::field::Field;
use crate::level::Level;
use crate::record::LogRecord;
use crate::remote::{RemoteClient, RemoteEntry};
use crate::sink::EntrySink;
use std::error::Error;
use std::sync::Arc;

/// A local sink that accepts and drops everything.
///
/// Useful for measuring the overhead of the enrichment core itself, and
/// for unit tests that don't care about persistence.
#[derive(Clone, Default)]
pub struct NoopSink;

impl EntrySink for NoopSink {
    fn enabled(&self, _level: Level) -> bool {
        true
    }

    fn with(&self, _fields: Vec<Field>) -> Arc<dyn EntrySink> {
        Arc::new(NoopSink)
    }

    fn write(
        &self,
        _record: &LogRecord,
        _fields: Vec<Field>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    fn sync(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// A remote client that drops every entry.
#[derive(Clone, Default)]
pub struct NoopRemote;

impl RemoteClient for NoopRemote {
    fn log(&self, _entry: RemoteEntry) {}

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
