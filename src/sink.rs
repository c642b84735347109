use crate::field::Field;
use crate::level::Level;
use crate::record::LogRecord;
use std::error::Error;
use std::sync::Arc;

/// Destination for finished log entries, and the contract the enrichment
/// core itself implements so decorating layers compose transparently.
///
/// Implementations own batching, buffering and transport; the core hands
/// them a finished field set and trusts them from there. All methods are
/// called synchronously on whatever thread the application logs from.
pub trait EntrySink: Send + Sync {
    /// Whether entries at `level` should be written at all. Owned entirely
    /// by the innermost sink's level-enabling mechanism.
    fn enabled(&self, level: Level) -> bool;

    /// Derive a child sink with `fields` permanently attached.
    fn with(&self, fields: Vec<Field>) -> Arc<dyn EntrySink>;

    /// Write one entry.
    ///
    /// **Returns**
    /// - `Ok(())` if the entry was accepted.
    /// - `Err(..)` on sink failure (I/O error, closed writer, etc.). This
    ///   is the only error the enrichment layer surfaces to callers.
    fn write(
        &self,
        record: &LogRecord,
        fields: Vec<Field>,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush anything buffered.
    fn sync(&self) -> Result<(), Box<dyn Error + Send + Sync>>;
}
