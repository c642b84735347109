use crate::field::Field;
use crate::level::Level;
use crate::record::LogRecord;
use crate::sink::EntrySink;
use crate::value::normalize;
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Local structured-log writer: one JSON object per line to any
/// `io::Write`.
///
/// Fields attached through `with` and the per-write field set are both
/// rendered through the normalizer, so the line format matches what the
/// remote payload would show for the same fields. The record's own keys
/// (`timestamp`, `level`, `message`) win over a field using the same name.
pub struct JsonWriterSink {
    min_level: Level,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    fields: Vec<Field>,
}

impl JsonWriterSink {
    pub fn new(writer: Box<dyn Write + Send>, min_level: Level) -> Self {
        JsonWriterSink {
            min_level,
            writer: Arc::new(Mutex::new(writer)),
            fields: Vec::new(),
        }
    }

    /// Line-per-entry sink on standard output.
    pub fn stdout(min_level: Level) -> Self {
        JsonWriterSink::new(Box::new(std::io::stdout()), min_level)
    }
}

impl EntrySink for JsonWriterSink {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn EntrySink> {
        let mut all = self.fields.clone();
        all.extend(fields);
        Arc::new(JsonWriterSink {
            min_level: self.min_level,
            writer: Arc::clone(&self.writer),
            fields: all,
        })
    }

    fn write(
        &self,
        record: &LogRecord,
        fields: Vec<Field>,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut map = serde_json::Map::new();
        for field in self.fields.iter().chain(fields.iter()) {
            if let Some(value) = normalize(field) {
                map.insert(field.key.clone(), serde_json::to_value(&value)?);
            }
        }
        map.insert(
            "timestamp".to_string(),
            record.timestamp.to_rfc3339().into(),
        );
        map.insert("level".to_string(), record.level.as_str().into());
        map.insert("message".to_string(), record.message.clone().into());

        let line = serde_json::to_string(&serde_json::Value::Object(map))?;
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn sync(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let buf = SharedBuf::default();
        let sink = JsonWriterSink::new(Box::new(buf.clone()), Level::Debug);
        let scoped = sink.with(vec![Field::str("user", "x")]);

        let record = LogRecord::new(Level::Info, "hello");
        scoped
            .write(&record, vec![Field::i64("status", 200)])
            .unwrap();

        let bytes = buf.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed["user"], "x");
        assert_eq!(parsed["status"], 200);
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["message"], "hello");
    }

    #[test]
    fn level_gate_follows_min_level() {
        let sink = JsonWriterSink::new(Box::new(std::io::sink()), Level::Warn);
        assert!(!sink.enabled(Level::Info));
        assert!(sink.enabled(Level::Error));
    }

    #[test]
    fn record_keys_win_over_field_keys() {
        let buf = SharedBuf::default();
        let sink = JsonWriterSink::new(Box::new(buf.clone()), Level::Debug);

        let record = LogRecord::new(Level::Info, "real message");
        sink.write(&record, vec![Field::str("message", "impostor")])
            .unwrap();

        let bytes = buf.0.lock().unwrap().clone();
        let parsed: serde_json::Value =
            serde_json::from_str(String::from_utf8(bytes).unwrap().trim_end()).unwrap();
        assert_eq!(parsed["message"], "real message");
    }
}
