use crate::core::DriverConfig;
use crate::field::Field;
use crate::level::Level;
use crate::record::{CallerInfo, LogRecord};
use serde_json::json;

/// Reserved key for the call-site location attached to an entry.
pub const SOURCE_LOCATION_KEY: &str = "sourceLocation";

/// Reserved key for the service identity attached to an entry.
pub const SERVICE_CONTEXT_KEY: &str = "serviceContext";

/// Reserved key for the error-report marker attached to an entry.
pub const ERROR_REPORT_KEY: &str = "context";

/// Reserved payload key carrying the record's message text.
pub const MESSAGE_KEY: &str = "message";

/// Service name used for error reports when none is configured.
const UNKNOWN_SERVICE: &str = "unknown";

pub fn source_location_field(caller: &CallerInfo, synthesized: bool) -> Field {
    Field::object(
        SOURCE_LOCATION_KEY,
        json!({
            "file": caller.file,
            "line": caller.line,
            "function": caller.function.as_deref().unwrap_or(""),
            "synthesized": synthesized,
        }),
    )
}

pub fn service_context_field(name: &str) -> Field {
    Field::object(SERVICE_CONTEXT_KEY, json!({ "service": name }))
}

pub fn error_report_field(caller: &CallerInfo) -> Field {
    Field::object(
        ERROR_REPORT_KEY,
        json!({
            "reportLocation": {
                "filePath": caller.file,
                "lineNumber": caller.line,
                "functionName": caller.function.as_deref().unwrap_or(""),
            }
        }),
    )
}

fn has_key(fields: &[Field], key: &str) -> bool {
    fields.iter().any(|f| f.key == key)
}

/// Append the record's call-site location unless the caller already set
/// one or the record carries none.
pub fn with_source_location(record: &LogRecord, mut fields: Vec<Field>) -> Vec<Field> {
    if has_key(&fields, SOURCE_LOCATION_KEY) {
        return fields;
    }
    if let Some(caller) = &record.caller {
        fields.push(source_location_field(caller, true));
    }
    fields
}

/// Append a service-context field unless the caller already set one.
pub fn with_service_context(name: &str, mut fields: Vec<Field>) -> Vec<Field> {
    if has_key(&fields, SERVICE_CONTEXT_KEY) {
        return fields;
    }
    fields.push(service_context_field(name));
    fields
}

/// Append an error report for the record's call site unless the caller
/// already set one or the record carries no caller info.
pub fn with_error_report(record: &LogRecord, mut fields: Vec<Field>) -> Vec<Field> {
    if has_key(&fields, ERROR_REPORT_KEY) {
        return fields;
    }
    if let Some(caller) = &record.caller {
        fields.push(error_report_field(caller));
    }
    fields
}

/// Apply the three enrichment rules to a finished field set.
///
/// Each rule only inspects keys already present when it runs, so a
/// caller-supplied field always wins over an auto-derived one. The
/// error-report rule requires `report_all_errors`, error level and caller
/// info together; when it applies without a configured service name it
/// also attaches a generic service context so the report stays associated
/// with a service.
pub fn decorate(record: &LogRecord, config: &DriverConfig, mut fields: Vec<Field>) -> Vec<Field> {
    fields = with_source_location(record, fields);

    if !config.service_name.is_empty() {
        fields = with_service_context(&config.service_name, fields);
    }

    if config.report_all_errors && record.level >= Level::Error && record.caller.is_some() {
        fields = with_error_report(record, fields);
        if config.service_name.is_empty() {
            fields = with_service_context(UNKNOWN_SERVICE, fields);
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_record() -> LogRecord {
        LogRecord::new(Level::Error, "boom").with_caller("src/app.rs", 42, None)
    }

    fn count_key(fields: &[Field], key: &str) -> usize {
        fields.iter().filter(|f| f.key == key).count()
    }

    #[test]
    fn decoration_is_idempotent() {
        let config = DriverConfig {
            report_all_errors: true,
            service_name: "api".to_string(),
        };
        let record = error_record();

        let once = decorate(&record, &config, Vec::new());
        let twice = decorate(&record, &config, once.clone());

        assert_eq!(once, twice);
        assert_eq!(count_key(&twice, SOURCE_LOCATION_KEY), 1);
        assert_eq!(count_key(&twice, SERVICE_CONTEXT_KEY), 1);
        assert_eq!(count_key(&twice, ERROR_REPORT_KEY), 1);
    }

    #[test]
    fn caller_supplied_source_location_wins() {
        let config = DriverConfig::default();
        let record = error_record();
        let manual = Field::str(SOURCE_LOCATION_KEY, "handwritten");

        let fields = decorate(&record, &config, vec![manual.clone()]);

        assert_eq!(count_key(&fields, SOURCE_LOCATION_KEY), 1);
        assert!(fields.contains(&manual));
    }

    #[test]
    fn no_source_location_without_caller_info() {
        let config = DriverConfig::default();
        let record = LogRecord::new(Level::Info, "hi");

        let fields = decorate(&record, &config, Vec::new());
        assert_eq!(count_key(&fields, SOURCE_LOCATION_KEY), 0);
    }

    #[test]
    fn error_report_requires_flag_level_and_caller() {
        let on = DriverConfig {
            report_all_errors: true,
            service_name: "api".to_string(),
        };
        let off = DriverConfig {
            report_all_errors: false,
            service_name: "api".to_string(),
        };

        let fields = decorate(&error_record(), &off, Vec::new());
        assert_eq!(count_key(&fields, ERROR_REPORT_KEY), 0);

        let info = LogRecord::new(Level::Info, "fine").with_caller("a.rs", 1, None);
        let fields = decorate(&info, &on, Vec::new());
        assert_eq!(count_key(&fields, ERROR_REPORT_KEY), 0);

        let no_caller = LogRecord::new(Level::Error, "boom");
        let fields = decorate(&no_caller, &on, Vec::new());
        assert_eq!(count_key(&fields, ERROR_REPORT_KEY), 0);

        let fields = decorate(&error_record(), &on, Vec::new());
        assert_eq!(count_key(&fields, ERROR_REPORT_KEY), 1);
    }

    #[test]
    fn error_report_without_service_name_adds_unknown_service() {
        let config = DriverConfig {
            report_all_errors: true,
            service_name: String::new(),
        };

        let fields = decorate(&error_record(), &config, Vec::new());

        assert_eq!(count_key(&fields, ERROR_REPORT_KEY), 1);
        assert_eq!(count_key(&fields, SERVICE_CONTEXT_KEY), 1);
        let svc = fields.iter().find(|f| f.key == SERVICE_CONTEXT_KEY).unwrap();
        assert_eq!(svc, &service_context_field("unknown"));
    }
}
