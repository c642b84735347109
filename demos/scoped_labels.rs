use std::sync::Arc;
use tracing::{info, info_span};

use structured_log_driver::core::{DriverConfig, DriverCore};
use structured_log_driver::init::{init_tracing_with_config, InitConfig};
use structured_log_driver::labels::label;
use structured_log_driver::level::Level;
use structured_log_driver::noop::NoopRemote;
use structured_log_driver::record::LogRecord;
use structured_log_driver::sink::EntrySink;

fn main() {
    init_tracing_with_config(
        Arc::new(NoopRemote),
        InitConfig {
            driver: DriverConfig::default(),
            min_level: Level::Debug,
            enable_fmt: false,
        },
    );

    // Through tracing: span fields become permanent labels of the scope.
    let span = info_span!("request", labels.env = "prod", user = "x");
    let _guard = span.enter();
    info!(labels.request_id = "42", status = 200, "handled request");

    // The core can also be driven directly, without tracing.
    let sink = structured_log_driver::json_sink::JsonWriterSink::stdout(Level::Debug);
    let core = DriverCore::new(Arc::new(sink), Arc::new(NoopRemote), DriverConfig::default());
    let scope = core.with(vec![label("env", "prod")]);
    let record = LogRecord::new(Level::Info, "direct write");
    scope
        .write(&record, vec![label("request_id", "43")])
        .expect("stdout write");
}
