use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use structured_log_driver::core::DriverConfig;
use structured_log_driver::http_remote::{HttpRemoteClient, HttpRemoteConfig};
use structured_log_driver::init::{init_tracing_with_config, InitConfig};
use structured_log_driver::level::Level;

#[tokio::main]
async fn main() {
    let config = HttpRemoteConfig::new("http://127.0.0.1:8080/ingest");
    let (remote, _handle) = HttpRemoteClient::new(config);

    init_tracing_with_config(
        Arc::new(remote),
        InitConfig {
            driver: DriverConfig {
                report_all_errors: true,
                service_name: "demo-service".to_string(),
            },
            min_level: Level::Debug,
            enable_fmt: false,
        },
    );

    info!(labels.env = "dev", "starting service");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );

    sleep(Duration::from_secs(2)).await;
}
