/// Environment variable names used by this crate for convenient
/// configuration from microservices.
///
/// These are purely helpers; the core types remain decoupled from
/// environment access.

/// Remote ingestion endpoint, e.g. `http://127.0.0.1:8080/ingest`.
pub const LOG_DRIVER_REMOTE_URL_ENV: &str = "LOG_DRIVER_REMOTE_URL";

/// Optional ingestion user name.
pub const LOG_DRIVER_REMOTE_USER_ENV: &str = "LOG_DRIVER_REMOTE_USER";

/// Optional ingestion password.
pub const LOG_DRIVER_REMOTE_PASSWORD_ENV: &str = "LOG_DRIVER_REMOTE_PASSWORD";

/// Logical service name attached as service context.
pub const LOG_DRIVER_SERVICE_NAME_ENV: &str = "LOG_DRIVER_SERVICE_NAME";

/// Set to `1`/`true` to attach error reports to error-level entries.
pub const LOG_DRIVER_REPORT_ERRORS_ENV: &str = "LOG_DRIVER_REPORT_ERRORS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
