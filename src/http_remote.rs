use crate::remote::{RemoteClient, RemoteEntry};
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Send attempts per batch before it is dropped.
const MAX_SEND_ATTEMPTS: u32 = 3;

/// Configuration for [`HttpRemoteClient`].
#[derive(Clone, Debug)]
pub struct HttpRemoteConfig {
    /// Full ingestion endpoint, e.g. "http://127.0.0.1:8080/ingest".
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Maximum queued entries before `log` starts dropping new ones.
    pub buffer: usize,
    /// Entries per HTTP request.
    pub batch_size: usize,
    /// Maximum interval between sends even with a partial batch.
    pub flush_interval: Duration,
}

impl HttpRemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        HttpRemoteConfig {
            url: url.into(),
            user: None,
            password: None,
            buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
        }
    }
}

/// Wire seam of the remote client; lets tests exercise batching without a
/// network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, batch: &[RemoteEntry]) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// HTTP transport posting each batch as one JSON array.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &HttpRemoteConfig) -> Self {
        let mut query = String::new();
        if let Some(user) = &config.user {
            query.push_str(&format!("user={}", urlencoding::encode(user)));
        }
        if let Some(password) = &config.password {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&format!("password={}", urlencoding::encode(password)));
        }

        let endpoint = if query.is_empty() {
            config.url.clone()
        } else {
            format!("{}?{}", config.url, query)
        };

        HttpTransport {
            client: Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &[RemoteEntry]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let resp = self.client.post(&self.endpoint).json(batch).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("remote ingestion failed with status {}: {}", status, text).into())
        }
    }
}

enum Command {
    Entry(RemoteEntry),
    Flush(std::sync::mpsc::Sender<()>),
}

/// Error surfaced by [`HttpRemoteClient::flush`].
#[derive(thiserror::Error, Debug)]
pub enum FlushError {
    #[error("remote log queue is full or closed")]
    QueueFull,

    #[error("remote flush did not complete in time")]
    TimedOut,
}

/// [`RemoteClient`] that queues entries into a bounded channel and ships
/// them from a background task in batches.
///
/// `log` never blocks: when the queue is full the entry is dropped and
/// counted. Must be constructed inside a tokio runtime.
pub struct HttpRemoteClient {
    sender: mpsc::Sender<Command>,
    /// Entries accepted by the background task.
    pub enqueued_entries: Arc<AtomicU64>,
    /// Entries dropped because the queue was full.
    pub dropped_entries: Arc<AtomicU64>,
    flush_timeout: Duration,
}

impl HttpRemoteClient {
    pub fn new(config: HttpRemoteConfig) -> (Self, JoinHandle<()>) {
        let transport = Arc::new(HttpTransport::new(&config));
        HttpRemoteClient::with_transport(transport, config)
    }

    /// Spawn the batching task against an explicit transport.
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        config: HttpRemoteConfig,
    ) -> (Self, JoinHandle<()>) {
        let buffer = config.buffer.max(16);
        let batch_size = config.batch_size.max(1);
        let flush_interval = if config.flush_interval < Duration::from_millis(10) {
            Duration::from_millis(10)
        } else {
            config.flush_interval
        };

        let (tx, mut rx) = mpsc::channel::<Command>(buffer);

        let enqueued_entries = Arc::new(AtomicU64::new(0));
        let dropped_entries = Arc::new(AtomicU64::new(0));
        let enqueued_bg = Arc::clone(&enqueued_entries);

        let handle = tokio::spawn(async move {
            let mut batch: Vec<RemoteEntry> = Vec::with_capacity(batch_size);

            loop {
                tokio::select! {
                    cmd = rx.recv() => match cmd {
                        Some(Command::Entry(entry)) => {
                            batch.push(entry);
                            enqueued_bg.fetch_add(1, Ordering::Relaxed);
                            if batch.len() >= batch_size {
                                send_batch(&*transport, &mut batch).await;
                            }
                        }
                        Some(Command::Flush(ack)) => {
                            if !batch.is_empty() {
                                send_batch(&*transport, &mut batch).await;
                            }
                            let _ = ack.send(());
                        }
                        // Channel closed: drain and stop.
                        None => {
                            if !batch.is_empty() {
                                send_batch(&*transport, &mut batch).await;
                            }
                            break;
                        }
                    },
                    _ = sleep(flush_interval) => {
                        if !batch.is_empty() {
                            send_batch(&*transport, &mut batch).await;
                        }
                    }
                }
            }
        });

        (
            HttpRemoteClient {
                sender: tx,
                enqueued_entries,
                dropped_entries,
                flush_timeout: Duration::from_secs(5),
            },
            handle,
        )
    }
}

async fn send_batch(transport: &dyn Transport, batch: &mut Vec<RemoteEntry>) {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(10);

    for attempt in 1..=MAX_SEND_ATTEMPTS {
        match transport.send(batch).await {
            Ok(()) => {
                batch.clear();
                return;
            }
            Err(e) if attempt == MAX_SEND_ATTEMPTS => {
                eprintln!(
                    "dropping batch of {} log entries after {} attempts: {}",
                    batch.len(),
                    attempt,
                    e
                );
                batch.clear();
                return;
            }
            Err(e) => {
                eprintln!("remote log send failed, retrying in {:?}: {}", backoff, e);
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
        }
    }
}

impl RemoteClient for HttpRemoteClient {
    fn log(&self, entry: RemoteEntry) {
        if self.sender.try_send(Command::Entry(entry)).is_err() {
            self.dropped_entries.fetch_add(1, Ordering::Relaxed);
            eprintln!("remote log queue full, dropping entry");
        }
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        self.sender
            .try_send(Command::Flush(ack_tx))
            .map_err(|_| FlushError::QueueFull)?;
        ack_rx
            .recv_timeout(self.flush_timeout)
            .map_err(|_| FlushError::TimedOut)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Severity;
    use chrono::Utc;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    fn entry(n: u64) -> RemoteEntry {
        let mut labels = HashMap::new();
        labels.insert("n".to_string(), n.to_string());
        RemoteEntry {
            timestamp: Utc::now(),
            severity: Severity::Info,
            payload: BTreeMap::new(),
            labels,
            source_location: None,
            insert_id: String::new(),
            http_request: None,
            operation: None,
            log_name: String::new(),
            resource: None,
            trace: String::new(),
            span_id: String::new(),
            trace_sampled: false,
        }
    }

    struct MockTransport {
        batches: Arc<Mutex<Vec<usize>>>,
        failures_left: Arc<AtomicU64>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, batch: &[RemoteEntry]) -> Result<(), Box<dyn Error + Send + Sync>> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err("transient".into());
            }
            self.batches.lock().unwrap().push(batch.len());
            Ok(())
        }
    }

    fn mock(failures: u64) -> (Arc<MockTransport>, Arc<Mutex<Vec<usize>>>) {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(MockTransport {
            batches: Arc::clone(&batches),
            failures_left: Arc::new(AtomicU64::new(failures)),
        });
        (transport, batches)
    }

    fn config() -> HttpRemoteConfig {
        let mut config = HttpRemoteConfig::new("http://127.0.0.1:9/unused");
        config.batch_size = 3;
        config.flush_interval = Duration::from_secs(60);
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn full_batch_is_sent_without_flush() {
        let (transport, batches) = mock(0);
        let (client, _handle) = HttpRemoteClient::with_transport(transport, config());

        for n in 0..3 {
            client.log(entry(n));
        }

        for _ in 0..100 {
            if !batches.lock().unwrap().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*batches.lock().unwrap(), vec![3]);
        assert_eq!(client.enqueued_entries.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn flush_delivers_a_partial_batch() {
        let (transport, batches) = mock(0);
        let (client, _handle) = HttpRemoteClient::with_transport(transport, config());

        client.log(entry(1));
        client.log(entry(2));

        let client = Arc::new(client);
        let flusher = Arc::clone(&client);
        tokio::task::spawn_blocking(move || flusher.flush())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(*batches.lock().unwrap(), vec![2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn transient_failures_are_retried_with_backoff() {
        let (transport, batches) = mock(1);
        let (client, _handle) = HttpRemoteClient::with_transport(transport, config());

        for n in 0..3 {
            client.log(entry(n));
        }

        for _ in 0..200 {
            if !batches.lock().unwrap().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*batches.lock().unwrap(), vec![3]);
    }

    #[test]
    fn endpoint_carries_credentials_when_configured() {
        let mut config = config();
        config.user = Some("svc account".to_string());
        config.password = Some("p@ss".to_string());
        let transport = HttpTransport::new(&config);
        assert_eq!(
            transport.endpoint,
            "http://127.0.0.1:9/unused?user=svc%20account&password=p%40ss"
        );
    }
}
