use crate::core::{DriverConfig, DriverCore};
use crate::json_sink::JsonWriterSink;
use crate::layer::DriverLayer;
use crate::level::Level;
use crate::remote::RemoteClient;
use crate::sink::EntrySink;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration for the global-subscriber installation helpers.
///
/// **Fields**
/// - `driver`: enrichment behavior ([`DriverConfig`]).
/// - `min_level`: lowest level the local JSON sink accepts.
/// - `enable_fmt`: if `true`, a `tracing_subscriber::fmt` layer is added
///   on top so entries also show up human-readably on the console.
#[derive(Clone, Debug)]
pub struct InitConfig {
    pub driver: DriverConfig,
    pub min_level: Level,
    pub enable_fmt: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            driver: DriverConfig::default(),
            min_level: Level::Info,
            enable_fmt: false,
        }
    }
}

/// Install the enrichment stack as the global `tracing` subscriber.
///
/// Builds a stdout JSON sink, wraps it in a [`DriverCore`] against the
/// provided remote client and registers a [`DriverLayer`] over it, so
/// every `tracing` event in the process flows through the enrichment
/// pipeline.
pub fn init_tracing_with_config(remote: Arc<dyn RemoteClient>, config: InitConfig) {
    let sink: Arc<dyn EntrySink> = Arc::new(JsonWriterSink::stdout(config.min_level));
    let core = Arc::new(DriverCore::new(sink, remote, config.driver));
    let layer = DriverLayer::new(core);

    if config.enable_fmt {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }
}

/// Install the enrichment stack with default settings.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`InitConfig::default`].
pub fn init_tracing(remote: Arc<dyn RemoteClient>) {
    init_tracing_with_config(remote, InitConfig::default());
}
