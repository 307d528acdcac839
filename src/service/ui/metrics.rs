//! Page hit counters, exported in the Prometheus text format on `/metrics`
use anyhow::Result;
use prometheus::Encoder;
use prometheus_metric_storage::StorageRegistry;
use std::sync::OnceLock;

static REGISTRY: OnceLock<StorageRegistry> = OnceLock::new();

fn storage_registry() -> &'static StorageRegistry {
    REGISTRY.get_or_init(StorageRegistry::default)
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "auction")]
pub struct Metrics {
    /// Counter for hits on index page.
    pub index_total: prometheus::IntCounter,

    /// Counter for hits on item page.
    #[metric(labels("item", "method"))]
    pub item_total: prometheus::IntCounterVec,

    /// Counter for hits on admin page.
    pub admin_total: prometheus::IntCounter,
}

impl Metrics {
    pub fn get() -> Result<&'static Self> {
        Ok(Self::instance(storage_registry())?)
    }
}

pub fn encode() -> Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&storage_registry().registry().gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
