// Server identity, status tier and per-node metrics block

use serde::{Deserialize, Serialize};

use super::MetricHistory;

/// Port the operator console listens on for every node.
pub const OPERATOR_PORT: u16 = 3000;

/// Node role; fixed when the registry is seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerKind {
    Main,
    Proxy,
    Fallback,
}

/// Status tier derived from the latest metrics. `Offline` is never produced by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    Online,
    Warning,
    Critical,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBlock {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    /// 1m, 5m, 15m.
    pub load_avg: [f64; 3],
    pub network_in: f64,
    pub network_out: f64,
    #[serde(default)]
    pub history: MetricHistory,
}

impl MetricsBlock {
    pub fn new(
        cpu: f64,
        ram: f64,
        disk: f64,
        load_avg: [f64; 3],
        network_in: f64,
        network_out: f64,
    ) -> Self {
        Self {
            cpu,
            ram,
            disk,
            load_avg,
            network_in,
            network_out,
            history: MetricHistory::default(),
        }
    }

    pub fn zeroed() -> Self {
        Self::new(0.0, 0.0, 0.0, [0.0; 3], 0.0, 0.0)
    }
}

/// One monitored node. `id` and `kind` never change after seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "ip")]
    pub address: String,
    #[serde(rename = "type")]
    pub kind: ServerKind,
    pub status: ServerStatus,
    pub metrics: MetricsBlock,
    pub uptime: String,
}

impl ServerRecord {
    /// Console link for a human operator; never fetched by the service itself.
    pub fn operator_url(&self) -> String {
        format!("http://{}:{}/", self.address, OPERATOR_PORT)
    }
}
