use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::models::DEFAULT_HISTORY_CAPACITY;
use crate::registry;
use crate::simulator::{
    DEFAULT_SPIKE_CPU_PERCENT, DEFAULT_SPIKE_NODE, DEFAULT_SPIKE_PROBABILITY, SimConfig, SpikeRule,
};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Fixed RNG seed for reproducible runs; drawn from the OS when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Omitted = the stock demo spike; `spikes = []` disables spikes entirely.
    #[serde(default = "default_spikes")]
    pub spikes: Vec<SpikeConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            history_capacity: default_history_capacity(),
            seed: None,
            spikes: default_spikes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpikeConfig {
    pub node_id: String,
    pub probability: f64,
    #[serde(default = "default_spike_cpu_percent")]
    pub cpu_percent: f64,
}

fn default_tick_interval_ms() -> u64 {
    3000
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_spike_cpu_percent() -> f64 {
    DEFAULT_SPIKE_CPU_PERCENT
}

fn default_spikes() -> Vec<SpikeConfig> {
    vec![SpikeConfig {
        node_id: DEFAULT_SPIKE_NODE.to_string(),
        probability: DEFAULT_SPIKE_PROBABILITY,
        cpu_percent: DEFAULT_SPIKE_CPU_PERCENT,
    }]
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sim_config(&self) -> SimConfig {
        let spikes: HashMap<String, SpikeRule> = self
            .spikes
            .iter()
            .map(|s| {
                (
                    s.node_id.clone(),
                    SpikeRule {
                        probability: s.probability,
                        cpu_percent: s.cpu_percent,
                    },
                )
            })
            .collect();
        SimConfig {
            history_capacity: self.history_capacity,
            spikes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of fleet snapshots buffered for /ws/fleet (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    16
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log fleet stats (tick, critical/warning counts, ws clients) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_api_key_env() -> String {
    "API_KEY".into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.simulation.tick_interval_ms > 0,
            "simulation.tick_interval_ms must be > 0, got {}",
            self.simulation.tick_interval_ms
        );
        anyhow::ensure!(
            self.simulation.history_capacity > 0,
            "simulation.history_capacity must be > 0, got {}",
            self.simulation.history_capacity
        );
        let mut seen = HashSet::new();
        for spike in &self.simulation.spikes {
            anyhow::ensure!(
                registry::is_known_id(&spike.node_id),
                "simulation.spikes.node_id {:?} is not a registered node",
                spike.node_id
            );
            anyhow::ensure!(
                seen.insert(spike.node_id.as_str()),
                "simulation.spikes.node_id {:?} listed more than once",
                spike.node_id
            );
            anyhow::ensure!(
                (0.0..=1.0).contains(&spike.probability),
                "simulation.spikes.probability must be within [0, 1], got {}",
                spike.probability
            );
            anyhow::ensure!(
                (0.0..=100.0).contains(&spike.cpu_percent),
                "simulation.spikes.cpu_percent must be within [0, 100], got {}",
                spike.cpu_percent
            );
        }
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.diagnostics.endpoint.starts_with("http://")
                || self.diagnostics.endpoint.starts_with("https://"),
            "diagnostics.endpoint must be an http(s) URL, got {:?}",
            self.diagnostics.endpoint
        );
        anyhow::ensure!(
            !self.diagnostics.model.is_empty(),
            "diagnostics.model must be non-empty"
        );
        anyhow::ensure!(
            !self.diagnostics.api_key_env.is_empty(),
            "diagnostics.api_key_env must be non-empty"
        );
        anyhow::ensure!(
            self.diagnostics.timeout_secs > 0,
            "diagnostics.timeout_secs must be > 0, got {}",
            self.diagnostics.timeout_secs
        );
        Ok(())
    }
}
