// Metrics simulator: one random-walk step over the fleet plus status classification.
// Pure with respect to its inputs; all randomness comes through a `RandomSource`.

use chrono::NaiveTime;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::collections::HashMap;

use crate::models::{
    DEFAULT_HISTORY_CAPACITY, MetricPoint, MetricsBlock, ServerRecord, ServerStatus,
};

/// Full width of the per-tick CPU step (uniform in ±5).
pub const CPU_STEP: f64 = 10.0;
/// Full width of the per-tick RAM step (uniform in ±2.5).
pub const RAM_STEP: f64 = 5.0;
pub const NETWORK_IN_STEP: f64 = 50.0;
pub const NETWORK_OUT_STEP: f64 = 100.0;

pub const CRITICAL_CPU_PERCENT: f64 = 90.0;
pub const CRITICAL_RAM_PERCENT: f64 = 95.0;
pub const WARNING_CPU_PERCENT: f64 = 70.0;
pub const WARNING_RAM_PERCENT: f64 = 80.0;

/// CPU level a spike forces.
pub const DEFAULT_SPIKE_CPU_PERCENT: f64 = 95.0;
pub const DEFAULT_SPIKE_NODE: &str = "proxy-3";
pub const DEFAULT_SPIKE_PROBABILITY: f64 = 0.2;

const LOAD_DIVISOR: f64 = 20.0;
const HISTORY_TIME_FORMAT: &str = "%H:%M:%S";

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Uniform sample centred on zero: `(U - 0.5) * span`.
    fn centered(&mut self, span: f64) -> f64 {
        (self.next_unit() - 0.5) * span
    }

    /// Uniform integer in `0..n` (0 when `n == 0`).
    fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        ((self.next_unit() * f64::from(n)) as u32).min(n - 1)
    }
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

impl RngSource<Pcg64> {
    pub fn seeded(seed: u64) -> Self {
        Self(Pcg64::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self(Pcg64::from_os_rng())
    }
}

/// Forced CPU spike for one node: each tick, with `probability`, cpu := `cpu_percent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeRule {
    pub probability: f64,
    pub cpu_percent: f64,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub history_capacity: usize,
    /// Spike rules keyed by node id.
    pub spikes: HashMap<String, SpikeRule>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let spikes = HashMap::from([(
            DEFAULT_SPIKE_NODE.to_string(),
            SpikeRule {
                probability: DEFAULT_SPIKE_PROBABILITY,
                cpu_percent: DEFAULT_SPIKE_CPU_PERCENT,
            },
        )]);
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            spikes,
        }
    }
}

impl SimConfig {
    /// No spike rules; every node follows the plain random walk.
    pub fn without_spikes() -> Self {
        Self {
            spikes: HashMap::new(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimConfig,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Produces the fleet one tick later. `current` is left untouched; the result has the
    /// same length, ids and order.
    ///
    /// Draw order per record: cpu, ram, spike roll (only for nodes with a rule), network in,
    /// network out.
    pub fn advance<R: RandomSource + ?Sized>(
        &self,
        current: &[ServerRecord],
        now: NaiveTime,
        rng: &mut R,
    ) -> Vec<ServerRecord> {
        let label = now.format(HISTORY_TIME_FORMAT).to_string();
        current
            .iter()
            .map(|server| self.advance_one(server, &label, rng))
            .collect()
    }

    fn advance_one<R: RandomSource + ?Sized>(
        &self,
        server: &ServerRecord,
        label: &str,
        rng: &mut R,
    ) -> ServerRecord {
        let prev = &server.metrics;

        let mut cpu = clamp_percent(prev.cpu + rng.centered(CPU_STEP));
        let ram = clamp_percent(prev.ram + rng.centered(RAM_STEP));
        if let Some(rule) = self.config.spikes.get(&server.id)
            && rng.next_unit() < rule.probability
        {
            cpu = clamp_percent(rule.cpu_percent);
        }
        let network_in = (prev.network_in + rng.centered(NETWORK_IN_STEP)).max(0.0);
        let network_out = (prev.network_out + rng.centered(NETWORK_OUT_STEP)).max(0.0);

        // Shift register: 5m takes the old 1m, 15m takes the old 5m.
        let load_avg = [
            round_to(cpu / LOAD_DIVISOR, 2),
            round_to(prev.load_avg[0], 2),
            round_to(prev.load_avg[1], 2),
        ];

        let capacity = self.config.history_capacity;
        let mut history = prev.history.clone();
        history.push_cpu(MetricPoint::new(label, cpu.round()), capacity);
        history.push_ram(MetricPoint::new(label, ram.round()), capacity);

        // Classified before display rounding.
        let status = classify_status(cpu, ram);

        ServerRecord {
            id: server.id.clone(),
            name: server.name.clone(),
            address: server.address.clone(),
            kind: server.kind,
            status,
            metrics: MetricsBlock {
                cpu: round_to(cpu, 1),
                ram: round_to(ram, 1),
                disk: clamp_percent(prev.disk),
                load_avg,
                network_in: round_to(network_in, 1),
                network_out: round_to(network_out, 1),
                history,
            },
            uptime: server.uptime.clone(),
        }
    }
}

/// First match wins: critical, then warning, else online.
pub fn classify_status(cpu: f64, ram: f64) -> ServerStatus {
    if cpu > CRITICAL_CPU_PERCENT || ram > CRITICAL_RAM_PERCENT {
        ServerStatus::Critical
    } else if cpu > WARNING_CPU_PERCENT || ram > WARNING_RAM_PERCENT {
        ServerStatus::Warning
    } else {
        ServerStatus::Online
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
