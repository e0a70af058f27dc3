// Static node registry: the fixed set of monitored identities, seeded once at startup.

use crate::models::{MetricsBlock, ServerKind, ServerRecord, ServerStatus};
use crate::simulator::RandomSource;

/// All main nodes share one host.
pub const MAIN_ADDRESS: &str = "57.129.46.103";

/// Proxy hosts in order; proxy `n` (1-based) is `PROXY_ADDRESSES[n - 1]`.
pub const PROXY_ADDRESSES: [&str; 12] = [
    "144.217.165.108",
    "151.80.145.125",
    "151.80.144.116",
    "57.131.25.192",
    "57.131.25.193",
    "57.129.112.17",
    "57.129.112.19",
    "57.129.112.18",
    "57.129.112.20",
    "54.36.181.10",
    "51.38.64.164",
    "192.99.168.190",
];

pub const DOMAIN: &str = "monoklix.com";

/// Upper bounds (exclusive) for the randomly drawn proxy uptime label.
const PROXY_UPTIME_MAX_DAYS: u32 = 30;
const PROXY_UPTIME_MAX_HOURS: u32 = 24;

struct MainSeed {
    id: &'static str,
    host: &'static str,
    uptime: &'static str,
    cpu: f64,
    ram: f64,
    disk: f64,
    load_avg: [f64; 3],
    network_in: f64,
    network_out: f64,
}

const MAIN_SEEDS: [MainSeed; 3] = [
    MainSeed {
        id: "main-01",
        host: "app",
        uptime: "14d 2h",
        cpu: 45.0,
        ram: 60.0,
        disk: 30.0,
        load_avg: [0.45, 0.50, 0.40],
        network_in: 120.0,
        network_out: 450.0,
    },
    MainSeed {
        id: "main-02",
        host: "veox",
        uptime: "45d 12h",
        cpu: 25.0,
        ram: 40.0,
        disk: 20.0,
        load_avg: [0.20, 0.25, 0.22],
        network_in: 80.0,
        network_out: 200.0,
    },
    MainSeed {
        id: "main-03",
        host: "gemx",
        uptime: "5d 1h",
        cpu: 10.0,
        ram: 35.0,
        disk: 15.0,
        load_avg: [0.10, 0.12, 0.09],
        network_in: 50.0,
        network_out: 100.0,
    },
];

pub const MAIN_NODE_COUNT: usize = MAIN_SEEDS.len();
pub const PROXY_NODE_COUNT: usize = PROXY_ADDRESSES.len();
pub const NODE_COUNT: usize = MAIN_NODE_COUNT + PROXY_NODE_COUNT;

pub fn proxy_id(n: usize) -> String {
    format!("proxy-{n}")
}

pub fn proxy_name(n: usize) -> String {
    format!("s{n}.{DOMAIN}")
}

/// Every id the registry will seed, in fleet order.
pub fn node_ids() -> Vec<String> {
    MAIN_SEEDS
        .iter()
        .map(|s| s.id.to_string())
        .chain((1..=PROXY_NODE_COUNT).map(proxy_id))
        .collect()
}

pub fn is_known_id(id: &str) -> bool {
    node_ids().iter().any(|known| known == id)
}

/// Builds the initial fleet: main nodes first, then proxies `s1..s12` with zeroed metrics.
/// Proxy uptime labels are drawn from `rng`.
pub fn seed_fleet<R: RandomSource + ?Sized>(rng: &mut R) -> Vec<ServerRecord> {
    let mains = MAIN_SEEDS.iter().map(|seed| ServerRecord {
        id: seed.id.to_string(),
        name: format!("{}.{DOMAIN}", seed.host),
        address: MAIN_ADDRESS.to_string(),
        kind: ServerKind::Main,
        status: ServerStatus::Online,
        metrics: MetricsBlock::new(
            seed.cpu,
            seed.ram,
            seed.disk,
            seed.load_avg,
            seed.network_in,
            seed.network_out,
        ),
        uptime: seed.uptime.to_string(),
    });
    let mut fleet: Vec<ServerRecord> = mains.collect();

    for (i, address) in PROXY_ADDRESSES.iter().enumerate() {
        let n = i + 1;
        let days = rng.below(PROXY_UPTIME_MAX_DAYS);
        let hours = rng.below(PROXY_UPTIME_MAX_HOURS);
        fleet.push(ServerRecord {
            id: proxy_id(n),
            name: proxy_name(n),
            address: address.to_string(),
            kind: ServerKind::Proxy,
            status: ServerStatus::Online,
            metrics: MetricsBlock::zeroed(),
            uptime: format!("{days}d {hours}h"),
        });
    }
    fleet
}
