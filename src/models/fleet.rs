// Fleet snapshot (one published tick) and its status summary

use serde::{Deserialize, Serialize};

use super::{ServerKind, ServerRecord, ServerStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSnapshot {
    /// Number of simulator steps applied since seeding.
    pub tick: u64,
    /// Unix millis of the last sync.
    pub updated_at: u64,
    pub servers: Vec<ServerRecord>,
}

impl FleetSnapshot {
    /// Tick-zero snapshot for a freshly seeded fleet.
    pub fn initial(servers: Vec<ServerRecord>) -> Self {
        Self {
            tick: 0,
            updated_at: unix_millis(),
            servers,
        }
    }

    pub fn find(&self, id: &str) -> Option<&ServerRecord> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn by_kind(&self, kind: ServerKind) -> impl Iterator<Item = &ServerRecord> {
        self.servers.iter().filter(move |s| s.kind == kind)
    }

    pub fn summary(&self) -> FleetSummary {
        let mut summary = FleetSummary {
            tick: self.tick,
            total: self.servers.len(),
            ..FleetSummary::default()
        };
        for server in &self.servers {
            match server.status {
                ServerStatus::Online => summary.online += 1,
                ServerStatus::Warning => summary.warning += 1,
                ServerStatus::Critical => summary.critical += 1,
                ServerStatus::Offline => summary.offline += 1,
            }
            match server.kind {
                ServerKind::Main => summary.main += 1,
                ServerKind::Proxy => summary.proxy += 1,
                ServerKind::Fallback => summary.fallback += 1,
            }
        }
        summary.all_optimal = summary.critical == 0;
        summary
    }
}

/// Counts per status tier and node role; `all_optimal` is false while any node is critical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub tick: u64,
    pub total: usize,
    pub online: usize,
    pub warning: usize,
    pub critical: usize,
    pub offline: usize,
    pub main: usize,
    pub proxy: usize,
    pub fallback: usize,
    pub all_optimal: bool,
}

pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
