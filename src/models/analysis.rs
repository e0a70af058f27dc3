// Diagnostics outcome and the compact per-node digest sent for analysis

use serde::{Deserialize, Serialize};

use super::ServerRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Idle,
    Analyzing,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    /// Report text; empty unless `status` is `Complete`.
    pub report: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn idle() -> Self {
        Self {
            status: AnalysisStatus::Idle,
            report: String::new(),
            error: None,
        }
    }

    pub fn analyzing() -> Self {
        Self {
            status: AnalysisStatus::Analyzing,
            ..Self::idle()
        }
    }

    pub fn complete(report: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Complete,
            report: report.into(),
            error: None,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            report: String::new(),
            error: Some(reason.into()),
        }
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::idle()
    }
}

/// Per-node row of the metrics snapshot handed to the report generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDigest {
    pub name: String,
    pub cpu: f64,
    pub ram: f64,
    /// 1-minute load.
    pub load: f64,
    pub net_in: f64,
    pub net_out: f64,
}

impl From<&ServerRecord> for MetricsDigest {
    fn from(server: &ServerRecord) -> Self {
        let m = &server.metrics;
        Self {
            name: server.name.clone(),
            cpu: m.cpu,
            ram: m.ram,
            load: m.load_avg[0],
            net_in: m.network_in,
            net_out: m.network_out,
        }
    }
}
