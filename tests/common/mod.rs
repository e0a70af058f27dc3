// Shared test helpers
#![allow(dead_code)]

use async_trait::async_trait;
use sentinel::diagnostics::{DiagnosticsError, ReportGenerator};
use sentinel::models::*;
use sentinel::simulator::RandomSource;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Plays back fixed unit samples, then 0.5 (a zero step) once exhausted.
pub struct ScriptedSource {
    values: VecDeque<f64>,
}

impl ScriptedSource {
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: values.iter().copied().collect(),
        }
    }

    pub fn neutral() -> Self {
        Self::new(&[])
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(0.5)
    }
}

pub fn record(id: &str, cpu: f64, ram: f64) -> ServerRecord {
    ServerRecord {
        id: id.into(),
        name: format!("{id}.test"),
        address: "10.0.0.1".into(),
        kind: ServerKind::Proxy,
        status: ServerStatus::Online,
        metrics: MetricsBlock::new(cpu, ram, 30.0, [0.0; 3], 100.0, 100.0),
        uptime: "1d 1h".into(),
    }
}

/// Report generator double: counts calls, optionally waits on `release` before answering.
pub struct MockGenerator {
    pub calls: AtomicUsize,
    pub release: Option<Arc<Notify>>,
    pub configured: bool,
    pub fail_with_status: Option<u16>,
    pub report: String,
}

impl MockGenerator {
    pub fn ok(report: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            release: None,
            configured: true,
            fail_with_status: None,
            report: report.into(),
        }
    }

    pub fn gated(report: &str, release: Arc<Notify>) -> Self {
        Self {
            release: Some(release),
            ..Self::ok(report)
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::ok("")
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::ok("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportGenerator for MockGenerator {
    fn ensure_configured(&self) -> Result<(), DiagnosticsError> {
        if self.configured {
            Ok(())
        } else {
            Err(DiagnosticsError::missing_credential("API_KEY"))
        }
    }

    async fn generate(&self, _prompt: &str) -> Result<String, DiagnosticsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            release.notified().await;
        }
        match self.fail_with_status {
            Some(status) => Err(DiagnosticsError::api(status, "upstream failure")),
            None => Ok(self.report.clone()),
        }
    }
}
