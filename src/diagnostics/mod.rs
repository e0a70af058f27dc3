// Diagnostics requester: one-at-a-time gate around an external report generator.
// Status moves idle -> analyzing -> complete | error; a missing credential goes straight to error.

mod client;
mod error;
mod prompt;

pub use client::GeminiClient;
pub use error::DiagnosticsError;
pub use prompt::{build_prompt, digest, preamble};

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

use crate::models::{AnalysisResult, ServerRecord};

/// Single-method request/response capability that turns a prompt into report text.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Cheap precheck run before any request (e.g. credential present).
    fn ensure_configured(&self) -> Result<(), DiagnosticsError> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, DiagnosticsError>;
}

/// Clears the in-flight flag on drop, including when the task running the call panics.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DiagnosticsRequester {
    generator: Arc<dyn ReportGenerator>,
    in_flight: Arc<AtomicBool>,
    state: watch::Sender<AnalysisResult>,
}

impl DiagnosticsRequester {
    pub fn new(generator: Arc<dyn ReportGenerator>) -> Self {
        let (state, _) = watch::channel(AnalysisResult::idle());
        Self {
            generator,
            in_flight: Arc::new(AtomicBool::new(false)),
            state,
        }
    }

    pub fn current(&self) -> AnalysisResult {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisResult> {
        self.state.subscribe()
    }

    pub fn is_analyzing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn claim(&self) -> Result<InFlight, DiagnosticsError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(self.in_flight.clone()))
            .map_err(|_| DiagnosticsError::Busy)
    }

    fn publish(&self, result: AnalysisResult) -> AnalysisResult {
        self.state.send_replace(result.clone());
        result
    }

    /// Precheck + prompt build. On failure the error outcome is already published.
    fn prepare(&self, servers: &[ServerRecord]) -> Result<String, AnalysisResult> {
        if let Err(e) = self.generator.ensure_configured() {
            tracing::warn!(error = %e, operation = "diagnostics", "diagnostics not configured");
            return Err(self.publish(AnalysisResult::error(e.to_string())));
        }
        let prompt = build_prompt(servers).map_err(|e| {
            tracing::warn!(error = %e, operation = "build_prompt", "failed to build prompt");
            self.publish(AnalysisResult::error(
                DiagnosticsError::from(e).to_string(),
            ))
        })?;
        self.publish(AnalysisResult::analyzing());
        Ok(prompt)
    }

    async fn finish(&self, prompt: &str) -> AnalysisResult {
        let result = match self.generator.generate(prompt).await {
            Ok(report) => AnalysisResult::complete(report),
            Err(e) => {
                tracing::warn!(error = %e, operation = "generate_report", "diagnostics failed");
                AnalysisResult::error(format!("Failed to generate analysis: {e}"))
            }
        };
        self.publish(result)
    }

    /// Runs one analysis to completion. Rejects with `Busy` (and makes no call) while another
    /// is in flight.
    pub async fn run(&self, servers: &[ServerRecord]) -> Result<AnalysisResult, DiagnosticsError> {
        let _in_flight = self.claim()?;
        match self.prepare(servers) {
            Ok(prompt) => Ok(self.finish(&prompt).await),
            Err(result) => Ok(result),
        }
    }

    /// Like `run`, but the external call proceeds on a spawned task. Returns the immediate
    /// outcome: `analyzing`, or `error` when the precheck fails.
    pub fn start(
        self: &Arc<Self>,
        servers: &[ServerRecord],
    ) -> Result<AnalysisResult, DiagnosticsError> {
        let in_flight = self.claim()?;
        let prompt = match self.prepare(servers) {
            Ok(prompt) => prompt,
            Err(result) => return Ok(result),
        };
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _in_flight = in_flight;
            this.finish(&prompt).await;
        });
        Ok(AnalysisResult::analyzing())
    }
}
