// Domain models (fleet records, metric history, diagnostics outcome)

mod analysis;
mod fleet;
mod metric;
mod server;

pub use analysis::{AnalysisResult, AnalysisStatus, MetricsDigest};
pub use fleet::{FleetSnapshot, FleetSummary, unix_millis};
pub use metric::{DEFAULT_HISTORY_CAPACITY, MetricHistory, MetricPoint, push_bounded};
pub use server::{MetricsBlock, OPERATOR_PORT, ServerKind, ServerRecord, ServerStatus};
