// Prompt assembly: instructional preamble + pretty JSON digest of the fleet

use crate::models::{MetricsDigest, ServerKind, ServerRecord};

pub fn digest(servers: &[ServerRecord]) -> Vec<MetricsDigest> {
    servers.iter().map(MetricsDigest::from).collect()
}

/// Preamble describing the fleet layout and what the report should contain.
pub fn preamble(servers: &[ServerRecord]) -> String {
    let names_of = |kind: ServerKind| -> Vec<&str> {
        servers
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.name.split('.').next().unwrap_or(s.name.as_str()))
            .collect()
    };
    let main = names_of(ServerKind::Main);
    let proxy = names_of(ServerKind::Proxy);
    format!(
        "You are a Senior DevOps Engineer analyzing the Monoklix Server Infrastructure.\n\
         Infrastructure:\n\
         - Main Nodes: {} ({})\n\
         - Proxy Nodes: {} ({})\n\
         \n\
         Analyze the provided JSON metrics. Look for high load, anomalies, or network bottlenecks.\n\
         Provide a concise, bulleted health report and 2 actionable recommendations.\n\
         Keep it professional and technical.",
        main.len(),
        main.join(", "),
        proxy.len(),
        proxy.join(", "),
    )
}

pub fn build_prompt(servers: &[ServerRecord]) -> Result<String, serde_json::Error> {
    let snapshot = serde_json::to_string_pretty(&digest(servers))?;
    Ok(format!(
        "System Context: {}\n\nCurrent Metrics Snapshot:\n{}",
        preamble(servers),
        snapshot
    ))
}
