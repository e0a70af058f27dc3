// Deployment guide: static setup steps for the Prometheus + Grafana monitoring hub.
// Scrape targets are derived from the registry addresses rather than listed by hand.

use serde::Serialize;

use crate::models::ServerRecord;

/// Node that hosts Prometheus and Grafana.
pub const HUB_NODE_ID: &str = "proxy-12";
pub const NODE_EXPORTER_PORT: u16 = 9100;
pub const PROMETHEUS_PORT: u16 = 9090;
pub const GRAFANA_DASHBOARD_ID: u32 = 1860;
const MONITOR_DIR: &str = "/root/monoklix-monitor";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentGuide {
    pub title: String,
    pub hub: Option<HubInfo>,
    pub steps: Vec<GuideStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubInfo {
    pub id: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideStep {
    pub title: String,
    pub body: Vec<String>,
    pub code_blocks: Vec<CodeBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub label: String,
    pub language: String,
    pub code: String,
}

impl CodeBlock {
    fn new(label: &str, language: &str, code: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            language: language.into(),
            code: code.into(),
        }
    }
}

/// Distinct node addresses in fleet order, as `address:9100`.
pub fn scrape_targets(servers: &[ServerRecord]) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for server in servers {
        let target = format!("{}:{}", server.address, NODE_EXPORTER_PORT);
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}

pub fn prometheus_config(servers: &[ServerRecord]) -> String {
    let mut out = String::from(
        "global:\n  scrape_interval: 15s\n\nscrape_configs:\n  - job_name: 'monoklix_nodes'\n    static_configs:\n      - targets:\n",
    );
    for target in scrape_targets(servers) {
        out.push_str(&format!("        - '{target}'\n"));
    }
    out
}

pub fn deployment_guide(servers: &[ServerRecord]) -> DeploymentGuide {
    let hub = servers.iter().find(|s| s.id == HUB_NODE_ID).map(|s| HubInfo {
        id: s.id.clone(),
        name: s.name.clone(),
        address: s.address.clone(),
    });
    let hub_label = hub
        .as_ref()
        .map(|h| format!("{} ({})", h.name, h.address))
        .unwrap_or_else(|| "the hub node".into());
    let host_count = scrape_targets(servers).len();

    let steps = vec![
        GuideStep {
            title: "Prepare the Prometheus config on the hub".into(),
            body: vec![
                format!("SSH into {hub_label}; it collects metrics from every other node."),
                "Save the scrape config below as prometheus.yml.".into(),
            ],
            code_blocks: vec![
                CodeBlock::new(
                    "SSH command (hub)",
                    "bash",
                    format!("mkdir -p {MONITOR_DIR}\ncd {MONITOR_DIR}\nnano prometheus.yml"),
                ),
                CodeBlock::new("prometheus.yml", "yaml", prometheus_config(servers)),
            ],
        },
        GuideStep {
            title: "Deploy Prometheus and Grafana as panel services".into(),
            body: vec![
                format!(
                    "Prometheus: image prom/prometheus:latest, container port {PROMETHEUS_PORT}, \
                     mount {MONITOR_DIR}/prometheus.yml at /etc/prometheus/prometheus.yml."
                ),
                "Grafana: image grafana/grafana:latest, container port 3000 mapped to a domain \
                 (e.g. monitor.monoklix.com); set GF_SECURITY_ADMIN_PASSWORD."
                    .into(),
            ],
            code_blocks: vec![],
        },
        GuideStep {
            title: "Install node exporter on every host".into(),
            body: vec![format!(
                "Run on all {host_count} hosts, including the hub itself."
            )],
            code_blocks: vec![CodeBlock::new(
                "Run on each server (SSH)",
                "bash",
                "docker run -d \\\n  --name=node_exporter \\\n  --net=\"host\" \\\n  --pid=\"host\" \\\n  --restart=unless-stopped \\\n  -v \"/:/host:ro,rslave\" \\\n  quay.io/prometheus/node-exporter:latest \\\n  --path.rootfs=/host",
            )],
        },
        GuideStep {
            title: "Connect Grafana to Prometheus".into(),
            body: vec![
                "Open the Grafana domain and log in as admin.".into(),
                "Connections -> Data Sources -> Add new -> Prometheus.".into(),
                format!(
                    "Connection URL: http://prometheus:{PROMETHEUS_PORT} (services on the hub resolve each other by name)."
                ),
                format!("Save & Test, then import dashboard {GRAFANA_DASHBOARD_ID}."),
            ],
            code_blocks: vec![],
        },
    ];

    DeploymentGuide {
        title: "Monitoring hub setup".into(),
        hub,
        steps,
    }
}
