use anyhow::Result;
use sentinel::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let mut rng = match app_config.simulation.seed {
        Some(seed) => {
            tracing::info!(seed, "Using fixed simulation seed");
            simulator::RngSource::seeded(seed)
        }
        None => simulator::RngSource::from_os_rng(),
    };
    let fleet = registry::seed_fleet(&mut rng);
    tracing::info!(nodes = fleet.len(), "Fleet seeded");

    let publisher = scheduler::FleetPublisher::new(
        models::FleetSnapshot::initial(fleet),
        app_config.publishing.broadcast_capacity,
    );
    let simulator = simulator::Simulator::new(app_config.simulation.sim_config());
    let ws_fleet_connections = Arc::new(AtomicUsize::new(0));

    let scheduler_handle = scheduler::spawn(
        scheduler::SchedulerDeps {
            scheduler: scheduler::Scheduler::new(simulator, rng, publisher.clone()),
            ws_fleet_connections: ws_fleet_connections.clone(),
            cancel: CancellationToken::new(),
        },
        scheduler::SchedulerConfig {
            tick_interval: app_config.simulation.tick_interval(),
            stats_log_interval: std::time::Duration::from_secs(
                app_config.monitoring.stats_log_interval_secs,
            ),
        },
    );

    let generator = diagnostics::GeminiClient::from_env(&app_config.diagnostics)?;
    if let Err(e) = diagnostics::ReportGenerator::ensure_configured(&generator) {
        tracing::warn!(error = %e, "Diagnostics disabled until a key is provided");
    }
    let requester = Arc::new(diagnostics::DiagnosticsRequester::new(Arc::new(generator)));

    let app = routes::app(publisher, requester, ws_fleet_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
        }
    }

    scheduler_handle.shutdown().await;
    Ok(())
}
