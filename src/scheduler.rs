// Tick driver: owns the live fleet, advances it on a fixed interval and publishes each snapshot.
// Each tick runs read -> advance -> publish to completion inside one task, so ticks never interleave.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::models::FleetSnapshot;
use crate::simulator::{RandomSource, Simulator};

/// Rate limit for the "no subscribers" debug line.
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Fan-out for published snapshots: a broadcast for streaming subscribers and a watch
/// holding the latest value for point reads.
#[derive(Clone)]
pub struct FleetPublisher {
    tx: broadcast::Sender<Arc<FleetSnapshot>>,
    latest: Arc<watch::Sender<Arc<FleetSnapshot>>>,
}

impl FleetPublisher {
    pub fn new(initial: FleetSnapshot, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(Arc::new(initial));
        Self {
            tx,
            latest: Arc::new(latest),
        }
    }

    /// Stores `snapshot` as latest and broadcasts it. Returns the number of stream subscribers
    /// that received it.
    pub fn publish(&self, snapshot: Arc<FleetSnapshot>) -> usize {
        self.latest.send_replace(snapshot.clone());
        self.tx.send(snapshot).unwrap_or(0)
    }

    pub fn latest(&self) -> Arc<FleetSnapshot> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<FleetSnapshot>> {
        self.tx.subscribe()
    }

    pub fn watch(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.latest.subscribe()
    }
}

/// Explicit owner of the live fleet state.
pub struct Scheduler<R> {
    simulator: Simulator,
    rng: R,
    current: Arc<FleetSnapshot>,
    publisher: FleetPublisher,
}

impl<R: RandomSource> Scheduler<R> {
    /// Starts from whatever the publisher currently holds.
    pub fn new(simulator: Simulator, rng: R, publisher: FleetPublisher) -> Self {
        let current = publisher.latest();
        Self {
            simulator,
            rng,
            current,
            publisher,
        }
    }

    pub fn current(&self) -> Arc<FleetSnapshot> {
        self.current.clone()
    }

    /// One tick: advance the current fleet, replace it wholesale and publish the result.
    pub fn step(&mut self, now: DateTime<Local>) -> (Arc<FleetSnapshot>, usize) {
        let servers = self
            .simulator
            .advance(&self.current.servers, now.time(), &mut self.rng);
        let next = Arc::new(FleetSnapshot {
            tick: self.current.tick + 1,
            updated_at: u64::try_from(now.timestamp_millis()).unwrap_or(0),
            servers,
        });
        self.current = next.clone();
        let receivers = self.publisher.publish(next.clone());
        (next, receivers)
    }
}

pub struct SchedulerConfig {
    pub tick_interval: Duration,
    /// How often to log fleet stats (real seconds).
    pub stats_log_interval: Duration,
}

/// Scheduler plus the shared pieces its loop reports on.
pub struct SchedulerDeps<R> {
    pub scheduler: Scheduler<R>,
    pub ws_fleet_connections: Arc<AtomicUsize>,
    pub cancel: CancellationToken,
}

/// Running scheduler task.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests the loop to stop; safe to call any number of times.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops and waits for the loop to exit. No snapshot is published after this returns.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, operation = "scheduler_join", "scheduler task failed");
        }
    }
}

/// Spawns the tick loop. The first tick fires one interval after spawn.
pub fn spawn<R>(deps: SchedulerDeps<R>, config: SchedulerConfig) -> SchedulerHandle
where
    R: RandomSource + Send + 'static,
{
    let SchedulerDeps {
        mut scheduler,
        ws_fleet_connections,
        cancel,
    } = deps;
    let SchedulerConfig {
        tick_interval,
        stats_log_interval,
    } = config;
    let loop_cancel = cancel.clone();
    let tick_interval_ms = tick_interval.as_millis() as u64;
    let span = tracing::span!(tracing::Level::DEBUG, "scheduler", tick_interval_ms);

    let join = tokio::spawn(
        async move {
            let mut tick = interval_at(Instant::now() + tick_interval, tick_interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut last_no_receivers_log: Option<Instant> = None;

            loop {
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => {
                        tracing::debug!("Scheduler shutting down");
                        break;
                    }
                    _ = tick.tick() => {
                        let (snapshot, receivers) = scheduler.step(Local::now());
                        tracing::trace!(tick = snapshot.tick, receivers, "fleet advanced");
                        if receivers == 0 {
                            let should_log = last_no_receivers_log
                                .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL);
                            if should_log {
                                tracing::debug!(
                                    operation = "broadcast_snapshot",
                                    "No active WebSocket clients; broadcast channel has no receivers"
                                );
                                last_no_receivers_log = Some(Instant::now());
                            }
                        }
                    }
                    _ = stats_log_tick.tick() => {
                        let summary = scheduler.current().summary();
                        tracing::info!(
                            tick = summary.tick,
                            critical = summary.critical,
                            warning = summary.warning,
                            ws_fleet_clients = ws_fleet_connections.load(Ordering::Relaxed),
                            "fleet stats"
                        );
                    }
                }
            }
        }
        .instrument(span),
    );

    SchedulerHandle { cancel, join }
}
