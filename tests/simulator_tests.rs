// Simulator tests: scripted scenarios plus property checks over seeded random walks

mod common;

use chrono::NaiveTime;
use common::{ScriptedSource, record};
use proptest::prelude::*;
use sentinel::models::*;
use sentinel::registry;
use sentinel::simulator::*;

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap()
}

fn plain() -> Simulator {
    Simulator::new(SimConfig::without_spikes())
}

#[test]
fn test_cpu_step_into_critical() {
    let input = vec![record("n1", 88.0, 50.0)];
    // cpu +5, ram 0, net 0, net 0
    let mut rng = ScriptedSource::new(&[1.0, 0.5, 0.5, 0.5]);
    let out = plain().advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, 93.0);
    assert_eq!(out[0].status, ServerStatus::Critical);
}

#[test]
fn test_status_uses_unrounded_cpu() {
    let input = vec![record("n1", 88.0, 50.0)];
    // cpu +2.04 -> 90.04, stored as 90.0
    let mut rng = ScriptedSource::new(&[0.704, 0.5, 0.5, 0.5]);
    let out = plain().advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, 90.0);
    assert_eq!(out[0].status, ServerStatus::Critical);
}

#[test]
fn test_status_uses_unrounded_ram() {
    let input = vec![record("n1", 10.0, 80.0)];
    // ram +0.02 -> 80.02, stored as 80.0
    let mut rng = ScriptedSource::new(&[0.5, 0.504, 0.5, 0.5]);
    let out = plain().advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.ram, 80.0);
    assert_eq!(out[0].status, ServerStatus::Warning);
}

#[test]
fn test_cpu_above_seventy_is_warning() {
    let input = vec![record("n1", 72.0, 50.0)];
    let out = plain().advance(&input, noon(), &mut ScriptedSource::neutral());
    assert_eq!(out[0].metrics.cpu, 72.0);
    assert_eq!(out[0].status, ServerStatus::Warning);
}

#[test]
fn test_ram_drives_status() {
    let input = vec![record("a", 10.0, 96.0), record("b", 10.0, 81.0), record("c", 10.0, 80.0)];
    let out = plain().advance(&input, noon(), &mut ScriptedSource::neutral());
    let statuses: Vec<_> = out.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [ServerStatus::Critical, ServerStatus::Warning, ServerStatus::Online]
    );
}

#[test]
fn test_offline_is_reclassified_from_metrics() {
    let mut input = vec![record("n1", 20.0, 20.0)];
    input[0].status = ServerStatus::Offline;
    let out = plain().advance(&input, noon(), &mut ScriptedSource::neutral());
    assert_eq!(out[0].status, ServerStatus::Online);
}

#[test]
fn test_cpu_and_ram_clamped() {
    let input = vec![record("hi", 98.0, 99.0), record("lo", 2.0, 1.0)];
    // hi: cpu +5, ram +2.5, nets 0; lo: cpu -5, ram -2.5, nets 0
    let mut rng = ScriptedSource::new(&[1.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.5, 0.5]);
    let out = plain().advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, 100.0);
    assert_eq!(out[0].metrics.ram, 100.0);
    assert_eq!(out[0].status, ServerStatus::Critical);
    assert_eq!(out[1].metrics.cpu, 0.0);
    assert_eq!(out[1].metrics.ram, 0.0);
    assert_eq!(out[1].status, ServerStatus::Online);
}

#[test]
fn test_network_rates_floor_at_zero() {
    let mut input = vec![record("n1", 10.0, 10.0)];
    input[0].metrics.network_in = 10.0;
    input[0].metrics.network_out = 20.0;
    // net in -25, net out -50
    let mut rng = ScriptedSource::new(&[0.5, 0.5, 0.0, 0.0]);
    let out = plain().advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.network_in, 0.0);
    assert_eq!(out[0].metrics.network_out, 0.0);
}

#[test]
fn test_network_rates_unbounded_above() {
    let mut input = vec![record("n1", 10.0, 10.0)];
    input[0].metrics.network_in = 5000.0;
    input[0].metrics.network_out = 9000.0;
    let mut rng = ScriptedSource::new(&[0.5, 0.5, 1.0, 1.0]);
    let out = plain().advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.network_in, 5025.0);
    assert_eq!(out[0].metrics.network_out, 9050.0);
}

#[test]
fn test_values_rounded_for_display() {
    let input = vec![record("n1", 45.0, 50.0)];
    // cpu +0.123 -> 45.123, ram +0.06 -> 50.06
    let mut rng = ScriptedSource::new(&[0.5123, 0.512, 0.5, 0.5]);
    let out = plain().advance(&input, noon(), &mut rng);
    let m = &out[0].metrics;
    assert_eq!(m.cpu, 45.1);
    assert_eq!(m.ram, 50.1);
    assert_eq!(m.load_avg[0], 2.26);
    assert_eq!(m.history.cpu.back().map(|p| p.value), Some(45.0));
}

#[test]
fn test_load_average_shift_register() {
    let mut input = vec![record("n1", 45.0, 50.0)];
    input[0].metrics.load_avg = [0.45, 0.50, 0.40];
    let out = plain().advance(&input, noon(), &mut ScriptedSource::neutral());
    assert_eq!(out[0].metrics.load_avg, [2.25, 0.45, 0.50]);

    let out2 = plain().advance(&out, noon(), &mut ScriptedSource::neutral());
    assert_eq!(out2[0].metrics.load_avg, [2.25, 2.25, 0.45]);
}

#[test]
fn test_full_history_evicts_oldest() {
    let mut input = vec![record("n1", 40.0, 40.0)];
    for i in 0..DEFAULT_HISTORY_CAPACITY {
        input[0]
            .metrics
            .history
            .cpu
            .push_back(MetricPoint::new(format!("t{i}"), i as f64));
    }
    let out = plain().advance(&input, noon(), &mut ScriptedSource::neutral());
    let cpu = &out[0].metrics.history.cpu;
    assert_eq!(cpu.len(), DEFAULT_HISTORY_CAPACITY);
    assert_eq!(cpu.front().map(|p| p.time.as_str()), Some("t1"));
    assert_eq!(cpu.back(), Some(&MetricPoint::new("12:00:00", 40.0)));
}

#[test]
fn test_ram_history_populated_alongside_cpu() {
    let input = vec![record("n1", 40.0, 61.4)];
    let out = plain().advance(&input, noon(), &mut ScriptedSource::neutral());
    let history = &out[0].metrics.history;
    assert_eq!(history.ram.len(), 1);
    assert_eq!(history.ram.back(), Some(&MetricPoint::new("12:00:00", 61.0)));
}

#[test]
fn test_history_fifo_after_many_ticks() {
    let sim = plain();
    let mut rng = RngSource::seeded(11);
    let mut fleet = vec![record("n1", 50.0, 50.0)];
    let ticks = 25u32;
    for i in 0..ticks {
        let now = NaiveTime::from_hms_opt(10, 0, i).unwrap();
        fleet = sim.advance(&fleet, now, &mut rng);
        assert!(fleet[0].metrics.history.cpu.len() <= DEFAULT_HISTORY_CAPACITY);
    }
    let cpu = &fleet[0].metrics.history.cpu;
    assert_eq!(cpu.len(), DEFAULT_HISTORY_CAPACITY);
    assert_eq!(cpu.front().map(|p| p.time.as_str()), Some("10:00:05"));
    assert_eq!(cpu.back().map(|p| p.time.as_str()), Some("10:00:24"));
}

#[test]
fn test_custom_history_capacity() {
    let sim = Simulator::new(SimConfig {
        history_capacity: 3,
        ..SimConfig::without_spikes()
    });
    let mut fleet = vec![record("n1", 50.0, 50.0)];
    for _ in 0..5 {
        fleet = sim.advance(&fleet, noon(), &mut ScriptedSource::neutral());
    }
    assert_eq!(fleet[0].metrics.history.cpu.len(), 3);
    assert_eq!(fleet[0].metrics.history.ram.len(), 3);
}

#[test]
fn test_spike_forces_cpu() {
    let sim = Simulator::default();
    let input = vec![record(DEFAULT_SPIKE_NODE, 20.0, 30.0)];
    // cpu, ram, spike roll 0.1 < 0.2, nets
    let mut rng = ScriptedSource::new(&[0.5, 0.5, 0.1, 0.5, 0.5]);
    let out = sim.advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, DEFAULT_SPIKE_CPU_PERCENT);
    assert_eq!(out[0].status, ServerStatus::Critical);
    assert_eq!(out[0].metrics.load_avg[0], 4.75);
    assert_eq!(rng.remaining(), 0);
}

#[test]
fn test_spike_roll_above_probability_keeps_walk() {
    let sim = Simulator::default();
    let input = vec![record(DEFAULT_SPIKE_NODE, 20.0, 30.0)];
    let mut rng = ScriptedSource::new(&[0.5, 0.5, 0.9, 0.5, 0.5]);
    let out = sim.advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, 20.0);
    assert_eq!(out[0].status, ServerStatus::Online);
}

#[test]
fn test_nodes_without_spike_rule_draw_no_roll() {
    let sim = Simulator::default();
    let input = vec![record("main-01", 20.0, 30.0)];
    // Third sample must feed network in, not a spike roll.
    let mut rng = ScriptedSource::new(&[0.5, 0.5, 1.0, 0.5]);
    let out = sim.advance(&input, noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, 20.0);
    assert_eq!(out[0].metrics.network_in, 125.0);
    assert_eq!(rng.remaining(), 0);
}

#[test]
fn test_spike_keyed_by_id_not_name() {
    let sim = Simulator::default();
    let mut decoy = record("proxy-9", 20.0, 30.0);
    decoy.name = "s3.monoklix.com".into();
    let mut rng = ScriptedSource::new(&[0.5, 0.5, 0.0, 0.5]);
    let out = sim.advance(&[decoy], noon(), &mut rng);
    assert_eq!(out[0].metrics.cpu, 20.0);
    assert_eq!(out[0].metrics.network_in, 75.0);
}

#[test]
fn test_advance_leaves_input_untouched() {
    let mut seed_rng = RngSource::seeded(3);
    let input = registry::seed_fleet(&mut seed_rng);
    let frozen = input.clone();
    let sim = Simulator::default();

    let first = sim.advance(&input, noon(), &mut RngSource::seeded(1));
    let second = sim.advance(&input, noon(), &mut RngSource::seeded(2));

    assert_eq!(input, frozen);
    assert_ne!(first, second);
    assert!(first.iter().all(|s| s.metrics.history.cpu.len() == 1));
    assert!(second.iter().all(|s| s.metrics.history.cpu.len() == 1));
}

#[test]
fn test_same_seed_same_output() {
    let input = registry::seed_fleet(&mut RngSource::seeded(3));
    let sim = Simulator::default();
    let a = sim.advance(&input, noon(), &mut RngSource::seeded(99));
    let b = sim.advance(&input, noon(), &mut RngSource::seeded(99));
    assert_eq!(a, b);
}

#[test]
fn test_identity_fields_carried_over() {
    let input = registry::seed_fleet(&mut RngSource::seeded(5));
    let out = Simulator::default().advance(&input, noon(), &mut RngSource::seeded(6));
    for (before, after) in input.iter().zip(&out) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.name, after.name);
        assert_eq!(before.address, after.address);
        assert_eq!(before.kind, after.kind);
        assert_eq!(before.uptime, after.uptime);
        assert_eq!(before.metrics.disk, after.metrics.disk);
    }
}

#[test]
fn test_empty_fleet() {
    let out = Simulator::default().advance(&[], noon(), &mut ScriptedSource::neutral());
    assert!(out.is_empty());
}

// =============================================================================
// Invariants over seeded random walks
// =============================================================================

fn arb_record(index: usize) -> impl Strategy<Value = ServerRecord> {
    (
        0.0f64..=100.0,
        0.0f64..=100.0,
        0.0f64..=100.0,
        0.0f64..2000.0,
        0.0f64..2000.0,
        prop::array::uniform3(0.0f64..5.0),
    )
        .prop_map(move |(cpu, ram, disk, net_in, net_out, load_avg)| {
            let id = if index == 0 {
                DEFAULT_SPIKE_NODE.to_string()
            } else {
                format!("node-{index}")
            };
            ServerRecord {
                id,
                name: format!("n{index}"),
                address: "10.0.0.1".into(),
                kind: ServerKind::Proxy,
                status: ServerStatus::Online,
                metrics: MetricsBlock::new(cpu, ram, disk, load_avg, net_in, net_out),
                uptime: "0d 0h".into(),
            }
        })
}

fn arb_fleet() -> impl Strategy<Value = Vec<ServerRecord>> {
    (1usize..6).prop_flat_map(|n| (0..n).map(arb_record).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn advance_keeps_invariants(fleet in arb_fleet(), seed in any::<u64>(), ticks in 1usize..40) {
        let sim = Simulator::default();
        let mut rng = RngSource::seeded(seed);
        let mut current = fleet;
        for _ in 0..ticks {
            let next = sim.advance(&current, noon(), &mut rng);

            prop_assert_eq!(next.len(), current.len());
            for (before, after) in current.iter().zip(&next) {
                let m = &after.metrics;
                prop_assert_eq!(&before.id, &after.id);
                prop_assert_eq!(before.kind, after.kind);
                prop_assert!((0.0..=100.0).contains(&m.cpu), "cpu {}", m.cpu);
                prop_assert!((0.0..=100.0).contains(&m.ram), "ram {}", m.ram);
                prop_assert!((0.0..=100.0).contains(&m.disk), "disk {}", m.disk);
                prop_assert!(m.network_in >= 0.0);
                prop_assert!(m.network_out >= 0.0);
                prop_assert!(m.history.cpu.len() <= DEFAULT_HISTORY_CAPACITY);

                // Stored values are rounded; status is decided before rounding.
                let near = |v: f64, t: f64| (v - t).abs() <= 0.05 + 1e-9;
                let ambiguous = [70.0, 90.0].iter().any(|&t| near(m.cpu, t))
                    || [80.0, 95.0].iter().any(|&t| near(m.ram, t));
                let critical = m.cpu > 90.0 || m.ram > 95.0;
                let warning = !critical && (m.cpu > 70.0 || m.ram > 80.0);
                let expected = if critical {
                    ServerStatus::Critical
                } else if warning {
                    ServerStatus::Warning
                } else {
                    ServerStatus::Online
                };
                if !ambiguous {
                    prop_assert_eq!(after.status, expected);
                }

                prop_assert!((m.load_avg[1] - before.metrics.load_avg[0]).abs() <= 0.005 + 1e-9);
                prop_assert!((m.load_avg[2] - before.metrics.load_avg[1]).abs() <= 0.005 + 1e-9);
            }
            current = next;
        }
        let expected_len = ticks.min(DEFAULT_HISTORY_CAPACITY);
        prop_assert!(current.iter().all(|s| s.metrics.history.cpu.len() == expected_len));
    }
}
