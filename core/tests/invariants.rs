//! Randomized sweeps: the bookkeeping invariants hold after every tick.

use callcenter_core::{
    config::{DispatchConfig, DispatchPolicy, TierRates},
    simulation::TrafficSimulator,
    DispatchEvent, Tier,
};

const SEEDS: [u64; 5] = [1, 7, 42, 1234, 0xDEAD_BEEF];

fn sweep(config: &DispatchConfig, seed: u64, ticks: u64) -> TrafficSimulator {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut sim = TrafficSimulator::new(format!("inv-{seed}"), seed, config)
        .expect("build simulator");
    for _ in 0..ticks {
        let events = sim.tick().expect("tick");
        let d = sim.dispatcher();
        d.check_invariants()
            .unwrap_or_else(|e| panic!("seed={seed} tick={}: {e}", sim.current_tick));

        // Every live call is either held or queued.
        let s = sim.summary();
        assert_eq!(
            (s.submitted - s.completed) as usize,
            d.active_calls() + d.backlog_len(),
            "seed={seed} tick={}: calls leaked",
            sim.current_tick
        );

        for event in &events {
            if let DispatchEvent::CallEscalated { from_tier, to_tier, .. } = event {
                assert!(
                    to_tier > from_tier,
                    "seed={seed}: escalation did not raise tier {from_tier} -> {to_tier}"
                );
            }
            if let DispatchEvent::CallAssigned { employee_tier, required_tier, .. } = event {
                assert!(
                    employee_tier >= required_tier,
                    "seed={seed}: {required_tier} call given to {employee_tier} employee"
                );
            }
        }
    }
    sim
}

#[test]
fn invariants_hold_under_default_traffic() {
    let config = DispatchConfig::default_test();
    for seed in SEEDS {
        let sim = sweep(&config, seed, 200);
        let s = sim.summary();
        assert!(s.submitted > 0, "seed={seed}: no calls submitted");
        assert!(s.completed > 0, "seed={seed}: no calls completed");
        assert!(s.escalated > 0, "seed={seed}: no escalations in 200 ticks");
    }
}

/// Heavy arrivals, slow handling: the backlog grows and drains constantly.
#[test]
fn invariants_hold_under_overload() {
    let mut config = DispatchConfig::default_test();
    config.traffic.arrival_probability = TierRates {
        junior: 0.9,
        mid: 0.6,
        senior: 0.3,
    };
    config.traffic.completion_probability = 0.15;
    config.traffic.escalation_probability = 0.25;

    for seed in SEEDS {
        let sim = sweep(&config, seed, 150);
        let s = sim.summary();
        assert!(s.max_backlog > 0, "seed={seed}: overload never queued anything");
        assert!(s.drained > 0, "seed={seed}: backlog never drained");
    }
}

#[test]
fn invariants_hold_with_drain_on_escalation() {
    let mut config = DispatchConfig::default_test();
    config.policy = DispatchPolicy { drain_on_escalation: true };
    config.traffic.escalation_probability = 0.3;

    for seed in SEEDS {
        sweep(&config, seed, 200);
    }
}

/// With no arrivals the backlog can only shrink and eventually empties.
#[test]
fn backlog_drains_once_arrivals_stop() {
    let mut quiet = DispatchConfig::default_test();
    quiet.traffic.escalation_probability = 0.0;
    quiet.traffic.arrival_probability = TierRates { junior: 0.0, mid: 0.0, senior: 0.0 };
    let mut drained = TrafficSimulator::new("inv-quiet".into(), 42, &quiet).expect("build");
    for tier in [Tier::Junior, Tier::Mid] {
        for _ in 0..10 {
            drained.dispatcher_mut().submit_call(tier).expect("submit");
        }
    }
    drained.flush_events().expect("flush");
    assert!(drained.dispatcher().backlog_len() > 0);

    let mut last = drained.dispatcher().backlog_len();
    for _ in 0..500 {
        drained.tick().expect("tick");
        let now = drained.dispatcher().backlog_len();
        assert!(now <= last, "backlog grew with no arrivals: {last} -> {now}");
        last = now;
    }
    assert_eq!(last, 0, "backlog should empty within 500 quiet ticks");
    assert_eq!(drained.dispatcher().active_calls(), 0);
}
