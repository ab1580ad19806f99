//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two pipelines, same seed, same config.
//! They must produce identical tables and identical event logs.
//! Any divergence is a blocker — do not merge until fixed.

use mmm_sim_core::{config::SimConfig, pipeline::simulate};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn event_log(config: SimConfig) -> Vec<String> {
    init_logging();
    simulate(config)
        .expect("pipeline run")
        .events
        .iter()
        .map(|e| serde_json::to_string(e).expect("serialize event"))
        .collect()
}

#[test]
fn same_seed_produces_identical_tables() {
    init_logging();
    let a = simulate(SimConfig::default()).expect("run a");
    let b = simulate(SimConfig::default()).expect("run b");

    assert_eq!(a.panel, b.panel, "Panel assignment diverged");
    assert_eq!(a.calendar, b.calendar, "Calendar diverged");
    assert_eq!(a.shocks, b.shocks, "Shock series diverged");

    assert_eq!(a.sales.len(), b.sales.len());
    for (i, (x, y)) in a.sales.iter().zip(&b.sales).enumerate() {
        assert_eq!(
            x.sales.to_bits(),
            y.sales.to_bits(),
            "Sales diverged at row {i}: {x:?} vs {y:?}"
        );
    }

    assert_eq!(a.media.len(), b.media.len());
    for (i, (x, y)) in a.media.iter().zip(&b.media).enumerate() {
        assert_eq!(
            x.spend.to_bits(),
            y.spend.to_bits(),
            "Spend diverged at row {i}: {x:?} vs {y:?}"
        );
    }
}

#[test]
fn same_seed_produces_identical_event_logs() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let log_a = event_log(SimConfig::default().with_seed(SEED));
    let log_b = event_log(SimConfig::default().with_seed(SEED));

    assert_eq!(log_a.len(), log_b.len(), "Event log lengths differ");
    for (i, (a, b)) in log_a.iter().zip(&log_b).enumerate() {
        assert_eq!(a, b, "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
}

#[test]
fn different_seeds_produce_different_values() {
    let a = simulate(SimConfig::default().with_seed(123)).expect("run a");
    let b = simulate(SimConfig::default().with_seed(124)).expect("run b");

    let sales_differ = a.sales.iter().zip(&b.sales).any(|(x, y)| x.sales != y.sales);
    let spend_differ = a.media.iter().zip(&b.media).any(|(x, y)| x.spend != y.spend);
    assert!(sales_differ, "Different seeds produced identical sales — seed is not being used");
    assert!(spend_differ, "Different seeds produced identical spend — seed is not being used");

    // Structure is seed-independent.
    assert_eq!(a.sales.len(), b.sales.len());
    assert_eq!(a.media.len(), b.media.len());
    assert_eq!(a.calendar, b.calendar);
    assert_eq!(a.panel.states(), b.panel.states());
    assert_eq!(a.panel.regions(), b.panel.regions());
}

#[test]
fn media_effect_mode_does_not_shift_random_streams() {
    use mmm_sim_core::ground_truth::MediaEffect;

    let excluded = simulate(SimConfig::default()).expect("excluded run");
    let additive = simulate(SimConfig {
        media_effect: MediaEffect::Additive,
        ..SimConfig::default()
    })
    .expect("additive run");

    assert_eq!(excluded.shocks, additive.shocks);
    assert_eq!(excluded.media, additive.media);
    for (x, y) in excluded.sales.iter().zip(&additive.sales) {
        assert_eq!(x.shock_sales.to_bits(), y.shock_sales.to_bits());
    }
}
