//! SQLite export tests.

use mmm_sim_core::{
    config::SimConfig,
    estimator::EstimatorOptions,
    event::SimEvent,
    pipeline::simulate,
    store::SimStore,
};

fn open_store() -> SimStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

#[test]
fn saved_run_round_trips_row_counts() {
    let store = open_store();
    let run = simulate(SimConfig::default_test()).expect("pipeline run");
    store.save_run("store-counts", &run, "0.1.0-test").expect("save run");

    assert_eq!(store.run_ids().unwrap(), vec!["store-counts".to_string()]);
    assert_eq!(store.sales_count("store-counts").unwrap(), (6 * 20) as i64);
    assert_eq!(store.media_count("store-counts").unwrap(), (6 * 20 * 6) as i64);
    assert_eq!(store.week_count("store-counts").unwrap(), 20);
}

#[test]
fn saved_rollup_matches_in_memory_rollup() {
    let store = open_store();
    let run = simulate(SimConfig::default_test()).expect("pipeline run");
    store.save_run("store-rollup", &run, "0.1.0-test").expect("save run");

    let rollup = run.regional_rollup();
    let region = rollup[0].region.clone();
    let expected: Vec<(i64, f64)> = rollup
        .iter()
        .filter(|r| r.region == region)
        .map(|r| (r.week as i64, r.sales))
        .collect();

    let saved = store.rollup_for_region("store-rollup", &region).unwrap();
    assert_eq!(saved, expected);
}

#[test]
fn event_log_is_persisted_in_order() {
    let store = open_store();
    let mut run = simulate(SimConfig::default_test()).expect("pipeline run");
    run.estimate(EstimatorOptions::default()).expect("estimation");
    store.save_run("store-events", &run, "0.1.0-test").expect("save run");

    let entries = store.events("store-events").unwrap();
    assert_eq!(entries.len(), run.events.len());
    assert_eq!(entries[0].event_type, "run_initialized");
    assert_eq!(entries.last().unwrap().event_type, "model_fitted");

    for (entry, event) in entries.iter().zip(&run.events) {
        let decoded: SimEvent = serde_json::from_str(&entry.payload).expect("decode payload");
        assert_eq!(decoded.type_name(), event.type_name());
    }
}

#[test]
fn estimates_are_saved_per_term() {
    let store = open_store();
    let mut run = simulate(SimConfig::default_test()).expect("pipeline run");
    let report = run.estimate(EstimatorOptions::default()).expect("estimation");
    store.save_run("store-coef", &run, "0.1.0-test").expect("save run");
    store.save_estimates("store-coef", &report).expect("save estimates");

    let saved = store.coefficient_estimates("store-coef").unwrap();
    assert_eq!(saved.len(), report.coefficients.len());
    assert_eq!(saved[0].0, "intercept");
    assert_eq!(saved[1].0, "META");
    assert_eq!(saved[1].1, Some(report.coefficients[1].estimate));
}

#[test]
fn duplicate_run_id_is_rejected() {
    let store = open_store();
    let run = simulate(SimConfig::default_test()).expect("pipeline run");
    store.save_run("dup", &run, "0.1.0-test").expect("first save");
    assert!(store.save_run("dup", &run, "0.1.0-test").is_err());
    // The failed transaction leaves the first copy intact.
    assert_eq!(store.sales_count("dup").unwrap(), 120);
}

#[test]
fn file_backed_store_opens_and_saves() {
    let path = std::env::temp_dir().join(format!("mmm-store-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let path_str = path.to_str().expect("utf-8 temp path");

    let store = SimStore::open(path_str).expect("open file store");
    store.migrate().expect("migration");
    let run = simulate(SimConfig::default_test()).expect("pipeline run");
    store.save_run("file-run", &run, "0.1.0-test").expect("save run");
    assert_eq!(store.sales_count("file-run").unwrap(), 120);

    drop(store);
    let _ = std::fs::remove_file(&path);
}
