//! Configuration loading and validation tests.

use chrono::NaiveDate;
use mmm_sim_core::{
    arima::ArimaSpec,
    config::SimConfig,
    error::SimError,
    ground_truth::MediaEffect,
    media::Channel,
    pipeline::SimPipeline,
};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");

fn assert_config_error(config: SimConfig, needle: &str) {
    match config.validate() {
        Err(SimError::Config(msg)) => assert!(msg.contains(needle), "'{msg}' lacks '{needle}'"),
        other => panic!("expected config error containing '{needle}', got {other:?}"),
    }
    assert!(
        matches!(SimPipeline::new(config), Err(SimError::Config(_))),
        "pipeline accepted an invalid config"
    );
}

#[test]
fn defaults_are_valid() {
    let config = SimConfig::default();
    config.validate().expect("default config");
    assert_eq!(config.seed, 123);
    assert_eq!(config.calendar().len(), 104);
    assert_eq!(config.channels.len(), 6);
    SimConfig::default_test().validate().expect("test config");
    assert_eq!(SimConfig::default_test().calendar().len(), 20);
}

#[test]
fn data_dir_matches_built_in_defaults() {
    let loaded = SimConfig::load(DATA_DIR).expect("load data dir");
    assert_eq!(loaded, SimConfig::default());
}

#[test]
fn missing_data_dir_is_an_error() {
    let err = SimConfig::load("/nonexistent/mmm-data").unwrap_err();
    assert!(err.to_string().contains("simulation.json"), "{err}");
}

#[test]
fn zero_states_rejected() {
    assert_config_error(SimConfig { state_count: 0, ..SimConfig::default() }, "state_count");
}

#[test]
fn zero_regions_rejected() {
    assert_config_error(SimConfig { region_count: 0, ..SimConfig::default() }, "region_count");
}

#[test]
fn negative_scale_rejected() {
    assert_config_error(SimConfig { scale: -1.0, ..SimConfig::default() }, "scale");
    assert_config_error(SimConfig { scale: f64::NAN, ..SimConfig::default() }, "scale");
}

#[test]
fn empty_week_range_rejected() {
    let reversed = SimConfig {
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        ..SimConfig::default()
    };
    assert_config_error(reversed, "precedes");

    // Monday to Thursday contains no Sunday.
    let no_sunday = SimConfig {
        start_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
        ..SimConfig::default()
    };
    assert_config_error(no_sunday, "no week-ending");
}

#[test]
fn bad_arima_parameters_rejected() {
    let mut config = SimConfig::default();
    config.arima.regional = ArimaSpec { sigma: 0.0, ..config.arima.regional };
    assert_config_error(config, "regional ARIMA sigma");

    let mut config = SimConfig::default();
    config.arima.national.d = 3;
    assert_config_error(config, "differencing");

    let mut config = SimConfig::default();
    config.arima.state.ma = f64::INFINITY;
    assert_config_error(config, "state ARIMA coefficients");
}

#[test]
fn channel_set_must_be_exactly_the_six_channels() {
    let mut config = SimConfig::default();
    config.channels.pop();
    assert_config_error(config, "expected 6 channels");

    let mut config = SimConfig::default();
    config.channels[5].channel = Channel::Meta;
    assert_config_error(config, "META configured 2 times");
}

#[test]
fn negative_spend_parameters_rejected() {
    let mut config = SimConfig::default();
    config.channels[0].volatility = -0.1;
    assert_config_error(config, "non-negative");

    let mut config = SimConfig::default();
    config.channels[1].persistence = 1.0;
    assert_config_error(config, "persistence");
}

#[test]
fn media_effect_parses_from_flag_values() {
    assert_eq!("additive".parse::<MediaEffect>().unwrap(), MediaEffect::Additive);
    assert_eq!("excluded".parse::<MediaEffect>().unwrap(), MediaEffect::Excluded);
    assert!(matches!("both".parse::<MediaEffect>(), Err(SimError::Config(_))));
    assert_eq!(MediaEffect::default(), MediaEffect::Excluded);
}
