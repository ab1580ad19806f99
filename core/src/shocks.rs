//! Shock generator — national, regional and state ARIMA realizations.
//!
//! Every series is drawn from its own RNG stream: the national series from
//! the NationalShock slot, each region's from (RegionalShock, region index),
//! each state's from (StateShock, state index). Series are stored keyed by
//! region / state id.

use crate::{
    arima::ArimaSpec,
    config::SimConfig,
    error::{SimError, SimResult},
    panel::Panel,
    rng::{RngBank, StageSlot, SubsystemRng},
    types::{RegionId, StateId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockLevel {
    National,
    Regional,
    State,
}

impl fmt::Display for ShockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::National => "national",
            Self::Regional => "regional",
            Self::State    => "state",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockSet {
    pub national: Vec<f64>,
    pub regional: BTreeMap<RegionId, Vec<f64>>,
    pub state: BTreeMap<StateId, Vec<f64>>,
}

impl ShockSet {
    pub fn generate(
        config: &SimConfig,
        panel: &Panel,
        week_count: usize,
        bank: &RngBank,
    ) -> SimResult<Self> {
        let arima = &config.arima;

        let mut rng = bank.for_stage(StageSlot::NationalShock);
        let national = draw(&arima.national, week_count, &mut rng, ShockLevel::National, "national")?;

        let mut regional = BTreeMap::new();
        for (idx, region) in panel.regions().iter().enumerate() {
            let mut rng = bank.for_unit(StageSlot::RegionalShock, idx as u64);
            let series = draw(&arima.regional, week_count, &mut rng, ShockLevel::Regional, region)?;
            regional.insert(region.clone(), series);
        }

        let mut state = BTreeMap::new();
        for (idx, st) in panel.states().iter().enumerate() {
            let mut rng = bank.for_unit(StageSlot::StateShock, idx as u64);
            let series = draw(&arima.state, week_count, &mut rng, ShockLevel::State, st)?;
            state.insert(st.clone(), series);
        }

        log::info!(
            "shocks: 1 national, {} regional, {} state series of {week_count} weeks",
            regional.len(),
            state.len()
        );
        Ok(Self { national, regional, state })
    }

    pub fn regional_series(&self, region: &str) -> Option<&[f64]> {
        self.regional.get(region).map(Vec::as_slice)
    }

    pub fn state_series(&self, state: &str) -> Option<&[f64]> {
        self.state.get(state).map(Vec::as_slice)
    }
}

fn draw(
    spec: &ArimaSpec,
    week_count: usize,
    rng: &mut SubsystemRng,
    level: ShockLevel,
    unit: &str,
) -> SimResult<Vec<f64>> {
    let series = spec.simulate(week_count, rng).map_err(|e| SimError::Generation {
        level,
        unit: unit.to_string(),
        reason: e.to_string(),
    })?;
    log::debug!(
        "shocks: {level} {unit} first={:.4} last={:.4}",
        series.first().copied().unwrap_or_default(),
        series.last().copied().unwrap_or_default()
    );
    Ok(series)
}
