//! Sales synthesizer — combines the shock hierarchy into state-week sales.
//!
//! ```text
//! shock_sales = baseline + scale * (national * w_n + regional * w_r + state * w_s)
//! sales       = shock_sales + media_contribution
//! ```
//!
//! The media contribution starts at zero; `ground_truth::apply_media_effect`
//! fills it in when the run folds media into sales. Nothing is floored or
//! capped, so extreme draws can produce negative sales.

use crate::{
    calendar::Calendar,
    config::{ShockWeights, SimConfig},
    error::{SimError, SimResult},
    panel::Panel,
    shocks::{ShockLevel, ShockSet},
    types::{RegionId, StateId, WeekIndex},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub state: StateId,
    pub region: RegionId,
    pub week: WeekIndex,
    pub week_ending: NaiveDate,
    pub national_shock: f64,
    pub regional_shock: f64,
    pub state_shock: f64,
    pub shock_sales: f64,
    pub media_contribution: f64,
    pub sales: f64,
}

/// Summed sales of a region's member states in one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRow {
    pub region: RegionId,
    pub week: WeekIndex,
    pub week_ending: NaiveDate,
    pub sales: f64,
}

/// The deterministic shock-to-sales combination.
pub fn shock_sales(
    baseline: f64,
    scale: f64,
    weights: &ShockWeights,
    national: f64,
    regional: f64,
    state: f64,
) -> f64 {
    baseline + scale * (national * weights.national + regional * weights.regional + state * weights.state)
}

/// One record per (state, week), ordered by state then week.
pub fn synthesize_sales(
    config: &SimConfig,
    panel: &Panel,
    calendar: &Calendar,
    shocks: &ShockSet,
) -> SimResult<Vec<SalesRecord>> {
    let weeks = calendar.len();
    let mut records = Vec::with_capacity(panel.state_count() * weeks);
    check_length(ShockLevel::National, "national", &shocks.national, weeks)?;

    for state in panel.states() {
        let region = panel.region_of(state).ok_or_else(|| missing(ShockLevel::State, state))?;
        let regional = shocks
            .regional_series(region)
            .ok_or_else(|| missing(ShockLevel::Regional, region))?;
        check_length(ShockLevel::Regional, region, regional, weeks)?;
        let own = shocks
            .state_series(state)
            .ok_or_else(|| missing(ShockLevel::State, state))?;
        check_length(ShockLevel::State, state, own, weeks)?;

        for (week, &week_ending) in calendar.weeks().iter().enumerate() {
            let n = shocks.national[week];
            let r = regional[week];
            let s = own[week];
            let value = shock_sales(config.baseline, config.scale, &config.weights, n, r, s);
            records.push(SalesRecord {
                state: state.clone(),
                region: region.clone(),
                week,
                week_ending,
                national_shock: n,
                regional_shock: r,
                state_shock: s,
                shock_sales: value,
                media_contribution: 0.0,
                sales: value,
            });
        }
    }

    log::info!("sales: synthesized {} state-week records", records.len());
    Ok(records)
}

fn check_length(level: ShockLevel, unit: &str, series: &[f64], weeks: usize) -> SimResult<()> {
    if series.len() < weeks {
        return Err(SimError::Generation {
            level,
            unit: unit.to_string(),
            reason: format!("shock series has {} weeks, calendar has {weeks}", series.len()),
        });
    }
    Ok(())
}

fn missing(level: ShockLevel, unit: &str) -> SimError {
    SimError::Generation {
        level,
        unit: unit.to_string(),
        reason: "no shock series for this unit".into(),
    }
}

/// Sum sales by (region, week). Rows are ordered by region (panel order)
/// then week; regions without member states are omitted.
pub fn regional_rollup(panel: &Panel, calendar: &Calendar, records: &[SalesRecord]) -> Vec<RollupRow> {
    let mut totals: HashMap<(&str, WeekIndex), f64> = HashMap::new();
    for rec in records {
        *totals.entry((rec.region.as_str(), rec.week)).or_insert(0.0) += rec.sales;
    }

    let mut rows = Vec::new();
    for region in panel.regions() {
        for (week, &week_ending) in calendar.weeks().iter().enumerate() {
            if let Some(&sales) = totals.get(&(region.as_str(), week)) {
                rows.push(RollupRow {
                    region: region.clone(),
                    week,
                    week_ending,
                    sales,
                });
            }
        }
    }
    rows
}
