//! Panel builder — the cross-sectional structure of the simulation.
//!
//! States `S1..S{n}` each draw one region from `R1..R{k}` uniformly with
//! replacement. A region can end up with no member states.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    rng::SubsystemRng,
    types::{RegionId, StateId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    states: Vec<StateId>,
    regions: Vec<RegionId>,
    assignment: BTreeMap<StateId, RegionId>,
}

impl Panel {
    /// Fails with `SimError::Config` when there is no region to draw from.
    pub fn build(config: &SimConfig, rng: &mut SubsystemRng) -> SimResult<Self> {
        if config.region_count == 0 {
            return Err(SimError::Config("region_count must be at least 1".into()));
        }
        let regions: Vec<RegionId> = (1..=config.region_count).map(|i| format!("R{i}")).collect();
        let states: Vec<StateId> = (1..=config.state_count).map(|i| format!("S{i}")).collect();

        let assignment = states
            .iter()
            .map(|state| {
                let pick = rng.next_u64_below(regions.len() as u64) as usize;
                (state.clone(), regions[pick].clone())
            })
            .collect();

        let panel = Self { states, regions, assignment };
        for region in &panel.regions {
            if panel.members(region).is_empty() {
                log::warn!("panel: region {region} received no states");
            }
        }
        log::info!(
            "panel: {} states assigned across {} regions",
            panel.states.len(),
            panel.regions.len()
        );
        Ok(panel)
    }

    /// States in label order (`S1`, `S2`, ...).
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// Regions in label order (`R1`, `R2`, ...).
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn region_of(&self, state: &str) -> Option<&RegionId> {
        self.assignment.get(state)
    }

    /// Member states of a region, in state order.
    pub fn members(&self, region: &str) -> Vec<&StateId> {
        self.states
            .iter()
            .filter(|s| self.assignment.get(*s).map(String::as_str) == Some(region))
            .collect()
    }
}
