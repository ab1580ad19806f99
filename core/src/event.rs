//! The pipeline event log.
//!
//! RULE: every stage records what it produced as exactly one event.
//! The log is the cheapest fingerprint of a run: two runs with the same
//! seed and config must produce identical logs.

use crate::{
    ground_truth::MediaEffect,
    types::{RegionId, RunId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variants are appended as stages are added — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    RunInitialized {
        seed: u64,
        weeks: usize,
        media_effect: MediaEffect,
    },
    PanelBuilt {
        states: usize,
        regions: usize,
        members: BTreeMap<RegionId, usize>,
    },
    ShocksGenerated {
        weeks: usize,
        national_first: f64,
        national_last: f64,
        regional_series: usize,
        state_series: usize,
    },
    SalesSynthesized {
        records: usize,
        mean_sales: f64,
        min_sales: f64,
        max_sales: f64,
    },
    MediaGenerated {
        records: usize,
        total_spend: f64,
    },
    MediaEffectApplied {
        media_effect: MediaEffect,
        total_contribution: f64,
    },
    ModelFitted {
        observations: usize,
        parameters: usize,
        r_squared: f64,
    },
}

impl SimEvent {
    /// Stable name used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::RunInitialized { .. }     => "run_initialized",
            SimEvent::PanelBuilt { .. }         => "panel_built",
            SimEvent::ShocksGenerated { .. }    => "shocks_generated",
            SimEvent::SalesSynthesized { .. }   => "sales_synthesized",
            SimEvent::MediaGenerated { .. }     => "media_generated",
            SimEvent::MediaEffectApplied { .. } => "media_effect_applied",
            SimEvent::ModelFitted { .. }        => "model_fitted",
        }
    }
}

/// A persisted event log entry (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub seq: u64,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
