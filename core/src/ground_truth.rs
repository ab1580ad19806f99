//! Ground-truth coefficients and how they reach the sales series.
//!
//! Each channel carries a fixed coefficient: incremental sales per unit of
//! spend. Whether that effect is part of the simulated sales is a run-level
//! choice:
//!
//! - `Excluded` (default): sales follow the shock-only formula. The
//!   regression is a downstream check whose true media coefficients are 0
//!   in the data.
//! - `Additive`: each state-week gains `sum_c coefficient_c * spend_c`,
//!   so the regression should recover the configured coefficients.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    media::{Channel, ChannelSpend, MediaRecord},
    sales::SalesRecord,
    types::WeekIndex,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaEffect {
    #[default]
    Excluded,
    Additive,
}

impl fmt::Display for MediaEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excluded => "excluded",
            Self::Additive => "additive",
        })
    }
}

impl FromStr for MediaEffect {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excluded" => Ok(Self::Excluded),
            "additive" => Ok(Self::Additive),
            other => Err(SimError::Config(format!("unknown media effect '{other}'"))),
        }
    }
}

/// Known coefficient per channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub coefficients: ChannelSpend,
    pub media_effect: MediaEffect,
}

impl GroundTruth {
    pub fn from_config(config: &SimConfig) -> Self {
        let mut coefficients = ChannelSpend::default();
        for c in &config.channels {
            coefficients.set(c.channel, c.coefficient);
        }
        Self { coefficients, media_effect: config.media_effect }
    }

    pub fn coefficient(&self, channel: Channel) -> f64 {
        self.coefficients.get(channel)
    }

    /// The coefficient the data actually carries for a channel.
    pub fn effective_coefficient(&self, channel: Channel) -> f64 {
        match self.media_effect {
            MediaEffect::Additive => self.coefficient(channel),
            MediaEffect::Excluded => 0.0,
        }
    }

    /// `sum_c coefficient_c * spend_c` in channel order.
    pub fn contribution(&self, spend: &ChannelSpend) -> f64 {
        Channel::ALL
            .iter()
            .map(|c| self.coefficient(*c) * spend.get(*c))
            .sum()
    }
}

/// Fold the media contribution into sales when the run is additive.
/// Leaves records untouched for `Excluded`.
pub fn apply_media_effect(
    truth: &GroundTruth,
    sales: &mut [SalesRecord],
    media: &[MediaRecord],
) -> SimResult<()> {
    if truth.media_effect == MediaEffect::Excluded {
        return Ok(());
    }

    let mut spend: HashMap<(&str, WeekIndex), ChannelSpend> = HashMap::with_capacity(sales.len());
    for m in media {
        spend
            .entry((m.state.as_str(), m.week))
            .or_default()
            .set(m.channel, m.spend);
    }

    for rec in sales.iter_mut() {
        let row = spend.get(&(rec.state.as_str(), rec.week)).ok_or_else(|| SimError::Reshape {
            state: rec.state.clone(),
            week: rec.week,
            detail: "no spend for this state-week".into(),
        })?;
        rec.media_contribution = truth.contribution(row);
        rec.sales = rec.shock_sales + rec.media_contribution;
    }

    log::info!("ground_truth: folded media contribution into {} records", sales.len());
    Ok(())
}
