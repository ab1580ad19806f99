//! Media generator — synthetic weekly spend per state and channel.
//!
//! Spend rule, one independent stream per (state, channel):
//!
//! ```text
//! level   = base_spend * U(0.5, 1.5)
//! slope   = U(-trend, +trend)
//! f_t     = persistence * f_{t-1} + N(0, volatility^2),   f_{-1} = 0
//! spend_t = max(0, level * (1 + slope * t + f_t))
//! ```
//!
//! Levels differ by state, the slope gives each series a drift and the
//! AR(1) term a week-to-week fluctuation. Spend is floored at zero.

use crate::{
    config::{ChannelConfig, SimConfig},
    error::{SimError, SimResult},
    panel::Panel,
    rng::{RngBank, StageSlot, SubsystemRng},
    sales::SalesRecord,
    types::{RegionId, StateId, WeekIndex},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The fixed set of marketing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "META")]
    Meta,
    #[serde(rename = "Instagram")]
    Instagram,
    #[serde(rename = "TikTok")]
    TikTok,
    #[serde(rename = "Influencers")]
    Influencers,
    #[serde(rename = "OOH")]
    Ooh,
    #[serde(rename = "PR")]
    Pr,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Meta,
        Channel::Instagram,
        Channel::TikTok,
        Channel::Influencers,
        Channel::Ooh,
        Channel::Pr,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Meta        => "META",
            Self::Instagram   => "Instagram",
            Self::TikTok      => "TikTok",
            Self::Influencers => "Influencers",
            Self::Ooh         => "OOH",
            Self::Pr          => "PR",
        }
    }

    /// Stable position in `Channel::ALL`.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One spend observation in long layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub state: StateId,
    pub week: WeekIndex,
    pub channel: Channel,
    pub spend: f64,
}

/// Spend for every channel in one state-week, one named field per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpend {
    #[serde(rename = "META")]
    pub meta: f64,
    #[serde(rename = "Instagram")]
    pub instagram: f64,
    #[serde(rename = "TikTok")]
    pub tiktok: f64,
    #[serde(rename = "Influencers")]
    pub influencers: f64,
    #[serde(rename = "OOH")]
    pub ooh: f64,
    #[serde(rename = "PR")]
    pub pr: f64,
}

impl ChannelSpend {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Meta        => self.meta,
            Channel::Instagram   => self.instagram,
            Channel::TikTok      => self.tiktok,
            Channel::Influencers => self.influencers,
            Channel::Ooh         => self.ooh,
            Channel::Pr          => self.pr,
        }
    }

    fn slot(&mut self, channel: Channel) -> &mut f64 {
        match channel {
            Channel::Meta        => &mut self.meta,
            Channel::Instagram   => &mut self.instagram,
            Channel::TikTok      => &mut self.tiktok,
            Channel::Influencers => &mut self.influencers,
            Channel::Ooh         => &mut self.ooh,
            Channel::Pr          => &mut self.pr,
        }
    }

    pub fn set(&mut self, channel: Channel, spend: f64) {
        *self.slot(channel) = spend;
    }

    pub fn total(&self) -> f64 {
        Channel::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// One regression-ready row: sales, shocks and every channel's spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub state: StateId,
    pub region: RegionId,
    pub week: WeekIndex,
    pub week_ending: NaiveDate,
    pub national_shock: f64,
    pub regional_shock: f64,
    pub state_shock: f64,
    pub sales: f64,
    pub spend: ChannelSpend,
}

/// Generate long-layout spend for every (state, week, channel), ordered by
/// state, then channel, then week.
pub fn generate_media(
    config: &SimConfig,
    panel: &Panel,
    week_count: usize,
    bank: &RngBank,
) -> Vec<MediaRecord> {
    let channels = &config.channels;
    let mut records = Vec::with_capacity(panel.state_count() * week_count * channels.len());

    for (state_idx, state) in panel.states().iter().enumerate() {
        for channel_cfg in channels {
            let unit = (state_idx * Channel::ALL.len() + channel_cfg.channel.index()) as u64;
            let mut rng = bank.for_unit(StageSlot::Media, unit);
            let series = spend_series(channel_cfg, week_count, &mut rng);
            records.extend(series.into_iter().enumerate().map(|(week, spend)| MediaRecord {
                state: state.clone(),
                week,
                channel: channel_cfg.channel,
                spend,
            }));
        }
        log::debug!("media: generated {} channels for {state}", channels.len());
    }

    log::info!(
        "media: {} records over {} states, {} weeks, {} channels",
        records.len(),
        panel.state_count(),
        week_count,
        channels.len()
    );
    records
}

fn spend_series(cfg: &ChannelConfig, week_count: usize, rng: &mut SubsystemRng) -> Vec<f64> {
    let level = cfg.base_spend * rng.uniform(0.5, 1.5);
    let slope = rng.uniform(-cfg.trend, cfg.trend);
    let mut fluctuation = 0.0;
    (0..week_count)
        .map(|t| {
            fluctuation = cfg.persistence * fluctuation + rng.normal(0.0, cfg.volatility);
            (level * (1.0 + slope * t as f64 + fluctuation)).max(0.0)
        })
        .collect()
}

/// Pivot long spend records into one row per (state, week), joined to the
/// sales table. Every sales row must receive exactly one value per channel.
pub fn to_wide(sales: &[SalesRecord], media: &[MediaRecord]) -> SimResult<Vec<WideRow>> {
    let mut index: HashMap<(&str, WeekIndex), usize> = HashMap::with_capacity(sales.len());
    let mut rows = Vec::with_capacity(sales.len());
    let mut filled: Vec<[bool; 6]> = Vec::with_capacity(sales.len());

    for (i, rec) in sales.iter().enumerate() {
        if index.insert((rec.state.as_str(), rec.week), i).is_some() {
            return Err(SimError::Reshape {
                state: rec.state.clone(),
                week: rec.week,
                detail: "duplicate sales row".into(),
            });
        }
        rows.push(WideRow {
            state: rec.state.clone(),
            region: rec.region.clone(),
            week: rec.week,
            week_ending: rec.week_ending,
            national_shock: rec.national_shock,
            regional_shock: rec.regional_shock,
            state_shock: rec.state_shock,
            sales: rec.sales,
            spend: ChannelSpend::default(),
        });
        filled.push([false; 6]);
    }

    for m in media {
        let Some(&row) = index.get(&(m.state.as_str(), m.week)) else {
            return Err(SimError::Reshape {
                state: m.state.clone(),
                week: m.week,
                detail: "spend has no matching sales row".into(),
            });
        };
        let seen = &mut filled[row][m.channel.index()];
        if *seen {
            return Err(SimError::Reshape {
                state: m.state.clone(),
                week: m.week,
                detail: format!("duplicate {} spend", m.channel),
            });
        }
        *seen = true;
        rows[row].spend.set(m.channel, m.spend);
    }

    for (row, seen) in rows.iter().zip(&filled) {
        if let Some(missing) = Channel::ALL.iter().find(|c| !seen[c.index()]) {
            return Err(SimError::Reshape {
                state: row.state.clone(),
                week: row.week,
                detail: format!("missing {missing} spend"),
            });
        }
    }

    Ok(rows)
}
