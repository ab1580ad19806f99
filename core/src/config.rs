use crate::{
    arima::{ArimaSpec, MAX_DIFFERENCING},
    calendar::Calendar,
    error::{SimError, SimResult},
    ground_truth::MediaEffect,
    media::Channel,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Relative importance of each shock level in the sales formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShockWeights {
    pub national: f64,
    pub regional: f64,
    pub state: f64,
}

impl Default for ShockWeights {
    fn default() -> Self {
        Self { national: 5.0, regional: 3.0, state: 1.0 }
    }
}

/// ARIMA parameters per shock level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArimaLevels {
    pub national: ArimaSpec,
    pub regional: ArimaSpec,
    pub state: ArimaSpec,
}

impl Default for ArimaLevels {
    fn default() -> Self {
        Self {
            // Long-horizon macro drift: integrated, so it wanders.
            national: ArimaSpec::new(0.9, 0.2, 1),
            regional: ArimaSpec::new(0.5, 0.5, 0),
            state:    ArimaSpec::new(0.7, 0.25, 0),
        }
    }
}

/// Spend-generation parameters and ground-truth effect for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel: Channel,
    /// Typical weekly spend per state.
    pub base_spend: f64,
    /// Maximum absolute fractional drift per week.
    pub trend: f64,
    /// Standard deviation of the fractional fluctuation innovations.
    pub volatility: f64,
    /// AR(1) coefficient of the fluctuation.
    pub persistence: f64,
    /// Incremental sales per unit of spend.
    pub coefficient: f64,
}

impl ChannelConfig {
    fn new(
        channel: Channel,
        base_spend: f64,
        trend: f64,
        volatility: f64,
        persistence: f64,
        coefficient: f64,
    ) -> Self {
        Self { channel, base_spend, trend, volatility, persistence, coefficient }
    }
}

pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new(Channel::Meta,        20_000.0, 0.004, 0.15, 0.6, 2.5),
        ChannelConfig::new(Channel::Instagram,   15_000.0, 0.003, 0.20, 0.5, 1.8),
        ChannelConfig::new(Channel::TikTok,      10_000.0, 0.006, 0.25, 0.4, 1.2),
        ChannelConfig::new(Channel::Influencers,  8_000.0, 0.002, 0.30, 0.3, 0.9),
        ChannelConfig::new(Channel::Ooh,         12_000.0, 0.001, 0.10, 0.8, 0.6),
        ChannelConfig::new(Channel::Pr,           5_000.0, 0.000, 0.35, 0.2, 0.4),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    pub state_count: usize,
    pub region_count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub baseline: f64,
    pub scale: f64,
    pub weights: ShockWeights,
    pub arima: ArimaLevels,
    pub channels: Vec<ChannelConfig>,
    pub media_effect: MediaEffect,
}

#[derive(Debug, Clone, Deserialize)]
struct SimulationFile {
    seed: u64,
    state_count: usize,
    region_count: usize,
    start_date: NaiveDate,
    end_date: NaiveDate,
    baseline: f64,
    scale: f64,
    weights: ShockWeights,
    arima: ArimaLevels,
    #[serde(default)]
    media_effect: MediaEffect,
}

#[derive(Debug, Clone, Deserialize)]
struct ChannelsFile {
    channels: Vec<ChannelConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 123,
            state_count: 50,
            region_count: 5,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 28).unwrap_or_default(),
            baseline: 1_000_000.0,
            scale: 10_000.0,
            weights: ShockWeights::default(),
            arima: ArimaLevels::default(),
            channels: default_channels(),
            media_effect: MediaEffect::Excluded,
        }
    }
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default() or SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let sim_path = format!("{data_dir}/simulation.json");
        let sim_content = std::fs::read_to_string(&sim_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {sim_path}: {e}"))?;
        let sim: SimulationFile = serde_json::from_str(&sim_content)?;

        let channels_path = format!("{data_dir}/media/channels.json");
        let channels_content = std::fs::read_to_string(&channels_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {channels_path}: {e}"))?;
        let channels_file: ChannelsFile = serde_json::from_str(&channels_content)?;

        let config = Self {
            seed: sim.seed,
            state_count: sim.state_count,
            region_count: sim.region_count,
            start_date: sim.start_date,
            end_date: sim.end_date,
            baseline: sim.baseline,
            scale: sim.scale,
            weights: sim.weights,
            arima: sim.arima,
            channels: channels_file.channels,
            media_effect: sim.media_effect,
        };
        config.validate()?;
        Ok(config)
    }

    /// Small panel for fast unit tests: 6 states, 3 regions, 20 weeks.
    pub fn default_test() -> Self {
        Self {
            state_count: 6,
            region_count: 3,
            end_date: NaiveDate::from_ymd_opt(2023, 5, 14).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::weekly(self.start_date, self.end_date)
    }

    pub fn channel(&self, channel: Channel) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    /// Reject anything that would make generation meaningless.
    /// Runs before any random draw.
    pub fn validate(&self) -> SimResult<()> {
        if self.state_count == 0 {
            return Err(invalid("state_count must be at least 1"));
        }
        if self.region_count == 0 {
            return Err(invalid("region_count must be at least 1"));
        }
        if self.end_date < self.start_date {
            return Err(invalid(format!(
                "end_date {} precedes start_date {}",
                self.end_date, self.start_date
            )));
        }
        if self.calendar().is_empty() {
            return Err(invalid(format!(
                "no week-ending Sunday between {} and {}",
                self.start_date, self.end_date
            )));
        }
        if !self.baseline.is_finite() {
            return Err(invalid("baseline must be finite"));
        }
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(invalid(format!("scale must be finite and >= 0, got {}", self.scale)));
        }
        let w = &self.weights;
        if ![w.national, w.regional, w.state].iter().all(|v| v.is_finite()) {
            return Err(invalid("shock weights must be finite"));
        }

        for (level, spec) in [
            ("national", &self.arima.national),
            ("regional", &self.arima.regional),
            ("state", &self.arima.state),
        ] {
            if !spec.ar.is_finite() || !spec.ma.is_finite() {
                return Err(invalid(format!("{level} ARIMA coefficients must be finite")));
            }
            if !spec.sigma.is_finite() || spec.sigma <= 0.0 {
                return Err(invalid(format!("{level} ARIMA sigma must be > 0")));
            }
            if spec.d > MAX_DIFFERENCING {
                return Err(invalid(format!(
                    "{level} differencing order {} exceeds {MAX_DIFFERENCING}",
                    spec.d
                )));
            }
        }

        if self.channels.len() != Channel::ALL.len() {
            return Err(invalid(format!(
                "expected {} channels, got {}",
                Channel::ALL.len(),
                self.channels.len()
            )));
        }
        for channel in Channel::ALL {
            let count = self.channels.iter().filter(|c| c.channel == channel).count();
            if count != 1 {
                return Err(invalid(format!("channel {channel} configured {count} times")));
            }
        }
        for c in &self.channels {
            let params = [c.base_spend, c.trend, c.volatility, c.persistence, c.coefficient];
            if !params.iter().all(|v| v.is_finite()) {
                return Err(invalid(format!("channel {} has non-finite parameters", c.channel)));
            }
            if c.base_spend < 0.0 || c.trend < 0.0 || c.volatility < 0.0 {
                return Err(invalid(format!(
                    "channel {} spend parameters must be non-negative",
                    c.channel
                )));
            }
            if c.persistence.abs() >= 1.0 {
                return Err(invalid(format!(
                    "channel {} persistence must lie in (-1, 1)",
                    c.channel
                )));
            }
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> SimError {
    SimError::Config(msg.into())
}
