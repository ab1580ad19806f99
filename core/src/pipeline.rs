//! The simulation pipeline — one seeded pass from config to tables.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Panel builder      (StageSlot::Panel)
//!   2. Shock generator    (NationalShock, RegionalShock, StateShock)
//!   3. Sales synthesizer  (no randomness)
//!   4. Media generator    (StageSlot::Media)
//!   5. Ground truth       (folds media into sales when additive)
//!   6. Estimator          (on demand, via SimRun::estimate)
//!
//! RULES:
//!   - Config is validated before the first random draw.
//!   - All randomness flows through the RngBank.
//!   - Every stage records one event in the run's log.

use crate::{
    calendar::Calendar,
    config::SimConfig,
    error::SimResult,
    estimator::{EstimationReport, Estimator, EstimatorOptions},
    event::SimEvent,
    ground_truth::{apply_media_effect, GroundTruth},
    media::{generate_media, to_wide, MediaRecord, WideRow},
    panel::Panel,
    rng::{RngBank, StageSlot},
    sales::{regional_rollup, synthesize_sales, RollupRow, SalesRecord},
    shocks::ShockSet,
};

pub struct SimPipeline {
    config: SimConfig,
    rng_bank: RngBank,
    events: Vec<SimEvent>,
}

impl SimPipeline {
    /// Fails fast with `SimError::Config` on an invalid config.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            rng_bank: RngBank::new(config.seed),
            config,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run stages 1–5 in order.
    pub fn run(mut self) -> SimResult<SimRun> {
        let calendar = self.config.calendar();
        let weeks = calendar.len();
        self.events.push(SimEvent::RunInitialized {
            seed: self.config.seed,
            weeks,
            media_effect: self.config.media_effect,
        });

        // 1. Panel
        let mut rng = self.rng_bank.for_stage(StageSlot::Panel);
        let panel = Panel::build(&self.config, &mut rng)?;
        self.events.push(SimEvent::PanelBuilt {
            states: panel.state_count(),
            regions: panel.region_count(),
            members: panel
                .regions()
                .iter()
                .map(|r| (r.clone(), panel.members(r).len()))
                .collect(),
        });

        // 2. Shocks
        let shocks = ShockSet::generate(&self.config, &panel, weeks, &self.rng_bank)?;
        self.events.push(SimEvent::ShocksGenerated {
            weeks,
            national_first: shocks.national.first().copied().unwrap_or_default(),
            national_last: shocks.national.last().copied().unwrap_or_default(),
            regional_series: shocks.regional.len(),
            state_series: shocks.state.len(),
        });

        // 3. Sales
        let mut sales = synthesize_sales(&self.config, &panel, &calendar, &shocks)?;
        self.events.push(sales_event(&sales));

        // 4. Media
        let media = generate_media(&self.config, &panel, weeks, &self.rng_bank);
        self.events.push(SimEvent::MediaGenerated {
            records: media.len(),
            total_spend: media.iter().map(|m| m.spend).sum(),
        });

        // 5. Ground truth
        let truth = GroundTruth::from_config(&self.config);
        apply_media_effect(&truth, &mut sales, &media)?;
        self.events.push(SimEvent::MediaEffectApplied {
            media_effect: truth.media_effect,
            total_contribution: sales.iter().map(|s| s.media_contribution).sum(),
        });

        log::info!(
            "pipeline: seed={} produced {} sales and {} media records",
            self.config.seed,
            sales.len(),
            media.len()
        );

        Ok(SimRun {
            config: self.config,
            calendar,
            panel,
            shocks,
            truth,
            sales,
            media,
            events: self.events,
        })
    }
}

/// Convenience: validate, run, return the tables.
pub fn simulate(config: SimConfig) -> SimResult<SimRun> {
    SimPipeline::new(config)?.run()
}

fn sales_event(sales: &[SalesRecord]) -> SimEvent {
    let n = sales.len();
    let (min, max, sum) = sales.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(lo, hi, acc), r| (lo.min(r.sales), hi.max(r.sales), acc + r.sales),
    );
    SimEvent::SalesSynthesized {
        records: n,
        mean_sales: if n > 0 { sum / n as f64 } else { 0.0 },
        min_sales: if n > 0 { min } else { 0.0 },
        max_sales: if n > 0 { max } else { 0.0 },
    }
}

/// Everything one pipeline pass produced, held in memory.
#[derive(Debug, Clone)]
pub struct SimRun {
    pub config: SimConfig,
    pub calendar: Calendar,
    pub panel: Panel,
    pub shocks: ShockSet,
    pub truth: GroundTruth,
    pub sales: Vec<SalesRecord>,
    pub media: Vec<MediaRecord>,
    pub events: Vec<SimEvent>,
}

impl SimRun {
    /// (region, week, summed sales), ordered by region then week.
    pub fn regional_rollup(&self) -> Vec<RollupRow> {
        regional_rollup(&self.panel, &self.calendar, &self.sales)
    }

    /// One row per (state, week) with sales and each channel's spend.
    pub fn wide_table(&self) -> SimResult<Vec<WideRow>> {
        to_wide(&self.sales, &self.media)
    }

    /// Stage 6: fit OLS on the wide table and compare with ground truth.
    pub fn estimate(&mut self, options: EstimatorOptions) -> SimResult<EstimationReport> {
        let rows = self.wide_table()?;
        let report = Estimator::new(options).fit(&rows, &self.truth)?;
        self.events.push(SimEvent::ModelFitted {
            observations: report.observations,
            parameters: report.coefficients.len(),
            r_squared: report.r_squared,
        });
        Ok(report)
    }
}
