//! Estimator — pooled ordinary least squares of sales on media spend.
//!
//! The design matrix has an intercept, one column per channel and,
//! optionally, the three shock columns as controls. The fit goes through an
//! SVD of the design so a rank-deficient matrix (collinear spend, constant
//! columns) is detected instead of producing garbage coefficients.

use crate::{
    error::{SimError, SimResult},
    ground_truth::{GroundTruth, MediaEffect},
    media::{Channel, WideRow},
};
use nalgebra::{DMatrix, DVector, SVD};
use serde::{Deserialize, Serialize};

/// Singular values below `s_max * RANK_TOLERANCE` count as zero.
pub const RANK_TOLERANCE: f64 = 1e-10;

/// A fit with `rss <= EXACT_FIT_TOLERANCE * tss` reproduces the response
/// up to rounding; its standard errors measure floating-point noise.
pub const EXACT_FIT_TOLERANCE: f64 = 1e-20;

/// Smallest relative gap between estimate and truth that ever counts as a
/// miss, whatever the standard error.
pub const COMPARISON_FLOOR: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorOptions {
    /// Add national, regional and state shocks as regressors.
    pub include_shock_controls: bool,
}

/// Raw OLS solution for an arbitrary design.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub beta: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub r_squared: f64,
    pub residual_std_error: f64,
    pub observations: usize,
    pub degrees_of_freedom: usize,
    /// Residuals are rounding noise relative to the response's spread.
    pub exact_fit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientEstimate {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelComparison {
    pub channel: Channel,
    /// Coefficient configured for the channel.
    pub configured: f64,
    /// Coefficient the simulated sales actually carry (0 when excluded).
    pub truth: f64,
    pub estimate: f64,
    pub std_error: f64,
    pub abs_error: f64,
    pub within_two_se: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationReport {
    pub media_effect: MediaEffect,
    pub options: EstimatorOptions,
    pub observations: usize,
    pub degrees_of_freedom: usize,
    pub r_squared: f64,
    pub residual_std_error: f64,
    /// t-statistics are not meaningful when set.
    pub exact_fit: bool,
    pub coefficients: Vec<CoefficientEstimate>,
    pub comparison: Vec<ChannelComparison>,
}

impl EstimationReport {
    pub fn estimate(&self, term: &str) -> Option<&CoefficientEstimate> {
        self.coefficients.iter().find(|c| c.term == term)
    }

    pub fn channel(&self, channel: Channel) -> Option<&ChannelComparison> {
        self.comparison.iter().find(|c| c.channel == channel)
    }
}

pub struct Estimator {
    options: EstimatorOptions,
}

impl Estimator {
    pub fn new(options: EstimatorOptions) -> Self {
        Self { options }
    }

    pub fn terms(&self) -> Vec<String> {
        let mut terms = vec!["intercept".to_string()];
        terms.extend(Channel::ALL.iter().map(|c| c.label().to_string()));
        if self.options.include_shock_controls {
            terms.extend(["national_shock", "regional_shock", "state_shock"].map(String::from));
        }
        terms
    }

    pub fn fit(&self, rows: &[WideRow], truth: &GroundTruth) -> SimResult<EstimationReport> {
        let terms = self.terms();
        let p = terms.len();
        let controls = self.options.include_shock_controls;

        let design = DMatrix::from_fn(rows.len(), p, |i, j| {
            let row = &rows[i];
            match j {
                0 => 1.0,
                j if j <= Channel::ALL.len() => row.spend.get(Channel::ALL[j - 1]),
                7 if controls => row.national_shock,
                8 if controls => row.regional_shock,
                _ => row.state_shock,
            }
        });
        let response = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.sales));

        let fit = ols(&design, &response)?;

        let coefficients: Vec<CoefficientEstimate> = terms
            .into_iter()
            .zip(fit.beta.iter().zip(&fit.std_errors))
            .map(|(term, (&estimate, &std_error))| CoefficientEstimate {
                term,
                estimate,
                std_error,
                t_stat: estimate / std_error,
            })
            .collect();

        let comparison = Channel::ALL
            .iter()
            .map(|&channel| {
                let est = &coefficients[channel.index() + 1];
                let expected = truth.effective_coefficient(channel);
                let abs_error = (est.estimate - expected).abs();
                ChannelComparison {
                    channel,
                    configured: truth.coefficient(channel),
                    truth: expected,
                    estimate: est.estimate,
                    std_error: est.std_error,
                    abs_error,
                    within_two_se: within_two_se(abs_error, est.std_error, expected),
                }
            })
            .collect();

        if fit.exact_fit {
            log::warn!("estimator: design reproduces sales exactly; t-statistics are rounding noise");
        }
        log::info!(
            "estimator: n={} p={p} r2={:.4} sigma={:.2}",
            fit.observations,
            fit.r_squared,
            fit.residual_std_error
        );

        Ok(EstimationReport {
            media_effect: truth.media_effect,
            options: self.options,
            observations: fit.observations,
            degrees_of_freedom: fit.degrees_of_freedom,
            r_squared: fit.r_squared,
            residual_std_error: fit.residual_std_error,
            exact_fit: fit.exact_fit,
            coefficients,
            comparison,
        })
    }
}

/// An estimate agrees with the truth when it lies within two standard
/// errors, or within a relative floor that absorbs rounding on exact fits.
pub fn within_two_se(abs_error: f64, std_error: f64, truth: f64) -> bool {
    abs_error <= (2.0 * std_error).max(COMPARISON_FLOOR * truth.abs().max(1.0))
}

/// Least squares solution of `design * beta = response` with classical
/// standard errors.
pub fn ols(design: &DMatrix<f64>, response: &DVector<f64>) -> SimResult<OlsFit> {
    let (n, p) = design.shape();
    if response.len() != n {
        return Err(SimError::Estimation(format!(
            "response has {} rows, design has {n}",
            response.len()
        )));
    }
    if p == 0 || n <= p {
        return Err(SimError::Estimation(format!(
            "need more observations ({n}) than parameters ({p})"
        )));
    }
    if design.iter().chain(response.iter()).any(|v| !v.is_finite()) {
        return Err(SimError::Estimation("non-finite value in regression input".into()));
    }

    let svd = SVD::new(design.clone(), true, true);
    let u = svd
        .u
        .as_ref()
        .ok_or_else(|| SimError::Estimation("SVD did not produce U".into()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| SimError::Estimation("SVD did not produce V".into()))?;
    let s = &svd.singular_values;

    let s_max = s.iter().fold(0.0_f64, |m, v| m.max(*v));
    let tol = s_max * RANK_TOLERANCE;
    let rank = s.iter().filter(|v| **v > tol).count();
    if s_max <= 0.0 || rank < p {
        return Err(SimError::Estimation(format!(
            "design matrix is rank deficient (rank {rank} < {p} parameters); regressors are collinear"
        )));
    }

    // beta = V diag(1/s) U^T y
    let uty = u.transpose() * response;
    let scaled = DVector::from_iterator(p, uty.iter().zip(s.iter()).map(|(a, sv)| a / sv));
    let beta = v_t.transpose() * scaled;

    let residuals = response - design * &beta;
    let rss = residuals.norm_squared();
    let mean = response.mean();
    let tss: f64 = response.iter().map(|y| (y - mean).powi(2)).sum();
    let df = n - p;
    let sigma2 = rss / df as f64;

    // diag((X'X)^-1) = diag(V diag(1/s^2) V^T)
    let std_errors = (0..p)
        .map(|j| {
            let var: f64 = (0..p).map(|k| (v_t[(k, j)] / s[k]).powi(2)).sum();
            (sigma2 * var).sqrt()
        })
        .collect();

    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
    let exact_fit = rss <= EXACT_FIT_TOLERANCE * tss;

    Ok(OlsFit {
        beta: beta.iter().copied().collect(),
        std_errors,
        r_squared,
        residual_std_error: sigma2.sqrt(),
        observations: n,
        degrees_of_freedom: df,
        exact_fit,
    })
}
