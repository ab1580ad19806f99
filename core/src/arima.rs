//! ARIMA(1,d,1) realizations used as correlated shock generators.
//!
//! The process is only ever simulated, never fitted:
//!
//! ```text
//! y_t = ar * y_{t-1} + e_t + ma * e_{t-1},   e_t ~ N(0, sigma^2)
//! ```
//!
//! run for `BURN_IN` warm-up steps that are discarded, then cumulatively
//! summed `d` times. Integrated output is left exactly as produced; its
//! spread grows with the series length.

use crate::rng::SubsystemRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Warm-up steps discarded so the ARMA part starts near its stationary law.
pub const BURN_IN: usize = 100;

/// Highest differencing order accepted by configuration.
pub const MAX_DIFFERENCING: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArimaSpec {
    pub ar: f64,
    pub ma: f64,
    /// Differencing (integration) order.
    pub d: u32,
    /// Innovation standard deviation.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
}

fn default_sigma() -> f64 {
    1.0
}

#[derive(Debug, Error, PartialEq)]
pub enum ArimaFailure {
    #[error("AR coefficient {0} is outside (-1, 1); the ARMA part does not converge")]
    NonStationary(f64),

    #[error("value at week {0} is not finite")]
    NonFinite(usize),
}

impl ArimaSpec {
    pub fn new(ar: f64, ma: f64, d: u32) -> Self {
        Self { ar, ma, d, sigma: 1.0 }
    }

    pub fn is_integrated(&self) -> bool {
        self.d > 0
    }

    /// Draw one realization of length `n`.
    pub fn simulate(&self, n: usize, rng: &mut SubsystemRng) -> Result<Vec<f64>, ArimaFailure> {
        if !(self.ar.abs() < 1.0) {
            return Err(ArimaFailure::NonStationary(self.ar));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity(n);
        let mut y_prev = 0.0;
        let mut e_prev = 0.0;
        for t in 0..BURN_IN + n {
            let e = rng.normal(0.0, self.sigma);
            let y = self.ar * y_prev + e + self.ma * e_prev;
            if t >= BURN_IN {
                out.push(y);
            }
            y_prev = y;
            e_prev = e;
        }

        for _ in 0..self.d {
            integrate(&mut out);
        }

        match out.iter().position(|v| !v.is_finite()) {
            Some(week) => Err(ArimaFailure::NonFinite(week)),
            None => Ok(out),
        }
    }
}

/// In-place cumulative sum.
fn integrate(series: &mut [f64]) {
    let mut acc = 0.0;
    for v in series.iter_mut() {
        acc += *v;
        *v = acc;
    }
}
