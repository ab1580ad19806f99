//! Seeded synthetic panel for media mix modeling.
//!
//! One pass builds a state/region panel over weekly dates, draws a
//! national/regional/state ARIMA shock hierarchy, turns it into state-week
//! sales, generates spend for six channels and fits OLS to check whether
//! known channel coefficients come back out. See `pipeline` for the stage
//! order.

pub mod arima;
pub mod calendar;
pub mod config;
pub mod error;
pub mod estimator;
pub mod event;
pub mod ground_truth;
pub mod media;
pub mod panel;
pub mod pipeline;
pub mod rng;
pub mod sales;
pub mod shocks;
pub mod store;
pub mod types;
