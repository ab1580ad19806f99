//! Shared primitive types used across the entire simulation.

/// Position of a week in the calendar. Week 0 is the first week-ending.
pub type WeekIndex = usize;

/// A state label, `S1..S{n}`.
pub type StateId = String;

/// A region label, `R1..R{k}`.
pub type RegionId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Build a fresh run identifier. Only used to label exports; it never
/// feeds the generators, so it does not affect reproducibility.
pub fn new_run_id(seed: u64) -> RunId {
    format!("run-{seed}-{}", uuid::Uuid::new_v4().simple())
}
