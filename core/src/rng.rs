//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed on the SimConfig.
//!
//! Each pipeline stage gets its own RNG stream, seeded deterministically
//! from (master_seed XOR stage_slot). Stages that generate one series per
//! unit (region, state, state×channel) further split their stream by unit
//! index. This means:
//!   - Adding a new stage never changes existing stages' streams.
//!   - Each unit's series is fully reproducible in isolation.
//!   - Drawing order inside one unit never shifts another unit's draws.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64Mcg;

const SLOT_MIX: u64 = 0x9e37_79b9_7f4a_7c15;
const UNIT_MIX: u64 = 0xbf58_476d_1ce4_e5b9;

/// A named, deterministic RNG for a single stage or unit.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create an RNG from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ slot_index.wrapping_mul(SLOT_MIX);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a float uniformly in [low, high).
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Draw from N(mean, sd²). `sd` must be finite and non-negative;
    /// callers validate it through SimConfig before generation.
    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        match Normal::new(mean, sd) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => f64::NAN,
        }
    }
}

/// All RNG streams for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stage(&self, slot: StageSlot) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }

    /// Independent stream for one unit (region, state, ...) of a stage.
    pub fn for_unit(&self, slot: StageSlot, unit_index: u64) -> SubsystemRng {
        let unit_seed = self.master_seed ^ (unit_index + 1).wrapping_mul(UNIT_MIX);
        SubsystemRng::new(unit_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stage slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stage's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StageSlot {
    Panel = 0,
    NationalShock = 1,
    RegionalShock = 2,
    StateShock = 3,
    Media = 4,
    // Add new stages here — append only.
}

impl StageSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Panel => "panel",
            Self::NationalShock => "national_shock",
            Self::RegionalShock => "regional_shock",
            Self::StateShock => "state_shock",
            Self::Media => "media",
        }
    }
}
