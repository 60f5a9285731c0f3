//! Simulation strategy, configuration and state types.
//!
//! Every strategy runs the same tick; they differ only in how many ticks an
//! [`Simulation::advance`](crate::engine::Simulation::advance) call runs and
//! with which delta time.

use crate::grid::GridPosition;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};

/// Tick counter type.
pub type Ticks = u64;

// ---------------------------------------------------------------------------
// Strategy and configuration
// ---------------------------------------------------------------------------

/// How `advance` turns elapsed frame time into ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum SimulationStrategy {
    /// One tick per call, using the frame time as the delta.
    #[default]
    Variable,

    /// Frame time is accumulated and as many ticks of `timestep` seconds run
    /// as fit; the remainder carries over to the next call.
    Fixed { timestep: f64 },
}

/// Construction-time settings for a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub strategy: SimulationStrategy,
    /// Ring buffer capacity per event kind.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            strategy: SimulationStrategy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    /// Ticks completed so far.
    pub tick: Ticks,
    /// Simulated seconds across all completed ticks.
    pub elapsed: f64,
    /// Unspent frame time in fixed-step mode.
    pub accumulator: f64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tick reports
// ---------------------------------------------------------------------------

/// A directional hand-off from one node to its neighbour.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub from: GridPosition,
    pub to: GridPosition,
    pub item: ItemId,
    pub amount: f64,
}

/// A portion routed into the global pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispersal {
    pub from: GridPosition,
    pub item: ItemId,
    pub amount: f64,
}

/// What moved during one tick. Deliveries are listed only when the
/// neighbour accepted a positive amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub tick: Ticks,
    pub deliveries: Vec<Delivery>,
    pub dispersals: Vec<Dispersal>,
}

impl StepReport {
    pub fn new(tick: Ticks) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn delivered_total(&self) -> f64 {
        self.deliveries.iter().map(|d| d.amount).sum()
    }

    pub fn dispersed_total(&self) -> f64 {
        self.dispersals.iter().map(|d| d.amount).sum()
    }
}

/// Result of an `advance` call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    pub steps_run: u64,
    /// One report per tick run, oldest first.
    pub reports: Vec<StepReport>,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit) hash of simulation state for determinism checks.
/// Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write(s.as_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
