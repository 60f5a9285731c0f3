//! Flow units: a quantity of one item moving in a set of directions.
//!
//! The same type serves as a node's slot (where `queued` is the slot's
//! backlog and `rate` its per-second cap) and as the transient portion the
//! tick resolver hands to a neighbour. Derivation methods return new values;
//! only the owning node mutates a slot.

use crate::direction::DirectionMask;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowUnit {
    pub item: ItemId,
    /// Throughput cap, in units per second.
    pub rate: f64,
    /// Amount currently held. Never negative.
    #[serde(default)]
    pub queued: f64,
    pub directions: DirectionMask,
}

impl FlowUnit {
    /// An empty slot. Negative rates are clamped to zero.
    pub fn new(item: impl Into<ItemId>, rate: f64, directions: DirectionMask) -> Self {
        Self {
            item: item.into(),
            rate: rate.max(0.0),
            queued: 0.0,
            directions,
        }
    }

    /// Same item, rate and directions carrying `queued`.
    pub fn with_quantity(&self, queued: f64) -> Self {
        Self {
            item: self.item.clone(),
            rate: self.rate,
            queued,
            directions: self.directions,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        self.with_quantity(self.queued * factor)
    }

    pub fn retargeted(&self, directions: DirectionMask) -> Self {
        Self {
            directions,
            ..self.clone()
        }
    }

    pub fn rotated(&self, times: u32) -> Self {
        self.retargeted(self.directions.rotated(times))
    }

    pub fn flipped(&self) -> Self {
        self.retargeted(self.directions.flipped())
    }

    /// Amount this slot moves in one tick of `delta_time` seconds.
    pub fn per_tick(&self, delta_time: f64) -> f64 {
        self.rate * delta_time
    }
}

impl fmt::Display for FlowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:.1}:{}", self.item, self.queued, self.directions)
    }
}
