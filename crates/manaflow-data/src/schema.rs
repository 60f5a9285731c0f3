//! On-disk structs for node templates and scenes.
//!
//! These are deserialized from RON, JSON or TOML and then resolved into
//! engine types by [`crate::library`] and [`crate::scene`]. Item `"Any"` is
//! the wildcard; directions are bitflag strings such as `"LEFT | DISPERSE"`.

use manaflow_core::direction::DirectionMask;
use manaflow_core::sim::SimConfig;
use serde::Deserialize;

// ===========================================================================
// Templates
// ===========================================================================

/// One input or output slot of a template.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotData {
    pub item: String,
    pub rate: f64,
    pub directions: DirectionMask,
    /// Starting backlog; templates normally start empty.
    #[serde(default)]
    pub queued: f64,
}

/// A named, placeable node definition.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<SlotData>,
    #[serde(default)]
    pub outputs: Vec<SlotData>,
}

// ===========================================================================
// Scenes
// ===========================================================================

/// A template placed at a cell, optionally rotated.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementData {
    pub template: String,
    pub x: i32,
    pub y: i32,
    /// Quarter turns, LEFT -> UP -> RIGHT -> DOWN.
    #[serde(default)]
    pub rotations: u32,
}

/// An initial amount in the global pool.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolSeed {
    pub item: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub placements: Vec<PlacementData>,
    #[serde(default)]
    pub pool: Vec<PoolSeed>,
}

// ===========================================================================
// Tests
// ===========================================================================
