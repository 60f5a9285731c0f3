//! Manaflow Core -- the production-and-flow engine for a grid-based
//! factory game.
//!
//! Nodes sit on an unbounded integer grid. Each node consumes input flows at
//! fixed rates, accumulates outputs, and routes those outputs to its grid
//! neighbours or into a shared global pool according to a five-bit
//! [`direction::DirectionMask`].
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Simulation::step`] resolves every node once, in
//! placement order:
//!
//! 1. **Produce** -- the node checks starvation and backpressure, then
//!    consumes inputs and queues one tick of output.
//! 2. **Split** -- each candidate output is divided evenly across its active
//!    directions.
//! 3. **Route** -- directional portions are offered to neighbours (which may
//!    accept part of them); disperse portions merge into the global pool.
//! 4. **Commit** -- the node's backlog is reduced by what actually moved.
//!
//! Buffered events are delivered to subscribers at the end of the step.
//!
//! # Key Types
//!
//! - [`engine::Simulation`] -- owns the nodes, position index and pool.
//! - [`node::ProductionNode`] -- input/output slots and the per-tick rules.
//! - [`flow::FlowUnit`] -- a quantity of one item with a rate cap and routing.
//! - [`grid::SparseGrid`] -- coordinate-keyed lookup used for neighbours.
//! - [`pool::GlobalPool`] -- resources not tied to any grid cell.
//! - [`blueprint::BoxExtraction`] -- boundary analysis of a rectangular region.

pub mod blueprint;
pub mod direction;
pub mod engine;
pub mod event;
pub mod flow;
pub mod grid;
pub mod id;
pub mod item;
pub mod node;
pub mod pool;
pub mod query;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
