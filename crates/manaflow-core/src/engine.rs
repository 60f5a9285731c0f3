//! The simulation aggregate: owns every placed node, the position index and
//! the global pool, and runs the tick resolver.
//!
//! # Architecture
//!
//! The `Simulation` owns:
//! - A slotmap of [`ProductionNode`]s keyed by [`NodeId`]
//! - The placement order, which is also the resolution order within a tick
//! - A [`SparseGrid`] from cell to `NodeId`, used for neighbour lookup
//! - The [`GlobalPool`]
//! - Per-node status from the previous tick (for stall/resume events)
//! - A [`SimState`] and [`SimulationStrategy`]
//! - An [`EventBus`] for typed simulation events
//!
//! Nodes are resolved one at a time. A node's neighbours are read and
//! written while it is being resolved, so a neighbour that runs later in the
//! same tick already sees what was delivered to it. Resolution order is
//! therefore observable; it is fixed as placement order (oldest first).

use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::flow::FlowUnit;
use crate::grid::{GridPosition, SparseGrid};
use crate::id::NodeId;
use crate::item::ItemId;
use crate::node::{NodeStatus, Production, ProductionNode};
use crate::pool::GlobalPool;
use crate::query::NodeView;
use crate::sim::{
    AdvanceResult, Delivery, Dispersal, SimConfig, SimState, SimulationStrategy, StateHash,
    StepReport, Ticks,
};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Errors from editing the grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("cell {position} is already occupied")]
    Occupied { position: GridPosition },
    #[error("no node at {position}")]
    Vacant { position: GridPosition },
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Simulation {
    pub(crate) nodes: SlotMap<NodeId, ProductionNode>,

    /// Resolution order. Appended on place, pruned on remove.
    pub(crate) order: Vec<NodeId>,

    pub(crate) grid: SparseGrid<NodeId>,

    pub(crate) pool: GlobalPool,

    /// Status each node had on its most recent tick.
    statuses: SecondaryMap<NodeId, NodeStatus>,

    strategy: SimulationStrategy,

    pub sim_state: SimState,

    paused: bool,

    pub event_bus: EventBus,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            grid: SparseGrid::new(),
            pool: GlobalPool::new(),
            statuses: SecondaryMap::new(),
            strategy: config.strategy,
            sim_state: SimState::new(),
            paused: false,
            event_bus: EventBus::new(config.event_capacity),
        }
    }

    // -----------------------------------------------------------------------
    // Grid editing
    // -----------------------------------------------------------------------

    /// Place a copy of `template`, rotated by `rotations` quarter turns, at
    /// `position`. Fails without touching anything if the cell is taken.
    pub fn place(
        &mut self,
        position: GridPosition,
        template: &ProductionNode,
        rotations: u32,
    ) -> Result<NodeId, SimError> {
        let mut node = template.rotated(rotations);
        node.position = position;
        let id = self.nodes.insert(node);
        if !self.grid.add(position, id) {
            self.nodes.remove(id);
            return Err(SimError::Occupied { position });
        }
        self.order.push(id);

        debug!(%position, rotations, "node placed");
        self.event_bus.emit(Event::NodePlaced {
            node: id,
            position,
            tick: self.sim_state.tick,
        });
        Ok(id)
    }

    /// Remove the node at `position`, returning it.
    pub fn remove(&mut self, position: GridPosition) -> Option<ProductionNode> {
        let id = self.grid.take(position)?;
        self.order.retain(|&other| other != id);
        self.statuses.remove(id);
        let node = self.nodes.remove(id)?;

        debug!(%position, "node removed");
        self.event_bus.emit(Event::NodeRemoved {
            node: id,
            position,
            tick: self.sim_state.tick,
        });
        Some(node)
    }

    /// Rotate an already placed node in place. Queued amounts are kept.
    pub fn rotate(&mut self, position: GridPosition, times: u32) -> Result<(), SimError> {
        let node = self
            .grid
            .get(position)
            .and_then(|&id| self.nodes.get_mut(id))
            .ok_or(SimError::Vacant { position })?;
        *node = node.rotated(times);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn node_id_at(&self, position: GridPosition) -> Option<NodeId> {
        self.grid.get(position).copied()
    }

    pub fn node_at(&self, position: GridPosition) -> Option<&ProductionNode> {
        self.node_id_at(position).and_then(|id| self.nodes.get(id))
    }

    pub fn node(&self, id: NodeId) -> Option<&ProductionNode> {
        self.nodes.get(id)
    }

    /// Status from the node's most recent tick.
    pub fn status(&self, id: NodeId) -> Option<NodeStatus> {
        self.statuses.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids in resolution order.
    pub fn placement_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Placed nodes in resolution order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ProductionNode)> {
        self.order
            .iter()
            .filter_map(|&id| self.nodes.get(id).map(|node| (id, node)))
    }

    /// Owned snapshot of the node at `position`, for inspection.
    pub fn peek(&self, position: GridPosition) -> Option<NodeView> {
        let id = self.node_id_at(position)?;
        let node = self.nodes.get(id)?;
        Some(NodeView::new(id, node, self.status(id)))
    }

    // -----------------------------------------------------------------------
    // Pool
    // -----------------------------------------------------------------------

    pub fn pool(&self) -> &GlobalPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut GlobalPool {
        &mut self.pool
    }

    pub fn pool_summary(&self) -> BTreeMap<ItemId, f64> {
        self.pool.summary()
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    /// Deliver events buffered outside a step, such as placements made
    /// between ticks.
    pub fn deliver_events(&mut self) {
        self.event_bus.deliver();
    }

    // -----------------------------------------------------------------------
    // Strategy / pause
    // -----------------------------------------------------------------------

    pub fn strategy(&self) -> &SimulationStrategy {
        &self.strategy
    }

    /// Switch strategy. Any fixed-step remainder is discarded.
    pub fn set_strategy(&mut self, strategy: SimulationStrategy) {
        self.strategy = strategy;
        self.sim_state.accumulator = 0.0;
    }

    /// While paused `advance` runs nothing. An explicit `step` still runs.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance by one frame according to the configured strategy.
    ///
    /// - **Variable**: exactly one step of `frame_time` seconds.
    /// - **Fixed**: `frame_time` is accumulated and as many steps of
    ///   `timestep` seconds run as fit.
    pub fn advance(&mut self, frame_time: f64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused {
            return result;
        }

        match self.strategy.clone() {
            SimulationStrategy::Variable => {
                if let Some(report) = self.try_step(frame_time) {
                    result.reports.push(report);
                }
            }
            SimulationStrategy::Fixed { timestep } => {
                if !is_valid_delta(timestep) || timestep == 0.0 {
                    warn!(timestep, "fixed timestep must be positive and finite");
                    return result;
                }
                if !is_valid_delta(frame_time) {
                    warn!(frame_time, "rejected frame time");
                    return result;
                }
                self.sim_state.accumulator += frame_time;
                while self.sim_state.accumulator >= timestep {
                    self.sim_state.accumulator -= timestep;
                    result.reports.extend(self.try_step(timestep));
                }
            }
        }

        result.steps_run = result.reports.len() as u64;
        result
    }

    /// Run one tick of `delta_time` seconds.
    ///
    /// A negative or non-finite delta is rejected: nothing changes and the
    /// returned report is empty.
    pub fn step(&mut self, delta_time: f64) -> StepReport {
        self.try_step(delta_time)
            .unwrap_or_else(|| StepReport::new(self.sim_state.tick))
    }

    fn try_step(&mut self, delta_time: f64) -> Option<StepReport> {
        if !is_valid_delta(delta_time) {
            warn!(delta_time, "rejected delta time; tick skipped");
            return None;
        }

        let mut report = StepReport::new(self.sim_state.tick);
        for index in 0..self.order.len() {
            let id = self.order[index];
            self.resolve_node(id, delta_time, &mut report);
        }

        self.sim_state.tick += 1;
        self.sim_state.elapsed += delta_time;
        self.event_bus.deliver();
        Some(report)
    }

    // -----------------------------------------------------------------------
    // Tick resolver
    // -----------------------------------------------------------------------

    /// Produce, split, route and commit for one node.
    fn resolve_node(&mut self, id: NodeId, delta_time: f64, report: &mut StepReport) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let from = node.position;
        let Production { status, outputs } = node.run(delta_time);
        self.track_status(id, from, status);

        for candidate in &outputs {
            let moved = self.route(from, candidate, report);
            if let Some(node) = self.nodes.get_mut(id) {
                node.commit_output(candidate, moved);
            }
        }
    }

    /// Split `candidate` evenly across its active directions and hand each
    /// portion off. Returns the total that left the node.
    fn route(&mut self, from: GridPosition, candidate: &FlowUnit, report: &mut StepReport) -> f64 {
        let count = candidate.directions.active_count();
        if count == 0 {
            warn!(%from, item = %candidate.item, "output has no directions; nothing routed");
            return 0.0;
        }
        let divided = candidate.scaled(1.0 / f64::from(count));
        let tick = self.sim_state.tick;
        let mut moved = 0.0;

        for side in candidate.directions.sides() {
            let to = from.neighbor(side);
            let Some(&target) = self.grid.get(to) else {
                continue;
            };
            let Some(neighbor) = self.nodes.get_mut(target) else {
                continue;
            };
            let accepted = neighbor.accept(&divided.retargeted(side.opposite().mask()));
            if accepted <= 0.0 {
                continue;
            }
            moved += accepted;

            trace!(%from, %to, item = %divided.item, amount = accepted, "flow delivered");
            report.deliveries.push(Delivery {
                from,
                to,
                item: divided.item.clone(),
                amount: accepted,
            });
            self.event_bus.emit(Event::FlowDelivered {
                from,
                to,
                item: divided.item.clone(),
                amount: accepted,
                tick,
            });
        }

        if candidate.directions.disperses() {
            self.pool.merge(&divided);
            moved += divided.queued;
            if divided.queued > 0.0 {
                report.dispersals.push(Dispersal {
                    from,
                    item: divided.item.clone(),
                    amount: divided.queued,
                });
                self.event_bus.emit(Event::FlowDispersed {
                    from,
                    item: divided.item.clone(),
                    amount: divided.queued,
                    tick,
                });
            }
        }

        moved
    }

    /// Record this tick's status and emit an event when it changed.
    fn track_status(&mut self, id: NodeId, position: GridPosition, status: NodeStatus) {
        let previous = self.statuses.insert(id, status);
        if previous == Some(status) {
            return;
        }
        let tick = self.sim_state.tick;
        match status {
            NodeStatus::Stalled { reason } => self.event_bus.emit(Event::NodeStalled {
                node: id,
                position,
                reason,
                tick,
            }),
            NodeStatus::Producing if previous.is_some() => {
                self.event_bus.emit(Event::NodeResumed {
                    node: id,
                    position,
                    tick,
                })
            }
            NodeStatus::Producing => {}
        }
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Deterministic hash of the tick counter, every node's cell and slots
    /// (in resolution order) and the pool.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);

        for (_, node) in self.nodes() {
            hasher.write_i32(node.position.x);
            hasher.write_i32(node.position.y);
            for slots in [&node.inputs, &node.outputs] {
                hasher.write_u64(slots.len() as u64);
                for slot in slots {
                    hash_unit(&mut hasher, slot);
                }
            }
        }

        hasher.write_u64(self.pool.len() as u64);
        for entry in self.pool.iter() {
            hash_unit(&mut hasher, entry);
        }
        hasher.finish()
    }
}

fn hash_unit(hasher: &mut StateHash, unit: &FlowUnit) {
    hasher.write_str(unit.item.name());
    hasher.write_f64(unit.rate);
    hasher.write_f64(unit.queued);
    hasher.write(&[unit.directions.bits()]);
}

fn is_valid_delta(delta_time: f64) -> bool {
    delta_time.is_finite() && delta_time >= 0.0
}

// ===========================================================================
// Tests
// ===========================================================================
