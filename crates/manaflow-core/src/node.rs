use crate::flow::FlowUnit;
use crate::grid::GridPosition;
use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Node status
// ---------------------------------------------------------------------------

/// Why a node made no new product this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StallReason {
    /// Some input slot holds less than one tick of consumption.
    Starved,
    /// Some output slot already holds more than it can absorb this tick.
    Backpressured,
}

/// Classification of a single tick for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    Producing,
    Stalled { reason: StallReason },
}

/// The outcome of [`ProductionNode::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub status: NodeStatus,
    /// Candidate outputs, one per emitting slot. Quantities are this tick's
    /// amounts, not the slots' cumulative backlog.
    pub outputs: Vec<FlowUnit>,
}

// ---------------------------------------------------------------------------
// ProductionNode
// ---------------------------------------------------------------------------

/// A grid cell entity converting input flows into output flows over time.
///
/// Also used unplaced as a template: placement copies a template, rotates it
/// and assigns its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionNode {
    #[serde(default)]
    pub position: GridPosition,
    #[serde(default)]
    pub inputs: Vec<FlowUnit>,
    #[serde(default)]
    pub outputs: Vec<FlowUnit>,
}

impl ProductionNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`add_input`](Self::add_input).
    pub fn with_input(mut self, unit: FlowUnit) -> Self {
        self.add_input(unit);
        self
    }

    /// Builder form of [`add_output`](Self::add_output).
    pub fn with_output(mut self, unit: FlowUnit) -> Self {
        self.add_output(unit);
        self
    }

    /// Add an input slot. A slot for the same item absorbs it instead: the
    /// rates add and the direction masks are OR-ed together.
    pub fn add_input(&mut self, unit: FlowUnit) {
        if let Some(slot) = self.inputs.iter_mut().find(|s| s.item == unit.item) {
            slot.rate += unit.rate;
            slot.directions |= unit.directions;
            return;
        }
        self.inputs.push(unit);
    }

    /// Add an output slot. A slot for the same item absorbs it instead: with
    /// identical masks the rates add, otherwise the masks are OR-ed and the
    /// existing rate is kept.
    pub fn add_output(&mut self, unit: FlowUnit) {
        if let Some(slot) = self.outputs.iter_mut().find(|s| s.item == unit.item) {
            if slot.directions == unit.directions {
                slot.rate += unit.rate;
            } else {
                slot.directions |= unit.directions;
            }
            return;
        }
        self.outputs.push(unit);
    }

    /// First input slot that takes `unit`: the item matches (or the slot is a
    /// wildcard) and the masks intersect.
    fn matching_input(&self, unit: &FlowUnit) -> Option<usize> {
        self.inputs
            .iter()
            .position(|s| s.item.accepts(&unit.item) && s.directions.intersects(unit.directions))
    }

    /// Offer `unit` to this node. Returns how much was taken, which is
    /// bounded by the matching slot's free capacity and by `unit.queued`.
    ///
    /// A wildcard slot is rebound to the incoming item, together with every
    /// output still named `Any`.
    pub fn accept(&mut self, unit: &FlowUnit) -> f64 {
        let Some(index) = self.matching_input(unit) else {
            return 0.0;
        };
        if self.inputs[index].item.is_wildcard() && !unit.item.is_wildcard() {
            self.bind_wildcards(index, &unit.item);
        }
        let slot = &mut self.inputs[index];
        let accepted = (slot.rate - slot.queued).min(unit.queued).max(0.0);
        slot.queued += accepted;
        accepted
    }

    /// Capacity probe: the rate cap of the slot that would take `unit`, or
    /// zero. Never mutates.
    pub fn capacity_for(&self, unit: &FlowUnit) -> f64 {
        self.matching_input(unit)
            .map(|index| self.inputs[index].rate)
            .unwrap_or(0.0)
    }

    fn bind_wildcards(&mut self, input: usize, item: &ItemId) {
        self.inputs[input].item = item.clone();
        for output in self.outputs.iter_mut().filter(|o| o.item.is_wildcard()) {
            output.item = item.clone();
        }
    }

    /// Classify the coming tick without changing any slot.
    pub fn status(&self, delta_time: f64) -> NodeStatus {
        if self
            .inputs
            .iter()
            .any(|s| s.queued < s.per_tick(delta_time))
        {
            return NodeStatus::Stalled {
                reason: StallReason::Starved,
            };
        }
        if self.outputs.iter().any(|s| is_backed_up(s, delta_time)) {
            return NodeStatus::Stalled {
                reason: StallReason::Backpressured,
            };
        }
        NodeStatus::Producing
    }

    /// Run one tick of production.
    ///
    /// - Starved: nothing is emitted and no slot changes.
    /// - Backpressured: every backed-up output emits what it already holds
    ///   (at most one tick's worth); inputs are untouched and nothing new is
    ///   produced, even for outputs that are not backed up.
    /// - Producing: every input gives up one tick of consumption, every
    ///   output queues one tick of product and emits exactly that amount.
    pub fn run(&mut self, delta_time: f64) -> Production {
        let status = self.status(delta_time);
        let outputs = match status {
            NodeStatus::Stalled {
                reason: StallReason::Starved,
            } => Vec::new(),
            NodeStatus::Stalled {
                reason: StallReason::Backpressured,
            } => self
                .outputs
                .iter()
                .filter(|s| is_backed_up(s, delta_time))
                .map(|s| s.with_quantity(s.per_tick(delta_time).min(s.queued)))
                .collect(),
            NodeStatus::Producing => {
                for input in &mut self.inputs {
                    input.queued = (input.queued - input.per_tick(delta_time)).max(0.0);
                }
                self.outputs
                    .iter_mut()
                    .map(|output| {
                        let made = output.per_tick(delta_time);
                        output.queued += made;
                        output.with_quantity(made)
                    })
                    .collect()
            }
        };
        Production { status, outputs }
    }

    /// Candidate outputs for one tick. See [`run`](Self::run).
    pub fn produce(&mut self, delta_time: f64) -> Vec<FlowUnit> {
        self.run(delta_time).outputs
    }

    /// Reconcile a candidate output with what actually left the node: the
    /// matching output slot's backlog drops by `delivered`, never below zero.
    pub fn commit_output(&mut self, output: &FlowUnit, delivered: f64) {
        if let Some(slot) = self.outputs.iter_mut().find(|s| s.item == output.item) {
            slot.queued = (slot.queued - delivered).max(0.0);
        }
    }

    /// A copy with every slot rotated by `times` quarter turns.
    pub fn rotated(&self, times: u32) -> Self {
        Self {
            position: self.position,
            inputs: self.inputs.iter().map(|u| u.rotated(times)).collect(),
            outputs: self.outputs.iter().map(|u| u.rotated(times)).collect(),
        }
    }
}

fn is_backed_up(slot: &FlowUnit, delta_time: f64) -> bool {
    slot.queued + slot.per_tick(delta_time) > slot.rate
}

impl fmt::Display for ProductionNode {
    /// Inspection text: `item:rate:queued:dirs` per slot, inputs then outputs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.inputs {
            write!(
                f,
                "{}:{}:{:.1}:{}, ",
                slot.item, slot.rate, slot.queued, slot.directions
            )?;
        }
        writeln!(f, " >")?;
        for slot in &self.outputs {
            write!(
                f,
                "{}:{}:{:.1}:{}, ",
                slot.item, slot.rate, slot.queued, slot.directions
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::DirectionMask;

    const L: DirectionMask = DirectionMask::LEFT;
    const R: DirectionMask = DirectionMask::RIGHT;
    const U: DirectionMask = DirectionMask::UP;
    const D: DirectionMask = DirectionMask::DOWN;

    fn slot(item: &str, rate: f64, queued: f64, dirs: DirectionMask) -> FlowUnit {
        FlowUnit::new(item, rate, dirs).with_quantity(queued)
    }

    fn smelter(ore_queued: f64) -> ProductionNode {
        ProductionNode::new()
            .with_input(slot("Ore", 2.0, ore_queued, L))
            .with_output(slot("Plate", 2.0, 0.0, R))
    }

    // -----------------------------------------------------------------------
    // Slot merging
    // -----------------------------------------------------------------------

    #[test]
    fn add_input_merges_rate_and_mask() {
        let node = ProductionNode::new()
            .with_input(slot("Ore", 1.0, 0.0, L))
            .with_input(slot("Ore", 2.0, 0.0, U));
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.inputs[0].rate, 3.0);
        assert_eq!(node.inputs[0].directions, L | U);
    }

    #[test]
    fn add_output_same_mask_adds_rate() {
        let node = ProductionNode::new()
            .with_output(slot("Plate", 1.0, 0.0, R))
            .with_output(slot("Plate", 1.5, 0.0, R));
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.outputs[0].rate, 2.5);
    }

    #[test]
    fn add_output_other_mask_keeps_rate() {
        let node = ProductionNode::new()
            .with_output(slot("Plate", 1.0, 0.0, R))
            .with_output(slot("Plate", 5.0, 0.0, D));
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.outputs[0].rate, 1.0);
        assert_eq!(node.outputs[0].directions, R | D);
    }

    #[test]
    fn distinct_items_get_distinct_slots() {
        let node = ProductionNode::new()
            .with_input(slot("Ore", 1.0, 0.0, L))
            .with_input(slot("Coal", 1.0, 0.0, L));
        assert_eq!(node.inputs.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Accept
    // -----------------------------------------------------------------------

    #[test]
    fn accept_caps_at_free_capacity() {
        let mut node = ProductionNode::new().with_input(slot("Plate", 1.0, 0.0, L));
        let taken = node.accept(&slot("Plate", 2.0, 2.0, L));
        assert_eq!(taken, 1.0);
        assert_eq!(node.inputs[0].queued, 1.0);
        assert_eq!(node.accept(&slot("Plate", 2.0, 2.0, L)), 0.0);
    }

    #[test]
    fn accept_caps_at_offered_amount() {
        let mut node = ProductionNode::new().with_input(slot("Plate", 4.0, 0.0, L));
        assert_eq!(node.accept(&slot("Plate", 1.0, 0.5, L)), 0.5);
        assert_eq!(node.inputs[0].queued, 0.5);
    }

    #[test]
    fn accept_requires_direction_overlap() {
        let mut node = ProductionNode::new().with_input(slot("Ore", 2.0, 0.0, L));
        assert_eq!(node.accept(&slot("Ore", 2.0, 1.0, R)), 0.0);
        assert_eq!(node.inputs[0].queued, 0.0);
    }

    #[test]
    fn accept_rejects_other_items() {
        let mut node = ProductionNode::new().with_input(slot("Ore", 2.0, 0.0, L));
        assert_eq!(node.accept(&slot("Coal", 2.0, 1.0, L)), 0.0);
    }

    #[test]
    fn accept_uses_first_matching_slot_only() {
        let mut node = ProductionNode::new()
            .with_input(slot("Any", 1.0, 1.0, L))
            .with_input(slot("Ore", 5.0, 0.0, L));
        // The wildcard slot is full, but it matches first, so nothing falls
        // through to the dedicated Ore slot.
        assert_eq!(node.accept(&slot("Ore", 1.0, 1.0, L)), 0.0);
        assert_eq!(node.inputs[1].queued, 0.0);
    }

    #[test]
    fn accept_never_goes_negative_when_overfull() {
        let mut node = ProductionNode::new().with_input(slot("Ore", 1.0, 3.0, L));
        assert_eq!(node.accept(&slot("Ore", 1.0, 1.0, L)), 0.0);
        assert_eq!(node.inputs[0].queued, 3.0);
    }

    #[test]
    fn wildcard_binds_input_and_outputs() {
        let mut node = ProductionNode::new()
            .with_input(slot("Any", 2.0, 0.0, L))
            .with_output(slot("Any", 2.0, 0.0, R))
            .with_output(slot("Slag", 1.0, 0.0, D));
        let taken = node.accept(&slot("Ore", 1.0, 1.0, L));
        assert_eq!(taken, 1.0);
        assert_eq!(node.inputs[0].item, ItemId::new("Ore"));
        assert_eq!(node.outputs[0].item, ItemId::new("Ore"));
        assert_eq!(node.outputs[1].item, ItemId::new("Slag"));

        // Bound permanently: a different item no longer matches.
        assert_eq!(node.accept(&slot("Coal", 1.0, 1.0, L)), 0.0);
        assert_eq!(node.accept(&slot("Ore", 1.0, 1.0, L)), 1.0);
    }

    #[test]
    fn wildcard_offer_does_not_bind() {
        let mut node = ProductionNode::new()
            .with_input(slot("Any", 2.0, 0.0, L))
            .with_output(slot("Any", 2.0, 0.0, R));
        node.accept(&slot("Any", 1.0, 1.0, L));
        assert!(node.inputs[0].item.is_wildcard());
        assert!(node.outputs[0].item.is_wildcard());
    }

    #[test]
    fn capacity_probe_does_not_mutate() {
        let node = ProductionNode::new()
            .with_input(slot("Any", 3.0, 0.0, L))
            .with_output(slot("Any", 3.0, 0.0, R));
        let before = node.clone();
        assert_eq!(node.capacity_for(&slot("Ore", 1.0, 1.0, L)), 3.0);
        assert_eq!(node.capacity_for(&slot("Ore", 1.0, 1.0, U)), 0.0);
        assert_eq!(node, before);
    }

    // -----------------------------------------------------------------------
    // Produce
    // -----------------------------------------------------------------------

    #[test]
    fn produce_consumes_and_queues_one_tick() {
        let mut node = smelter(2.0);
        let out = node.produce(1.0);
        assert_eq!(node.inputs[0].queued, 0.0);
        assert_eq!(node.outputs[0].queued, 2.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item, ItemId::new("Plate"));
        assert_eq!(out[0].queued, 2.0);
        assert_eq!(out[0].directions, R);
    }

    #[test]
    fn produce_reports_tick_amount_not_backlog() {
        let mut node = ProductionNode::new().with_output(slot("Plate", 4.0, 1.0, R));
        let out = node.produce(0.25);
        assert_eq!(out[0].queued, 1.0);
        assert_eq!(node.outputs[0].queued, 2.0);
    }

    #[test]
    fn starved_node_changes_nothing() {
        let mut node = smelter(1.5);
        let before = node.clone();
        let production = node.run(1.0);
        assert!(production.outputs.is_empty());
        assert_eq!(
            production.status,
            NodeStatus::Stalled {
                reason: StallReason::Starved
            }
        );
        assert_eq!(node, before);
    }

    #[test]
    fn any_starved_input_gates_all_outputs() {
        let mut node = smelter(2.0).with_input(slot("Coal", 1.0, 0.0, U));
        assert!(node.produce(1.0).is_empty());
        assert_eq!(node.inputs[0].queued, 2.0);
    }

    #[test]
    fn backpressure_emits_backlog_and_skips_inputs() {
        let mut node = smelter(2.0);
        node.outputs[0].queued = 1.0;
        let production = node.run(1.0);
        assert_eq!(
            production.status,
            NodeStatus::Stalled {
                reason: StallReason::Backpressured
            }
        );
        assert_eq!(production.outputs.len(), 1);
        assert_eq!(production.outputs[0].queued, 1.0);
        assert_eq!(node.inputs[0].queued, 2.0);
        assert_eq!(node.outputs[0].queued, 1.0);
    }

    #[test]
    fn backpressure_emission_is_capped_at_one_tick() {
        let mut node = ProductionNode::new().with_output(slot("Plate", 1.0, 5.0, R));
        let out = node.produce(0.5);
        assert_eq!(out[0].queued, 0.5);
    }

    #[test]
    fn backpressure_short_circuits_whole_node() {
        let mut node = ProductionNode::new()
            .with_output(slot("Plate", 1.0, 1.0, R))
            .with_output(slot("Slag", 1.0, 0.0, D));
        let out = node.produce(0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item, ItemId::new("Plate"));
        assert_eq!(node.outputs[1].queued, 0.0);
    }

    #[test]
    fn sink_consumes_without_outputs() {
        let mut node = ProductionNode::new().with_input(slot("Plate", 1.0, 1.0, L));
        assert!(node.produce(1.0).is_empty());
        assert_eq!(node.inputs[0].queued, 0.0);
        assert_eq!(node.status(1.0), NodeStatus::Stalled { reason: StallReason::Starved });
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    #[test]
    fn commit_subtracts_delivered_amount() {
        let mut node = smelter(2.0);
        let out = node.produce(1.0);
        node.commit_output(&out[0], 1.0);
        assert_eq!(node.outputs[0].queued, 1.0);
    }

    #[test]
    fn commit_clamps_at_zero() {
        let mut node = smelter(0.0);
        node.outputs[0].queued = 0.5;
        node.commit_output(&slot("Plate", 2.0, 0.0, R), 3.0);
        assert_eq!(node.outputs[0].queued, 0.0);
    }

    #[test]
    fn commit_for_unknown_item_is_ignored() {
        let mut node = smelter(0.0);
        node.outputs[0].queued = 0.5;
        node.commit_output(&slot("Coal", 1.0, 0.0, R), 0.5);
        assert_eq!(node.outputs[0].queued, 0.5);
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    #[test]
    fn rotation_leaves_original_untouched() {
        let node = smelter(1.0);
        let turned = node.rotated(1);
        assert_eq!(node.inputs[0].directions, L);
        assert_eq!(turned.inputs[0].directions, U);
        assert_eq!(turned.outputs[0].directions, D);
        assert_eq!(turned.inputs[0].queued, 1.0);
    }

    #[test]
    fn four_quarter_turns_round_trip() {
        let node = smelter(1.0).with_output(slot("Mana", 1.0, 0.0, U | DirectionMask::DISPERSE));
        assert_eq!(node.rotated(4), node);
        assert_eq!(node.rotated(1).rotated(3), node);
    }

    #[test]
    fn display_lists_inputs_then_outputs() {
        let text = smelter(2.0).to_string();
        assert_eq!(text, "Ore:2:2.0:L____,  >\nPlate:2:0.0:_R___, ");
    }
}
