//! Box extraction: boundary analysis of a rectangular region of the grid.
//!
//! The result is a reusable template whose slots are the region's
//! outward-facing inputs and outputs, plus a summary of how the nodes inside
//! are wired to each other. Nothing is placed or modified.

use crate::direction::DirectionMask;
use crate::engine::Simulation;
use crate::grid::GridPosition;
use crate::node::ProductionNode;
use tracing::debug;

/// Counts gathered while scanning a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxSummary {
    /// Lower-left corner after normalisation.
    pub min: GridPosition,
    /// Upper-right corner after normalisation.
    pub max: GridPosition,
    pub node_count: usize,
    /// Inward-facing output directions whose neighbour cell holds a node able
    /// to take the item.
    pub linked_outputs: usize,
    /// Inward-facing output directions pointing at an empty cell.
    pub dangling_outputs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxExtraction {
    /// Aggregated boundary node at (0, 0) with every queued amount zero.
    pub template: ProductionNode,
    pub summary: BoxSummary,
}

impl Simulation {
    /// Analyse the inclusive rectangle spanned by `a` and `b` (in any corner
    /// order).
    ///
    /// Perimeter slots that face out of the region are merged into the
    /// template with their mask reduced to the outward bits. `DISPERSE` never
    /// counts as outward.
    pub fn extract_box(&self, a: GridPosition, b: GridPosition) -> BoxExtraction {
        let min = GridPosition::new(a.x.min(b.x), a.y.min(b.y));
        let max = GridPosition::new(a.x.max(b.x), a.y.max(b.y));
        let mut template = ProductionNode::new();
        let mut summary = BoxSummary {
            min,
            max,
            ..BoxSummary::default()
        };

        for (position, &id) in self.grid.in_rect(min, max) {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            summary.node_count += 1;
            let outward = outward_mask(position, min, max);

            for input in &node.inputs {
                let facing = input.directions & outward;
                if !facing.is_empty() {
                    template.add_input(input.retargeted(facing).with_quantity(0.0));
                }
            }

            for output in &node.outputs {
                let facing = output.directions & outward;
                if !facing.is_empty() {
                    template.add_output(output.retargeted(facing).with_quantity(0.0));
                }

                for side in output.directions.sides() {
                    if outward.contains(side.mask()) {
                        continue;
                    }
                    let target = self
                        .grid
                        .get(position.neighbor(side))
                        .and_then(|&n| self.nodes.get(n));
                    match target {
                        Some(neighbor) => {
                            let offered = output.retargeted(side.opposite().mask());
                            if neighbor.capacity_for(&offered) > 0.0 {
                                summary.linked_outputs += 1;
                            }
                        }
                        None => summary.dangling_outputs += 1,
                    }
                }
            }
        }

        debug!(
            %min,
            %max,
            nodes = summary.node_count,
            inputs = template.inputs.len(),
            outputs = template.outputs.len(),
            "box extracted"
        );
        BoxExtraction { template, summary }
    }
}

/// Directions that leave the rectangle from `position`.
fn outward_mask(position: GridPosition, min: GridPosition, max: GridPosition) -> DirectionMask {
    let mut mask = DirectionMask::empty();
    mask.set(DirectionMask::LEFT, position.x == min.x);
    mask.set(DirectionMask::RIGHT, position.x == max.x);
    mask.set(DirectionMask::DOWN, position.y == min.y);
    mask.set(DirectionMask::UP, position.y == max.y);
    mask
}
