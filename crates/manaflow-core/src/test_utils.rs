//! Shared builders for tests and benches.
//!
//! Enabled for this crate's own tests and, via the `test-utils` feature, for
//! integration tests and downstream crates.

use crate::direction::DirectionMask;
use crate::flow::FlowUnit;
use crate::item::ItemId;
use crate::node::ProductionNode;

pub const L: DirectionMask = DirectionMask::LEFT;
pub const R: DirectionMask = DirectionMask::RIGHT;
pub const U: DirectionMask = DirectionMask::UP;
pub const D: DirectionMask = DirectionMask::DOWN;
pub const O: DirectionMask = DirectionMask::DISPERSE;

/// Tolerance used by [`assert_close`].
pub const EPSILON: f64 = 1e-9;

pub fn slot(item: &str, rate: f64, queued: f64, dirs: DirectionMask) -> FlowUnit {
    FlowUnit::new(item, rate, dirs).with_quantity(queued)
}

/// A node with a single output and no inputs.
pub fn source(item: &str, rate: f64, dirs: DirectionMask) -> ProductionNode {
    ProductionNode::new().with_output(slot(item, rate, 0.0, dirs))
}

/// A node with a single input and no outputs.
pub fn sink(item: &str, rate: f64, dirs: DirectionMask) -> ProductionNode {
    ProductionNode::new().with_input(slot(item, rate, 0.0, dirs))
}

/// One input converted into one output at the same rate.
pub fn converter(
    input: &str,
    input_dirs: DirectionMask,
    output: &str,
    output_dirs: DirectionMask,
    rate: f64,
) -> ProductionNode {
    ProductionNode::new()
        .with_input(slot(input, rate, 0.0, input_dirs))
        .with_output(slot(output, rate, 0.0, output_dirs))
}

/// Passes along whatever item first arrives.
pub fn relay(rate: f64, input_dirs: DirectionMask, output_dirs: DirectionMask) -> ProductionNode {
    converter(ItemId::WILDCARD, input_dirs, ItemId::WILDCARD, output_dirs, rate)
}

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}
