//! Property-based tests for production, routing and determinism.

use manaflow_core::direction::DirectionMask;
use manaflow_core::engine::Simulation;
use manaflow_core::grid::GridPosition;
use manaflow_core::node::ProductionNode;
use manaflow_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_mask() -> impl Strategy<Value = DirectionMask> {
    (0u8..32).prop_map(DirectionMask::from_bits_truncate)
}

fn arb_cardinal_or_disperse() -> impl Strategy<Value = DirectionMask> {
    (1u8..32).prop_map(DirectionMask::from_bits_truncate)
}

/// A converter whose inputs hold between one and two ticks' worth.
fn arb_fed_node(dt: f64) -> impl Strategy<Value = ProductionNode> {
    (
        proptest::collection::vec((0.1f64..10.0, 1.0f64..2.0), 1..4),
        proptest::collection::vec(0.1f64..10.0, 0..4),
    )
        .prop_map(move |(inputs, outputs)| {
            let mut node = ProductionNode::new();
            for (i, (rate, fill)) in inputs.into_iter().enumerate() {
                node.add_input(slot(&format!("In{i}"), rate, rate * dt * fill, L));
            }
            for (i, rate) in outputs.into_iter().enumerate() {
                node.add_output(slot(&format!("Out{i}"), rate, 0.0, R));
            }
            node
        })
}

fn template(kind: u8) -> ProductionNode {
    match kind {
        0 => source("Ore", 2.0, R),
        1 => converter("Ore", L, "Plate", R | U, 1.5),
        2 => relay(1.0, L | D, R),
        3 => converter("Plate", L | D, "Fire Mana", O, 1.0),
        _ => sink("Plate", 3.0, L),
    }
}

/// Placements on a small grid; collisions are skipped.
fn arb_layout() -> impl Strategy<Value = Vec<(i32, i32, u8, u32)>> {
    proptest::collection::vec((-3i32..3, -3i32..3, 0u8..5, 0u32..4), 1..30)
}

fn build(layout: &[(i32, i32, u8, u32)]) -> Simulation {
    let mut sim = Simulation::default();
    for &(x, y, kind, rotations) in layout {
        let _ = sim.place(GridPosition::new(x, y), &template(kind), rotations);
    }
    sim
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normal_tick_conserves_per_slot(
        (dt, mut node) in (0.01f64..1.0).prop_flat_map(|dt| (Just(dt), arb_fed_node(dt))),
    ) {
        let before = node.clone();
        let produced = node.produce(dt);

        prop_assert_eq!(produced.len(), node.outputs.len());
        for (after, prior) in node.outputs.iter().zip(&before.outputs) {
            prop_assert!((after.queued - prior.queued - after.rate * dt).abs() < 1e-9);
        }
        for (after, prior) in node.inputs.iter().zip(&before.inputs) {
            prop_assert!((prior.queued - after.queued - after.rate * dt).abs() < 1e-9);
        }
    }

    #[test]
    fn starved_node_is_untouched(
        node in arb_fed_node(0.5),
        which in 0usize..4,
        shortfall in 0.01f64..1.0,
    ) {
        let mut node = node;
        let index = which % node.inputs.len();
        let input = &mut node.inputs[index];
        input.queued = input.rate * 0.5 * (1.0 - shortfall);
        let before = node.clone();

        prop_assert!(node.produce(0.5).is_empty());
        prop_assert_eq!(node, before);
    }

    #[test]
    fn four_quarter_turns_are_identity(mask in arb_mask(), a in 0u32..8, b in 0u32..8) {
        prop_assert_eq!(mask.rotated(4), mask);
        prop_assert_eq!(mask.rotated(a).rotated(b), mask.rotated(a + b));
        prop_assert_eq!(mask.rotated(a).active_count(), mask.active_count());
        prop_assert_eq!(mask.flipped().flipped(), mask);
    }

    #[test]
    fn split_portions_sum_to_candidate(mask in arb_cardinal_or_disperse(), rate in 0.1f64..10.0) {
        let mut sim = Simulation::default();
        sim.place(GridPosition::new(0, 0), &source("Ore", rate, mask), 0).unwrap();
        for (x, y, dirs) in [(-1, 0, R), (1, 0, L), (0, 1, D), (0, -1, U)] {
            sim.place(GridPosition::new(x, y), &sink("Ore", 100.0, dirs), 0).unwrap();
        }

        let report = sim.step(1.0);

        let k = f64::from(mask.active_count());
        let moved = report.delivered_total() + report.dispersed_total();
        prop_assert!((moved - rate).abs() < 1e-9);
        for delivery in &report.deliveries {
            prop_assert!((delivery.amount - rate / k).abs() < 1e-9);
        }
        prop_assert_eq!(
            report.deliveries.len() + report.dispersals.len(),
            mask.active_count() as usize
        );
    }

    #[test]
    fn accept_stays_within_capacity(
        rate in 0.0f64..5.0,
        queued in 0.0f64..10.0,
        offered in 0.0f64..10.0,
    ) {
        let mut node = ProductionNode::new().with_input(slot("Ore", rate, queued, L));
        let taken = node.accept(&slot("Ore", 1.0, offered, L));
        prop_assert!(taken >= 0.0);
        prop_assert!(taken <= offered);
        prop_assert!(taken <= (rate - queued).max(0.0) + 1e-12);
    }

    #[test]
    fn queues_never_go_negative(layout in arb_layout(), dt in 0.05f64..2.0) {
        let mut sim = build(&layout);
        for _ in 0..25 {
            sim.step(dt);
        }
        for (_, node) in sim.nodes() {
            for unit in node.inputs.iter().chain(&node.outputs) {
                prop_assert!(unit.queued >= 0.0, "negative queue in {}", node);
            }
        }
        for entry in sim.pool().iter() {
            prop_assert!(entry.queued >= 0.0);
        }
    }

    #[test]
    fn identical_layouts_stay_identical(layout in arb_layout(), dt in 0.05f64..1.0) {
        let mut a = build(&layout);
        let mut b = build(&layout);
        for _ in 0..15 {
            a.step(dt);
            b.step(dt);
        }
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a.pool_summary(), b.pool_summary());
    }
}
