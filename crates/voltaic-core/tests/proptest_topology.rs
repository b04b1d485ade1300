//! Property-based tests for the topology and distribution engines.
//!
//! Random edit sequences on a small cube of positions are checked against a
//! reference union-find built from scratch over the same adjacency rules.
//! Distribution helpers are checked for conservation on random inputs.

use std::collections::BTreeMap;

use proptest::prelude::*;
use voltaic_core::capability::{ConsumptionRange, Energy};
use voltaic_core::distribution::{allocate, split_overflow};
use voltaic_core::grid::PowerGrid;
use voltaic_core::id::NetworkId;
use voltaic_core::mask::ConnectionMask;
use voltaic_core::pos::{BlockPos, Face};
use voltaic_core::test_utils::*;

// ===========================================================================
// Reference model
// ===========================================================================

/// A face slot of one position: the unit of network membership.
type Node = (BlockPos, Face);

struct UnionFind {
    parent: BTreeMap<Node, Node>,
}

impl UnionFind {
    fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            parent: nodes.into_iter().map(|n| (n, n)).collect(),
        }
    }

    fn find(&mut self, node: Node) -> Node {
        let parent = self.parent[&node];
        if parent == node {
            return node;
        }
        let root = self.find(parent);
        self.parent.insert(node, root);
        root
    }

    fn union(&mut self, a: Node, b: Node) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }
}

/// Every neighbor slot that meets `(face, direction)` at `pos`, as the
/// position and the face whose network it belongs to.
fn meeting_slots(pos: BlockPos, face: Face, direction: Face) -> [(BlockPos, Face, Face); 5] {
    let back = direction.opposite();
    let under = face.opposite();
    let straight = pos.offset(direction);
    let diagonal = straight.offset(face);
    [
        (straight, face, back),
        (straight, back, face),
        (diagonal, back, under),
        (diagonal, under, back),
        (pos.offset(face), direction, under),
    ]
}

/// Connected components of the occupied face slots in `masks`.
fn reference_components(masks: &BTreeMap<BlockPos, ConnectionMask>) -> UnionFind {
    let nodes = masks
        .iter()
        .flat_map(|(pos, mask)| mask.faces().map(move |face| (*pos, face)));
    let mut uf = UnionFind::new(nodes);

    for (pos, mask) in masks {
        for (face, direction) in mask.slots() {
            if mask.has(direction, face) {
                uf.union((*pos, face), (*pos, direction));
            }
            for (at, slot_face, slot_direction) in meeting_slots(*pos, face, direction) {
                if masks.get(&at).is_some_and(|m| m.has(slot_face, slot_direction)) {
                    uf.union((*pos, face), (at, slot_face));
                }
            }
        }
    }
    uf
}

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum Op {
    Set(BlockPos, ConnectionMask),
    Remove(BlockPos),
    AttachLoad(BlockPos),
}

fn arb_pos() -> impl Strategy<Value = BlockPos> {
    (0..3i32, 0..3i32, 0..3i32).prop_map(|(x, y, z)| BlockPos::new(x, y, z))
}

/// Sparse masks: each slot set with probability about one in four.
fn arb_mask() -> impl Strategy<Value = ConnectionMask> {
    (any::<u32>(), any::<u32>()).prop_map(|(a, b)| ConnectionMask::from_bits_truncate(a & b))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_pos(), arb_mask()).prop_map(|(pos, mask)| Op::Set(pos, mask)),
        2 => arb_pos().prop_map(Op::Remove),
        1 => arb_pos().prop_map(Op::AttachLoad),
    ]
}

// ===========================================================================
// Invariant checks
// ===========================================================================

fn check_partition(grid: &PowerGrid, masks: &BTreeMap<BlockPos, ConnectionMask>) {
    // Registry holds exactly the connected or capability-bearing positions.
    for part in grid.parts() {
        let expected = masks.get(&part.position).copied().unwrap_or(ConnectionMask::NONE);
        assert_eq!(part.connection, expected, "mask at {:?}", part.position);
        assert!(!part.is_empty(), "empty entry kept at {:?}", part.position);
        for face in Face::ALL {
            let occupied = part.connection.intersects(ConnectionMask::face(face));
            assert_eq!(
                part.network(face).is_some(),
                occupied,
                "face {face:?} at {:?}",
                part.position
            );
        }
    }
    for pos in masks.keys() {
        assert!(grid.part(*pos).is_some(), "missing entry at {pos:?}");
    }

    // Same network iff same reference component.
    let mut uf = reference_components(masks);
    let nodes: Vec<(Node, NetworkId)> = masks
        .iter()
        .flat_map(|(pos, mask)| mask.faces().map(move |face| (*pos, face)))
        .map(|node| {
            let id = grid.network_at(node.0, node.1).expect("occupied face has a network");
            (node, id)
        })
        .collect();
    let mut root_of_network: BTreeMap<NetworkId, Node> = BTreeMap::new();
    let mut network_of_root: BTreeMap<Node, NetworkId> = BTreeMap::new();
    for (node, id) in &nodes {
        let root = uf.find(*node);
        assert_eq!(*root_of_network.entry(*id).or_insert(root), root, "network {id:?} spans components");
        assert_eq!(*network_of_root.entry(root).or_insert(*id), *id, "component split across networks");
    }
    assert_eq!(grid.network_count(), root_of_network.len(), "orphan networks");

    // Network membership and capabilities agree with the registry.
    for (id, network) in grid.networks() {
        for pos in &network.positions {
            let part = grid.part(*pos).expect("member has an entry");
            assert!(part.networks.contains(&Some(id)), "{pos:?} listed but not linked");
        }
        for part in grid.parts() {
            let touches = part.networks.contains(&Some(id));
            assert_eq!(network.positions.contains(&part.position), touches);
            if let Some(consumer) = part.consumer {
                assert_eq!(network.consumers.contains(&consumer), touches);
            }
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn partition_matches_reference(ops in proptest::collection::vec(arb_op(), 1..40)) {
        let mut grid = PowerGrid::new();
        let mut masks: BTreeMap<BlockPos, ConnectionMask> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(pos, mask) => {
                    grid.set_connection(pos, mask);
                    if mask.is_empty() {
                        masks.remove(&pos);
                    } else {
                        masks.insert(pos, mask);
                    }
                }
                Op::Remove(pos) => {
                    grid.remove(pos);
                    masks.remove(&pos);
                }
                Op::AttachLoad(pos) => {
                    let load = grid.add_consumer(Box::new(Load::new(0, 1)));
                    grid.set_consumer(pos, Some(load)).unwrap();
                }
            }
            check_partition(&grid, &masks);
        }
    }

    #[test]
    fn placement_order_does_not_matter(
        entries in proptest::collection::btree_map(arb_pos(), arb_mask(), 1..20),
    ) {
        let masks: BTreeMap<BlockPos, ConnectionMask> =
            entries.into_iter().filter(|(_, mask)| !mask.is_empty()).collect();

        let mut forward = PowerGrid::new();
        for (pos, mask) in &masks {
            forward.set_connection(*pos, *mask);
        }
        let mut backward = PowerGrid::new();
        for (pos, mask) in masks.iter().rev() {
            backward.set_connection(*pos, *mask);
        }

        check_partition(&forward, &masks);
        check_partition(&backward, &masks);
        prop_assert_eq!(forward.network_count(), backward.network_count());
    }

    #[test]
    fn allocation_conserves_energy(
        ranges in proptest::collection::vec((0..20i64, 0..20i64), 0..8),
        production in 0..200i64,
    ) {
        let ranges: Vec<ConsumptionRange> = ranges
            .into_iter()
            .map(|(min, extra)| ConsumptionRange::new(min, min + extra))
            .collect();
        let allocation = allocate(&ranges, production);

        let given: Energy = allocation.given.iter().sum();
        prop_assert_eq!(given + allocation.remaining, production);
        prop_assert!(allocation.remaining >= 0);
        for (range, got) in ranges.iter().zip(&allocation.given) {
            prop_assert!(*got <= range.max);
            prop_assert!(*got == 0 || *got >= range.min);
        }
        let demand: Energy = ranges.iter().map(|r| r.max).sum();
        if allocation.remaining > 0 {
            // Leftover only when every admitted consumer is full.
            for (range, got) in ranges.iter().zip(&allocation.given) {
                prop_assert!(*got == range.max || *got == 0);
            }
        }
        prop_assert!(given <= demand);
    }

    #[test]
    fn overflow_split_stores_what_fits(
        headroom in proptest::collection::vec(0..50i64, 0..8),
        overflow in 0..300i64,
    ) {
        let grants = split_overflow(overflow, &headroom);
        prop_assert_eq!(grants.len(), headroom.len());
        for (grant, free) in grants.iter().zip(&headroom) {
            prop_assert!(*grant >= 0 && grant <= free);
        }
        let stored: Energy = grants.iter().sum();
        let desired: Energy = headroom.iter().sum();
        prop_assert_eq!(stored, overflow.min(desired));
    }

    #[test]
    fn tick_keeps_overflow_identity(
        outputs in proptest::collection::vec(0..40i64, 0..4),
        loads in proptest::collection::vec((0..15i64, 0..15i64), 0..4),
        charges in proptest::collection::vec((1..60i64, 0..60i64), 0..3),
    ) {
        let mut grid = PowerGrid::new();
        let line = cable_line(&mut grid, BlockPos::new(0, 0, 0), 12);
        let mut slots = line.iter();

        for output in outputs {
            let id = grid.add_producer(Box::new(Generator::new(output)));
            grid.set_producer(*slots.next().unwrap(), Some(id)).unwrap();
        }
        for (min, extra) in loads {
            let id = grid.add_consumer(Box::new(Load::new(min, min + extra)));
            grid.set_consumer(*slots.next().unwrap(), Some(id)).unwrap();
        }
        let mut batteries = Vec::new();
        for (max, charge) in charges {
            let id = grid.add_accumulator(Box::new(Battery::charged(max, charge.min(max))));
            grid.set_accumulator(*slots.next().unwrap(), Some(id)).unwrap();
            batteries.push(id);
        }

        for _ in 0..3 {
            let stored_before: Energy = batteries
                .iter()
                .map(|id| grid.accumulator(*id).unwrap().capacity())
                .sum();
            let summary = grid.tick();
            let stored_after: Energy = batteries
                .iter()
                .map(|id| grid.accumulator(*id).unwrap().capacity())
                .sum();

            prop_assert_eq!(summary.networks, 1);
            prop_assert!(summary.consumption >= 0);
            prop_assert_eq!(summary.overflow, summary.production - summary.consumption);
            prop_assert!(summary.overflow >= 0);
            // Stored energy only moves through production and consumption.
            let released = (stored_before - stored_after).max(0);
            prop_assert!(summary.consumption <= summary.production + released);
        }
    }
}
