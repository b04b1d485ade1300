//! Per-position registry entries and the networks they belong to.

use std::collections::BTreeSet;

use crate::capability::Energy;
use crate::id::{AccumulatorId, ConsumerId, NetworkId, ProducerId};
use crate::mask::ConnectionMask;
use crate::pos::{BlockPos, Face};

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A connected component of the electrical graph.
///
/// Holds the member positions, the capabilities attached at those
/// positions, and the totals of the most recently completed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    /// Positions with at least one face slot in this network.
    pub positions: BTreeSet<BlockPos>,
    pub producers: BTreeSet<ProducerId>,
    pub consumers: BTreeSet<ConsumerId>,
    pub accumulators: BTreeSet<AccumulatorId>,
    /// Energy available last tick (generation plus accumulator discharge).
    pub production: Energy,
    /// Energy handed to consumers and stored in accumulators last tick.
    pub consumption: Energy,
    /// `production - consumption`: energy lost last tick.
    pub overflow: Energy,
}

impl Network {
    /// Register every capability attached to `part`.
    pub fn attach(&mut self, part: &NetworkPart) {
        if let Some(producer) = part.producer {
            self.producers.insert(producer);
        }
        if let Some(consumer) = part.consumer {
            self.consumers.insert(consumer);
        }
        if let Some(accumulator) = part.accumulator {
            self.accumulators.insert(accumulator);
        }
    }

    /// Take over the members and capabilities of `other`.
    pub fn absorb(&mut self, other: Network) {
        self.positions.extend(other.positions);
        self.producers.extend(other.producers);
        self.consumers.extend(other.consumers);
        self.accumulators.extend(other.accumulators);
    }
}

// ---------------------------------------------------------------------------
// NetworkPart
// ---------------------------------------------------------------------------

/// Registry entry for one voxel: its connection mask, the network of each
/// face slot, and at most one capability of each kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPart {
    pub position: BlockPos,
    pub connection: ConnectionMask,
    /// Network of each face, indexed by [`Face::index`]. `Some` exactly for
    /// the faces occupied in `connection`.
    pub networks: [Option<NetworkId>; 6],
    pub producer: Option<ProducerId>,
    pub consumer: Option<ConsumerId>,
    pub accumulator: Option<AccumulatorId>,
}

impl NetworkPart {
    pub fn new(position: BlockPos) -> Self {
        Self {
            position,
            connection: ConnectionMask::NONE,
            networks: [None; 6],
            producer: None,
            consumer: None,
            accumulator: None,
        }
    }

    pub fn network(&self, face: Face) -> Option<NetworkId> {
        self.networks[face.index()]
    }

    pub fn has_capability(&self) -> bool {
        self.producer.is_some() || self.consumer.is_some() || self.accumulator.is_some()
    }

    /// An entry with no connection and no capability is dropped from the
    /// registry.
    pub fn is_empty(&self) -> bool {
        self.connection.is_empty() && !self.has_capability()
    }

    /// Distinct networks referenced by any face, in face order.
    pub fn distinct_networks(&self) -> Vec<NetworkId> {
        let mut out = Vec::with_capacity(6);
        for id in self.networks.iter().flatten() {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }
}
