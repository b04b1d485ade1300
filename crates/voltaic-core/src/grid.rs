//! The power grid: capability registry, device arenas and network arena.
//!
//! [`PowerGrid`] is the single owner of all simulation state. It is created
//! empty when a world loads and dropped when it unloads. Topology updates
//! live in [`crate::topology`], the per-tick allocation in
//! [`crate::distribution`].

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::capability::{Accumulator, Consumer, Producer};
use crate::id::{AccumulatorId, ConsumerId, NetworkId, ProducerId};
use crate::network::{Network, NetworkPart};
use crate::pos::{BlockPos, Face};

/// Errors from capability registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("producer {0:?} is not registered")]
    UnknownProducer(ProducerId),
    #[error("consumer {0:?} is not registered")]
    UnknownConsumer(ConsumerId),
    #[error("accumulator {0:?} is not registered")]
    UnknownAccumulator(AccumulatorId),
}

/// All electrical state of one world.
#[derive(Debug, Default)]
pub struct PowerGrid {
    pub(crate) parts: BTreeMap<BlockPos, NetworkPart>,
    pub(crate) networks: SlotMap<NetworkId, Network>,
    pub(crate) producers: SlotMap<ProducerId, Box<dyn Producer>>,
    pub(crate) consumers: SlotMap<ConsumerId, Box<dyn Consumer>>,
    pub(crate) accumulators: SlotMap<AccumulatorId, Box<dyn Accumulator>>,
}

impl PowerGrid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Device arenas --

    /// Register a producer. It takes part in no network until attached to a
    /// position with [`PowerGrid::set_producer`].
    pub fn add_producer(&mut self, producer: Box<dyn Producer>) -> ProducerId {
        self.producers.insert(producer)
    }

    pub fn add_consumer(&mut self, consumer: Box<dyn Consumer>) -> ConsumerId {
        self.consumers.insert(consumer)
    }

    pub fn add_accumulator(&mut self, accumulator: Box<dyn Accumulator>) -> AccumulatorId {
        self.accumulators.insert(accumulator)
    }

    /// Detach a producer from every position and hand it back.
    pub fn remove_producer(&mut self, id: ProducerId) -> Option<Box<dyn Producer>> {
        let holders: Vec<BlockPos> = self
            .parts
            .values()
            .filter(|part| part.producer == Some(id))
            .map(|part| part.position)
            .collect();
        for pos in holders {
            self.replace_producer(pos, None);
        }
        self.producers.remove(id)
    }

    /// Detach a consumer from every position and hand it back.
    pub fn remove_consumer(&mut self, id: ConsumerId) -> Option<Box<dyn Consumer>> {
        let holders: Vec<BlockPos> = self
            .parts
            .values()
            .filter(|part| part.consumer == Some(id))
            .map(|part| part.position)
            .collect();
        for pos in holders {
            self.replace_consumer(pos, None);
        }
        self.consumers.remove(id)
    }

    /// Detach an accumulator from every position and hand it back.
    pub fn remove_accumulator(&mut self, id: AccumulatorId) -> Option<Box<dyn Accumulator>> {
        let holders: Vec<BlockPos> = self
            .parts
            .values()
            .filter(|part| part.accumulator == Some(id))
            .map(|part| part.position)
            .collect();
        for pos in holders {
            self.replace_accumulator(pos, None);
        }
        self.accumulators.remove(id)
    }

    pub fn producer(&self, id: ProducerId) -> Option<&dyn Producer> {
        self.producers.get(id).map(|p| p.as_ref())
    }

    pub fn producer_mut(&mut self, id: ProducerId) -> Option<&mut (dyn Producer + 'static)> {
        self.producers.get_mut(id).map(|p| p.as_mut())
    }

    pub fn consumer(&self, id: ConsumerId) -> Option<&dyn Consumer> {
        self.consumers.get(id).map(|c| c.as_ref())
    }

    pub fn consumer_mut(&mut self, id: ConsumerId) -> Option<&mut (dyn Consumer + 'static)> {
        self.consumers.get_mut(id).map(|c| c.as_mut())
    }

    pub fn accumulator(&self, id: AccumulatorId) -> Option<&dyn Accumulator> {
        self.accumulators.get(id).map(|a| a.as_ref())
    }

    pub fn accumulator_mut(&mut self, id: AccumulatorId) -> Option<&mut (dyn Accumulator + 'static)> {
        self.accumulators.get_mut(id).map(|a| a.as_mut())
    }

    // -- Capability attachment --

    /// Attach (or with `None`, detach) the producer at `pos`.
    ///
    /// A replaced producer leaves every network touching `pos`; the new one
    /// joins all of them.
    pub fn set_producer(&mut self, pos: BlockPos, producer: Option<ProducerId>) -> Result<(), GridError> {
        if let Some(id) = producer {
            if !self.producers.contains_key(id) {
                return Err(GridError::UnknownProducer(id));
            }
        }
        self.replace_producer(pos, producer);
        Ok(())
    }

    /// Attach (or with `None`, detach) the consumer at `pos`.
    pub fn set_consumer(&mut self, pos: BlockPos, consumer: Option<ConsumerId>) -> Result<(), GridError> {
        if let Some(id) = consumer {
            if !self.consumers.contains_key(id) {
                return Err(GridError::UnknownConsumer(id));
            }
        }
        self.replace_consumer(pos, consumer);
        Ok(())
    }

    /// Attach (or with `None`, detach) the accumulator at `pos`.
    pub fn set_accumulator(
        &mut self,
        pos: BlockPos,
        accumulator: Option<AccumulatorId>,
    ) -> Result<(), GridError> {
        if let Some(id) = accumulator {
            if !self.accumulators.contains_key(id) {
                return Err(GridError::UnknownAccumulator(id));
            }
        }
        self.replace_accumulator(pos, accumulator);
        Ok(())
    }

    fn replace_producer(&mut self, pos: BlockPos, producer: Option<ProducerId>) {
        if producer.is_none() && !self.parts.contains_key(&pos) {
            return;
        }
        let part = self.parts.entry(pos).or_insert_with(|| NetworkPart::new(pos));
        if part.producer == producer {
            return;
        }
        part.producer = producer;
        self.recollect_capabilities(pos);
        self.prune(pos);
    }

    fn replace_consumer(&mut self, pos: BlockPos, consumer: Option<ConsumerId>) {
        if consumer.is_none() && !self.parts.contains_key(&pos) {
            return;
        }
        let part = self.parts.entry(pos).or_insert_with(|| NetworkPart::new(pos));
        if part.consumer == consumer {
            return;
        }
        part.consumer = consumer;
        self.recollect_capabilities(pos);
        self.prune(pos);
    }

    fn replace_accumulator(&mut self, pos: BlockPos, accumulator: Option<AccumulatorId>) {
        if accumulator.is_none() && !self.parts.contains_key(&pos) {
            return;
        }
        let part = self.parts.entry(pos).or_insert_with(|| NetworkPart::new(pos));
        if part.accumulator == accumulator {
            return;
        }
        part.accumulator = accumulator;
        self.recollect_capabilities(pos);
        self.prune(pos);
    }

    /// Rebuild the capability sets of every network touching `pos` from
    /// their members. A device attached at several members stays in the
    /// network until the last of them lets go.
    fn recollect_capabilities(&mut self, pos: BlockPos) {
        let Some(part) = self.parts.get(&pos) else {
            return;
        };
        for id in part.distinct_networks() {
            let Some(network) = self.networks.get_mut(id) else {
                continue;
            };
            let mut members = Network::default();
            for member in &network.positions {
                if let Some(part) = self.parts.get(member) {
                    members.attach(part);
                }
            }
            network.producers = members.producers;
            network.consumers = members.consumers;
            network.accumulators = members.accumulators;
        }
    }

    /// Drop the entry at `pos` if it has neither connections nor
    /// capabilities.
    pub(crate) fn prune(&mut self, pos: BlockPos) {
        if self.parts.get(&pos).is_some_and(NetworkPart::is_empty) {
            self.parts.remove(&pos);
        }
    }

    // -- Read access --

    pub fn part(&self, pos: BlockPos) -> Option<&NetworkPart> {
        self.parts.get(&pos)
    }

    /// All registry entries, ordered by position.
    pub fn parts(&self) -> impl Iterator<Item = &NetworkPart> {
        self.parts.values()
    }

    pub fn network(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(id)
    }

    pub fn networks(&self) -> impl Iterator<Item = (NetworkId, &Network)> {
        self.networks.iter()
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// The network of the face slot `face` at `pos`.
    pub fn network_at(&self, pos: BlockPos, face: Face) -> Option<NetworkId> {
        self.parts.get(&pos).and_then(|part| part.network(face))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::ConnectionMask;
    use crate::test_utils::*;

    #[test]
    fn unknown_handles_are_rejected() {
        let mut grid = PowerGrid::new();
        let id = grid.add_producer(Box::new(Generator::new(5)));
        grid.remove_producer(id);

        let err = grid.set_producer(BlockPos::new(0, 0, 0), Some(id)).unwrap_err();
        assert_eq!(err, GridError::UnknownProducer(id));
        assert!(grid.part(BlockPos::new(0, 0, 0)).is_none());
    }

    #[test]
    fn capability_creates_and_removes_entry() {
        let mut grid = PowerGrid::new();
        let pos = BlockPos::new(1, 0, 0);
        let load = grid.add_consumer(Box::new(Load::new(0, 10)));

        grid.set_consumer(pos, Some(load)).unwrap();
        assert_eq!(grid.part(pos).and_then(|p| p.consumer), Some(load));

        grid.set_consumer(pos, None).unwrap();
        assert!(grid.part(pos).is_none());
    }

    #[test]
    fn detaching_unknown_position_is_noop() {
        let mut grid = PowerGrid::new();
        grid.set_accumulator(BlockPos::new(4, 4, 4), None).unwrap();
        assert_eq!(grid.parts().count(), 0);
    }

    #[test]
    fn replacing_capability_updates_every_network() {
        let mut grid = PowerGrid::new();
        let pos = BlockPos::new(0, 0, 0);
        // Two faces, not fused: two networks at one position.
        let mask = ConnectionMask::slot(Face::Down, Face::East)
            | ConnectionMask::slot(Face::Up, Face::East);
        grid.set_connection(pos, mask);
        let down = grid.network_at(pos, Face::Down).unwrap();
        let up = grid.network_at(pos, Face::Up).unwrap();
        assert_ne!(down, up);

        let first = grid.add_producer(Box::new(Generator::new(1)));
        let second = grid.add_producer(Box::new(Generator::new(2)));
        grid.set_producer(pos, Some(first)).unwrap();
        for id in [down, up] {
            assert!(grid.network(id).unwrap().producers.contains(&first));
        }

        grid.set_producer(pos, Some(second)).unwrap();
        for id in [down, up] {
            let network = grid.network(id).unwrap();
            assert!(!network.producers.contains(&first));
            assert!(network.producers.contains(&second));
        }
    }

    #[test]
    fn shared_device_stays_while_another_member_holds_it() {
        let mut grid = PowerGrid::new();
        let line = cable_line(&mut grid, BlockPos::new(0, 0, 0), 2);
        let load = grid.add_consumer(Box::new(Load::new(0, 10)));
        grid.set_consumer(line[0], Some(load)).unwrap();
        grid.set_consumer(line[1], Some(load)).unwrap();
        let net = grid.network_at(line[0], Face::Down).unwrap();

        grid.set_consumer(line[0], None).unwrap();
        assert_eq!(grid.part(line[1]).unwrap().consumer, Some(load));
        assert!(grid.network(net).unwrap().consumers.contains(&load));

        grid.set_consumer(line[1], None).unwrap();
        assert!(grid.network(net).unwrap().consumers.is_empty());
    }

    #[test]
    fn removing_device_detaches_it() {
        let mut grid = PowerGrid::new();
        let pos = BlockPos::new(0, 0, 0);
        grid.set_connection(pos, ConnectionMask::slot(Face::Down, Face::North));
        let battery = grid.add_accumulator(Box::new(Battery::new(100)));
        grid.set_accumulator(pos, Some(battery)).unwrap();
        let net = grid.network_at(pos, Face::Down).unwrap();
        assert_eq!(grid.network(net).unwrap().accumulators.len(), 1);

        let device = grid.remove_accumulator(battery);
        assert!(device.is_some());
        assert!(grid.accumulator(battery).is_none());
        assert!(grid.network(net).unwrap().accumulators.is_empty());
        assert_eq!(grid.part(pos).unwrap().accumulator, None);
    }
}
