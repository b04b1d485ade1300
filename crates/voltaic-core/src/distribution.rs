//! Per-tick energy distribution.
//!
//! Each network is balanced independently, once per tick:
//!
//! 1. Sum production from every producer.
//! 2. If production falls short of total maximum demand, discharge
//!    accumulators evenly to cover the deficit.
//! 3. Admit consumer groups (equal minimum) in ascending order of minimum,
//!    while their combined minimum still fits in the available energy.
//! 4. Share the surplus evenly among admitted consumers below their maximum.
//! 5. Hand every consumer its grant, including zero.
//! 6. Store what is left in accumulators, smallest headroom first.
//!
//! All arithmetic is integral with floor division; every loop makes
//! progress or stops.

use std::collections::BTreeMap;

use slotmap::SlotMap;
use tracing::trace;

use crate::capability::{Accumulator, ConsumptionRange, Energy};
use crate::grid::PowerGrid;
use crate::id::{AccumulatorId, ConsumerId, NetworkId};

// ---------------------------------------------------------------------------
// Consumer allocation
// ---------------------------------------------------------------------------

/// Outcome of sharing energy among consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Energy granted to each consumer, aligned with the input ranges.
    pub given: Vec<Energy>,
    /// Energy nobody took.
    pub remaining: Energy,
}

/// Share `available` among consumers with the given ranges.
///
/// Consumers are grouped by minimum and groups are admitted in ascending
/// order of minimum while the group's combined minimum fits. A group that
/// does not fit gets nothing, even if a later group could have been funded.
/// The surplus is then shared evenly among admitted consumers still below
/// their maximum, at least one unit per consumer per pass.
pub fn allocate(ranges: &[ConsumptionRange], available: Energy) -> Allocation {
    let mut given = vec![0; ranges.len()];
    let mut available = available.max(0);

    let mut groups: BTreeMap<Energy, Vec<usize>> = BTreeMap::new();
    for (i, range) in ranges.iter().enumerate() {
        groups.entry(range.min).or_default().push(i);
    }

    let mut admitted = Vec::with_capacity(ranges.len());
    for (min, members) in groups {
        let cost = min * members.len() as Energy;
        if cost <= available {
            available -= cost;
            for &i in &members {
                given[i] = min;
            }
            admitted.extend(members);
        }
    }

    while available > 0 {
        let dissatisfied: Vec<usize> = admitted
            .iter()
            .copied()
            .filter(|&i| ranges[i].max > given[i])
            .collect();
        if dissatisfied.is_empty() {
            break;
        }

        let share = (available / dissatisfied.len() as Energy).max(1);
        for i in dissatisfied {
            if available == 0 {
                break;
            }
            let grant = share.min(ranges[i].max - given[i]);
            available -= grant;
            given[i] += grant;
        }

        let unmet: Energy = admitted
            .iter()
            .map(|&i| (ranges[i].max - given[i]).max(0))
            .sum();
        if unmet == 0 {
            break;
        }
    }

    Allocation {
        given,
        remaining: available,
    }
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Split `overflow` among accumulators with the given headroom.
///
/// Returns the amount to store in each, aligned with `headroom`. If the
/// overflow covers all headroom, every accumulator is filled. Otherwise
/// accumulators are served smallest headroom first, each offered an even
/// share of what is still left, so no energy is offered to an accumulator
/// that cannot hold it.
pub fn split_overflow(overflow: Energy, headroom: &[Energy]) -> Vec<Energy> {
    let mut grants = vec![0; headroom.len()];
    if overflow <= 0 {
        return grants;
    }

    let mut order: Vec<usize> = (0..headroom.len()).filter(|&i| headroom[i] > 0).collect();
    if order.is_empty() {
        return grants;
    }
    // Stable: equal headroom keeps input order.
    order.sort_by_key(|&i| headroom[i]);

    let desired: Energy = order.iter().map(|&i| headroom[i]).sum();
    if overflow >= desired {
        for i in order {
            grants[i] = headroom[i];
        }
        return grants;
    }

    let mut left = overflow;
    let mut slots = order.len() as Energy;
    for i in order {
        let grant = headroom[i].min(left / slots);
        grants[i] = grant;
        left -= grant;
        slots -= 1;
    }
    grants
}

/// Discharge accumulators evenly until `deficit` is covered or no even
/// share remains. Returns the energy released.
fn discharge(
    accumulators: &mut SlotMap<AccumulatorId, Box<dyn Accumulator>>,
    ids: &[AccumulatorId],
    deficit: Energy,
) -> Energy {
    let mut released = 0;
    loop {
        let missing = deficit - released;
        if missing <= 0 {
            break;
        }

        let charged: Vec<AccumulatorId> = ids
            .iter()
            .copied()
            .filter(|id| accumulators.get(*id).is_some_and(|a| a.capacity() > 0))
            .collect();
        if charged.is_empty() {
            break;
        }

        let rest = missing / charged.len() as Energy;
        if rest == 0 {
            break;
        }

        for id in charged {
            if let Some(accumulator) = accumulators.get_mut(id) {
                let amount = accumulator.capacity().min(rest);
                if amount > 0 {
                    accumulator.release(amount);
                    released += amount;
                }
            }
        }
    }
    released
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Totals across every network for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub networks: usize,
    pub production: Energy,
    pub consumption: Energy,
    pub overflow: Energy,
}

impl PowerGrid {
    /// Balance every network once. Networks do not interact.
    pub fn tick(&mut self) -> TickSummary {
        let ids: Vec<NetworkId> = self.networks.keys().collect();
        let mut summary = TickSummary::default();

        for id in ids {
            self.tick_network(id);
            if let Some(network) = self.networks.get(id) {
                summary.networks += 1;
                summary.production += network.production;
                summary.consumption += network.consumption;
                summary.overflow += network.overflow;
            }
        }
        summary
    }

    fn tick_network(&mut self, id: NetworkId) {
        let Some(network) = self.networks.get(id) else {
            return;
        };
        let producer_ids: Vec<_> = network.producers.iter().copied().collect();
        let consumer_ids: Vec<ConsumerId> = network.consumers.iter().copied().collect();
        let accumulator_ids: Vec<AccumulatorId> = network.accumulators.iter().copied().collect();

        let mut production: Energy = 0;
        for pid in producer_ids {
            if let Some(producer) = self.producers.get_mut(pid) {
                production += producer.produce();
            }
        }

        let consumers: Vec<(ConsumerId, ConsumptionRange)> = consumer_ids
            .iter()
            .filter_map(|cid| {
                self.consumers
                    .get(*cid)
                    .map(|consumer| (*cid, consumer.consumption_range()))
            })
            .collect();
        let required: Energy = consumers.iter().map(|(_, range)| range.max).sum();

        if production < required {
            production += discharge(&mut self.accumulators, &accumulator_ids, required - production);
        }

        let ranges: Vec<ConsumptionRange> = consumers.iter().map(|(_, range)| *range).collect();
        let allocation = allocate(&ranges, production);
        for ((cid, _), given) in consumers.iter().zip(&allocation.given) {
            if let Some(consumer) = self.consumers.get_mut(*cid) {
                consumer.consume(*given);
            }
        }

        let mut consumption: Energy = allocation.given.iter().sum();

        let surplus = production - consumption;
        if surplus > 0 {
            let headroom: Vec<(AccumulatorId, Energy)> = accumulator_ids
                .iter()
                .filter_map(|aid| {
                    self.accumulators
                        .get(*aid)
                        .map(|accumulator| (*aid, accumulator.available_capacity()))
                })
                .collect();
            let amounts: Vec<Energy> = headroom.iter().map(|(_, free)| *free).collect();
            let grants = split_overflow(surplus, &amounts);
            for ((aid, _), grant) in headroom.iter().zip(grants) {
                if grant <= 0 {
                    continue;
                }
                if let Some(accumulator) = self.accumulators.get_mut(*aid) {
                    accumulator.store(grant);
                    consumption += grant;
                }
            }
        }

        if let Some(network) = self.networks.get_mut(id) {
            network.production = production;
            network.consumption = consumption;
            network.overflow = production - consumption;
            trace!(
                network = ?id,
                production,
                consumption,
                overflow = network.overflow,
                "balanced network"
            );
        }
    }
}
