//! Voltaic Core -- power grids embedded in a voxel world.
//!
//! Cable blocks lay connections on the faces of voxels. This crate keeps the
//! resulting electrical networks partitioned as cables are placed and broken,
//! and balances each network's energy once per fixed tick.
//!
//! # Topology
//!
//! Each voxel carries a 24-slot [`mask::ConnectionMask`]: six faces, four
//! directions per face. [`grid::PowerGrid::set_connection`] merges networks
//! incrementally when slots are added and rebuilds the affected component
//! when slots are removed, so a network always equals a connected component.
//!
//! # Distribution
//!
//! [`grid::PowerGrid::tick`] runs, per network:
//!
//! 1. **Production** -- every producer is asked once.
//! 2. **Deficit** -- accumulators are discharged evenly to cover demand.
//! 3. **Minimums** -- consumer groups are admitted by ascending minimum.
//! 4. **Fair share** -- the surplus is split evenly among admitted consumers.
//! 5. **Storage** -- leftovers charge accumulators, smallest headroom first.
//!
//! # Key Types
//!
//! - [`grid::PowerGrid`] -- Registry, device arenas and network arena.
//! - [`capability`] -- `Producer`, `Consumer` and `Accumulator` contracts.
//! - [`network::Network`] -- A connected component and its last tick totals.
//! - [`wiring::Wiring`] -- Persisted cable plus switch interruptions.
//! - [`serialize`] -- Versioned connection snapshots via bitcode.
//! - [`clock::TickClock`] -- Fixed-cadence tick scheduling.

pub mod capability;
pub mod clock;
pub mod distribution;
pub mod grid;
pub mod id;
pub mod mask;
pub mod network;
pub mod pos;
pub mod query;
pub mod serialize;
pub mod topology;
pub mod wiring;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
