//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, in the
//! integration test crates.

use std::cell::Cell;
use std::rc::Rc;

use crate::capability::{Accumulator, Consumer, ConsumptionRange, Energy, Producer};
use crate::grid::PowerGrid;
use crate::mask::ConnectionMask;
use crate::pos::{BlockPos, Face};

// ===========================================================================
// Masks and layouts
// ===========================================================================

/// A floor cable running east-west: `(Down, East) | (Down, West)`.
pub fn floor_east_west() -> ConnectionMask {
    ConnectionMask::from_slots([(Face::Down, Face::East), (Face::Down, Face::West)])
}

/// A floor cable running north-south.
pub fn floor_north_south() -> ConnectionMask {
    ConnectionMask::from_slots([(Face::Down, Face::North), (Face::Down, Face::South)])
}

/// Lay `len` east-west floor cables starting at `start` and heading east.
pub fn cable_line(grid: &mut PowerGrid, start: BlockPos, len: i32) -> Vec<BlockPos> {
    let positions: Vec<BlockPos> = (0..len)
        .map(|dx| BlockPos::new(start.x + dx, start.y, start.z))
        .collect();
    for pos in &positions {
        grid.set_connection(*pos, floor_east_west());
    }
    positions
}

// ===========================================================================
// Devices
// ===========================================================================

/// Producer with a fixed output that tests may change between ticks.
#[derive(Debug, Clone)]
pub struct Generator {
    output: Rc<Cell<Energy>>,
}

impl Generator {
    pub fn new(output: Energy) -> Self {
        Self {
            output: Rc::new(Cell::new(output)),
        }
    }

    /// A generator plus a handle to adjust its output.
    pub fn probed(output: Energy) -> (Self, Rc<Cell<Energy>>) {
        let generator = Self::new(output);
        let handle = Rc::clone(&generator.output);
        (generator, handle)
    }
}

impl Producer for Generator {
    fn produce(&mut self) -> Energy {
        self.output.get()
    }
}

/// Consumer with a fixed range that records its last grant.
#[derive(Debug, Clone)]
pub struct Load {
    range: ConsumptionRange,
    received: Rc<Cell<Energy>>,
}

impl Load {
    pub fn new(min: Energy, max: Energy) -> Self {
        Self {
            range: ConsumptionRange::new(min, max),
            received: Rc::new(Cell::new(0)),
        }
    }

    /// A load plus a handle that reads its last grant.
    pub fn probed(min: Energy, max: Energy) -> (Self, Rc<Cell<Energy>>) {
        let load = Self::new(min, max);
        let handle = Rc::clone(&load.received);
        (load, handle)
    }

    pub fn received(&self) -> Energy {
        self.received.get()
    }
}

impl Consumer for Load {
    fn consumption_range(&self) -> ConsumptionRange {
        self.range
    }

    fn consume(&mut self, granted: Energy) {
        assert!(
            (0..=self.range.max).contains(&granted),
            "granted {granted} outside 0..={}",
            self.range.max
        );
        self.received.set(granted);
    }
}

/// Accumulator that asserts it is never over- or under-drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battery {
    max: Energy,
    charge: Energy,
}

impl Battery {
    pub fn new(max: Energy) -> Self {
        Self { max, charge: 0 }
    }

    pub fn charged(max: Energy, charge: Energy) -> Self {
        assert!((0..=max).contains(&charge));
        Self { max, charge }
    }
}

impl Accumulator for Battery {
    fn max_capacity(&self) -> Energy {
        self.max
    }

    fn capacity(&self) -> Energy {
        self.charge
    }

    fn store(&mut self, amount: Energy) {
        assert!(amount >= 0 && self.charge + amount <= self.max, "overcharged by {amount}");
        self.charge += amount;
    }

    fn release(&mut self, amount: Energy) {
        assert!(amount >= 0 && amount <= self.charge, "overdrawn by {amount}");
        self.charge -= amount;
    }
}
