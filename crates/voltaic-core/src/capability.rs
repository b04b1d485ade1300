//! Capability contracts implemented by electrical devices.
//!
//! The grid never inspects devices beyond these three traits. A device may
//! implement several of them, but each registration is a separate
//! capability with its own handle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Energy units. Integral; all division in the grid is floor division.
pub type Energy = i64;

/// The band of energy a consumer accepts per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumptionRange {
    /// Energy the consumer needs before it can do anything useful.
    pub min: Energy,
    /// Energy at which the consumer is fully satisfied.
    pub max: Energy,
}

impl ConsumptionRange {
    pub const fn new(min: Energy, max: Energy) -> Self {
        Self { min, max }
    }

    /// A consumer with no minimum that takes up to `max`.
    pub const fn up_to(max: Energy) -> Self {
        Self { min: 0, max }
    }
}

/// Generates energy once per tick.
pub trait Producer: fmt::Debug {
    /// Energy generated this tick. Called exactly once per tick; may update
    /// device-visible state.
    fn produce(&mut self) -> Energy;
}

/// Consumes energy once per tick.
pub trait Consumer: fmt::Debug {
    fn consumption_range(&self) -> ConsumptionRange;

    /// Receives the granted energy for this tick, in `0..=max`. Called
    /// exactly once per tick, including with zero.
    fn consume(&mut self, granted: Energy);
}

/// Buffers energy between ticks.
pub trait Accumulator: fmt::Debug {
    fn max_capacity(&self) -> Energy;

    /// Currently stored energy.
    fn capacity(&self) -> Energy;

    /// Adds `amount`, never more than `max_capacity() - capacity()`.
    fn store(&mut self, amount: Energy);

    /// Removes `amount`, never more than `capacity()`.
    fn release(&mut self, amount: Energy);

    /// Free headroom.
    fn available_capacity(&self) -> Energy {
        self.max_capacity() - self.capacity()
    }
}
