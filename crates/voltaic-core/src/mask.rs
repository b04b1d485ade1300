//! 24-bit connection masks over (face, direction) slots.
//!
//! Every face of a voxel carries four slots, one per direction that is
//! perpendicular to the face. A set slot `(face, direction)` means a cable
//! lies on `face` and runs towards `direction`. The six faces times four
//! directions give the 24 bits of a [`ConnectionMask`].
//!
//! # Bit layout
//!
//! Faces occupy 4-bit blocks from the most significant end, in
//! [`Face::ALL`] order (North in bits 20..24, Down in bits 0..4). Within a
//! block, slots are ordered as listed by [`perpendicular`], most significant
//! bit first.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

use crate::pos::Face;

/// The four directions perpendicular to `face`, in slot order.
pub const fn perpendicular(face: Face) -> [Face; 4] {
    match face {
        Face::North | Face::South => [Face::East, Face::West, Face::Up, Face::Down],
        Face::East | Face::West => [Face::North, Face::South, Face::Up, Face::Down],
        Face::Up | Face::Down => [Face::North, Face::East, Face::South, Face::West],
    }
}

/// Slot index of `direction` within `face`, or `None` if the pair is on one
/// axis and therefore not a valid slot.
fn slot_index(face: Face, direction: Face) -> Option<usize> {
    perpendicular(face).iter().position(|d| *d == direction)
}

/// Which (face, direction) slots of a voxel carry a connection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ConnectionMask(u32);

impl ConnectionMask {
    pub const NONE: ConnectionMask = ConnectionMask(0);
    pub const ALL: ConnectionMask = ConnectionMask(0x00FF_FFFF);

    /// Build a mask from raw bits. Returns `None` if any bit outside the
    /// 24 defined slots is set.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Build a mask from raw bits, dropping undefined bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The single slot `(face, direction)`. Empty if `direction` is
    /// parallel to `face`.
    pub fn slot(face: Face, direction: Face) -> Self {
        match slot_index(face, direction) {
            Some(slot) => Self(1 << (23 - 4 * face.index() - slot)),
            None => Self::NONE,
        }
    }

    /// All four slots on `face`.
    pub const fn face(face: Face) -> Self {
        Self(0xF << (20 - 4 * face.index()))
    }

    /// Every slot, on any face, that runs towards `direction`.
    pub fn direction(direction: Face) -> Self {
        Face::ALL
            .into_iter()
            .fold(Self::NONE, |acc, face| acc | Self::slot(face, direction))
    }

    /// Build a mask from a list of slots. Invalid pairs are ignored.
    pub fn from_slots(slots: impl IntoIterator<Item = (Face, Face)>) -> Self {
        slots
            .into_iter()
            .fold(Self::NONE, |acc, (face, direction)| acc | Self::slot(face, direction))
    }

    pub fn has(self, face: Face, direction: Face) -> bool {
        self.intersects(Self::slot(face, direction))
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Slots set in `self` but not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Faces with at least one occupied slot, in [`Face::ALL`] order.
    pub fn faces(self) -> impl Iterator<Item = Face> {
        Face::ALL
            .into_iter()
            .filter(move |face| self.intersects(Self::face(*face)))
    }

    /// Directions that appear on any face, in [`Face::ALL`] order.
    pub fn directions(self) -> impl Iterator<Item = Face> {
        Face::ALL
            .into_iter()
            .filter(move |direction| self.intersects(Self::direction(*direction)))
    }

    /// Every occupied `(face, direction)` slot.
    pub fn slots(self) -> impl Iterator<Item = (Face, Face)> {
        self.faces().flat_map(move |face| {
            perpendicular(face)
                .into_iter()
                .filter(move |direction| self.has(face, *direction))
                .map(move |direction| (face, direction))
        })
    }

    /// Number of occupied slots.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for ConnectionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConnectionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ConnectionMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ConnectionMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for ConnectionMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl fmt::Debug for ConnectionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionMask[")?;
        for (i, (face, direction)) in self.slots().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", face.name(), direction.name())?;
        }
        write!(f, "]")
    }
}
