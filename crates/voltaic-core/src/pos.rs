//! Voxel positions and the six axial faces of a block.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Face
// ---------------------------------------------------------------------------

/// One of the six axial faces of a voxel. Also used as a direction: the
/// direction of a face is the outward normal of that face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Face {
    North,
    East,
    South,
    West,
    Up,
    Down,
}

impl Face {
    /// All six faces in index order.
    pub const ALL: [Face; 6] = [
        Face::North,
        Face::East,
        Face::South,
        Face::West,
        Face::Up,
        Face::Down,
    ];

    /// Stable index in `0..6`, matching [`Face::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Face::North => 0,
            Face::East => 1,
            Face::South => 2,
            Face::West => 3,
            Face::Up => 4,
            Face::Down => 5,
        }
    }

    pub const fn opposite(self) -> Face {
        match self {
            Face::North => Face::South,
            Face::East => Face::West,
            Face::South => Face::North,
            Face::West => Face::East,
            Face::Up => Face::Down,
            Face::Down => Face::Up,
        }
    }

    /// Unit offset `(dx, dy, dz)` of the neighbor across this face.
    /// North is -Z, East is +X, Up is +Y.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::North => (0, 0, -1),
            Face::East => (1, 0, 0),
            Face::South => (0, 0, 1),
            Face::West => (-1, 0, 0),
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
        }
    }

    /// True if `other` lies on the same axis (itself or its opposite).
    pub const fn is_parallel(self, other: Face) -> bool {
        self.index() == other.index() || self.opposite().index() == other.index()
    }

    /// Lower-case name, as used in layout files.
    pub const fn name(self) -> &'static str {
        match self {
            Face::North => "north",
            Face::East => "east",
            Face::South => "south",
            Face::West => "west",
            Face::Up => "up",
            Face::Down => "down",
        }
    }

    /// Parse a lower-case face name.
    pub fn from_name(name: &str) -> Option<Face> {
        Face::ALL.into_iter().find(|face| face.name() == name)
    }
}

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// Integer position of a voxel in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighboring position across `face`.
    pub const fn offset(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}
