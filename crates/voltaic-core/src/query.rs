//! Read-only network summaries for informational display.
//!
//! All types are owned copies -- no references into grid storage.

use crate::capability::Energy;
use crate::grid::PowerGrid;
use crate::mask::ConnectionMask;
use crate::pos::BlockPos;

/// Aggregated counters of the distinct networks touching some faces of a
/// position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    pub production: Energy,
    pub consumption: Energy,
    pub overflow: Energy,
    /// Member positions, summed over the distinct networks.
    pub blocks: usize,
    pub consumers: usize,
    pub producers: usize,
    pub accumulators: usize,
    /// Full face blocks of the requested faces that carry a network.
    pub faces: ConnectionMask,
}

impl PowerGrid {
    /// Sum the last tick's counters of every distinct network referenced by
    /// the faces of `pos` that intersect `faces`.
    ///
    /// A network reached through several faces is counted once.
    pub fn network_info(&self, pos: BlockPos, faces: ConnectionMask) -> NetworkInfo {
        let mut info = NetworkInfo::default();
        let Some(part) = self.parts.get(&pos) else {
            return info;
        };

        let mut seen = Vec::with_capacity(6);
        for face in faces.faces() {
            let Some(id) = part.network(face) else {
                continue;
            };
            info.faces |= ConnectionMask::face(face);
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);

            let Some(network) = self.networks.get(id) else {
                continue;
            };
            info.production += network.production;
            info.consumption += network.consumption;
            info.overflow += network.overflow;
            info.blocks += network.positions.len();
            info.consumers += network.consumers.len();
            info.producers += network.producers.len();
            info.accumulators += network.accumulators.len();
        }
        info
    }
}
