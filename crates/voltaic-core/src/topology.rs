//! Incremental maintenance of the network partition.
//!
//! Every occupied face slot of every registry entry belongs to exactly one
//! [`Network`], and two slots share a network if and only if a chain of
//! mutually matching slots connects them.
//!
//! # Adjacency
//!
//! A slot `(F, D)` at `P` (cable on face `F`, running towards `D`) meets:
//!
//! 1. `(F, -D)` at `P + D`, a straight run on the same face,
//! 2. `(-D, F)` at `P + D`, an inner corner onto the neighbor's wall,
//! 3. `(-D, -F)` at `P + D + F`, an outer corner wrapping the edge,
//! 4. `(-F, -D)` at `P + D + F`, a run across the shared face layer,
//! 5. `(D, -F)` at `P + F`, rule 2 seen from the wall side.
//!
//! Within one position, faces `F` and `D` are fused when both `(F, D)` and
//! `(D, F)` are set.
//!
//! # Updates
//!
//! Added slots merge the networks they touch. Removed slots cannot be
//! resolved incrementally, so the affected network is discarded and all of
//! its surviving members are re-added from scratch, which splits it into
//! however many components remain.

use std::collections::BTreeMap;

use tracing::debug;

use crate::grid::PowerGrid;
use crate::id::NetworkId;
use crate::mask::ConnectionMask;
use crate::network::{Network, NetworkPart};
use crate::pos::{BlockPos, Face};

/// Absorbed network -> the network that absorbed it, within one update.
#[derive(Debug, Default)]
struct Redirects(BTreeMap<NetworkId, NetworkId>);

impl Redirects {
    fn resolve(&self, mut id: NetworkId) -> NetworkId {
        while let Some(next) = self.0.get(&id) {
            id = *next;
        }
        id
    }
}

impl PowerGrid {
    /// Replace the connection mask at `pos`. Returns `false` if the mask
    /// did not change.
    pub fn set_connection(&mut self, pos: BlockPos, mask: ConnectionMask) -> bool {
        let old = match self.parts.get(&pos) {
            Some(part) => part.connection,
            None => ConnectionMask::NONE,
        };
        if old == mask {
            return false;
        }

        self.parts
            .entry(pos)
            .or_insert_with(|| NetworkPart::new(pos))
            .connection = mask;

        self.add_connections(pos, mask.difference(old));
        self.remove_connections(pos, old.difference(mask));
        self.prune(pos);
        true
    }

    /// Drop the entry at `pos` with all its connections and capabilities,
    /// as when the owning block is destroyed.
    pub fn remove(&mut self, pos: BlockPos) {
        let Some(part) = self.parts.remove(&pos) else {
            return;
        };
        // The entry is gone, so rebuilding leaves it and its capabilities out.
        for id in part.distinct_networks() {
            // An earlier rebuild may already have consumed this network.
            if self.networks.contains_key(id) {
                self.rebuild_network(id);
            }
        }
    }

    /// Connect the slots in `added` (already present in the entry's mask)
    /// to their neighbors, merging networks as needed.
    fn add_connections(&mut self, pos: BlockPos, added: ConnectionMask) {
        if added.is_empty() {
            return;
        }
        let Some(part) = self.parts.get(&pos) else {
            return;
        };
        let mask = part.connection;
        let own = part.networks;

        let mut candidates: [Vec<NetworkId>; 6] = Default::default();

        for face in mask.faces() {
            let id = match own[face.index()] {
                Some(id) => id,
                None => self.networks.insert(Network::default()),
            };
            candidates[face.index()].push(id);
        }

        for (face, direction) in added.slots() {
            let found = self.neighbor_networks(pos, face, direction);
            candidates[face.index()].extend(found);
        }

        let mut redirects = Redirects::default();

        for face in mask.faces() {
            let id = self.merge_networks(&candidates[face.index()], &mut redirects);
            if let Some(part) = self.parts.get_mut(&pos) {
                if let Some(network) = self.networks.get_mut(id) {
                    network.attach(part);
                    network.positions.insert(pos);
                }
                part.networks[face.index()] = Some(id);
            }
        }

        self.fuse_faces(pos, &mut redirects);
    }

    /// Merge the networks of faces joined inside `pos` itself.
    fn fuse_faces(&mut self, pos: BlockPos, redirects: &mut Redirects) {
        let Some(mask) = self.parts.get(&pos).map(|part| part.connection) else {
            return;
        };
        for (face, direction) in mask.slots() {
            if !mask.has(direction, face) {
                continue;
            }
            let (a, b) = match self.parts.get(&pos) {
                Some(part) => (part.network(face), part.network(direction)),
                None => (None, None),
            };
            match (a, b) {
                (Some(a), Some(b)) => {
                    if a != b {
                        self.merge_networks(&[a, b], redirects);
                    }
                }
                _ => panic!(
                    "fused faces {face:?}/{direction:?} at {pos:?} lack a network \
                     ({a:?}, {b:?}): partition is corrupt"
                ),
            }
        }
    }

    /// Networks of every neighbor slot that meets `(face, direction)` at
    /// `pos`. Neighbors whose slot has no network yet are skipped; they
    /// will find this slot when they are added.
    fn neighbor_networks(&self, pos: BlockPos, face: Face, direction: Face) -> Vec<NetworkId> {
        let back = direction.opposite();
        let under = face.opposite();
        let straight = pos.offset(direction);
        let diagonal = straight.offset(face);
        let across = pos.offset(face);

        // (neighbor position, slot it must carry, face whose network joins)
        let probes = [
            (straight, face, back, face),
            (straight, back, face, back),
            (diagonal, back, under, back),
            (diagonal, under, back, under),
            (across, direction, under, direction),
        ];

        probes
            .into_iter()
            .filter_map(|(at, slot_face, slot_direction, join)| {
                let neighbor = self.parts.get(&at)?;
                if neighbor.connection.has(slot_face, slot_direction) {
                    neighbor.network(join)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Merge `ids` into the largest of them and return the survivor.
    /// Creates a fresh network if `ids` is empty.
    fn merge_networks(&mut self, ids: &[NetworkId], redirects: &mut Redirects) -> NetworkId {
        let mut live: Vec<NetworkId> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = redirects.resolve(*id);
            if self.networks.contains_key(id) && !live.contains(&id) {
                live.push(id);
            }
        }

        let mut survivor = None;
        let mut best = 0;
        for id in &live {
            let size = self.networks[*id].positions.len();
            if survivor.is_none() || size > best {
                survivor = Some(*id);
                best = size;
            }
        }
        let Some(survivor) = survivor else {
            return self.networks.insert(Network::default());
        };

        let mut absorbed = 0;
        for id in live {
            if id == survivor {
                continue;
            }
            let Some(network) = self.networks.remove(id) else {
                continue;
            };
            for member in &network.positions {
                if let Some(part) = self.parts.get_mut(member) {
                    for slot in part.networks.iter_mut() {
                        if *slot == Some(id) {
                            *slot = Some(survivor);
                        }
                    }
                }
            }
            if let Some(target) = self.networks.get_mut(survivor) {
                target.absorb(network);
            }
            redirects.0.insert(id, survivor);
            absorbed += 1;
        }

        if absorbed > 0 {
            debug!(?survivor, absorbed, "merged networks");
        }
        survivor
    }

    /// Rebuild the networks affected by removing `removed` from `pos`.
    fn remove_connections(&mut self, pos: BlockPos, removed: ConnectionMask) {
        for face in removed.faces() {
            // Re-read each time: a previous rebuild may have replaced it.
            if let Some(id) = self.network_at(pos, face) {
                self.rebuild_network(id);
            }
        }
    }

    /// Discard network `id` and re-add every surviving member from scratch.
    fn rebuild_network(&mut self, id: NetworkId) {
        let Some(network) = self.networks.remove(id) else {
            return;
        };

        for member in &network.positions {
            if let Some(part) = self.parts.get_mut(member) {
                for slot in part.networks.iter_mut() {
                    if *slot == Some(id) {
                        *slot = None;
                    }
                }
            }
        }

        let before = self.networks.len();
        for member in &network.positions {
            let Some(mask) = self.parts.get(member).map(|part| part.connection) else {
                continue;
            };
            self.add_connections(*member, mask);
        }

        debug!(
            network = ?id,
            members = network.positions.len(),
            networks = self.networks.len(),
            created = self.networks.len().saturating_sub(before),
            "rebuilt network"
        );
    }
}
