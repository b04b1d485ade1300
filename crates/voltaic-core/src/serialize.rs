//! Connection snapshots for world save/load.
//!
//! Networks are derived state and are never persisted. A snapshot records
//! each position's connection mask; loading replays the masks through the
//! topology so the partition is rebuilt from scratch. Capabilities are
//! reattached by the host, in any order.
//!
//! Encoding is `bitcode` with a versioned header.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grid::PowerGrid;
use crate::mask::ConnectionMask;
use crate::pos::BlockPos;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a connection snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x7017_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
}

impl SnapshotHeader {
    pub fn new() -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Every connected position and its raw mask bits, sorted by position.
///
/// Masks are stored as raw bits so a damaged entry can be detected and
/// dropped on restore instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub header: SnapshotHeader,
    pub entries: Vec<(BlockPos, u32)>,
}

pub fn serialize_snapshot(snapshot: &ConnectionSnapshot) -> Result<Vec<u8>, SerializeError> {
    bitcode::serialize(snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
}

pub fn deserialize_snapshot(data: &[u8]) -> Result<ConnectionSnapshot, DeserializeError> {
    let snapshot: ConnectionSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    Ok(snapshot)
}

impl PowerGrid {
    /// Capture the connection mask of every connected position.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        let entries = self
            .parts
            .values()
            .filter(|part| !part.connection.is_empty())
            .map(|part| (part.position, part.connection.bits()))
            .collect();
        ConnectionSnapshot {
            header: SnapshotHeader::new(),
            entries,
        }
    }

    /// Replay a snapshot's masks. Entries with undefined bits are logged and
    /// treated as unconnected.
    pub fn restore(&mut self, snapshot: &ConnectionSnapshot) {
        for &(pos, bits) in &snapshot.entries {
            let mask = match ConnectionMask::from_bits(bits) {
                Some(mask) => mask,
                None => {
                    warn!(
                        ?pos,
                        bits = format_args!("{bits:#010x}"),
                        "snapshot entry has undefined slot bits, treating as unconnected"
                    );
                    ConnectionMask::NONE
                }
            };
            self.set_connection(pos, mask);
        }
    }
}
