//! Persisted per-block wiring: laid cable plus switched-off slots.
//!
//! A switch opens a slot without forgetting it, so reclosing restores the
//! laid cable. The topology only ever sees the effective mask.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grid::PowerGrid;
use crate::mask::ConnectionMask;
use crate::pos::BlockPos;

/// Wiring stored with a block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wiring {
    /// Slots that carry cable.
    pub connection: ConnectionMask,
    /// Slots currently opened by a switch.
    pub interruption: ConnectionMask,
}

impl Wiring {
    pub fn new(connection: ConnectionMask) -> Self {
        Self {
            connection,
            interruption: ConnectionMask::NONE,
        }
    }

    /// Slots that conduct: laid and not interrupted.
    pub fn effective(&self) -> ConnectionMask {
        self.connection & !self.interruption
    }

    /// Open (`true`) or close (`false`) the given slots.
    pub fn set_interrupted(&mut self, slots: ConnectionMask, open: bool) {
        if open {
            self.interruption |= slots;
        } else {
            self.interruption = self.interruption.difference(slots);
        }
    }

    /// Encode for block persistence.
    pub fn encode(&self) -> Vec<u8> {
        // Two u32 fields always encode.
        bitcode::serialize(&(self.connection.bits(), self.interruption.bits())).unwrap_or_default()
    }

    /// Decode persisted wiring. Undecodable bytes and undefined bits fall back
    /// to an empty wiring with a warning, leaving the block unconnected until
    /// it is rewired.
    pub fn decode_or_default(bytes: &[u8]) -> Self {
        let (connection, interruption) = match bitcode::deserialize::<(u32, u32)>(bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "undecodable wiring record, using empty wiring");
                return Self::default();
            }
        };
        match (
            ConnectionMask::from_bits(connection),
            ConnectionMask::from_bits(interruption),
        ) {
            (Some(connection), Some(interruption)) => Self {
                connection,
                interruption,
            },
            _ => {
                warn!(
                    connection = format_args!("{connection:#010x}"),
                    interruption = format_args!("{interruption:#010x}"),
                    "wiring record has undefined slot bits, using empty wiring"
                );
                Self::default()
            }
        }
    }
}

impl PowerGrid {
    /// Report a block's wiring to the topology. Returns whether the
    /// effective mask changed.
    pub fn apply_wiring(&mut self, pos: BlockPos, wiring: &Wiring) -> bool {
        self.set_connection(pos, wiring.effective())
    }
}
