//! Cable layout files.
//!
//! A layout is a list of blocks, each with a position and the slots it
//! carries, written as `"face:direction"`:
//!
//! ```text
//! [
//!     (position: (0, 0, 0), slots: ["down:east", "down:west"]),
//!     (position: (1, 0, 0), slots: ["down:west"]),
//! ]
//! ```
//!
//! TOML layouts put the list under a top-level `blocks` key.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use voltaic_core::grid::PowerGrid;
use voltaic_core::mask::ConnectionMask;
use voltaic_core::pos::{BlockPos, Face};

use crate::loader::{DataLoadError, deserialize_list};

/// One block of a layout file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutBlock {
    pub position: [i32; 3],
    pub slots: Vec<String>,
}

/// A layout with every slot resolved into a mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub blocks: Vec<(BlockPos, ConnectionMask)>,
}

/// Parse `"face:direction"`. `None` for unknown names or a direction on the
/// face's own axis.
pub fn parse_slot(slot: &str) -> Option<(Face, Face)> {
    let (face, direction) = slot.split_once(':')?;
    let face = Face::from_name(face.trim())?;
    let direction = Face::from_name(direction.trim())?;
    if face.is_parallel(direction) {
        return None;
    }
    Some((face, direction))
}

impl Layout {
    /// Resolve raw blocks. `file` is used in error messages only.
    pub fn resolve(blocks: &[LayoutBlock], file: &Path) -> Result<Self, DataLoadError> {
        let mut resolved = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut mask = ConnectionMask::NONE;
            for slot in &block.slots {
                let (face, direction) =
                    parse_slot(slot).ok_or_else(|| DataLoadError::InvalidSlot {
                        file: file.to_path_buf(),
                        position: block.position,
                        slot: slot.clone(),
                    })?;
                mask |= ConnectionMask::slot(face, direction);
            }
            resolved.push((BlockPos::from(block.position), mask));
        }
        Ok(Self { blocks: resolved })
    }

    /// Load and resolve a layout file (RON, TOML or JSON).
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let blocks: Vec<LayoutBlock> = deserialize_list(path, "blocks")?;
        let layout = Self::resolve(&blocks, path)?;
        debug!(file = %path.display(), blocks = layout.blocks.len(), "loaded layout");
        Ok(layout)
    }

    /// Connect every block. Later entries for the same position replace
    /// earlier ones. Returns the number of masks that changed.
    pub fn apply(&self, grid: &mut PowerGrid) -> usize {
        self.blocks
            .iter()
            .filter(|(pos, mask)| grid.set_connection(*pos, *mask))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn block(position: [i32; 3], slots: &[&str]) -> LayoutBlock {
        LayoutBlock {
            position,
            slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voltaic_data_layout_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parse_slot_accepts_perpendicular_pairs() {
        assert_eq!(parse_slot("down:east"), Some((Face::Down, Face::East)));
        assert_eq!(parse_slot("north : up"), Some((Face::North, Face::Up)));
    }

    #[test]
    fn parse_slot_rejects_bad_input() {
        assert_eq!(parse_slot("down:up"), None);
        assert_eq!(parse_slot("east:east"), None);
        assert_eq!(parse_slot("floor:east"), None);
        assert_eq!(parse_slot("down"), None);
    }

    #[test]
    fn resolve_builds_masks() {
        let layout = Layout::resolve(
            &[block([0, 0, 0], &["down:east", "down:west"]), block([1, 0, 0], &[])],
            Path::new("inline"),
        )
        .unwrap();
        assert_eq!(
            layout.blocks[0],
            (
                BlockPos::new(0, 0, 0),
                ConnectionMask::from_slots([(Face::Down, Face::East), (Face::Down, Face::West)])
            )
        );
        assert_eq!(layout.blocks[1].1, ConnectionMask::NONE);
    }

    #[test]
    fn resolve_reports_offending_slot() {
        let err = Layout::resolve(&[block([4, 5, 6], &["up:down"])], Path::new("bad.ron"))
            .unwrap_err();
        match err {
            DataLoadError::InvalidSlot { position, slot, .. } => {
                assert_eq!(position, [4, 5, 6]);
                assert_eq!(slot, "up:down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ron_layout_applies_to_grid() {
        let path = write_temp(
            "line.ron",
            r#"[
                (position: (0, 0, 0), slots: ["down:east"]),
                (position: (1, 0, 0), slots: ["down:west", "down:east"]),
                (position: (2, 0, 0), slots: ["down:west"]),
            ]"#,
        );
        let layout = Layout::load(&path).unwrap();
        let mut grid = PowerGrid::new();
        assert_eq!(layout.apply(&mut grid), 3);
        assert_eq!(grid.network_count(), 1);
        assert_eq!(layout.apply(&mut grid), 0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn toml_layout_uses_blocks_key() {
        let path = write_temp(
            "line.toml",
            r#"
[[blocks]]
position = [0, 0, 0]
slots = ["down:north"]

[[blocks]]
position = [0, 0, -1]
slots = ["down:south"]
"#,
        );
        let layout = Layout::load(&path).unwrap();
        let mut grid = PowerGrid::new();
        layout.apply(&mut grid);
        assert_eq!(grid.network_count(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn json_layout_with_bad_slot_fails() {
        let path = write_temp(
            "bad.json",
            r#"[{"position": [0, 0, 0], "slots": ["down:sideways"]}]"#,
        );
        assert!(matches!(
            Layout::load(&path),
            Err(DataLoadError::InvalidSlot { .. })
        ));
        let _ = fs::remove_file(path);
    }
}
