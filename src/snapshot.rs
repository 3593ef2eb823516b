//! Topology snapshots.
//!
//! A snapshot is the whole schematic encoded as JSON: components, terminal
//! arena and wires. Restoring builds a fresh, independent [`Schematic`];
//! nothing is shared with the schematic that was saved. Undo/redo stacks
//! are left to the caller and can hold these strings directly.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::circuit::Schematic;
use crate::error::Result;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    schematic: &'a Schematic,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    schematic: Schematic,
}

/// Encode the current topology.
pub fn serialize_topology(schematic: &Schematic) -> Result<String> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        schematic,
    };
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Rebuild a topology from [`serialize_topology`] output.
///
/// The restored schematic is integrity-checked, so a hand-edited snapshot
/// with a wire to a missing terminal is rejected here rather than at
/// analysis time.
pub fn restore_topology(encoded: &str) -> Result<Schematic> {
    let snapshot: Snapshot = serde_json::from_str(encoded)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(serde_json::Error::custom(format!(
            "unsupported snapshot version {}",
            snapshot.version
        ))
        .into());
    }
    snapshot.schematic.check_integrity()?;
    Ok(snapshot.schematic)
}
