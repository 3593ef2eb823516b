//! Precondition checks run before anything is handed to a solver.

use crate::components::ComponentKind;
use crate::error::{OhmlabError, Result};

use super::Schematic;

/// Validate a schematic for solver analysis.
///
/// Checks:
/// - There is something to analyze: at least one resistor, ohmmeter or meter
/// - A ground component exists, so node voltages have a reference
/// - Every wire refers to live terminals
pub fn validate_schematic(schematic: &Schematic) -> Result<()> {
    let analyzable = schematic
        .components()
        .iter()
        .any(|c| !matches!(c.kind, ComponentKind::Ground | ComponentKind::Source { .. }));
    if !analyzable {
        return Err(OhmlabError::NoComponents);
    }

    if !schematic.has_ground() {
        return Err(OhmlabError::MissingGround);
    }

    schematic.check_integrity()
}
