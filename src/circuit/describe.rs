//! Plain-text description of a resolved schematic.

use std::fmt::Write;

use super::{NodeMap, Schematic};
use crate::components::ComponentKind;

/// List every component with its nodes, every wire and the ground node.
///
/// Terminals missing from `node_map` are shown as `?`.
pub fn describe(schematic: &Schematic, node_map: &NodeMap) -> String {
    let node = |t| {
        node_map
            .get(t)
            .map(|l| l.to_string())
            .unwrap_or_else(|| "?".to_string())
    };

    let mut out = String::from("Circuit contains:\n");
    for component in schematic.components() {
        let Some([a, b]) = component.pair() else {
            continue;
        };
        let (n1, n2) = (node(a), node(b));
        // Writing into a String cannot fail.
        let _ = match component.kind {
            ComponentKind::Resistor { ohms } => writeln!(
                out,
                "- Resistor {}: {} Ω between nodes {} and {}",
                component.name, ohms, n1, n2
            ),
            ComponentKind::Source { kind, value } => writeln!(
                out,
                "- {} source {}: {} {} between nodes {} and {}",
                capitalize(&kind.to_string()),
                component.name,
                value,
                kind.unit(),
                n1,
                n2
            ),
            ComponentKind::Ohmmeter => writeln!(
                out,
                "- Ohmmeter {} measures between nodes {} and {}",
                component.name, n1, n2
            ),
            ComponentKind::Meter(kind) => writeln!(
                out,
                "- {} {} between nodes {} and {}",
                capitalize(&kind.to_string()),
                component.name,
                n1,
                n2
            ),
            ComponentKind::Ground => Ok(()),
        };
    }

    for wire in schematic.wires() {
        let _ = writeln!(
            out,
            "- Connection {} - {} between nodes {} and {}",
            schematic.terminal_name(wire.a),
            schematic.terminal_name(wire.b),
            node(wire.a),
            node(wire.b)
        );
    }

    for ground in schematic.grounds() {
        let _ = writeln!(
            out,
            "- Ground {} at node {}",
            ground.name,
            node(ground.terminals.as_slice()[0])
        );
    }

    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
