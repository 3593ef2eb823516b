//! Analytical equivalent resistance.
//!
//! Works on the resistor-only multigraph of a resolved schematic: vertices
//! are nodes, edges are resistors. Every simple path between the two end
//! nodes is enumerated by depth-first search and the path resistances are
//! combined as parallel conductances:
//!
//! ```text
//! 1 / R_eq = Σ 1 / R_path
//! ```
//!
//! Paths are treated as independent. The result is exact when no two
//! paths share a resistor and an underestimate otherwise.
//!
//! # Cost
//!
//! The number of simple paths grows exponentially with graph density, and
//! there is no node or edge limit. Hand-drawn schematics have a handful of
//! resistors, where the enumeration is instant. Large or densely meshed
//! networks should be solved with the external solver instead.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::circuit::{NodeLabel, NodeMap, Schematic, TerminalId};
use crate::components::ComponentKind;
use crate::error::{OhmlabError, Result};

/// Resistor multigraph keyed by node.
#[derive(Debug, Default)]
struct ResistorGraph {
    adjacency: BTreeMap<NodeLabel, Vec<(NodeLabel, f64)>>,
}

impl ResistorGraph {
    fn build(schematic: &Schematic, node_map: &NodeMap) -> Result<Self> {
        let mut graph = Self::default();
        for component in schematic.components() {
            let ComponentKind::Resistor { ohms } = component.kind else {
                continue;
            };
            let Some(pair) = component.pair() else {
                continue;
            };
            let [a, b] = node_map.pair(pair)?;
            // Shorted resistors carry no current
            if a == b {
                continue;
            }
            graph.adjacency.entry(a).or_default().push((b, ohms));
            graph.adjacency.entry(b).or_default().push((a, ohms));
        }
        Ok(graph)
    }

    fn neighbours(&self, node: NodeLabel) -> &[(NodeLabel, f64)] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Running totals of one path enumeration.
#[derive(Debug, Default)]
struct PathSum {
    conductance: f64,
    paths: usize,
    shorted: bool,
}

/// Depth-first walk over simple paths. Returns early once a zero-ohm path
/// is found, since it dominates every other path.
fn walk(
    graph: &ResistorGraph,
    at: NodeLabel,
    target: NodeLabel,
    path_ohms: f64,
    visited: &mut BTreeSet<NodeLabel>,
    sum: &mut PathSum,
) {
    if at == target {
        sum.paths += 1;
        if path_ohms <= 0.0 {
            sum.shorted = true;
        } else {
            sum.conductance += 1.0 / path_ohms;
        }
        return;
    }

    visited.insert(at);
    for &(next, ohms) in graph.neighbours(at) {
        if visited.contains(&next) {
            continue;
        }
        walk(graph, next, target, path_ohms + ohms, visited, sum);
        if sum.shorted {
            break;
        }
    }
    visited.remove(&at);
}

/// Equivalent resistance between two terminals.
///
/// Zero when both terminals sit on the same node, infinite when no resistor
/// path joins them.
pub fn equivalent_resistance(
    a: TerminalId,
    b: TerminalId,
    schematic: &Schematic,
    node_map: &NodeMap,
) -> Result<f64> {
    let start = node_map.node(a)?;
    let target = node_map.node(b)?;
    if start == target {
        return Ok(0.0);
    }

    let graph = ResistorGraph::build(schematic, node_map)?;
    let mut sum = PathSum::default();
    walk(&graph, start, target, 0.0, &mut BTreeSet::new(), &mut sum);

    let ohms = if sum.shorted {
        0.0
    } else if sum.conductance > 0.0 {
        1.0 / sum.conductance
    } else {
        f64::INFINITY
    };

    debug!(from = %start, to = %target, paths = sum.paths, ohms, "analytical resistance");
    Ok(ohms)
}

/// Equivalent resistance seen by an ohmmeter across its two pins.
///
/// The ohmmeter itself is not a resistor, so it never appears in the graph.
pub fn ohmmeter_resistance(name: &str, schematic: &Schematic, node_map: &NodeMap) -> Result<f64> {
    let component = schematic.require(name)?;
    let Some([a, b]) = component.pair().filter(|_| component.kind.is_ohmmeter()) else {
        return Err(OhmlabError::NotAnOhmmeter {
            name: name.to_string(),
        });
    };
    equivalent_resistance(a, b, schematic, node_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{resolve, Pin};
    use approx::assert_relative_eq;

    fn wire(s: &mut Schematic, a: (&str, Pin), b: (&str, Pin)) {
        let ta = s.terminal(a.0, a.1).unwrap();
        let tb = s.terminal(b.0, b.1).unwrap();
        s.connect(ta, tb).unwrap();
    }

    fn between(s: &Schematic, a: (&str, Pin), b: (&str, Pin)) -> f64 {
        let map = resolve(s).unwrap();
        equivalent_resistance(
            s.terminal(a.0, a.1).unwrap(),
            s.terminal(b.0, b.1).unwrap(),
            s,
            &map,
        )
        .unwrap()
    }

    #[test]
    fn test_parallel() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 100.0).unwrap();
        wire(&mut s, ("R1", Pin::A), ("R2", Pin::A));
        wire(&mut s, ("R1", Pin::B), ("R2", Pin::B));
        assert_relative_eq!(between(&s, ("R1", Pin::A), ("R1", Pin::B)), 50.0);
    }

    #[test]
    fn test_series() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 100.0).unwrap();
        wire(&mut s, ("R1", Pin::B), ("R2", Pin::A));
        assert_relative_eq!(between(&s, ("R1", Pin::A), ("R2", Pin::B)), 200.0);
    }

    #[test]
    fn test_direct_short() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 100.0).unwrap();
        wire(&mut s, ("R1", Pin::A), ("R2", Pin::A));
        assert_eq!(between(&s, ("R1", Pin::A), ("R2", Pin::A)), 0.0);
    }

    #[test]
    fn test_no_path() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 100.0).unwrap();
        assert!(between(&s, ("R1", Pin::A), ("R2", Pin::B)).is_infinite());
    }

    #[test]
    fn test_shorted_resistor_skipped() {
        // R2 has both pins on the same node and must not count as a path
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 5.0).unwrap();
        wire(&mut s, ("R1", Pin::A), ("R2", Pin::A));
        wire(&mut s, ("R2", Pin::A), ("R2", Pin::B));
        assert_relative_eq!(between(&s, ("R1", Pin::A), ("R1", Pin::B)), 100.0);
    }

    #[test]
    fn test_disjoint_branches() {
        // (R1 + R2) || (R3 + R4) = 300 || 300
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 200.0).unwrap();
        s.add_resistor("R3", 150.0).unwrap();
        s.add_resistor("R4", 150.0).unwrap();
        wire(&mut s, ("R1", Pin::A), ("R3", Pin::A));
        wire(&mut s, ("R1", Pin::B), ("R2", Pin::A));
        wire(&mut s, ("R3", Pin::B), ("R4", Pin::A));
        wire(&mut s, ("R2", Pin::B), ("R4", Pin::B));
        assert_relative_eq!(
            between(&s, ("R1", Pin::A), ("R2", Pin::B)),
            150.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cycle_terminates() {
        // Triangle of 100 Ω: 100 || 200 between any two corners
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 100.0).unwrap();
        s.add_resistor("R3", 100.0).unwrap();
        wire(&mut s, ("R1", Pin::B), ("R2", Pin::A));
        wire(&mut s, ("R2", Pin::B), ("R3", Pin::A));
        wire(&mut s, ("R3", Pin::B), ("R1", Pin::A));
        assert_relative_eq!(
            between(&s, ("R1", Pin::A), ("R1", Pin::B)),
            200.0 / 3.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_ohmmeter_resistance() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 470.0).unwrap();
        s.add_ohmmeter("OHM1").unwrap();
        wire(&mut s, ("R1", Pin::A), ("OHM1", Pin::A));
        wire(&mut s, ("R1", Pin::B), ("OHM1", Pin::B));
        let map = resolve(&s).unwrap();

        assert_relative_eq!(ohmmeter_resistance("OHM1", &s, &map).unwrap(), 470.0);
        assert!(matches!(
            ohmmeter_resistance("R1", &s, &map),
            Err(OhmlabError::NotAnOhmmeter { .. })
        ));
    }
}
