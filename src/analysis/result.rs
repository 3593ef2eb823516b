//! Ingestion of solver output into an analysis result.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use super::output::parse_output;
use crate::circuit::{NodeLabel, Schematic};
use crate::netlist::{voltage_key, AnalysisMode, Netlist};

/// A value the solver was asked for but did not deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Gap {
    /// Node voltage missing; defaulted to 0 V
    NodeVoltage(NodeLabel),
    /// Probe current missing; defaulted to 0 A
    BranchCurrent { component: String, key: String },
    /// Output line with a `=` but no parsable value
    Malformed { line: usize, text: String },
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeVoltage(node) => write!(f, "missing voltage for node {}", node),
            Self::BranchCurrent { component, key } => {
                write!(f, "missing current '{}' for {}", key, component)
            }
            Self::Malformed { line, text } => {
                write!(f, "malformed output line {}: {:?}", line, text)
            }
        }
    }
}

/// Everything learned from one solver run.
///
/// Built fresh for every run and never updated in place. A result with
/// gaps still carries a value for every requested quantity, but
/// [`is_complete`](Self::is_complete) reports it as partial.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub mode: AnalysisMode,
    /// Voltage of every non-ground node
    pub node_voltages: BTreeMap<NodeLabel, f64>,
    /// Current through each probed component, keyed by component name
    pub branch_currents: BTreeMap<String, f64>,
    pub gaps: Vec<Gap>,
}

impl AnalysisResult {
    /// Voltage at a node. Ground is always 0 V.
    pub fn voltage(&self, node: NodeLabel) -> f64 {
        match node {
            NodeLabel::Ground => 0.0,
            net => self.node_voltages.get(&net).copied().unwrap_or(0.0),
        }
    }

    /// Voltage of `a` relative to `b`.
    pub fn voltage_between(&self, a: NodeLabel, b: NodeLabel) -> f64 {
        self.voltage(a) - self.voltage(b)
    }

    pub fn current(&self, component: &str) -> Option<f64> {
        self.branch_currents.get(component).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Whether the voltage at `node` was defaulted.
    pub fn voltage_missing(&self, node: NodeLabel) -> bool {
        self.gaps.iter().any(|g| *g == Gap::NodeVoltage(node))
    }

    /// Whether the current through `component` was defaulted.
    pub fn current_missing(&self, component: &str) -> bool {
        self.gaps
            .iter()
            .any(|g| matches!(g, Gap::BranchCurrent { component: c, .. } if c == component))
    }
}

/// Map raw solver output back onto the netlist's nodes and probes.
///
/// Never fails: every requested value the output lacks is defaulted to
/// zero and recorded as a [`Gap`].
pub fn ingest(raw: &str, netlist: &Netlist, schematic: &Schematic) -> AnalysisResult {
    let output = parse_output(raw);
    let mut gaps: Vec<Gap> = output
        .malformed
        .iter()
        .map(|(line, text)| Gap::Malformed {
            line: *line,
            text: text.clone(),
        })
        .collect();

    let mut node_voltages = BTreeMap::new();
    for &node in &netlist.nodes {
        let value = output.get(&voltage_key(node)).unwrap_or_else(|| {
            gaps.push(Gap::NodeVoltage(node));
            0.0
        });
        node_voltages.insert(node, value);
    }
    // Never sent to the solver; their potential is undefined
    for &node in &netlist.untouched {
        gaps.push(Gap::NodeVoltage(node));
        node_voltages.insert(node, 0.0);
    }

    let mut branch_currents = BTreeMap::new();
    for element in netlist.current_probes(schematic) {
        let Some(component) = schematic.component(element.component) else {
            continue;
        };
        let key = element.current_key();
        let value = output.get(&key).unwrap_or_else(|| {
            gaps.push(Gap::BranchCurrent {
                component: component.name.clone(),
                key: key.clone(),
            });
            0.0
        });
        branch_currents.insert(component.name.clone(), value);
    }

    for gap in &gaps {
        warn!(mode = %netlist.mode, "{}", gap);
    }
    debug!(
        nodes = node_voltages.len(),
        currents = branch_currents.len(),
        gaps = gaps.len(),
        "ingested solver output"
    );

    AnalysisResult {
        mode: netlist.mode,
        node_voltages,
        branch_currents,
        gaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{resolve, Pin};
    use crate::components::MeterKind;
    use crate::netlist::synthesize;
    use approx::assert_relative_eq;

    fn series_with_ammeter() -> Schematic {
        let mut s = Schematic::new();
        s.add_voltage_source("V1", 2.0).unwrap();
        s.add_meter("A1", MeterKind::Ammeter).unwrap();
        s.add_resistor("R1", 200.0).unwrap();
        s.add_ground("GND").unwrap();
        let t = |s: &Schematic, n: &str, p: Pin| s.terminal(n, p).unwrap();
        s.connect(t(&s, "V1", Pin::A), t(&s, "A1", Pin::A)).unwrap();
        s.connect(t(&s, "A1", Pin::B), t(&s, "R1", Pin::A)).unwrap();
        s.connect(t(&s, "R1", Pin::B), t(&s, "GND", Pin::A)).unwrap();
        s.connect(t(&s, "V1", Pin::B), t(&s, "GND", Pin::A)).unwrap();
        s
    }

    #[test]
    fn test_ingest_complete() {
        let s = series_with_ammeter();
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();

        let raw = "v(n1) = 2.0\nv(n2) = 1.99999999\n@ra1_probe[i] = 0.01\n";
        let result = ingest(raw, &netlist, &s);

        assert!(result.is_complete());
        assert_relative_eq!(result.current("A1").unwrap(), 0.01);
        assert_relative_eq!(result.voltage(NodeLabel::Ground), 0.0);
        let n1 = map.node(s.terminal("V1", Pin::A).unwrap()).unwrap();
        assert_relative_eq!(result.voltage(n1), 2.0);
    }

    #[test]
    fn test_missing_values_are_gaps() {
        let s = series_with_ammeter();
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();

        let result = ingest("v(n1) = 2.0\n", &netlist, &s);

        assert!(!result.is_complete());
        assert!(result.voltage_missing(NodeLabel::Net(2)));
        assert!(!result.voltage_missing(NodeLabel::Net(1)));
        assert!(result.current_missing("A1"));
        assert_relative_eq!(result.voltage(NodeLabel::Net(2)), 0.0);
        assert_relative_eq!(result.current("A1").unwrap(), 0.0);
    }

    #[test]
    fn test_empty_output() {
        let s = series_with_ammeter();
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();

        let result = ingest("", &netlist, &s);
        assert_eq!(result.gaps.len(), netlist.nodes.len() + 1);
    }

    #[test]
    fn test_untouched_node_is_a_local_gap() {
        let mut s = series_with_ammeter();
        s.add_meter("M1", MeterKind::General).unwrap();
        let (r1, m1) = (s.terminal("R1", Pin::A).unwrap(), s.terminal("M1", Pin::A).unwrap());
        s.connect(r1, m1).unwrap();
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();
        let dangling = map.node(s.terminal("M1", Pin::B).unwrap()).unwrap();

        let raw = "v(n1) = 2.0\nv(n2) = 1.99999999\n@ra1_probe[i] = 0.01\n";
        let result = ingest(raw, &netlist, &s);

        assert_eq!(result.gaps, vec![Gap::NodeVoltage(dangling)]);
        assert!(result.voltage_missing(dangling));
        assert_relative_eq!(result.voltage(dangling), 0.0);
        assert_relative_eq!(result.current("A1").unwrap(), 0.01);

        let readings = crate::analysis::derive_readings(&result, &s, &map).unwrap();
        let m1 = readings.iter().find(|r| r.name == "M1").unwrap();
        assert!(!m1.complete);
        assert_eq!(m1.quantity, crate::analysis::Quantity::Potential { volts: 0.0 });
    }
}
