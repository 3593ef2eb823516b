//! Solver-ready circuit elements.

use std::fmt;

use crate::circuit::{ComponentId, NodeLabel};

/// Electrical type of a synthesized element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Resistor,
    VoltageSource,
    CurrentSource,
}

impl ElementKind {
    /// SPICE element letter.
    pub fn spice_prefix(&self) -> char {
        match self {
            Self::Resistor => 'R',
            Self::VoltageSource => 'V',
            Self::CurrentSource => 'I',
        }
    }
}

/// Why an element is in the netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    /// A real resistor or source from the schematic
    Circuit,
    /// Synthetic resistor standing in for a meter or idle ohmmeter
    Probe,
    /// Test excitation replacing the ohmmeter being measured
    TestSource,
}

/// One two-terminal element of a synthesized netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Solver element name, unique within the netlist
    pub name: String,
    /// Schematic component this element was synthesized from
    pub component: ComponentId,
    pub kind: ElementKind,
    pub role: ElementRole,
    /// Nodes in pin order
    pub nodes: [NodeLabel; 2],
    /// Ohms, volts or amps depending on `kind`
    pub value: f64,
}

impl Element {
    /// Build the solver name for a component: element letter followed by the
    /// component name, with anything outside `[A-Za-z0-9_]` replaced by `_`.
    pub fn spice_name(kind: ElementKind, component_name: &str, suffix: Option<&str>) -> String {
        let mut name = String::with_capacity(component_name.len() + 8);
        name.push(kind.spice_prefix());
        name.extend(
            component_name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }),
        );
        if let Some(suffix) = suffix {
            name.push('_');
            name.push_str(suffix);
        }
        name
    }

    /// Output key under which the solver reports this element's current.
    ///
    /// Voltage sources expose a branch vector (`<name>#branch`); resistors
    /// are queried through the device parameter `@<name>[i]`.
    pub fn current_key(&self) -> String {
        match self.kind {
            ElementKind::VoltageSource => format!("{}#branch", self.name).to_lowercase(),
            ElementKind::Resistor | ElementKind::CurrentSource => {
                format!("@{}[i]", self.name).to_lowercase()
            }
        }
    }

    pub fn is_probe(&self) -> bool {
        self.role == ElementRole::Probe
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [n1, n2] = self.nodes;
        match self.kind {
            ElementKind::Resistor => write!(f, "{} {} {} {:e}", self.name, n1, n2, self.value),
            ElementKind::VoltageSource | ElementKind::CurrentSource => {
                write!(f, "{} {} {} DC {:e}", self.name, n1, n2, self.value)
            }
        }
    }
}

/// Output key for a node voltage.
pub fn voltage_key(node: NodeLabel) -> String {
    format!("v({})", node).to_lowercase()
}
