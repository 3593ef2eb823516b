//! Abstract Syntax Tree types for the schematic text format.

use std::fmt;

use crate::circuit::Pin;

/// Complete AST representation of a parsed schematic.
#[derive(Debug, Clone, Default)]
pub struct SchematicAst {
    /// Title from the `.title` directive
    pub title: Option<String>,
    /// All component declarations, in file order
    pub components: Vec<ComponentDef>,
    /// All wire declarations, in file order
    pub wires: Vec<WireDef>,
}

impl SchematicAst {
    /// Create a new empty schematic AST.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A component declaration.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    pub component_type: ComponentType,
    /// Unique component name
    pub name: String,
    /// Resistance or source magnitude
    pub value: Option<f64>,
    /// Source line number for error reporting
    pub line: usize,
}

/// A wire declaration: `wire <from> <to>`.
#[derive(Debug, Clone)]
pub struct WireDef {
    pub from: PinRef,
    pub to: PinRef,
    pub line: usize,
}

/// Reference to a terminal by component name and pin.
///
/// The pin may be omitted for single-terminal components (ground).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRef {
    pub component: String,
    pub pin: Option<Pin>,
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pin {
            Some(pin) => write!(f, "{}:{}", self.component, pin),
            None => write!(f, "{}", self.component),
        }
    }
}

/// Component types supported by the text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Resistor,
    Ohmmeter,
    VoltageSource,
    CurrentSource,
    Voltmeter,
    Ammeter,
    /// General meter
    Meter,
    Ground,
}

impl ComponentType {
    /// Parse a component type from its keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "resistor" | "res" | "r" => Some(Self::Resistor),
            "ohmmeter" | "ohm" => Some(Self::Ohmmeter),
            "vsource" | "v" => Some(Self::VoltageSource),
            "isource" | "i" => Some(Self::CurrentSource),
            "voltmeter" | "vm" => Some(Self::Voltmeter),
            "ammeter" | "am" => Some(Self::Ammeter),
            "meter" => Some(Self::Meter),
            "ground" | "gnd" => Some(Self::Ground),
            _ => None,
        }
    }

    /// Whether a declaration of this type must carry a value.
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            Self::Resistor | Self::VoltageSource | Self::CurrentSource
        )
    }
}
