//! Core identifier types for schematic representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a terminal in the schematic's terminal arena.
///
/// Terminals are owned by exactly one component and are never shared.
/// Identifiers stay stable for the lifetime of a schematic, even after the
/// owning component is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerminalId(pub usize);

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A unique identifier for a component in the schematic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Which end of a component a terminal sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pin {
    /// First terminal (positive side of sources and meters)
    A,
    /// Second terminal
    B,
}

impl Pin {
    /// Parse a pin from its text form (`a`/`b`, `1`/`2`, `+`/`-`).
    pub fn from_text(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "a" | "1" | "+" | "p" => Some(Self::A),
            "b" | "2" | "-" | "n" => Some(Self::B),
            _ => None,
        }
    }

    /// Position of this pin in a component's terminal list.
    pub fn index(&self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// Label of an electrical node.
///
/// Every terminal connected to a ground component collapses into
/// [`NodeLabel::Ground`], rendered as the reserved label `0`. All other
/// nodes are numbered in the order a resolution pass first meets them; the
/// numbers carry no meaning beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    /// The reference node `0`
    Ground,
    /// Any other node
    Net(usize),
}

impl NodeLabel {
    /// Check if this is the ground node.
    pub fn is_ground(&self) -> bool {
        matches!(self, Self::Ground)
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ground => write!(f, "0"),
            Self::Net(n) => write!(f, "N{}", n),
        }
    }
}

/// An unordered connection between two distinct terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub a: TerminalId,
    pub b: TerminalId,
}

impl Wire {
    /// Create a new wire.
    pub fn new(a: TerminalId, b: TerminalId) -> Self {
        Self { a, b }
    }

    /// Check whether this wire touches `terminal`.
    pub fn touches(&self, terminal: TerminalId) -> bool {
        self.a == terminal || self.b == terminal
    }

    /// Check whether this wire joins the two given terminals, in either order.
    pub fn joins(&self, x: TerminalId, y: TerminalId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_label_display() {
        assert_eq!(NodeLabel::Ground.to_string(), "0");
        assert_eq!(NodeLabel::Net(3).to_string(), "N3");
        assert!(NodeLabel::Ground < NodeLabel::Net(1));
    }

    #[test]
    fn test_wire_is_unordered() {
        let w = Wire::new(TerminalId(1), TerminalId(4));
        assert!(w.joins(TerminalId(4), TerminalId(1)));
        assert!(w.touches(TerminalId(1)));
        assert!(!w.touches(TerminalId(2)));
    }

    #[test]
    fn test_pin_from_text() {
        assert_eq!(Pin::from_text("A"), Some(Pin::A));
        assert_eq!(Pin::from_text("2"), Some(Pin::B));
        assert_eq!(Pin::from_text("x"), None);
    }
}
