//! Component models for schematic analysis.
//!
//! This module provides the schematic's building blocks:
//! - Passive: Resistor
//! - Sources: Voltage Source, Current Source
//! - Instruments: Ohmmeter, Voltmeter, Ammeter, General meter
//! - Reference: Ground
//!
//! Every kind carries exactly the data it needs. A resistor always has a
//! resistance, a source always has a magnitude, and instruments carry none.

mod meters;
mod sources;

pub use meters::MeterKind;
pub use sources::{is_valid_magnitude, SourceKind};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::circuit::{ComponentId, Pin, TerminalId};
use crate::error::{OhmlabError, Result};

/// What a component is, together with its per-kind data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Resistor with a strictly positive resistance in ohms
    Resistor { ohms: f64 },
    /// Resistance meter; replaced by a probe resistor or a test source
    Ohmmeter,
    /// Ideal independent source
    Source { kind: SourceKind, value: f64 },
    /// Voltmeter, ammeter or general meter
    Meter(MeterKind),
    /// Reference node; has a single terminal
    Ground,
}

impl ComponentKind {
    /// Create a resistor kind, validating the resistance.
    pub fn resistor(name: &str, ohms: f64) -> Result<Self> {
        let kind = Self::Resistor { ohms };
        kind.validate(name)?;
        Ok(kind)
    }

    /// Create a source kind, validating the magnitude.
    pub fn source(name: &str, kind: SourceKind, value: f64) -> Result<Self> {
        let kind = Self::Source { kind, value };
        kind.validate(name)?;
        Ok(kind)
    }

    /// Check the per-kind value invariants.
    pub fn validate(&self, name: &str) -> Result<()> {
        match *self {
            Self::Resistor { ohms } if !(ohms.is_finite() && ohms > 0.0) => Err(
                OhmlabError::invalid_value(name, ohms, "resistance must be strictly positive"),
            ),
            Self::Source { value, .. } if !is_valid_magnitude(value) => Err(
                OhmlabError::invalid_value(name, value, "source magnitude must be finite"),
            ),
            _ => Ok(()),
        }
    }

    /// Number of terminals a component of this kind owns.
    pub fn terminal_count(&self) -> usize {
        match self {
            Self::Ground => 1,
            _ => 2,
        }
    }

    /// The numeric value, for kinds that have one.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Self::Resistor { ohms } => Some(ohms),
            Self::Source { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Replace the numeric value, keeping the kind.
    pub fn with_value(&self, value: f64) -> Option<Self> {
        match *self {
            Self::Resistor { .. } => Some(Self::Resistor { ohms: value }),
            Self::Source { kind, .. } => Some(Self::Source { kind, value }),
            _ => None,
        }
    }

    /// Default display-name prefix for auto-generated names.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            Self::Resistor { .. } => "R",
            Self::Ohmmeter => "OHM",
            Self::Source { kind, .. } => kind.name_prefix(),
            Self::Meter(kind) => kind.name_prefix(),
            Self::Ground => "GND",
        }
    }

    pub fn is_ohmmeter(&self) -> bool {
        matches!(self, Self::Ohmmeter)
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, Self::Ground)
    }

    pub fn is_meter(&self) -> bool {
        matches!(self, Self::Meter(_))
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resistor { .. } => write!(f, "resistor"),
            Self::Ohmmeter => write!(f, "ohmmeter"),
            Self::Source { kind, .. } => write!(f, "{} source", kind),
            Self::Meter(kind) => write!(f, "{}", kind),
            Self::Ground => write!(f, "ground"),
        }
    }
}

/// The terminals a component owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminals {
    /// Ground components
    One(TerminalId),
    /// Every other component, in pin order
    Two([TerminalId; 2]),
}

impl Terminals {
    /// Both terminals, for two-terminal components.
    pub fn pair(&self) -> Option<[TerminalId; 2]> {
        match *self {
            Self::One(_) => None,
            Self::Two(pair) => Some(pair),
        }
    }

    /// The terminal on the given pin. Ground answers to either pin.
    pub fn get(&self, pin: Pin) -> TerminalId {
        match *self {
            Self::One(t) => t,
            Self::Two(pair) => pair[pin.index()],
        }
    }

    /// All terminals in pin order.
    pub fn as_slice(&self) -> &[TerminalId] {
        match self {
            Self::One(t) => std::slice::from_ref(t),
            Self::Two(pair) => pair,
        }
    }

    pub fn contains(&self, terminal: TerminalId) -> bool {
        self.as_slice().contains(&terminal)
    }
}

/// A placed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    /// Unique display label
    pub name: String,
    pub kind: ComponentKind,
    pub terminals: Terminals,
}

impl Component {
    /// Both terminals of a two-terminal component.
    pub fn pair(&self) -> Option<[TerminalId; 2]> {
        self.terminals.pair()
    }

    /// The terminal on the given pin.
    pub fn terminal(&self, pin: Pin) -> TerminalId {
        self.terminals.get(pin)
    }
}
