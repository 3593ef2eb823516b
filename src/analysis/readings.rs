//! Physical readings derived from an analysis result.

use std::fmt;

use super::result::AnalysisResult;
use crate::circuit::{ComponentId, NodeLabel, NodeMap, Pin, Schematic};
use crate::components::{Component, ComponentKind, MeterKind};
use crate::error::Result;
use crate::netlist::AnalysisMode;
use crate::PROBE_HIGH_OHMS;

/// Test currents below this are treated as no current at all.
const OPEN_CIRCUIT_AMPS: f64 = 1e-15;

/// What a meter shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    /// Ohmmeter reading; infinite for an open circuit
    Resistance { ohms: f64 },
    /// Voltmeter: drop across the meter and the current its probe draws
    Voltage { volts: f64, amps: f64 },
    /// Ammeter: current through the probe and the drop across it
    Current { amps: f64, volts: f64 },
    /// General meter: potential difference only
    Potential { volts: f64 },
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Resistance { ohms } if ohms.is_infinite() => write!(f, "∞ Ω"),
            Self::Resistance { ohms } => write!(f, "{:.2} Ω", ohms),
            Self::Voltage { volts, .. } | Self::Potential { volts } => write!(f, "{:.2} V", volts),
            Self::Current { amps, .. } => write!(f, "{:.2} mA", amps * 1e3),
        }
    }
}

/// A reading mapped back onto its component.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub component: ComponentId,
    pub name: String,
    pub quantity: Quantity,
    /// False when any input to this reading was defaulted
    pub complete: bool,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.quantity)?;
        if !self.complete {
            write!(f, " (incomplete)")?;
        }
        Ok(())
    }
}

/// Derive every reading a result supports.
///
/// A measurement-mode result yields the reading of the ohmmeter it was
/// solved for; a normal-mode result yields one reading per meter.
pub fn derive_readings(
    result: &AnalysisResult,
    schematic: &Schematic,
    node_map: &NodeMap,
) -> Result<Vec<Reading>> {
    match result.mode {
        AnalysisMode::Measurement { ohmmeter } => {
            let Some(component) = schematic.component(ohmmeter) else {
                return Ok(Vec::new());
            };
            Ok(vec![ohmmeter_reading(result, component, node_map)?])
        }
        AnalysisMode::Normal => schematic
            .meters()
            .filter_map(|c| match c.kind {
                ComponentKind::Meter(kind) => Some(meter_reading(result, c, kind, node_map)),
                _ => None,
            })
            .collect(),
    }
}

/// `R = |V(a) - V(b)| / |I_test|`, with the test current read from the
/// solver. No current means an open circuit.
fn ohmmeter_reading(
    result: &AnalysisResult,
    component: &Component,
    node_map: &NodeMap,
) -> Result<Reading> {
    let [a, b] = nodes_of(component, node_map)?;
    let complete = !result.voltage_missing(a)
        && !result.voltage_missing(b)
        && result.current(&component.name).is_some()
        && !result.current_missing(&component.name);

    let drop = result.voltage_between(a, b).abs();
    let current = result.current(&component.name).unwrap_or(0.0).abs();

    // Partial results read as open circuit
    let ohms = if !complete || current < OPEN_CIRCUIT_AMPS {
        f64::INFINITY
    } else {
        drop / current
    };

    Ok(Reading {
        component: component.id,
        name: component.name.clone(),
        quantity: Quantity::Resistance { ohms },
        complete,
    })
}

/// Readings built from a defaulted voltage show 0 V rather than a
/// half-real difference.
fn meter_reading(
    result: &AnalysisResult,
    component: &Component,
    kind: MeterKind,
    node_map: &NodeMap,
) -> Result<Reading> {
    let [a, b] = nodes_of(component, node_map)?;
    let voltages_complete = !result.voltage_missing(a) && !result.voltage_missing(b);
    let volts = if voltages_complete {
        result.voltage_between(a, b).abs()
    } else {
        0.0
    };

    let (quantity, complete) = match kind {
        MeterKind::Voltmeter => (
            Quantity::Voltage {
                volts,
                amps: volts / PROBE_HIGH_OHMS,
            },
            voltages_complete,
        ),
        MeterKind::Ammeter => {
            // Read directly; the probe is too small for Ohm's law to be stable
            let amps = result.current(&component.name).unwrap_or(0.0);
            let current_complete = !result.current_missing(&component.name);
            (
                Quantity::Current { amps, volts },
                voltages_complete && current_complete,
            )
        }
        MeterKind::General => (Quantity::Potential { volts }, voltages_complete),
    };

    Ok(Reading {
        component: component.id,
        name: component.name.clone(),
        quantity,
        complete,
    })
}

fn nodes_of(component: &Component, node_map: &NodeMap) -> Result<[NodeLabel; 2]> {
    match component.pair() {
        Some(pair) => node_map.pair(pair),
        None => {
            let node = node_map.node(component.terminal(Pin::A))?;
            Ok([node, node])
        }
    }
}
