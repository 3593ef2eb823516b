//! # Ohmlab Core
//!
//! Circuit graph and analysis engine for schematic-based DC measurements.
//!
//! This library provides:
//! - A schematic model of resistors, sources, meters, ohmmeters and ground,
//!   connected by point-to-point wires between terminals
//! - Connectivity resolution of terminals into electrical nodes
//! - Netlist synthesis for an external SPICE solver, in normal and
//!   ohmmeter measurement modes
//! - Ingestion of solver output into node voltages, probe currents and
//!   per-meter readings
//! - An analytical equivalent-resistance calculator that needs no solver
//!
//! ## Architecture
//!
//! - [`circuit`] - Schematic, terminals, wires and the connectivity resolver
//! - [`components`] - Component kinds
//! - [`dsl`] - Line-oriented text format for schematics
//! - [`netlist`] - Netlist synthesis and SPICE deck rendering
//! - [`solver`] - External solver boundary and the ngspice runner
//! - [`analysis`] - Output ingestion, readings, analytical resistance
//! - [`snapshot`] - Topology serialization for undo/redo
//!
//! ## Usage
//!
//! ```bash
//! ohmlab divider.ohm simulate
//! ohmlab divider.ohm resistance R1:a R2:b
//! ```
//!
//! ## Measurement Method
//!
//! Meters never appear in the netlist as themselves. A voltmeter or idle
//! ohmmeter becomes a 1 MΩ probe resistor and an ammeter a 1 µΩ one, so the
//! solver only ever sees resistors and sources. To measure an ohmmeter,
//! every source is zeroed and the ohmmeter is replaced by a 1 V source:
//!
//! ```text
//! R = |V(a) - V(b)| / |I_test|
//! ```

pub mod analysis;
pub mod circuit;
pub mod components;
pub mod dsl;
pub mod error;
pub mod netlist;
pub mod snapshot;
pub mod solver;

// Re-export main types for convenience
pub use analysis::{equivalent_resistance, ingest, AnalysisResult, Analyzer, Reading, Report};
pub use circuit::{resolve, NodeLabel, NodeMap, Schematic};
pub use error::{OhmlabError, Result};
pub use netlist::{synthesize, AnalysisMode, Netlist};
pub use snapshot::{restore_topology, serialize_topology};
pub use solver::{NgspiceSolver, Solver, SolverConfig};

/// Probe resistance standing in for voltmeters and idle ohmmeters (ohms)
pub const PROBE_HIGH_OHMS: f64 = 1e6;

/// Probe resistance standing in for ammeters (ohms)
pub const PROBE_LOW_OHMS: f64 = 1e-6;

/// Test source applied across the ohmmeter being measured (volts)
pub const TEST_VOLTAGE: f64 = 1.0;

/// Default wall-clock limit for one solver run
pub const DEFAULT_SOLVER_TIMEOUT_SECS: u64 = 30;
