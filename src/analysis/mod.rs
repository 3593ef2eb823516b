//! Turning solver output into readings.
//!
//! - [`parse_output`] reads the solver's flat `name = value` text.
//! - [`ingest`] maps it onto the netlist's nodes and probes, defaulting and
//!   flagging anything missing.
//! - [`derive_readings`] computes what each meter shows.
//! - [`equivalent_resistance`] answers resistance questions without a solver.
//! - [`Analyzer`] ties these together around an injected [`Solver`](crate::Solver).

mod analyzer;
mod output;
mod readings;
mod resistance;
mod result;

pub use analyzer::{Analysis, Analyzer, OhmmeterReport, Report};
pub use output::{parse_output, parse_output_strict, SolverOutput};
pub use readings::{derive_readings, Quantity, Reading};
pub use resistance::{equivalent_resistance, ohmmeter_resistance};
pub use result::{ingest, AnalysisResult, Gap};
