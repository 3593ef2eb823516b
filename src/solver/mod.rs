//! External solver boundary.
//!
//! The engine never solves circuits itself. A [`Solver`] takes a
//! synthesized [`Netlist`] and returns the raw `name = value` text the
//! solver printed; everything upstream and downstream of that call is pure.
//!
//! [`NgspiceSolver`] is the production implementation. Tests and embedders
//! can plug in anything else, including a plain closure:
//!
//! ```
//! use ohmlab_core::{Netlist, Schematic, Result};
//!
//! let canned = |_: &Netlist, _: &Schematic| -> Result<String> {
//!     Ok("v(n1) = 2.0\n".to_string())
//! };
//! # let _ = canned;
//! ```

mod config;
mod ngspice;

pub use config::{SolverConfig, EXECUTABLE_ENV, TIMEOUT_ENV};
pub use ngspice::NgspiceSolver;

use crate::circuit::Schematic;
use crate::error::Result;
use crate::netlist::Netlist;

/// Something that can solve a netlist and report raw output.
pub trait Solver {
    /// Check that the solver can be invoked at all.
    ///
    /// Called once before any solve so a missing binary is reported before
    /// work starts.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    /// Solve one netlist, returning the solver's raw key/value output.
    ///
    /// `schematic` is the snapshot the netlist was synthesized from; it is
    /// needed to decide which branch currents to request.
    fn solve(&self, netlist: &Netlist, schematic: &Schematic) -> Result<String>;
}

impl<F> Solver for F
where
    F: Fn(&Netlist, &Schematic) -> Result<String>,
{
    fn solve(&self, netlist: &Netlist, schematic: &Schematic) -> Result<String> {
        self(netlist, schematic)
    }
}
