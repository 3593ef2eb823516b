//! Schematic representation, connectivity and validation.
//!
//! This module holds the topology a user draws: components owning their
//! terminals, and wires between terminals. [`resolve`] turns that topology
//! into a [`NodeMap`] telling which terminals are electrically identical.

mod connectivity;
mod describe;
mod graph;
mod types;
mod validate;

pub use connectivity::{resolve, NodeMap};
pub use describe::describe;
pub use graph::{Schematic, TerminalSlot};
pub use types::*;
pub use validate::validate_schematic;
