//! Netlist synthesis.
//!
//! A [`Netlist`] is the solver-facing form of a schematic: every
//! two-terminal component becomes one [`Element`] between resolved nodes.
//! Meters are stood in for by probe resistors so the measured circuit is
//! disturbed as little as possible, and in measurement mode one ohmmeter
//! is replaced by a 1 V test source while every independent source is
//! zeroed.
//!
//! Elements are always emitted in the same order: resistors, sources,
//! ohmmeters, meters. Within each group they follow schematic order, so
//! the same schematic always yields the same deck.

mod deck;
mod element;
mod synth;

pub use deck::render_deck;
pub use element::{voltage_key, Element, ElementKind, ElementRole};
pub use synth::{synthesize, AnalysisMode, Netlist};
