//! SPICE deck rendering for batch-mode ngspice.

use std::fmt::Write as _;
use std::path::Path;

use super::synth::Netlist;
use crate::circuit::Schematic;

/// Render a netlist as a complete ngspice input deck.
///
/// The deck runs a single operating-point analysis and prints every
/// requested key to `output`, one `name = value` line per key.
pub fn render_deck(netlist: &Netlist, schematic: &Schematic, output: &Path) -> String {
    let mut deck = String::new();

    // First line of a SPICE deck is always the title
    let _ = writeln!(deck, "* {}", netlist.title);
    let _ = writeln!(deck, "* mode: {}", netlist.mode);

    for element in &netlist.elements {
        let _ = writeln!(deck, "{}", element);
    }

    deck.push_str(".op\n");
    deck.push_str(".control\n");
    deck.push_str("set noaskquit\n");
    deck.push_str("op\n");

    let keys = netlist.requested_keys(schematic);
    if !keys.is_empty() {
        let _ = writeln!(deck, "print {} > {}", keys.join(" "), output.display());
    }

    deck.push_str(".endc\n");
    deck.push_str(".end\n");
    deck
}
