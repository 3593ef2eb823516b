//! Text format for authoring schematics.
//!
//! Schematics are normally drawn in a graphical editor. This module gives
//! the same topology a line-oriented, human-editable form so that the
//! engine can be driven from files and the command line.
//!
//! # Grammar Overview
//!
//! ```text
//! schematic   = { line }
//! line        = comment | directive | component | wire | empty
//! comment     = ('#' | ';' | '*') { any_char }
//! directive   = ".title" { word } | ".end"
//! component   = type name [value]
//! wire        = "wire" pin_ref pin_ref
//!
//! type        = "resistor" | "ohmmeter" | "vsource" | "isource"
//!             | "voltmeter" | "ammeter" | "meter" | "ground"
//! pin_ref     = name [':' pin]
//! pin         = 'a' | 'b' | '1' | '2'
//! value       = number [unit_suffix]
//!
//! number      = ['-'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! # Component Types
//!
//! | Keyword | Description | Syntax |
//! |---------|-------------|--------|
//! | resistor | Resistor | `resistor <name> <ohms>` |
//! | vsource | Voltage source | `vsource <name> <volts>` |
//! | isource | Current source | `isource <name> <amps>` |
//! | ohmmeter | Ohmmeter | `ohmmeter <name>` |
//! | voltmeter | Voltmeter | `voltmeter <name>` |
//! | ammeter | Ammeter | `ammeter <name>` |
//! | meter | General meter | `meter <name>` |
//! | ground | Ground | `ground [name]` |
//!
//! Pin `a` is the positive side of sources and meters.
//!
//! # Example
//!
//! ```text
//! # Divider
//! vsource  V1 2
//! resistor R1 100
//! resistor R2 100
//! ground   GND
//!
//! wire V1:a R1:a
//! wire R1:b R2:a
//! wire R2:b GND
//! wire V1:b GND
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::circuit::Schematic;
use crate::error::{OhmlabError, Result};

/// Parse schematic text into an AST.
pub fn parse(input: &str) -> Result<SchematicAst> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse schematic text straight into a [`Schematic`].
pub fn parse_schematic(input: &str) -> Result<Schematic> {
    Schematic::from_ast(parse(input)?)
}

/// Parse a schematic file.
pub fn parse_file(path: &std::path::Path) -> Result<Schematic> {
    let content = std::fs::read_to_string(path).map_err(|e| OhmlabError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_schematic(&content)
}

/// Parse a `component[:pin]` terminal reference such as `R1:a`.
pub fn parse_pin_ref(input: &str) -> Result<PinRef> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse_pin_ref_only()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Pin;
    use std::io::Write;

    const DIVIDER: &str = "\
.title Divider
vsource  V1 2
resistor R1 100
resistor R2 100
ground
wire V1:a R1:a
wire R1:b R2:a
wire R2:b GND
wire V1:b GND
";

    #[test]
    fn test_build_schematic() {
        let s = parse_schematic(DIVIDER).unwrap();
        assert_eq!(s.title.as_deref(), Some("Divider"));
        assert_eq!(s.components().len(), 4);
        assert_eq!(s.wires().len(), 4);
        assert!(s.has_ground());
    }

    #[test]
    fn test_pin_ref() {
        let r = parse_pin_ref("R1:b").unwrap();
        assert_eq!(r.component, "R1");
        assert_eq!(r.pin, Some(Pin::B));
        assert!(parse_pin_ref("R1:b extra").is_err());
    }

    #[test]
    fn test_wire_to_unknown_component() {
        let err = parse_schematic("resistor R1 1\nwire R1:a R9:b").unwrap_err();
        assert!(matches!(err, OhmlabError::UnknownComponent { .. }));
    }

    #[test]
    fn test_value_on_meter_rejected() {
        let err = parse_schematic("ammeter A1 5").unwrap_err();
        assert!(matches!(err, OhmlabError::InvalidComponent { .. }));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DIVIDER.as_bytes()).unwrap();
        let s = parse_file(file.path()).unwrap();
        assert_eq!(s.components().len(), 4);

        let missing = parse_file(std::path::Path::new("/nonexistent/divider.ohm"));
        assert!(matches!(missing, Err(OhmlabError::FileReadError { .. })));
    }
}
