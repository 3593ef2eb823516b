//! Error types for the Ohmlab analysis engine.
//!
//! This module provides a unified error type [`OhmlabError`] that covers
//! every failure the engine can report: schematic construction, connectivity
//! resolution, precondition checks before a solve, the external solver
//! process, and the text/snapshot front ends.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`OhmlabError`].
pub type Result<T> = std::result::Result<T, OhmlabError>;

/// Unified error type for all Ohmlab operations.
#[derive(Error, Debug)]
pub enum OhmlabError {
    // ============ Configuration Errors ============
    /// Analysis requested on a schematic without a ground component
    #[error("Circuit has no ground - add a ground component before analysis")]
    MissingGround,

    /// Analysis requested on an empty schematic
    #[error("Circuit has no components to analyze")]
    NoComponents,

    /// Measurement mode requested for a component that is not an ohmmeter
    #[error("Component '{name}' is not an ohmmeter")]
    NotAnOhmmeter { name: String },

    /// Component value outside its allowed range
    #[error("Invalid value {value} for component '{name}': {message}")]
    InvalidValue {
        name: String,
        value: f64,
        message: String,
    },

    // ============ Graph Errors ============
    /// Wire or lookup referencing a terminal the schematic does not own
    #[error("Unknown terminal {terminal}")]
    UnknownTerminal { terminal: String },

    /// Lookup of a component that does not exist
    #[error("Unknown component '{name}'")]
    UnknownComponent { name: String },

    /// Wire from a terminal to itself
    #[error("Wire cannot connect terminal {terminal} to itself")]
    SelfConnection { terminal: String },

    /// Duplicate component name
    #[error("Duplicate component name '{name}'")]
    DuplicateComponent { name: String },

    // ============ Solver Errors ============
    /// Solver executable missing or not runnable
    #[error("Solver unavailable at '{executable}': {message}")]
    SolverUnavailable { executable: String, message: String },

    /// Solver did not finish within the configured timeout
    #[error("Solver timed out after {:.1} seconds", .0.as_secs_f64())]
    SolverTimeout(Duration),

    /// Solver exited with a non-zero status
    #[error("Solver exited with {status}\nstderr: {stderr}\nstdout: {stdout}")]
    SolverProcessFailure {
        status: String,
        stderr: String,
        stdout: String,
    },

    /// Solver exited cleanly but produced no output file
    #[error("Solver produced no output file '{path}'")]
    OutputMissing { path: String },

    /// Malformed result line (only returned by strict parsing)
    #[error("Malformed solver output at line {line}: {text:?}")]
    OutputParseError { line: usize, text: String },

    /// Transient workspace I/O failure
    #[error("Solver workspace error: {source}")]
    Workspace {
        #[source]
        source: std::io::Error,
    },

    // ============ Text Format Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Invalid component definition
    #[error("Invalid component '{name}' at line {line}: {message}")]
    InvalidComponent {
        name: String,
        line: usize,
        message: String,
    },

    /// Unknown component type
    #[error("Unknown component type '{component_type}' at line {line}")]
    UnknownComponentType { component_type: String, line: usize },

    /// Error reading schematic file
    #[error("Failed to read schematic file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ Snapshot Errors ============
    /// Topology snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl OhmlabError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid component error
    pub fn invalid_component(
        name: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidComponent {
            name: name.into(),
            line,
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(name: impl Into<String>, value: f64, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value,
            message: message.into(),
        }
    }

    /// Whether the failure only affects the current solve.
    ///
    /// A timed-out or crashed solver run leaves the schematic untouched, so
    /// the caller may retry or move on to the next probe.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SolverTimeout(_)
                | Self::SolverProcessFailure { .. }
                | Self::OutputMissing { .. }
                | Self::OutputParseError { .. }
        )
    }

    /// Whether this is a precondition violation detected before solving.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingGround
                | Self::NoComponents
                | Self::NotAnOhmmeter { .. }
                | Self::InvalidValue { .. }
        )
    }
}
