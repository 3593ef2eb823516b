//! Parser for the solver's `name = value` output.

use std::collections::HashMap;

use crate::error::{OhmlabError, Result};

/// Key/value pairs printed by the solver.
///
/// Keys are trimmed and lowercased so lookups are case-insensitive. Line
/// order carries no meaning; a repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOutput {
    values: HashMap<String, f64>,
    /// `(line, text)` of every line that had a `=` but no parsable number
    pub malformed: Vec<(usize, String)>,
}

impl SolverOutput {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(&normalize_key(key)).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Parse solver output leniently.
///
/// Lines without `=` (banners, blank lines) are skipped. Lines with a `=`
/// whose value does not parse are collected in
/// [`SolverOutput::malformed`] instead of failing.
pub fn parse_output(raw: &str) -> SolverOutput {
    let mut output = SolverOutput::default();

    for (index, line) in raw.lines().enumerate() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = normalize_key(key);
        // The solver may append units or comments after the number
        let number = value.split_whitespace().next().and_then(|v| v.parse::<f64>().ok());

        match number {
            Some(number) if !key.is_empty() => {
                output.values.insert(key, number);
            }
            _ => output.malformed.push((index + 1, line.trim().to_string())),
        }
    }

    output
}

/// Parse solver output, rejecting the first malformed line.
pub fn parse_output_strict(raw: &str) -> Result<SolverOutput> {
    let output = parse_output(raw);
    match output.malformed.first() {
        Some((line, text)) => Err(OhmlabError::OutputParseError {
            line: *line,
            text: text.clone(),
        }),
        None => Ok(output),
    }
}
