//! Solver configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::DEFAULT_SOLVER_TIMEOUT_SECS;

/// Environment variable naming the ngspice executable.
pub const EXECUTABLE_ENV: &str = "NGSPICE_EXECUTABLE";

/// Environment variable holding the solver timeout in seconds.
pub const TIMEOUT_ENV: &str = "OHMLAB_SOLVER_TIMEOUT";

/// Configuration for the external solver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Path to the ngspice executable, or a bare name looked up on `PATH`
    pub executable: PathBuf,
    /// Wall-clock limit for one solver run
    pub timeout: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("ngspice"),
            timeout: Duration::from_secs(DEFAULT_SOLVER_TIMEOUT_SECS),
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `NGSPICE_EXECUTABLE` and `OHMLAB_SOLVER_TIMEOUT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are ignored. An unparsable timeout is logged and the
    /// default kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(executable) = lookup(EXECUTABLE_ENV).filter(|v| !v.trim().is_empty()) {
            config.executable = PathBuf::from(executable.trim());
        }

        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid {}", TIMEOUT_ENV),
            }
        }

        config
    }

    /// Set the solver executable.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set the per-run timeout.
    ///
    /// The run is killed once the limit passes; callers see
    /// [`OhmlabError::SolverTimeout`](crate::OhmlabError::SolverTimeout).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
