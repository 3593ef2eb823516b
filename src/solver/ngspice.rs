//! ngspice process runner.
//!
//! Each run gets its own temporary directory holding the deck and the
//! result file. The directory is removed when the run ends, whether the
//! solve succeeded or not, so sequential runs never see each other's files
//! and concurrent runs would not collide.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{Solver, SolverConfig};
use crate::circuit::Schematic;
use crate::error::{OhmlabError, Result};
use crate::netlist::{render_deck, Netlist};

const DECK_FILE: &str = "deck.cir";
const OUTPUT_FILE: &str = "results.txt";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs netlists through an ngspice binary in batch mode.
#[derive(Debug, Clone, Default)]
pub struct NgspiceSolver {
    config: SolverConfig,
}

/// Captured result of a finished child process.
struct ProcessOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl NgspiceSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn executable_name(&self) -> String {
        self.config.executable.display().to_string()
    }

    fn unavailable(&self, message: impl Into<String>) -> OhmlabError {
        OhmlabError::SolverUnavailable {
            executable: self.executable_name(),
            message: message.into(),
        }
    }

    /// First line of `ngspice --version`.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.config.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(self.unavailable(format!("--version exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("unknown")
            .to_string())
    }

    /// Run a rendered deck that writes its results to `output`.
    fn run(&self, workspace: &Path, deck: &Path, output: &Path) -> Result<String> {
        let child = Command::new(&self.config.executable)
            .arg("-b")
            .arg(deck)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.unavailable(e.to_string()))?;

        let finished = wait_with_timeout(child, self.config.timeout)?;
        if !finished.status.success() {
            return Err(OhmlabError::SolverProcessFailure {
                status: finished.status.to_string(),
                stderr: finished.stderr,
                stdout: finished.stdout,
            });
        }

        match fs::read_to_string(output) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(OhmlabError::OutputMissing {
                path: output.display().to_string(),
            }),
            Err(source) => Err(OhmlabError::Workspace { source }),
        }
    }
}

impl Solver for NgspiceSolver {
    fn ensure_available(&self) -> Result<()> {
        let version = self.version()?;
        debug!(version = %version, "solver available");
        Ok(())
    }

    fn solve(&self, netlist: &Netlist, schematic: &Schematic) -> Result<String> {
        let workspace = tempfile::Builder::new()
            .prefix("ohmlab-")
            .tempdir()
            .map_err(|source| OhmlabError::Workspace { source })?;

        let output_path = workspace.path().join(OUTPUT_FILE);

        info!(
            mode = %netlist.mode,
            elements = netlist.elements.len(),
            executable = %self.executable_name(),
            "running solver"
        );

        let result = write_deck(workspace.path(), netlist, schematic)
            .and_then(|deck_path| self.run(workspace.path(), &deck_path, &output_path));

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!(
                path = %workspace_path.display(),
                error = %e,
                "failed to remove solver workspace"
            );
        }

        result
    }
}

/// Write the deck into `workspace`.
///
/// The deck names its result file relative to the workspace, which is the
/// solver's working directory, so the workspace path never has to survive
/// ngspice's command parsing.
fn write_deck(workspace: &Path, netlist: &Netlist, schematic: &Schematic) -> Result<PathBuf> {
    let deck_path = workspace.join(DECK_FILE);
    let deck = render_deck(netlist, schematic, Path::new(OUTPUT_FILE));
    fs::write(&deck_path, deck).map_err(|source| OhmlabError::Workspace { source })?;
    Ok(deck_path)
}

/// Wait for a child process, killing it once `timeout` has elapsed.
///
/// Both pipes are drained on their own threads so a chatty solver cannot
/// block on a full pipe while we poll.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<ProcessOutput> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let start = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(timeout_secs = timeout.as_secs_f64(), "solver killed after timeout");
                    return Err(OhmlabError::SolverTimeout(timeout));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                let _ = child.kill();
                return Err(OhmlabError::Workspace { source });
            }
        }
    };

    Ok(ProcessOutput {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}
