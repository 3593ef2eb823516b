//! Ohmlab - schematic analysis from the command line
//!
//! Reads a schematic in the text format and resolves, synthesizes or
//! analyses it.
//!
//! # Usage
//!
//! ```bash
//! ohmlab divider.ohm nodes
//! ohmlab divider.ohm netlist --measure OHM1
//! ohmlab divider.ohm simulate --ngspice /opt/ngspice/bin/ngspice
//! ohmlab divider.ohm resistance R1:a GND
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ohmlab_core::{
    analysis::{ohmmeter_resistance, Quantity},
    circuit::{describe, resolve, validate_schematic},
    dsl,
    error::Result,
    netlist::render_deck,
    snapshot::serialize_topology,
    AnalysisMode, Analyzer, NgspiceSolver, OhmlabError, Schematic, SolverConfig,
};

/// Schematic connectivity and resistance analysis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the schematic file
    #[arg(value_name = "SCHEMATIC_FILE")]
    schematic_file: PathBuf,

    /// ngspice executable; overrides NGSPICE_EXECUTABLE
    #[arg(long, global = true)]
    ngspice: Option<PathBuf>,

    /// Solver timeout in seconds; overrides OHMLAB_SOLVER_TIMEOUT
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every node and the terminals it contains
    Nodes,
    /// Print the solver deck
    Netlist {
        /// Synthesize in measurement mode for this ohmmeter
        #[arg(long, value_name = "OHMMETER")]
        measure: Option<String>,
    },
    /// Solve the circuit and print meter readings
    Simulate,
    /// Measure one ohmmeter, or analyse every instrument when no name is given
    Ohmmeter { name: Option<String> },
    /// Analytical resistance between two terminals (e.g. `R1:a GND`)
    Resistance { from: String, to: String },
    /// Describe components, wires and nodes
    Describe,
    /// Print a JSON topology snapshot
    Export,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let schematic = dsl::parse_file(&args.schematic_file)?;
    let config = solver_config(&args, SolverConfig::from_env());

    match args.command {
        Command::Nodes => print_nodes(&schematic),
        Command::Netlist { measure } => print_netlist(&schematic, measure.as_deref()),
        Command::Simulate => {
            let analysis = Analyzer::new(NgspiceSolver::new(config)).simulate(&schematic)?;
            for (node, volts) in &analysis.result.node_voltages {
                println!("V({}) = {:.4} V", node, volts);
            }
            for reading in &analysis.readings {
                println!("{}", reading);
            }
            Ok(())
        }
        Command::Ohmmeter { name: Some(name) } => {
            let analysis =
                Analyzer::new(NgspiceSolver::new(config)).measure_ohmmeter(&schematic, &name)?;
            let analytical = ohmmeter_resistance(&name, &schematic, &analysis.node_map)?;
            for reading in &analysis.readings {
                println!("{}", reading);
            }
            println!("Analytical: {}", Quantity::Resistance { ohms: analytical });
            Ok(())
        }
        Command::Ohmmeter { name: None } => {
            let report = Analyzer::new(NgspiceSolver::new(config)).run_all(&schematic)?;
            print!("{}", report);
            Ok(())
        }
        Command::Resistance { from, to } => {
            let a = schematic.resolve_pin_ref(&dsl::parse_pin_ref(&from)?)?;
            let b = schematic.resolve_pin_ref(&dsl::parse_pin_ref(&to)?)?;
            let node_map = resolve(&schematic)?;
            let ohms = ohmlab_core::equivalent_resistance(a, b, &schematic, &node_map)?;
            println!("{}", Quantity::Resistance { ohms });
            Ok(())
        }
        Command::Describe => {
            let node_map = resolve(&schematic)?;
            print!("{}", describe(&schematic, &node_map));
            Ok(())
        }
        Command::Export => {
            println!("{}", serialize_topology(&schematic)?);
            Ok(())
        }
    }
}

/// Command-line flags win over the environment. A bad environment value is
/// logged and ignored by [`SolverConfig::from_env`].
fn solver_config(args: &Args, base: SolverConfig) -> SolverConfig {
    let mut config = base;
    if let Some(executable) = &args.ngspice {
        config = config.with_executable(executable);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "ohmlab_core=debug,ohmlab=debug"
    } else {
        "ohmlab_core=info,ohmlab=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_nodes(schematic: &Schematic) -> Result<()> {
    let node_map = resolve(schematic)?;
    for node in node_map.nodes() {
        let members: Vec<String> = node_map
            .members(node)
            .into_iter()
            .map(|t| schematic.terminal_name(t))
            .collect();
        println!("{}: {}", node, members.join(" "));
    }
    Ok(())
}

fn print_netlist(schematic: &Schematic, measure: Option<&str>) -> Result<()> {
    validate_schematic(schematic)?;
    let mode = match measure {
        Some(name) => {
            let component = schematic.require(name)?;
            if !component.kind.is_ohmmeter() {
                return Err(OhmlabError::NotAnOhmmeter {
                    name: name.to_string(),
                });
            }
            AnalysisMode::Measurement {
                ohmmeter: component.id,
            }
        }
        None => AnalysisMode::Normal,
    };

    let node_map = resolve(schematic)?;
    let netlist = ohmlab_core::synthesize(schematic, &node_map, mode)?;
    print!("{}", render_deck(&netlist, schematic, Path::new("results.txt")));
    Ok(())
}
