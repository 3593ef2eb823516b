//! Analysis orchestration.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{info, warn};

use super::readings::{derive_readings, Quantity, Reading};
use super::resistance::ohmmeter_resistance;
use super::result::{ingest, AnalysisResult, Gap};
use crate::circuit::{resolve, validate_schematic, ComponentId, NodeMap, Schematic};
use crate::error::{OhmlabError, Result};
use crate::netlist::{synthesize, AnalysisMode, Netlist};
use crate::solver::Solver;

/// Everything produced by one solver run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub node_map: NodeMap,
    pub netlist: Netlist,
    pub result: AnalysisResult,
    pub readings: Vec<Reading>,
}

impl Analysis {
    pub fn reading(&self, name: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.name == name)
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_complete()
    }
}

/// Solver and analytical results for one ohmmeter.
#[derive(Debug, Clone)]
pub struct OhmmeterReport {
    pub name: String,
    /// Solver reading, absent when the run failed
    pub measured: Option<Reading>,
    /// Path-enumeration estimate
    pub analytical: f64,
}

/// Result of analysing every instrument in a schematic.
#[derive(Debug, Default)]
pub struct Report {
    pub ohmmeters: Vec<OhmmeterReport>,
    /// Normal-mode run, present when the schematic has any meter
    pub meters: Option<Analysis>,
    /// Recoverable failures, by the run they came from
    pub failures: Vec<(String, OhmlabError)>,
}

impl Report {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
            && self.ohmmeters.iter().all(|o| o.measured.as_ref().is_some_and(|r| r.complete))
            && self.meters.as_ref().map_or(true, Analysis::is_complete)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ohm in &self.ohmmeters {
            let analytical = Quantity::Resistance {
                ohms: ohm.analytical,
            };
            match &ohm.measured {
                Some(reading) => {
                    writeln!(f, "Ohmmeter {} (analytical {})", reading, analytical)?
                }
                None => writeln!(
                    f,
                    "Ohmmeter {}: no reading (analytical {})",
                    ohm.name, analytical
                )?,
            }
        }
        if let Some(meters) = &self.meters {
            for reading in &meters.readings {
                match reading.quantity {
                    Quantity::Voltage { volts, amps } | Quantity::Current { amps, volts } => {
                        writeln!(
                            f,
                            "{}: V_th={:.2} V, I_n={:.2} mA",
                            reading.name,
                            volts,
                            amps * 1e3
                        )?
                    }
                    _ => writeln!(f, "{}", reading)?,
                }
            }
        }
        for (run, error) in &self.failures {
            writeln!(f, "{} failed: {}", run, error)?;
        }
        Ok(())
    }
}

/// Runs analyses against an injected solver.
///
/// The analyzer never mutates the schematic it is given, and solver runs
/// are issued one after another.
#[derive(Debug, Clone)]
pub struct Analyzer<S> {
    solver: S,
}

impl<S: Solver> Analyzer<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Check preconditions and solver availability before any run.
    fn prepare(&self, schematic: &Schematic) -> Result<NodeMap> {
        validate_schematic(schematic)?;
        let node_map = resolve(schematic)?;
        self.solver.ensure_available()?;
        Ok(node_map)
    }

    fn run(
        &self,
        schematic: &Schematic,
        node_map: &NodeMap,
        mode: AnalysisMode,
    ) -> Result<Analysis> {
        let netlist = synthesize(schematic, node_map, mode)?;

        // A test source from a node to itself is a voltage loop
        let shorted = netlist
            .test_source()
            .filter(|t| t.nodes[0] == t.nodes[1])
            .map(|t| (t.component, t.nodes[0]));
        if let Some((ohmmeter, node)) = shorted {
            info!(node = %node, "ohmmeter leads share a node, reading 0 Ω");
            return Ok(shorted_measurement(schematic, node_map, netlist, ohmmeter));
        }

        let raw = self.solver.solve(&netlist, schematic)?;
        let result = ingest(&raw, &netlist, schematic);
        let readings = derive_readings(&result, schematic, node_map)?;

        if !result.is_complete() {
            warn!(mode = %mode, gaps = result.gaps.len(), "analysis result is partial");
        }

        Ok(Analysis {
            node_map: node_map.clone(),
            netlist,
            result,
            readings,
        })
    }

    /// Solve the circuit with its real excitation.
    pub fn simulate(&self, schematic: &Schematic) -> Result<Analysis> {
        let node_map = self.prepare(schematic)?;
        info!("simulating circuit");
        self.run(schematic, &node_map, AnalysisMode::Normal)
    }

    /// Measure one ohmmeter with every source zeroed.
    pub fn measure_ohmmeter(&self, schematic: &Schematic, name: &str) -> Result<Analysis> {
        let ohmmeter = schematic.require(name)?;
        if !ohmmeter.kind.is_ohmmeter() {
            return Err(OhmlabError::NotAnOhmmeter {
                name: name.to_string(),
            });
        }
        let id = ohmmeter.id;

        let node_map = self.prepare(schematic)?;
        info!(ohmmeter = name, "measuring resistance");
        self.run(schematic, &node_map, AnalysisMode::Measurement { ohmmeter: id })
    }

    /// Measure every ohmmeter, then simulate once for the meters.
    ///
    /// Recoverable solver failures are collected in the report and the
    /// remaining runs continue. Anything else aborts.
    pub fn run_all(&self, schematic: &Schematic) -> Result<Report> {
        let node_map = self.prepare(schematic)?;
        let mut report = Report::default();

        for ohmmeter in schematic.ohmmeters() {
            let analytical = ohmmeter_resistance(&ohmmeter.name, schematic, &node_map)?;
            let mode = AnalysisMode::Measurement {
                ohmmeter: ohmmeter.id,
            };
            info!(ohmmeter = %ohmmeter.name, "measuring resistance");

            let measured = match self.run(schematic, &node_map, mode) {
                Ok(analysis) => analysis.readings.into_iter().next(),
                Err(e) if e.is_recoverable() => {
                    warn!(ohmmeter = %ohmmeter.name, error = %e, "ohmmeter run failed");
                    report.failures.push((ohmmeter.name.clone(), e));
                    None
                }
                Err(e) => return Err(e),
            };

            report.ohmmeters.push(OhmmeterReport {
                name: ohmmeter.name.clone(),
                measured,
                analytical,
            });
        }

        if schematic.meters().next().is_some() {
            info!("simulating circuit");
            match self.run(schematic, &node_map, AnalysisMode::Normal) {
                Ok(analysis) => report.meters = Some(analysis),
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "meter run failed");
                    report.failures.push(("simulation".to_string(), e));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

/// Every source is zeroed and the test source is shorted out, so each
/// node the netlist knows sits at 0 V.
fn shorted_measurement(
    schematic: &Schematic,
    node_map: &NodeMap,
    netlist: Netlist,
    ohmmeter: ComponentId,
) -> Analysis {
    let node_voltages: BTreeMap<_, _> = netlist
        .nodes
        .iter()
        .chain(&netlist.untouched)
        .map(|&n| (n, 0.0))
        .collect();
    let gaps = netlist.untouched.iter().map(|&n| Gap::NodeVoltage(n)).collect();
    let readings = schematic
        .component(ohmmeter)
        .map(|c| Reading {
            component: c.id,
            name: c.name.clone(),
            quantity: Quantity::Resistance { ohms: 0.0 },
            complete: true,
        })
        .into_iter()
        .collect();

    Analysis {
        node_map: node_map.clone(),
        result: AnalysisResult {
            mode: netlist.mode,
            node_voltages,
            branch_currents: BTreeMap::new(),
            gaps,
        },
        netlist,
        readings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Pin;
    use crate::components::MeterKind;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::time::Duration;

    fn wire(s: &mut Schematic, a: (&str, Pin), b: (&str, Pin)) {
        let ta = s.terminal(a.0, a.1).unwrap();
        let tb = s.terminal(b.0, b.1).unwrap();
        s.connect(ta, tb).unwrap();
    }

    /// 10 V across R1 (1 kΩ) to ground, a voltmeter across R1 and an
    /// ohmmeter across R1.
    fn bench() -> Schematic {
        let mut s = Schematic::new();
        s.add_voltage_source("V1", 10.0).unwrap();
        s.add_resistor("R1", 1000.0).unwrap();
        s.add_meter("VM1", MeterKind::Voltmeter).unwrap();
        s.add_ohmmeter("OHM1").unwrap();
        s.add_ground("GND").unwrap();
        wire(&mut s, ("V1", Pin::A), ("R1", Pin::A));
        wire(&mut s, ("R1", Pin::A), ("VM1", Pin::A));
        wire(&mut s, ("R1", Pin::A), ("OHM1", Pin::A));
        wire(&mut s, ("R1", Pin::B), ("GND", Pin::A));
        wire(&mut s, ("VM1", Pin::B), ("GND", Pin::A));
        wire(&mut s, ("OHM1", Pin::B), ("GND", Pin::A));
        wire(&mut s, ("V1", Pin::B), ("GND", Pin::A));
        s
    }

    fn canned(netlist: &Netlist, _: &Schematic) -> Result<String> {
        Ok(match netlist.mode {
            AnalysisMode::Normal => "v(n1) = 10.0\n".to_string(),
            AnalysisMode::Measurement { .. } => {
                "v(n1) = 1.0\nvohm1_test#branch = -1e-3\n".to_string()
            }
        })
    }

    #[test]
    fn test_simulate() {
        let analyzer = Analyzer::new(canned);
        let analysis = analyzer.simulate(&bench()).unwrap();
        assert!(analysis.is_complete());
        assert_eq!(
            analysis.reading("VM1").unwrap().quantity,
            Quantity::Voltage {
                volts: 10.0,
                amps: 1e-5
            }
        );
    }

    #[test]
    fn test_measure_ohmmeter() {
        let analyzer = Analyzer::new(canned);
        let analysis = analyzer.measure_ohmmeter(&bench(), "OHM1").unwrap();
        assert_eq!(analysis.readings.len(), 1);
        assert_eq!(analysis.readings[0].to_string(), "OHM1: 1000.00 Ω");

        assert!(matches!(
            analyzer.measure_ohmmeter(&bench(), "R1"),
            Err(OhmlabError::NotAnOhmmeter { .. })
        ));
    }

    #[test]
    fn test_preconditions_fail_before_solving() {
        let calls = RefCell::new(0);
        let counting = |netlist: &Netlist, s: &Schematic| {
            *calls.borrow_mut() += 1;
            canned(netlist, s)
        };
        let analyzer = Analyzer::new(counting);

        let mut no_ground = Schematic::new();
        no_ground.add_resistor("R1", 1.0).unwrap();
        assert!(matches!(
            analyzer.simulate(&no_ground),
            Err(OhmlabError::MissingGround)
        ));
        assert!(matches!(
            analyzer.simulate(&Schematic::new()),
            Err(OhmlabError::NoComponents)
        ));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_run_all_sequential() {
        let modes = RefCell::new(Vec::new());
        let recording = |netlist: &Netlist, s: &Schematic| {
            modes.borrow_mut().push(netlist.mode);
            canned(netlist, s)
        };
        let s = bench();
        let report = Analyzer::new(recording).run_all(&s).unwrap();

        let ohm = s.component_by_name("OHM1").unwrap().id;
        assert_eq!(
            *modes.borrow(),
            vec![AnalysisMode::Measurement { ohmmeter: ohm }, AnalysisMode::Normal]
        );
        assert!(report.is_complete());
        assert_eq!(report.ohmmeters.len(), 1);
        assert_relative_eq!(report.ohmmeters[0].analytical, 1000.0, epsilon = 1e-9);

        let text = report.to_string();
        assert!(text.contains("Ohmmeter OHM1: 1000.00 Ω (analytical 1000.00 Ω)"));
        assert!(text.contains("VM1: V_th=10.00 V, I_n=0.01 mA"));
    }

    #[test]
    fn test_run_all_records_timeouts() {
        let flaky = |netlist: &Netlist, s: &Schematic| match netlist.mode {
            AnalysisMode::Measurement { .. } => {
                Err(OhmlabError::SolverTimeout(Duration::from_secs(30)))
            }
            AnalysisMode::Normal => canned(netlist, s),
        };
        let report = Analyzer::new(flaky).run_all(&bench()).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert!(report.ohmmeters[0].measured.is_none());
        assert!(report.meters.is_some());
    }

    #[test]
    fn test_unavailable_solver_fails_fast() {
        struct Missing;
        impl Solver for Missing {
            fn ensure_available(&self) -> Result<()> {
                Err(OhmlabError::SolverUnavailable {
                    executable: "ngspice".to_string(),
                    message: "not found".to_string(),
                })
            }
            fn solve(&self, _: &Netlist, _: &Schematic) -> Result<String> {
                panic!("solve must not be called");
            }
        }

        let err = Analyzer::new(Missing).run_all(&bench()).unwrap_err();
        assert!(matches!(err, OhmlabError::SolverUnavailable { .. }));
    }

    #[test]
    fn test_shorted_ohmmeter_reads_zero_without_solving() {
        let mut s = bench();
        s.add_ohmmeter("OHM2").unwrap();
        wire(&mut s, ("OHM2", Pin::A), ("R1", Pin::A));
        wire(&mut s, ("OHM2", Pin::B), ("R1", Pin::A));

        let ohm2 = s.require("OHM2").unwrap().id;
        let only_normal = move |netlist: &Netlist, s: &Schematic| {
            assert_ne!(netlist.mode, AnalysisMode::Measurement { ohmmeter: ohm2 });
            canned(netlist, s)
        };
        let analyzer = Analyzer::new(only_normal);

        let analysis = analyzer.measure_ohmmeter(&s, "OHM2").unwrap();
        assert!(analysis.is_complete());
        assert_eq!(analysis.readings.len(), 1);
        assert_eq!(analysis.readings[0].quantity, Quantity::Resistance { ohms: 0.0 });
        assert_eq!(analysis.readings[0].to_string(), "OHM2: 0.00 Ω");

        let report = analyzer.run_all(&s).unwrap();
        assert!(report.is_complete());
        let ohm2 = report.ohmmeters.iter().find(|o| o.name == "OHM2").unwrap();
        assert_relative_eq!(ohm2.analytical, 0.0);
        assert_eq!(
            ohm2.measured.as_ref().unwrap().quantity,
            Quantity::Resistance { ohms: 0.0 }
        );
    }
}
