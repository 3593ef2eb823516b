//! Netlist synthesis from a resolved schematic.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::{debug, warn};

use super::element::{voltage_key, Element, ElementKind, ElementRole};
use crate::circuit::{ComponentId, NodeLabel, NodeMap, Schematic};
use crate::components::{Component, ComponentKind, MeterKind, SourceKind};
use crate::error::{OhmlabError, Result};
use crate::{PROBE_HIGH_OHMS, TEST_VOLTAGE};

/// How the schematic is turned into a netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Real excitation; meters and ohmmeters become probe resistors
    Normal,
    /// Sources zeroed; one ohmmeter replaced by a 1 V test source
    Measurement { ohmmeter: ComponentId },
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Measurement { ohmmeter } => write!(f, "measurement of {}", ohmmeter),
        }
    }
}

/// A solver-ready circuit description.
#[derive(Debug, Clone, PartialEq)]
pub struct Netlist {
    pub title: String,
    pub mode: AnalysisMode,
    /// Elements in synthesis order: resistors, sources, ohmmeters, meters
    pub elements: Vec<Element>,
    /// Non-ground nodes on at least one element; their voltages are requested
    pub nodes: Vec<NodeLabel>,
    /// Non-ground nodes no element touches, such as a dangling general-meter
    /// lead. The solver never sees them.
    pub untouched: Vec<NodeLabel>,
}

impl Netlist {
    pub fn resistors(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| e.kind == ElementKind::Resistor && e.role == ElementRole::Circuit)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| e.kind != ElementKind::Resistor && e.role == ElementRole::Circuit)
    }

    pub fn probes(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_probe())
    }

    /// The test source injected in measurement mode.
    pub fn test_source(&self) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| e.role == ElementRole::TestSource)
    }

    /// The element synthesized for a component, if any.
    pub fn element_for(&self, component: ComponentId) -> Option<&Element> {
        self.elements.iter().find(|e| e.component == component)
    }

    /// Elements whose branch current the solver must report.
    ///
    /// Ammeter probes in normal mode, the test source in measurement mode.
    pub fn current_probes<'a>(
        &'a self,
        schematic: &'a Schematic,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| match e.role {
            ElementRole::TestSource => true,
            ElementRole::Probe => {
                self.mode == AnalysisMode::Normal
                    && schematic
                        .component(e.component)
                        .is_some_and(|c| c.kind == ComponentKind::Meter(MeterKind::Ammeter))
            }
            ElementRole::Circuit => false,
        })
    }

    /// Every output key the solver is asked to print.
    pub fn requested_keys(&self, schematic: &Schematic) -> Vec<String> {
        self.nodes
            .iter()
            .map(|&n| voltage_key(n))
            .chain(self.current_probes(schematic).map(Element::current_key))
            .collect()
    }
}

/// Turn a resolved schematic into a netlist.
///
/// Fails fast when the schematic has no ground: node labels would still be
/// well defined, but no solver can produce meaningful voltages without a
/// reference. In measurement mode the target must be an ohmmeter.
///
/// Element names are unique without regard to case: a component whose
/// derived name is already taken gets its id appended.
pub fn synthesize(
    schematic: &Schematic,
    node_map: &NodeMap,
    mode: AnalysisMode,
) -> Result<Netlist> {
    if !node_map.has_ground() {
        return Err(OhmlabError::MissingGround);
    }

    if let AnalysisMode::Measurement { ohmmeter } = mode {
        let target = schematic
            .component(ohmmeter)
            .ok_or_else(|| OhmlabError::UnknownComponent {
                name: ohmmeter.to_string(),
            })?;
        if !target.kind.is_ohmmeter() {
            return Err(OhmlabError::NotAnOhmmeter {
                name: target.name.clone(),
            });
        }
    }

    let measuring = matches!(mode, AnalysisMode::Measurement { .. });
    let mut elements: Vec<Element> = Vec::new();
    let mut taken = HashSet::new();

    // Stable sort keeps insertion order within each group.
    let mut ordered: Vec<&Component> = schematic.components().iter().collect();
    ordered.sort_by_key(|c| synthesis_rank(&c.kind));

    for component in ordered {
        let Some(pair) = component.pair() else {
            continue;
        };
        let nodes = node_map.pair(pair)?;
        let element = |kind, role, suffix, value| Element {
            name: Element::spice_name(kind, &component.name, suffix),
            component: component.id,
            kind,
            role,
            nodes,
            value,
        };

        let synthesized = match component.kind {
            ComponentKind::Resistor { ohms } => {
                Some(element(ElementKind::Resistor, ElementRole::Circuit, None, ohms))
            }
            ComponentKind::Source { kind, value } => {
                let value = if measuring { 0.0 } else { value };
                let kind = match kind {
                    SourceKind::Voltage => ElementKind::VoltageSource,
                    SourceKind::Current => ElementKind::CurrentSource,
                };
                Some(element(kind, ElementRole::Circuit, None, value))
            }
            ComponentKind::Ohmmeter => {
                if mode == (AnalysisMode::Measurement { ohmmeter: component.id }) {
                    Some(element(
                        ElementKind::VoltageSource,
                        ElementRole::TestSource,
                        Some("test"),
                        TEST_VOLTAGE,
                    ))
                } else {
                    Some(element(
                        ElementKind::Resistor,
                        ElementRole::Probe,
                        Some("probe"),
                        PROBE_HIGH_OHMS,
                    ))
                }
            }
            ComponentKind::Meter(kind) => kind.probe_resistance().map(|ohms| {
                element(ElementKind::Resistor, ElementRole::Probe, Some("probe"), ohms)
            }),
            ComponentKind::Ground => None,
        };

        if let Some(mut element) = synthesized {
            element.name = claim_name(element.name, component.id, &mut taken);
            elements.push(element);
        }
    }

    let touched: BTreeSet<NodeLabel> = elements
        .iter()
        .flat_map(|e| e.nodes)
        .filter(|n| !n.is_ground())
        .collect();
    let untouched: Vec<NodeLabel> = node_map.nets().filter(|n| !touched.contains(n)).collect();
    if !untouched.is_empty() {
        warn!(nodes = ?untouched, "nodes without elements left out of the netlist");
    }

    let netlist = Netlist {
        title: schematic
            .title
            .clone()
            .unwrap_or_else(|| "Ohmlab circuit".to_string()),
        mode,
        elements,
        nodes: touched.into_iter().collect(),
        untouched,
    };

    debug!(mode = %mode, elements = netlist.elements.len(), "synthesized netlist");
    Ok(netlist)
}

/// Reserve `base`, or `base_c<id>` when another element already holds it.
fn claim_name(base: String, component: ComponentId, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_lowercase()) {
        return base;
    }
    let mut name = format!("{}_c{}", base, component.0);
    let mut attempt = 2;
    while !taken.insert(name.to_lowercase()) {
        name = format!("{}_c{}_{}", base, component.0, attempt);
        attempt += 1;
    }
    debug!(base = %base, name = %name, "renamed colliding element");
    name
}

fn synthesis_rank(kind: &ComponentKind) -> u8 {
    match kind {
        ComponentKind::Resistor { .. } => 0,
        ComponentKind::Source { .. } => 1,
        ComponentKind::Ohmmeter => 2,
        ComponentKind::Meter(_) => 3,
        ComponentKind::Ground => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{resolve, Pin};
    use crate::PROBE_LOW_OHMS;

    /// 2 V source, two 100 Ω in series, voltmeter across R1, ammeter in
    /// series with the source, two ohmmeters and a general meter.
    fn bench() -> Schematic {
        let mut s = Schematic::new();
        s.add_voltage_source("V1", 2.0).unwrap();
        s.add_current_source("I1", 0.5).unwrap();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("R2", 100.0).unwrap();
        s.add_meter("VM1", MeterKind::Voltmeter).unwrap();
        s.add_meter("A1", MeterKind::Ammeter).unwrap();
        s.add_meter("M1", MeterKind::General).unwrap();
        s.add_ohmmeter("OHM1").unwrap();
        s.add_ohmmeter("OHM2").unwrap();
        s.add_ground("GND").unwrap();
        let t = |s: &Schematic, n: &str, p| s.terminal(n, p).unwrap();
        for (a, b) in [
            (t(&s, "V1", Pin::A), t(&s, "A1", Pin::A)),
            (t(&s, "A1", Pin::B), t(&s, "R1", Pin::A)),
            (t(&s, "R1", Pin::B), t(&s, "R2", Pin::A)),
            (t(&s, "R2", Pin::B), t(&s, "GND", Pin::A)),
            (t(&s, "V1", Pin::B), t(&s, "GND", Pin::A)),
            (t(&s, "VM1", Pin::A), t(&s, "R1", Pin::A)),
            (t(&s, "VM1", Pin::B), t(&s, "R1", Pin::B)),
            (t(&s, "OHM1", Pin::A), t(&s, "R2", Pin::A)),
            (t(&s, "OHM1", Pin::B), t(&s, "R2", Pin::B)),
            (t(&s, "OHM2", Pin::A), t(&s, "R1", Pin::A)),
            (t(&s, "OHM2", Pin::B), t(&s, "R1", Pin::B)),
        ] {
            s.connect(a, b).unwrap();
        }
        s
    }

    #[test]
    fn test_normal_mode() {
        let s = bench();
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();

        assert_eq!(netlist.resistors().count(), 2);
        assert_eq!(netlist.sources().count(), 2);
        let v1 = netlist.element_for(s.require("V1").unwrap().id).unwrap();
        assert_eq!(v1.value, 2.0);
        assert_eq!(v1.kind, ElementKind::VoltageSource);

        let probe = |name: &str| netlist.element_for(s.require(name).unwrap().id).unwrap().value;
        assert_eq!(probe("VM1"), PROBE_HIGH_OHMS);
        assert_eq!(probe("A1"), PROBE_LOW_OHMS);
        assert_eq!(probe("OHM1"), PROBE_HIGH_OHMS);
        assert!(netlist.element_for(s.require("M1").unwrap().id).is_none());
        assert!(netlist.test_source().is_none());
        assert_eq!(netlist.probes().count(), 4);
    }

    #[test]
    fn test_measurement_mode_isolation() {
        let s = bench();
        let map = resolve(&s).unwrap();
        let ohm1 = s.require("OHM1").unwrap().id;
        let ohm2 = s.require("OHM2").unwrap().id;
        let normal = synthesize(&s, &map, AnalysisMode::Normal).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Measurement { ohmmeter: ohm1 }).unwrap();

        assert!(netlist.sources().all(|e| e.value == 0.0));
        let test = netlist.test_source().unwrap();
        assert_eq!(test.component, ohm1);
        assert_eq!(test.value, TEST_VOLTAGE);
        assert_eq!(test.nodes, map.pair(s.require("OHM1").unwrap().pair().unwrap()).unwrap());
        // the idle ohmmeter keeps exactly its normal-mode probe
        assert_eq!(netlist.element_for(ohm2), normal.element_for(ohm2));
    }

    #[test]
    fn test_measurement_target_must_be_ohmmeter() {
        let s = bench();
        let map = resolve(&s).unwrap();
        let r1 = s.require("R1").unwrap().id;
        assert!(matches!(
            synthesize(&s, &map, AnalysisMode::Measurement { ohmmeter: r1 }),
            Err(OhmlabError::NotAnOhmmeter { .. })
        ));
        assert!(matches!(
            synthesize(&s, &map, AnalysisMode::Measurement { ohmmeter: ComponentId(999) }),
            Err(OhmlabError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn test_no_ground_is_a_precondition_failure() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        let map = resolve(&s).unwrap();
        assert!(matches!(
            synthesize(&s, &map, AnalysisMode::Normal),
            Err(OhmlabError::MissingGround)
        ));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let s = bench();
        let a = synthesize(&s, &resolve(&s).unwrap(), AnalysisMode::Normal).unwrap();
        let b = synthesize(&s, &resolve(&s).unwrap(), AnalysisMode::Normal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_requested_keys() {
        let s = bench();
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();
        let keys = netlist.requested_keys(&s);
        assert!(keys.contains(&"@ra1_probe[i]".to_string()));
        assert!(!keys.iter().any(|k| k.contains("ohm")));
        let voltages = keys.iter().filter(|k| k.starts_with("v(")).count();
        assert_eq!(voltages, netlist.nodes.len());
        // M1 is wired to nothing, so both of its nodes stay out of the deck
        assert_eq!(netlist.untouched.len(), 2);
        assert_eq!(voltages + netlist.untouched.len(), map.nets().count());

        let ohm1 = s.require("OHM1").unwrap().id;
        let measuring = synthesize(&s, &map, AnalysisMode::Measurement { ohmmeter: ohm1 }).unwrap();
        let keys = measuring.requested_keys(&s);
        assert!(keys.contains(&"vohm1_test#branch".to_string()));
        assert!(!keys.iter().any(|k| k.starts_with('@')));
    }

    #[test]
    fn test_element_names_unique_ignoring_case() {
        let mut s = Schematic::new();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_resistor("r1", 200.0).unwrap();
        s.add_resistor("R-1", 300.0).unwrap();
        s.add_resistor("R_1", 400.0).unwrap();
        s.add_resistor("X_probe", 500.0).unwrap();
        s.add_meter("X", MeterKind::Voltmeter).unwrap();
        s.add_meter("A1", MeterKind::Ammeter).unwrap();
        s.add_meter("a1", MeterKind::Ammeter).unwrap();
        s.add_voltage_source("OHM1_test", 1.0).unwrap();
        let ohm = s.add_ohmmeter("OHM1").unwrap();
        s.add_ground("GND").unwrap();
        let map = resolve(&s).unwrap();

        for mode in [AnalysisMode::Normal, AnalysisMode::Measurement { ohmmeter: ohm }] {
            let netlist = synthesize(&s, &map, mode).unwrap();
            let mut names: Vec<String> =
                netlist.elements.iter().map(|e| e.name.to_lowercase()).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "{:?}", netlist.elements);

            let mut keys = netlist.requested_keys(&s);
            let total = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), total);
        }

        // first claimant keeps the plain name
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();
        let r1 = s.require("R1").unwrap().id;
        assert_eq!(netlist.element_for(r1).unwrap().name, "RR1");
        let lower = s.require("r1").unwrap();
        assert_eq!(
            netlist.element_for(lower.id).unwrap().name,
            format!("Rr1_c{}", lower.id.0)
        );
    }

    #[test]
    fn test_untouched_nodes_not_requested() {
        let mut s = Schematic::new();
        s.add_voltage_source("V1", 5.0).unwrap();
        s.add_resistor("R1", 100.0).unwrap();
        s.add_meter("M1", MeterKind::General).unwrap();
        s.add_ground("GND").unwrap();
        let t = |s: &Schematic, n: &str, p| s.terminal(n, p).unwrap();
        for (a, b) in [
            (t(&s, "V1", Pin::A), t(&s, "R1", Pin::A)),
            (t(&s, "V1", Pin::B), t(&s, "GND", Pin::A)),
            (t(&s, "R1", Pin::B), t(&s, "GND", Pin::A)),
            (t(&s, "M1", Pin::A), t(&s, "R1", Pin::A)),
        ] {
            s.connect(a, b).unwrap();
        }
        let map = resolve(&s).unwrap();
        let netlist = synthesize(&s, &map, AnalysisMode::Normal).unwrap();

        let top = map.node(t(&s, "R1", Pin::A)).unwrap();
        let dangling = map.node(t(&s, "M1", Pin::B)).unwrap();
        assert_eq!(netlist.nodes, vec![top]);
        assert_eq!(netlist.untouched, vec![dangling]);
        assert_eq!(netlist.requested_keys(&s), vec![voltage_key(top)]);
    }
}
