//! Schematic graph structure.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::types::{ComponentId, Pin, TerminalId, Wire};
use crate::components::{Component, ComponentKind, MeterKind, SourceKind, Terminals};
use crate::dsl::{ComponentType, PinRef, SchematicAst};
use crate::error::{OhmlabError, Result};

/// Arena slot for one terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSlot {
    /// Owning component
    pub owner: ComponentId,
    /// Which end of the owner this terminal is
    pub pin: Pin,
}

/// A schematic: components, their terminals and the wires between them.
///
/// Terminals live in an arena indexed by [`TerminalId`]. Removing a
/// component leaves a hole in the arena so that the remaining identifiers
/// stay valid.
///
/// A `Schematic` is a plain value. Cloning it gives an independent snapshot
/// that can be handed to a background solve while the original keeps being
/// edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schematic {
    /// Optional title used as the first line of solver decks
    pub title: Option<String>,
    components: Vec<Component>,
    terminals: Vec<Option<TerminalSlot>>,
    wires: Vec<Wire>,
    next_component: usize,
}

impl Schematic {
    /// Create an empty schematic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty schematic with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Build a schematic from a parsed text description.
    pub fn from_ast(ast: SchematicAst) -> Result<Self> {
        let mut schematic = Self {
            title: ast.title,
            ..Self::default()
        };

        for def in &ast.components {
            let kind = match def.component_type {
                ComponentType::Resistor => {
                    let ohms = def.value.ok_or_else(|| {
                        let message = "resistor requires a value";
                        OhmlabError::invalid_component(&def.name, def.line, message)
                    })?;
                    ComponentKind::Resistor { ohms }
                }
                ComponentType::VoltageSource | ComponentType::CurrentSource => {
                    let value = def.value.ok_or_else(|| {
                        let message = "source requires a value";
                        OhmlabError::invalid_component(&def.name, def.line, message)
                    })?;
                    let kind = if def.component_type == ComponentType::VoltageSource {
                        SourceKind::Voltage
                    } else {
                        SourceKind::Current
                    };
                    ComponentKind::Source { kind, value }
                }
                ComponentType::Ohmmeter => ComponentKind::Ohmmeter,
                ComponentType::Voltmeter => ComponentKind::Meter(MeterKind::Voltmeter),
                ComponentType::Ammeter => ComponentKind::Meter(MeterKind::Ammeter),
                ComponentType::Meter => ComponentKind::Meter(MeterKind::General),
                ComponentType::Ground => ComponentKind::Ground,
            };

            if def.value.is_some() && kind.value().is_none() {
                return Err(OhmlabError::invalid_component(
                    &def.name,
                    def.line,
                    format!("a {} takes no value", kind),
                ));
            }

            schematic.add_component(def.name.clone(), kind)?;
        }

        for wire in &ast.wires {
            let a = schematic.resolve_pin_ref(&wire.from)?;
            let b = schematic.resolve_pin_ref(&wire.to)?;
            schematic
                .connect(a, b)
                .map_err(|e| OhmlabError::parse(wire.line, e.to_string()))?;
        }

        Ok(schematic)
    }

    // ============ Editing ============

    /// Place a component, allocating its terminals.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        kind: ComponentKind,
    ) -> Result<ComponentId> {
        let name = name.into();
        kind.validate(&name)?;
        if self.component_by_name(&name).is_some() {
            return Err(OhmlabError::DuplicateComponent { name });
        }

        let id = ComponentId(self.next_component);
        self.next_component += 1;

        let terminals = if kind.terminal_count() == 1 {
            Terminals::One(self.alloc_terminal(id, Pin::A))
        } else {
            let a = self.alloc_terminal(id, Pin::A);
            let b = self.alloc_terminal(id, Pin::B);
            Terminals::Two([a, b])
        };

        self.components.push(Component {
            id,
            name,
            kind,
            terminals,
        });
        Ok(id)
    }

    pub fn add_resistor(&mut self, name: impl Into<String>, ohms: f64) -> Result<ComponentId> {
        self.add_component(name, ComponentKind::Resistor { ohms })
    }

    pub fn add_ohmmeter(&mut self, name: impl Into<String>) -> Result<ComponentId> {
        self.add_component(name, ComponentKind::Ohmmeter)
    }

    pub fn add_voltage_source(
        &mut self,
        name: impl Into<String>,
        volts: f64,
    ) -> Result<ComponentId> {
        self.add_component(
            name,
            ComponentKind::Source {
                kind: SourceKind::Voltage,
                value: volts,
            },
        )
    }

    pub fn add_current_source(
        &mut self,
        name: impl Into<String>,
        amps: f64,
    ) -> Result<ComponentId> {
        self.add_component(
            name,
            ComponentKind::Source {
                kind: SourceKind::Current,
                value: amps,
            },
        )
    }

    pub fn add_meter(&mut self, name: impl Into<String>, kind: MeterKind) -> Result<ComponentId> {
        self.add_component(name, ComponentKind::Meter(kind))
    }

    pub fn add_ground(&mut self, name: impl Into<String>) -> Result<ComponentId> {
        self.add_component(name, ComponentKind::Ground)
    }

    /// Pick an unused name of the form `<prefix><n>`.
    pub fn next_name(&self, kind: &ComponentKind) -> String {
        let prefix = kind.name_prefix();
        (1..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|name| self.component_by_name(name).is_none())
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Draw a wire between two terminals.
    pub fn connect(&mut self, a: TerminalId, b: TerminalId) -> Result<()> {
        self.slot(a)?;
        self.slot(b)?;
        if a == b {
            return Err(OhmlabError::SelfConnection {
                terminal: a.to_string(),
            });
        }
        self.wires.push(Wire::new(a, b));
        Ok(())
    }

    /// Remove every wire joining the two terminals. Returns how many were removed.
    pub fn disconnect(&mut self, a: TerminalId, b: TerminalId) -> usize {
        let before = self.wires.len();
        self.wires.retain(|w| !w.joins(a, b));
        before - self.wires.len()
    }

    /// Remove a component together with every wire touching it.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<Component> {
        let idx = self
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| OhmlabError::UnknownComponent {
                name: id.to_string(),
            })?;
        let component = self.components.remove(idx);

        let owned = component.terminals;
        self.wires
            .retain(|w| !owned.contains(w.a) && !owned.contains(w.b));
        for t in owned.as_slice() {
            if let Some(slot) = self.terminals.get_mut(t.0) {
                *slot = None;
            }
        }
        Ok(component)
    }

    /// Change a component's display label.
    pub fn rename(&mut self, id: ComponentId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if let Some(other) = self.component_by_name(&name) {
            if other.id != id {
                return Err(OhmlabError::DuplicateComponent { name });
            }
        }
        self.component_mut(id)?.name = name;
        Ok(())
    }

    /// Change a resistor's resistance or a source's magnitude.
    pub fn set_value(&mut self, id: ComponentId, value: f64) -> Result<()> {
        let component = self.component_mut(id)?;
        let kind = component.kind.with_value(value).ok_or_else(|| {
            let message = format!("a {} has no value", component.kind);
            OhmlabError::invalid_value(&component.name, value, message)
        })?;
        kind.validate(&component.name)?;
        component.kind = kind;
        Ok(())
    }

    // ============ Queries ============

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_by_name(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Look up a component by name, failing if it does not exist.
    pub fn require(&self, name: &str) -> Result<&Component> {
        self.component_by_name(name)
            .ok_or_else(|| OhmlabError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// The terminal on `pin` of the component called `name`.
    pub fn terminal(&self, name: &str, pin: Pin) -> Result<TerminalId> {
        Ok(self.require(name)?.terminal(pin))
    }

    /// Resolve a textual `component:pin` reference.
    pub fn resolve_pin_ref(&self, pin_ref: &PinRef) -> Result<TerminalId> {
        let component = self.require(&pin_ref.component)?;
        match (pin_ref.pin, component.terminals) {
            (Some(pin), terminals) => Ok(terminals.get(pin)),
            (None, Terminals::One(t)) => Ok(t),
            (None, Terminals::Two(_)) => Err(OhmlabError::UnknownTerminal {
                terminal: format!("{} (pin required)", pin_ref.component),
            }),
        }
    }

    /// The component owning a terminal.
    pub fn owner(&self, terminal: TerminalId) -> Result<&Component> {
        let slot = self.slot(terminal)?;
        self.component(slot.owner)
            .ok_or_else(|| OhmlabError::UnknownTerminal {
                terminal: terminal.to_string(),
            })
    }

    /// Human-readable `component:pin` form of a terminal.
    pub fn terminal_name(&self, terminal: TerminalId) -> String {
        match self.owner(terminal) {
            Ok(c) if c.kind.is_ground() => c.name.clone(),
            Ok(c) => {
                let pin = if c.terminal(Pin::A) == terminal { Pin::A } else { Pin::B };
                format!("{}:{}", c.name, pin)
            }
            Err(_) => terminal.to_string(),
        }
    }

    /// Size of the terminal arena, holes included.
    pub fn terminal_capacity(&self) -> usize {
        self.terminals.len()
    }

    /// Arena slot of a live terminal.
    pub fn slot(&self, terminal: TerminalId) -> Result<TerminalSlot> {
        self.terminals
            .get(terminal.0)
            .copied()
            .flatten()
            .ok_or_else(|| OhmlabError::UnknownTerminal {
                terminal: terminal.to_string(),
            })
    }

    pub fn grounds(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.kind.is_ground())
    }

    pub fn has_ground(&self) -> bool {
        self.grounds().next().is_some()
    }

    pub fn ohmmeters(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.kind.is_ohmmeter())
    }

    pub fn meters(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| c.kind.is_meter())
    }

    /// Check that every component and wire refers to live, correctly owned terminals.
    ///
    /// Schematics built through the editing API always pass. Restored
    /// snapshots are checked before use.
    pub fn check_integrity(&self) -> Result<()> {
        let mut names = HashSet::new();
        for component in &self.components {
            if !names.insert(component.name.as_str()) {
                return Err(OhmlabError::DuplicateComponent {
                    name: component.name.clone(),
                });
            }
            if component.id.0 >= self.next_component {
                return Err(OhmlabError::UnknownComponent {
                    name: component.id.to_string(),
                });
            }
            component.kind.validate(&component.name)?;
            if component.terminals.as_slice().len() != component.kind.terminal_count() {
                return Err(OhmlabError::UnknownTerminal {
                    terminal: format!("{} has the wrong number of terminals", component.name),
                });
            }
            for &t in component.terminals.as_slice() {
                let slot = self.slot(t)?;
                if slot.owner != component.id {
                    return Err(OhmlabError::UnknownTerminal {
                        terminal: format!("{} is not owned by {}", t, component.name),
                    });
                }
            }
        }
        for wire in &self.wires {
            self.slot(wire.a)?;
            self.slot(wire.b)?;
            if wire.a == wire.b {
                return Err(OhmlabError::SelfConnection {
                    terminal: wire.a.to_string(),
                });
            }
        }
        Ok(())
    }

    fn alloc_terminal(&mut self, owner: ComponentId, pin: Pin) -> TerminalId {
        let id = TerminalId(self.terminals.len());
        self.terminals.push(Some(TerminalSlot { owner, pin }));
        id
    }

    fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component> {
        self.components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| OhmlabError::UnknownComponent {
                name: id.to_string(),
            })
    }
}
