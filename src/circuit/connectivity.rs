//! Connectivity resolution: which terminals form the same electrical node.
//!
//! Terminals are the vertices and wires the edges of an undirected graph.
//! Each connected component of that graph is one node. Every ground
//! terminal is additionally joined to a virtual reference vertex, so all
//! grounds share the label `0` even when no wire links them.
//!
//! Resolution is a union-find pass over the terminal arena: `O(T + W)`
//! with path halving and union by size. Cycles and fan-out only ever merge
//! sets that are already merged.

use std::collections::HashMap;

use tracing::debug;

use super::graph::Schematic;
use super::types::{NodeLabel, TerminalId};
use crate::error::{OhmlabError, Result};

/// Terminal-to-node assignment produced by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMap {
    /// Indexed by terminal id; `None` for holes in the arena
    labels: Vec<Option<NodeLabel>>,
    /// Number of non-ground nodes
    nets: usize,
    has_ground: bool,
}

impl NodeMap {
    /// The node a terminal belongs to.
    pub fn node(&self, terminal: TerminalId) -> Result<NodeLabel> {
        self.get(terminal).ok_or_else(|| OhmlabError::UnknownTerminal {
            terminal: terminal.to_string(),
        })
    }

    pub fn get(&self, terminal: TerminalId) -> Option<NodeLabel> {
        self.labels.get(terminal.0).copied().flatten()
    }

    /// Check whether two terminals are electrically identical.
    pub fn same_node(&self, a: TerminalId, b: TerminalId) -> Result<bool> {
        Ok(self.node(a)? == self.node(b)?)
    }

    /// Nodes of a two-terminal component, in pin order.
    pub fn pair(&self, terminals: [TerminalId; 2]) -> Result<[NodeLabel; 2]> {
        Ok([self.node(terminals[0])?, self.node(terminals[1])?])
    }

    /// Whether any terminal sits on the reference node.
    pub fn has_ground(&self) -> bool {
        self.has_ground
    }

    /// Number of distinct nodes, ground included.
    pub fn node_count(&self) -> usize {
        self.nets + usize::from(self.has_ground)
    }

    /// Every non-ground node, in label order.
    pub fn nets(&self) -> impl Iterator<Item = NodeLabel> {
        (1..=self.nets).map(NodeLabel::Net)
    }

    /// Every node, ground first when present.
    pub fn nodes(&self) -> Vec<NodeLabel> {
        let ground = self.has_ground.then_some(NodeLabel::Ground);
        ground.into_iter().chain(self.nets()).collect()
    }

    /// Terminals on the given node, in id order.
    pub fn members(&self, label: NodeLabel) -> Vec<TerminalId> {
        self.iter()
            .filter(|&(_, l)| l == label)
            .map(|(t, _)| t)
            .collect()
    }

    /// All `(terminal, node)` pairs, in terminal id order.
    pub fn iter(&self) -> impl Iterator<Item = (TerminalId, NodeLabel)> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.map(|l| (TerminalId(i), l)))
    }

    /// Number of terminals mapped.
    pub fn len(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Disjoint-set forest over terminal indices.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Partition every terminal of the schematic into nodes.
///
/// Labels `N1, N2, ...` are handed out in order of the lowest terminal id in
/// each node, so the same schematic always resolves to the same map. A wire
/// naming a terminal the schematic does not own fails the whole pass.
pub fn resolve(schematic: &Schematic) -> Result<NodeMap> {
    let capacity = schematic.terminal_capacity();
    // One extra vertex stands for the reference node.
    let reference = capacity;
    let mut sets = DisjointSet::new(capacity + 1);

    for wire in schematic.wires() {
        schematic.slot(wire.a)?;
        schematic.slot(wire.b)?;
        sets.union(wire.a.0, wire.b.0);
    }

    let mut has_ground = false;
    for ground in schematic.grounds() {
        for &t in ground.terminals.as_slice() {
            schematic.slot(t)?;
            sets.union(t.0, reference);
            has_ground = true;
        }
    }

    let reference_root = sets.find(reference);
    let mut labels = vec![None; capacity];
    let mut assigned: HashMap<usize, NodeLabel> = HashMap::new();
    let mut nets = 0usize;

    for index in 0..capacity {
        if schematic.slot(TerminalId(index)).is_err() {
            continue;
        }
        let root = sets.find(index);
        let label = if root == reference_root {
            NodeLabel::Ground
        } else {
            *assigned.entry(root).or_insert_with(|| {
                nets += 1;
                NodeLabel::Net(nets)
            })
        };
        labels[index] = Some(label);
    }

    debug!(
        terminals = labels.iter().filter(|l| l.is_some()).count(),
        nodes = nets + usize::from(has_ground),
        "resolved connectivity"
    );

    Ok(NodeMap {
        labels,
        nets,
        has_ground,
    })
}
