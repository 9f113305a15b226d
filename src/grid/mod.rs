//! Corpus grid: node space, types, slot containment and canonical order.
//!
//! This module is organized into the following submodules:
//! - `levels`: object types ranked by average slot-set size
//! - `order`: the canonical node comparator
//! - `embedding`: embedders, embeddees, direct containers and boundaries
//!
//! Everything is computed once from a [`FeatureProvider`] and never changes
//! afterwards. Out-of-range nodes yield empty results, never panics.

pub mod embedding;
pub mod levels;
pub mod order;


use std::cmp::Ordering;
use std::collections::HashMap;

use crate::data::{CorpusError, FeatureProvider};
use crate::types::{Node, NodeSet};

pub use levels::Level;

/// Precomputed structural view of a corpus.
#[derive(Debug, Clone)]
pub struct Grid {
    max_slot: Node,
    max_node: Node,
    slot_type: String,
    type_names: Vec<String>,
    /// Type index per node, index 0 unused.
    node_types: Vec<usize>,
    /// `slot_ids[s] == s`, so slots can hand out `&[s]`.
    slot_ids: Vec<Node>,
    composite_slots: Vec<Vec<Node>>,
    levels: Vec<Level>,
    /// Level position per type index.
    type_levels: Vec<usize>,
    order: Vec<Node>,
    rank: Vec<u32>,
    nodes_by_type: HashMap<String, Vec<Node>>,
    embedders: Vec<Vec<Node>>,
    embeddees: Vec<Vec<Node>>,
    up: Vec<Vec<Node>>,
    down: Vec<Vec<Node>>,
    first_slots: Vec<Vec<Node>>,
    last_slots: Vec<Vec<Node>>,
}

impl Grid {
    /// Build the grid from a feature provider.
    pub fn new(provider: &dyn FeatureProvider) -> Result<Self, CorpusError> {
        let max_slot = provider.max_slot();
        let max_node = provider.max_node();
        if max_slot == 0 {
            return Err(CorpusError::NoSlots);
        }
        if max_node < max_slot {
            return Err(CorpusError::FewerNodesThanSlots { max_node, max_slot });
        }
        let slot_type = provider.slot_type().to_string();

        let mut type_names = vec![slot_type.clone()];
        let mut type_index: HashMap<String, usize> = HashMap::new();
        type_index.insert(slot_type.clone(), 0);

        let mut node_types = vec![0usize; max_node as usize + 1];
        let n_composites = (max_node - max_slot) as usize;
        let mut composite_types = Vec::with_capacity(n_composites);
        let mut composite_slots = Vec::with_capacity(n_composites);
        for node in max_slot + 1..=max_node {
            let otype = provider.node_type(node).unwrap_or_default().to_string();
            let mut slots = provider.slots_of(node);
            if slots.is_empty() {
                return Err(CorpusError::EmptySlots { node, otype });
            }
            if let Some(&slot) = slots.iter().find(|&&s| s == 0 || s > max_slot) {
                return Err(CorpusError::SlotOutOfRange { node, slot, max_slot });
            }
            slots.sort_unstable();
            slots.dedup();
            let t = match type_index.get(&otype) {
                Some(&t) => t,
                None => {
                    type_names.push(otype.clone());
                    type_index.insert(otype, type_names.len() - 1);
                    type_names.len() - 1
                }
            };
            if t == 0 {
                return Err(CorpusError::SlotTypeReused(slot_type));
            }
            node_types[node as usize] = t;
            composite_types.push(t);
            composite_slots.push(slots);
        }

        let sizes: Vec<usize> = composite_slots.iter().map(Vec::len).collect();
        let levels = levels::compute_levels(&slot_type, max_slot, &type_names, &composite_types, &sizes);
        let mut type_levels = vec![0usize; type_names.len()];
        for (pos, level) in levels.iter().enumerate() {
            if let Some(&t) = type_index.get(&level.otype) {
                type_levels[t] = pos;
            }
        }

        let mut grid = Grid {
            max_slot,
            max_node,
            slot_type,
            type_names,
            node_types,
            slot_ids: (0..=max_slot).collect(),
            composite_slots,
            levels,
            type_levels,
            order: Vec::new(),
            rank: Vec::new(),
            nodes_by_type: HashMap::new(),
            embedders: Vec::new(),
            embeddees: Vec::new(),
            up: Vec::new(),
            down: Vec::new(),
            first_slots: Vec::new(),
            last_slots: Vec::new(),
        };

        let canonical = order::canonical_order(
            max_node,
            |n| grid.slots_of(n),
            |n| grid.type_levels[grid.node_types[n as usize]],
        );
        grid.order = canonical;
        let mut rank = vec![0u32; max_node as usize + 1];
        for (pos, &node) in grid.order.iter().enumerate() {
            rank[node as usize] = pos as u32;
        }
        grid.rank = rank;

        let mut nodes_by_type: HashMap<String, Vec<Node>> = HashMap::new();
        for &node in &grid.order {
            let name = &grid.type_names[grid.node_types[node as usize]];
            nodes_by_type.entry(name.clone()).or_default().push(node);
        }
        grid.nodes_by_type = nodes_by_type;

        grid.build_embedding();
        grid.build_boundaries();

        log::info!(
            "Grid ready: {} slots, {} nodes, {} types",
            grid.max_slot,
            grid.max_node,
            grid.levels.len()
        );
        Ok(grid)
    }

    pub fn max_slot(&self) -> Node {
        self.max_slot
    }

    pub fn max_node(&self) -> Node {
        self.max_node
    }

    pub fn slot_type(&self) -> &str {
        &self.slot_type
    }

    pub fn contains(&self, node: Node) -> bool {
        node >= 1 && node <= self.max_node
    }

    pub fn is_slot(&self, node: Node) -> bool {
        node >= 1 && node <= self.max_slot
    }

    pub fn node_type(&self, node: Node) -> Option<&str> {
        if !self.contains(node) {
            return None;
        }
        Some(&self.type_names[self.node_types[node as usize]])
    }

    pub fn has_type(&self, otype: &str) -> bool {
        self.nodes_by_type.contains_key(otype)
    }

    /// Ascending slots of a node; a slot yields itself.
    pub fn slots_of(&self, node: Node) -> &[Node] {
        if self.is_slot(node) {
            std::slice::from_ref(&self.slot_ids[node as usize])
        } else if self.contains(node) {
            &self.composite_slots[(node - self.max_slot - 1) as usize]
        } else {
            &[]
        }
    }

    pub fn first_slot(&self, node: Node) -> Option<Node> {
        self.slots_of(node).first().copied()
    }

    pub fn last_slot(&self, node: Node) -> Option<Node> {
        self.slots_of(node).last().copied()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Position of a type in the level order, slot type last.
    pub fn type_rank(&self, otype: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.otype == otype)
    }

    /// Position of a node in the canonical order.
    pub fn rank(&self, node: Node) -> Option<u32> {
        if self.contains(node) {
            Some(self.rank[node as usize])
        } else {
            None
        }
    }

    /// Canonical three-way comparison. Out-of-range nodes sort last.
    pub fn before(&self, a: Node, b: Node) -> Ordering {
        match (self.rank(a), self.rank(b)) {
            (Some(ra), Some(rb)) => ra.cmp(&rb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(&b),
        }
    }

    /// All nodes in canonical order.
    pub fn canonical_order(&self) -> &[Node] {
        &self.order
    }

    /// Nodes of a type in canonical order.
    pub fn nodes_of_type(&self, otype: &str) -> &[Node] {
        self.nodes_by_type.get(otype).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Type names in level order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.otype.as_str())
    }

    pub fn sort_nodes(&self, nodes: &mut [Node]) {
        nodes.sort_by(|&a, &b| self.before(a, b));
    }

    /// All nodes as a set.
    pub fn all_nodes(&self) -> NodeSet {
        NodeSet::range(1, self.max_node)
    }
}
