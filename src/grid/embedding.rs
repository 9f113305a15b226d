//! Embedding lookups and slot boundaries.
//!
//! `embedders(n)` lists every composite whose slot set contains the slot set
//! of `n`, nearest first. `up(n)` keeps only the direct containers: those
//! that precede `n` canonically with no other container of `n` between them.

use rayon::prelude::*;

use crate::grid::Grid;
use crate::types::{is_sorted_subset, Node};

impl Grid {
    pub(super) fn build_embedding(&mut self) {
        let max_slot = self.max_slot as usize;
        let max_node = self.max_node as usize;

        // composites per slot, as a starting point for superset lookups
        let mut slot_members: Vec<Vec<Node>> = vec![Vec::new(); max_slot + 1];
        for node in self.max_slot + 1..=self.max_node {
            for &s in self.slots_of(node) {
                slot_members[s as usize].push(node);
            }
        }

        let grid = &*self;
        let embedders: Vec<Vec<Node>> = (0..=max_node)
            .into_par_iter()
            .map(|idx| {
                let node = idx as Node;
                if !grid.contains(node) {
                    return Vec::new();
                }
                let slots = grid.slots_of(node);
                let mut found: Vec<Node> = slot_members[slots[0] as usize]
                    .iter()
                    .copied()
                    .filter(|&m| m != node && is_sorted_subset(slots, grid.slots_of(m)))
                    .collect();
                found.sort_unstable_by(|&a, &b| grid.rank[b as usize].cmp(&grid.rank[a as usize]));
                found
            })
            .collect();

        let mut embeddees: Vec<Vec<Node>> = vec![Vec::new(); max_node + 1];
        for node in self.max_slot + 1..=self.max_node {
            for &m in &embedders[node as usize] {
                embeddees[m as usize].push(node);
            }
        }
        for list in embeddees.iter_mut() {
            list.sort_unstable_by_key(|&n| self.rank[n as usize]);
        }

        let up: Vec<Vec<Node>> = (0..=max_node)
            .into_par_iter()
            .map(|idx| {
                let node = idx as Node;
                let rank = grid.rank.get(idx).copied().unwrap_or(0);
                let mut direct: Vec<Node> = Vec::new();
                for &m in &embedders[idx] {
                    if grid.rank[m as usize] > rank {
                        continue;
                    }
                    let interposed = direct
                        .iter()
                        .any(|&d| is_sorted_subset(grid.slots_of(d), grid.slots_of(m)));
                    if !interposed {
                        direct.push(m);
                    }
                }
                if !grid.contains(node) {
                    direct.clear();
                }
                direct
            })
            .collect();

        let mut down: Vec<Vec<Node>> = vec![Vec::new(); max_node + 1];
        for (idx, containers) in up.iter().enumerate() {
            for &m in containers {
                down[m as usize].push(idx as Node);
            }
        }
        for list in down.iter_mut() {
            list.sort_unstable_by_key(|&n| self.rank[n as usize]);
        }

        log::debug!(
            "Embedding built: {} embedder links, {} direct links",
            embedders.iter().map(Vec::len).sum::<usize>(),
            up.iter().map(Vec::len).sum::<usize>()
        );

        self.embedders = embedders;
        self.embeddees = embeddees;
        self.up = up;
        self.down = down;
    }

    pub(super) fn build_boundaries(&mut self) {
        let max_slot = self.max_slot as usize;
        let mut first_slots: Vec<Vec<Node>> = vec![Vec::new(); max_slot + 1];
        let mut last_slots: Vec<Vec<Node>> = vec![Vec::new(); max_slot + 1];
        for node in self.max_slot + 1..=self.max_node {
            let slots = self.slots_of(node);
            if let (Some(&first), Some(&last)) = (slots.first(), slots.last()) {
                first_slots[first as usize].push(node);
                last_slots[last as usize].push(node);
            }
        }
        for list in first_slots.iter_mut() {
            list.sort_unstable_by(|&a, &b| self.rank[b as usize].cmp(&self.rank[a as usize]));
        }
        for list in last_slots.iter_mut() {
            list.sort_unstable_by_key(|&n| self.rank[n as usize]);
        }
        self.first_slots = first_slots;
        self.last_slots = last_slots;
    }

    /// All composites embedding `node` (equal slot sets included), nearest
    /// first.
    pub fn embedders(&self, node: Node) -> &[Node] {
        self.embedders.get(node as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All composites embedded in `node` (equal slot sets included), in
    /// canonical order. Slots are not listed; see [`Grid::embeddees`].
    pub fn composite_embeddees(&self, node: Node) -> &[Node] {
        if self.is_slot(node) {
            return &[];
        }
        self.embeddees.get(node as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes embedded in `node`, slots included, in canonical order.
    pub fn embeddees(&self, node: Node) -> Vec<Node> {
        if !self.contains(node) || self.is_slot(node) {
            return Vec::new();
        }
        let mut all: Vec<Node> = self.composite_embeddees(node).to_vec();
        all.extend_from_slice(self.slots_of(node));
        self.sort_nodes(&mut all);
        all
    }

    /// Direct containers of `node`, nearest first.
    pub fn up(&self, node: Node) -> &[Node] {
        self.up.get(node as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct contents of `node` in canonical order, optionally of one type.
    pub fn down(&self, node: Node, type_filter: Option<&str>) -> Vec<Node> {
        let Some(list) = self.down.get(node as usize) else {
            return Vec::new();
        };
        match type_filter {
            Some(otype) => list
                .iter()
                .copied()
                .filter(|&n| self.node_type(n) == Some(otype))
                .collect(),
            None => list.clone(),
        }
    }

    /// Composites starting at slot `slot`, innermost first.
    pub fn first_slots(&self, slot: Node) -> &[Node] {
        if !self.is_slot(slot) {
            return &[];
        }
        &self.first_slots[slot as usize]
    }

    /// Composites ending at slot `slot`, outermost first.
    pub fn last_slots(&self, slot: Node) -> &[Node] {
        if !self.is_slot(slot) {
            return &[];
        }
        &self.last_slots[slot as usize]
    }
}
