//! Canonical node order.
//!
//! Node `a` precedes `b` when the smallest slot in the symmetric difference
//! of their slot sets belongs to `a`. A strict superset therefore comes
//! before its subsets. Equal slot sets fall back to the type level and then
//! to the node id.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::types::Node;

/// Compare two ascending slot lists by the smallest slot of their symmetric
/// difference. `Equal` means the slot sets are identical.
pub fn compare_slot_sets(a: &[Node], b: &[Node]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    // one is a prefix of the other: the longer one embraces it
    b.len().cmp(&a.len())
}

/// Full comparator over nodes, given their slots and type levels.
pub fn compare_nodes(a: Node, b: Node, slots_a: &[Node], slots_b: &[Node], level_a: usize, level_b: usize) -> Ordering {
    compare_slot_sets(slots_a, slots_b)
        .then(level_a.cmp(&level_b))
        .then(a.cmp(&b))
}

/// Sort all nodes `1..=max_node` canonically.
pub fn canonical_order<'a, S, L>(max_node: Node, slots_of: S, level_of: L) -> Vec<Node>
where
    S: Fn(Node) -> &'a [Node] + Sync,
    L: Fn(Node) -> usize + Sync,
{
    let mut order: Vec<Node> = (1..=max_node).collect();
    order.par_sort_by(|&a, &b| compare_nodes(a, b, slots_of(a), slots_of(b), level_of(a), level_of(b)));
    order
}
