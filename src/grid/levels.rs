//! Type levels: object types ordered by how much of the corpus they span.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Node;

/// One object type with its average slot-set size and node id range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Level {
    pub otype: String,
    pub avg_slots: f64,
    pub min_node: Node,
    pub max_node: Node,
}

/// Compute levels from per-node types and slot counts.
///
/// Types are sorted by descending average slot count, ties broken by the
/// smallest node of the type. The slot type is always last, with average 1.
pub fn compute_levels(
    slot_type: &str,
    max_slot: Node,
    type_names: &[String],
    composite_types: &[usize],
    composite_sizes: &[usize],
) -> Vec<Level> {
    struct Acc {
        total: usize,
        count: usize,
        min: Node,
        max: Node,
    }
    let mut acc: HashMap<usize, Acc> = HashMap::new();
    for (idx, (&t, &size)) in composite_types.iter().zip(composite_sizes).enumerate() {
        let node = max_slot + 1 + idx as Node;
        let entry = acc.entry(t).or_insert(Acc { total: 0, count: 0, min: node, max: node });
        entry.total += size;
        entry.count += 1;
        entry.min = entry.min.min(node);
        entry.max = entry.max.max(node);
    }

    let mut levels: Vec<Level> = acc
        .into_iter()
        .map(|(t, a)| Level {
            otype: type_names[t].clone(),
            avg_slots: a.total as f64 / a.count as f64,
            min_node: a.min,
            max_node: a.max,
        })
        .collect();
    levels.sort_by(|a, b| {
        b.avg_slots
            .total_cmp(&a.avg_slots)
            .then(a.min_node.cmp(&b.min_node))
    });
    levels.push(Level {
        otype: slot_type.to_string(),
        avg_slots: 1.0,
        min_node: 1,
        max_node: max_slot,
    });
    levels
}
