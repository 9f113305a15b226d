//! Joint yarn reduction through an indexed join.
//!
//! For a relation `R` and yarns `F`, `T` a bulk filter returns the members of
//! `F` related to at least one member of `T`, and the members of `T` related
//! to at least one member of `F`. It never drops a node that could take part
//! in a result.

use std::collections::HashSet;

use crate::relations::features::{feature_value, strip_matches};
use crate::relations::{FeatureComparison, RelationContext, RelationKind};
use crate::types::{FeatureValue, Node, NodeSet};

/// Apply the bulk filter of `kind`, or `None` if it has none.
pub fn apply(ctx: &RelationContext<'_>, kind: &RelationKind, from: &NodeSet, to: &NodeSet) -> Option<(NodeSet, NodeSet)> {
    match kind {
        RelationKind::Equal => {
            let common = from.intersection(to);
            Some((common.clone(), common))
        }
        RelationKind::SameSlots => Some(same_slots(ctx, from, to)),
        RelationKind::Overlap => Some(overlap(ctx, from, to)),
        RelationKind::Feature { left, right, comparison } => match comparison {
            FeatureComparison::Equal => Some(join_on(from, to, |n| feature_key(ctx, left, n), |m| feature_key(ctx, right, m))),
            FeatureComparison::MatchAfterStrip(re) => Some(join_on(
                from,
                to,
                |n| feature_value(ctx, left, n).map(|v| strip_matches(re, &v)),
                |m| feature_value(ctx, right, m).map(|v| strip_matches(re, &v)),
            )),
            _ => None,
        },
        _ => None,
    }
}

fn feature_key(ctx: &RelationContext<'_>, feature: &str, n: Node) -> Option<FeatureValue> {
    feature_value(ctx, feature, n).map(|v| v.into_owned())
}

/// Keep nodes on both sides whose key occurs on the other side.
fn join_on<K, L, R>(from: &NodeSet, to: &NodeSet, left_key: L, right_key: R) -> (NodeSet, NodeSet)
where
    K: std::hash::Hash + Eq,
    L: Fn(Node) -> Option<K>,
    R: Fn(Node) -> Option<K>,
{
    let left: Vec<(Node, K)> = from.iter().filter_map(|n| left_key(n).map(|k| (n, k))).collect();
    let right: Vec<(Node, K)> = to.iter().filter_map(|m| right_key(m).map(|k| (m, k))).collect();
    let left_keys: HashSet<&K> = left.iter().map(|(_, k)| k).collect();
    let right_keys: HashSet<&K> = right.iter().map(|(_, k)| k).collect();
    let new_from = left
        .iter()
        .filter(|(_, k)| right_keys.contains(k))
        .map(|(n, _)| *n)
        .collect();
    let new_to = right
        .iter()
        .filter(|(_, k)| left_keys.contains(k))
        .map(|(m, _)| *m)
        .collect();
    (new_from, new_to)
}

fn same_slots(ctx: &RelationContext<'_>, from: &NodeSet, to: &NodeSet) -> (NodeSet, NodeSet) {
    let grid = ctx.grid;
    join_on(from, to, |n| Some(grid.slots_of(n)), |m| Some(grid.slots_of(m)))
}

fn overlap(ctx: &RelationContext<'_>, from: &NodeSet, to: &NodeSet) -> (NodeSet, NodeSet) {
    let grid = ctx.grid;
    let width = grid.max_slot() as usize + 1;
    let mark = |yarn: &NodeSet| {
        let mut covered = vec![false; width];
        for n in yarn.iter() {
            for &s in grid.slots_of(n) {
                covered[s as usize] = true;
            }
        }
        covered
    };
    let from_slots = mark(from);
    let to_slots = mark(to);
    let touches = |n: Node, covered: &[bool]| grid.slots_of(n).iter().any(|&s| covered[s as usize]);

    let mut new_from = from.clone();
    new_from.retain(|n| touches(n, &to_slots));
    let mut new_to = to.clone();
    new_to.retain(|m| touches(m, &from_slots));
    (new_from, new_to)
}
