//! Relation algebra used by search templates.
//!
//! This module is organized into the following submodules:
//! - `catalog`: the relation table, operator parsing and the legend
//! - `slots`: structural relations over nodes and their slots
//! - `features`: relations comparing feature values of two nodes
//! - `edges`: relations backed by edge features
//! - `bulk`: joint yarn reduction for relations with an indexed join
//!
//! A relation either fans out (node to candidate nodes) or tests a pair of
//! nodes. Every relation can test a pair; only fan-out relations can
//! produce candidates.

pub mod bulk;
pub mod catalog;
pub mod edges;
pub mod features;
pub mod slots;

#[cfg(test)]
mod tests;

use regex::Regex;

use crate::data::{EdgeDirection, FeatureProvider};
use crate::grid::Grid;
use crate::types::{Node, ValueCondition};

pub use catalog::{parse_feature_op, parse_near_op, FeatureOp, FeatureOpKind, RelationTable};

/// Read-only view on the corpus needed to evaluate relations.
#[derive(Clone, Copy)]
pub struct RelationContext<'a> {
    pub grid: &'a Grid,
    pub provider: &'a dyn FeatureProvider,
}

/// What kind of nodes a yarn may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Slots,
    NonSlots,
    Mixed,
}

impl SlotKind {
    pub fn may_have_slots(self) -> bool {
        self != SlotKind::NonSlots
    }

    pub fn may_have_composites(self) -> bool {
        self != SlotKind::Slots
    }
}

/// How a relation is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Given the left node, candidates for the right node can be listed.
    Fanout,
    /// Only pairs can be tested.
    Test,
}

/// How many right nodes a left node is expected to relate to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpreadEstimate {
    /// A fixed number.
    Constant(f64),
    /// A fixed fraction of the right yarn.
    Proportional(f64),
    /// Estimated by sampling the yarns.
    Sampled,
}

/// Parameterized slot-distance families (`=k:`, `:k=`, `:k:`, `<k:`, `:k>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NearFamily {
    First,
    Last,
    Boundary,
    Before,
    After,
}

/// Comparison applied by feature relations.
#[derive(Debug, Clone)]
pub enum FeatureComparison {
    Equal,
    Unequal,
    Less,
    Greater,
    /// Equal after deleting all matches of the pattern from both values.
    MatchAfterStrip(Regex),
}

/// One relation constructor per relation; families carry their parameters.
#[derive(Debug, Clone)]
pub enum RelationKind {
    Equal,
    Unequal,
    CanonicalBefore,
    CanonicalAfter,
    SameSlots,
    Overlap,
    DifferentSlots,
    Disjoint,
    Embeds,
    EmbeddedIn,
    SlotBefore,
    SlotAfter,
    SameFirst,
    SameLast,
    SameBoundary,
    AdjacentBefore,
    AdjacentAfter,
    Near(NearFamily, u32),
    Edge {
        feature: String,
        direction: EdgeDirection,
        condition: Option<ValueCondition>,
    },
    Feature {
        left: String,
        right: String,
        comparison: FeatureComparison,
    },
}

impl RelationKind {
    pub fn shape(&self) -> Shape {
        match self {
            RelationKind::Unequal
            | RelationKind::CanonicalBefore
            | RelationKind::CanonicalAfter
            | RelationKind::DifferentSlots
            | RelationKind::Disjoint
            | RelationKind::SlotBefore
            | RelationKind::SlotAfter
            | RelationKind::Feature { .. } => Shape::Test,
            _ => Shape::Fanout,
        }
    }

    /// Whether an indexed joint yarn reduction exists.
    pub fn has_bulk_filter(&self) -> bool {
        match self {
            RelationKind::Equal | RelationKind::SameSlots | RelationKind::Overlap => true,
            RelationKind::Feature { comparison, .. } => matches!(
                comparison,
                FeatureComparison::Equal | FeatureComparison::MatchAfterStrip(_)
            ),
            _ => false,
        }
    }
}

/// An entry of the relation table.
#[derive(Debug, Clone)]
pub struct Relation {
    pub acro: String,
    pub kind: RelationKind,
    pub spread: SpreadEstimate,
    pub description: String,
    /// Index of the converse relation in the same table.
    pub converse: usize,
}

impl Relation {
    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    /// Specialize for the slot kinds of both yarns.
    pub fn compile(&self, from: SlotKind, to: SlotKind) -> CompiledRelation<'_> {
        CompiledRelation { relation: self, from, to }
    }
}

/// A relation bound to the slot kinds of its left and right yarns.
#[derive(Debug, Clone, Copy)]
pub struct CompiledRelation<'r> {
    pub relation: &'r Relation,
    pub from: SlotKind,
    pub to: SlotKind,
}

impl<'r> CompiledRelation<'r> {
    pub fn shape(&self) -> Shape {
        self.relation.shape()
    }

    /// Push candidate right nodes for `n`. Duplicates may occur; callers
    /// intersect with the right yarn anyway. Test relations push nothing.
    pub fn fanout(&self, ctx: &RelationContext<'_>, n: Node, out: &mut Vec<Node>) {
        match &self.relation.kind {
            RelationKind::Edge { feature, direction, condition } => {
                edges::fanout(ctx, feature, *direction, condition.as_ref(), n, out)
            }
            kind if kind.shape() == Shape::Fanout => slots::fanout(ctx, kind, self.from, self.to, n, out),
            _ => {}
        }
    }

    /// Whether `n` and `m` stand in this relation.
    pub fn holds(&self, ctx: &RelationContext<'_>, n: Node, m: Node) -> bool {
        match &self.relation.kind {
            RelationKind::Edge { feature, direction, condition } => {
                edges::holds(ctx, feature, *direction, condition.as_ref(), n, m)
            }
            RelationKind::Feature { left, right, comparison } => {
                features::holds(ctx, left, right, comparison, n, m)
            }
            kind => slots::holds(ctx, kind, n, m),
        }
    }
}
