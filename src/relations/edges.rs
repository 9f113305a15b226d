//! Relations backed by edge features.

use crate::data::EdgeDirection;
use crate::relations::RelationContext;
use crate::types::{Node, ValueCondition};

pub(super) fn fanout(
    ctx: &RelationContext<'_>,
    feature: &str,
    direction: EdgeDirection,
    condition: Option<&ValueCondition>,
    n: Node,
    out: &mut Vec<Node>,
) {
    for (m, value) in ctx.provider.edge_feature_targets(feature, n, direction) {
        if condition.map_or(true, |c| c.accepts(value)) {
            out.push(m);
        }
    }
}

pub(super) fn holds(
    ctx: &RelationContext<'_>,
    feature: &str,
    direction: EdgeDirection,
    condition: Option<&ValueCondition>,
    n: Node,
    m: Node,
) -> bool {
    ctx.provider
        .edge_feature_targets(feature, n, direction)
        .into_iter()
        .any(|(target, value)| target == m && condition.map_or(true, |c| c.accepts(value)))
}
