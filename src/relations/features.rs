//! Relations comparing a feature of the left node with a feature of the
//! right node. The pseudo-feature `otype` stands for the node type.

use std::borrow::Cow;

use crate::relations::{FeatureComparison, RelationContext};
use crate::types::{FeatureValue, Node};

pub const OTYPE: &str = "otype";

/// Value of a node feature, or the node type for `otype`.
pub fn feature_value<'a>(ctx: &RelationContext<'a>, feature: &str, n: Node) -> Option<Cow<'a, FeatureValue>> {
    if feature == OTYPE {
        return ctx
            .grid
            .node_type(n)
            .map(|t| Cow::Owned(FeatureValue::Str(t.to_string())));
    }
    ctx.provider.node_feature_value(feature, n).map(Cow::Borrowed)
}

/// Text of a value with every match of the pattern removed.
pub fn strip_matches(re: &regex::Regex, value: &FeatureValue) -> String {
    re.replace_all(&value.to_string(), "").into_owned()
}

pub(super) fn holds(
    ctx: &RelationContext<'_>,
    left: &str,
    right: &str,
    comparison: &FeatureComparison,
    n: Node,
    m: Node,
) -> bool {
    let nv = feature_value(ctx, left, n);
    let mv = feature_value(ctx, right, m);
    match comparison {
        FeatureComparison::Equal => matches!((&nv, &mv), (Some(a), Some(b)) if a == b),
        // two missing values count as different
        FeatureComparison::Unequal => match (&nv, &mv) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        },
        FeatureComparison::Less => matches!((&nv, &mv), (Some(a), Some(b)) if a < b),
        FeatureComparison::Greater => matches!((&nv, &mv), (Some(a), Some(b)) if a > b),
        FeatureComparison::MatchAfterStrip(re) => match (&nv, &mv) {
            (Some(a), Some(b)) => strip_matches(re, a) == strip_matches(re, b),
            _ => false,
        },
    }
}
