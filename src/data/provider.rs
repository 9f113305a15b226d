//! Read-only feature lookup interface consumed by the search engine.
//!
//! The engine never computes or stores features itself. Everything it knows
//! about a corpus (node types, slot containment, node and edge features)
//! comes through [`FeatureProvider`].

use crate::types::{FeatureValue, Node, ValueType};

/// Direction of an edge feature lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// Targets of edges leaving the node.
    Forward,
    /// Sources of edges arriving at the node.
    Backward,
    /// Both of the above.
    Both,
}

/// Static description of an edge feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFeatureInfo {
    /// Whether edges carry values.
    pub has_values: bool,
    pub value_type: ValueType,
}

/// Read-only access to corpus structure and features.
///
/// Out-of-range nodes and unknown names yield empty results or `None`.
pub trait FeatureProvider: Send + Sync {
    fn max_slot(&self) -> Node;

    fn max_node(&self) -> Node;

    /// Name of the type of all slots.
    fn slot_type(&self) -> &str;

    fn node_type(&self, node: Node) -> Option<&str>;

    /// Ordered slots of a node; a slot yields itself.
    fn slots_of(&self, node: Node) -> Vec<Node>;

    /// All type names, slot type included.
    fn node_types(&self) -> Vec<String>;

    /// Nodes of a type in ascending node order.
    fn nodes_of_type(&self, otype: &str) -> Vec<Node>;

    fn node_feature_names(&self) -> Vec<String>;

    fn node_feature_type(&self, feature: &str) -> Option<ValueType>;

    fn node_feature_value(&self, feature: &str, node: Node) -> Option<&FeatureValue>;

    fn edge_feature_names(&self) -> Vec<String>;

    fn edge_feature_info(&self, feature: &str) -> Option<EdgeFeatureInfo>;

    /// Nodes connected to `node` by the edge feature, with edge values.
    fn edge_feature_targets(
        &self,
        feature: &str,
        node: Node,
        direction: EdgeDirection,
    ) -> Vec<(Node, Option<&FeatureValue>)>;
}
