use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FeatureValue, Node, ValueType};

/// Serialized form of a corpus.
///
/// Composite nodes are listed in id order; the first one gets id
/// `max_slot + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub slot_type: String,
    pub max_slot: Node,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub node_features: BTreeMap<String, NodeFeatureEntry>,
    #[serde(default)]
    pub edge_features: BTreeMap<String, EdgeFeatureEntry>,
}

/// A composite node with its type and slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub otype: String,
    pub slots: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFeatureEntry {
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    pub values: BTreeMap<Node, FeatureValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeFeatureEntry {
    /// Whether the edges carry values.
    #[serde(default)]
    pub values: bool,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    pub edges: Vec<EdgeEntry>,
}

/// `[from, to]` or `[from, to, value]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeEntry {
    Valued(Node, Node, FeatureValue),
    Plain(Node, Node),
}

impl EdgeEntry {
    pub fn into_parts(self) -> (Node, Node, Option<FeatureValue>) {
        match self {
            EdgeEntry::Valued(from, to, value) => (from, to, Some(value)),
            EdgeEntry::Plain(from, to) => (from, to, None),
        }
    }
}
