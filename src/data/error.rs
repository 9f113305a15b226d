use thiserror::Error;

use crate::types::{Node, ValueType};

/// Errors raised while assembling a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus has no slots")]
    NoSlots,

    #[error("Node {node} of type '{otype}' has no slots")]
    EmptySlots { node: Node, otype: String },

    #[error("Node {node}: slot {slot} out of range 1..={max_slot}")]
    SlotOutOfRange { node: Node, slot: Node, max_slot: Node },

    #[error("Corpus declares {max_node} nodes but {max_slot} slots")]
    FewerNodesThanSlots { max_node: Node, max_slot: Node },

    #[error("Node {node} out of range 1..={max_node}")]
    NodeOutOfRange { node: Node, max_node: Node },

    #[error("Type '{0}' is the slot type and cannot be used for composite nodes")]
    SlotTypeReused(String),

    #[error("Feature '{feature}' mixes value types: declared {expected}, got {found}")]
    MixedValueTypes { feature: String, expected: ValueType, found: ValueType },

    #[error("Name '{0}' is used for both a node feature and an edge feature")]
    FeatureKindClash(String),
}
