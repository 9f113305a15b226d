pub mod condition;
pub mod node;
pub mod value;

pub use condition::ValueCondition;
pub use node::{is_sorted_subset, sorted_overlap, Node, NodeSet};
pub use value::{FeatureValue, ValueType};
