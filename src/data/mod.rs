pub mod document;
pub mod error;
pub mod memory;
pub mod parser;
pub mod provider;

pub use document::{CorpusDocument, EdgeEntry, EdgeFeatureEntry, NodeEntry, NodeFeatureEntry};
pub use error::CorpusError;
pub use memory::{CorpusBuilder, MemoryCorpus};
pub use parser::CorpusParser;
pub use provider::{EdgeDirection, EdgeFeatureInfo, FeatureProvider};

#[cfg(test)]
pub(crate) mod fixtures;
