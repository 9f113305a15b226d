pub mod compiler;
pub mod data;
pub mod engine;
pub mod grid;
pub mod relations;
pub mod results;
pub mod types;

pub use compiler::{compile, QueryGraph};
pub use data::{CorpusBuilder, CorpusError, CorpusParser, FeatureProvider, MemoryCorpus};
pub use engine::{Corpus, Diagnostic, DiagnosticKind, Search, SearchConfig, SearchError, SearchOptions, Strategy};
pub use grid::Grid;
pub use results::{glean, SearchResults};
pub use types::{FeatureValue, Node, NodeSet};
