pub mod search_results;

pub use search_results::{glean, SearchResults, TEXT_FEATURE};
