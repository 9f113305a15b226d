//! Search engine over a corpus grid
//!
//! This module is organized into the following submodules:
//! - `constants`: default parameters
//! - `config`: search configuration types (SearchConfig, PerfParams, Strategy)
//! - `error`: diagnostics and search errors
//! - `core`: the Corpus struct and its constructors
//! - `search`: the Search struct and its study/fetch entry points
//! - `spin`: atom yarns, spread estimates and edge thinning
//! - `quantifier`: yarn reductions by nested searches
//! - `plan`: connectivity and stitch planning strategies
//! - `stitch`: lazy result enumeration
//! - `display`: stitch plan rendering

pub mod config;
pub mod constants;
pub mod core;
pub mod display;
pub mod error;
pub mod plan;
pub mod quantifier;
pub mod search;
pub mod spin;
pub mod stitch;


// Re-export main types for convenience
pub use config::{PerfParams, SearchConfig, Strategy};
pub use constants::*;
pub use self::core::Corpus;
pub use error::{Diagnostic, DiagnosticKind, SearchError};
pub use plan::{PlanEdge, StitchPlan};
pub use search::{Search, SearchOptions};
pub use stitch::ResultIter;
