//! Search template compilation.
//!
//! This module is organized into the following submodules:
//! - `ast`: tokens, wired templates and the validated query graph
//! - `pest_parser`: the pest line grammar (`template.pest`)
//! - `syntax`: escapes, line classification and quantifier blocks
//! - `semantics`: wiring by indentation and validation against the corpus

pub mod ast;
pub mod pest_parser;
pub mod semantics;
pub mod syntax;

#[cfg(test)]
mod tests;

pub use ast::{QueryAtom, QueryEdge, QueryGraph, Quantifier, QuantifierKind, RawCondition};
pub use semantics::{SemanticEnv, ANY_TYPE};

use crate::engine::error::Diagnostic;
use crate::relations::RelationTable;

/// Compile a template into a query graph. Diagnostic lines are shifted by
/// `offset`. Relations the template needs are added to `table`.
pub fn compile(
    template: &str,
    offset: usize,
    env: &SemanticEnv<'_>,
    table: &mut RelationTable,
) -> Result<QueryGraph, Vec<Diagnostic>> {
    let (tokens, problems) = syntax::tokenize(template, offset);
    if !problems.is_empty() {
        return Err(problems);
    }
    let wired = semantics::wire(tokens, offset, &|name| env.is_type(name))?;
    semantics::validate(wired, env, table, offset)
}
