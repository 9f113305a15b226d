//! Quantifiers: yarn reductions computed by nested searches

use std::collections::BTreeSet;

use crate::compiler::syntax::parent_line;
use crate::compiler::{QueryAtom, Quantifier, QuantifierKind};
use crate::engine::error::Diagnostic;
use crate::engine::search::{Search, SearchOptions};
use crate::types::{Node, NodeSet};

fn line_count(template: &str) -> usize {
    template.split('\n').count()
}

fn first_members(tuples: impl IntoIterator<Item = Vec<Node>>) -> NodeSet {
    tuples.into_iter().filter_map(|t| t.first().copied()).collect()
}

impl<'c> Search<'c> {
    /// A search on the same corpus with the same sets and parameters.
    fn nested(&self, template: &str, offset: usize) -> Result<Search<'c>, Vec<Diagnostic>> {
        let options = SearchOptions {
            sets: self.options.sets.clone(),
            offset,
            perf: self.options.perf.clone(),
            strategy: self.strategy,
        };
        let mut search = Search::with_options(self.corpus, options);
        let problems = search.study(template, None);
        if problems.is_empty() {
            Ok(search)
        } else {
            Err(problems)
        }
    }

    /// Reduce the yarn of `atom` by one of its quantifiers.
    pub(crate) fn apply_quantifier(
        &self,
        atom: &QueryAtom,
        quantifier: &Quantifier,
        yarn: NodeSet,
    ) -> Result<NodeSet, Vec<Diagnostic>> {
        let head = parent_line(&atom.source, &quantifier.parent);
        let offset = self.options.offset + quantifier.line;
        let with_head = |block: &str| format!("{}\n{}", head, block);

        match quantifier.kind {
            QuantifierKind::Without => {
                let Some(block) = quantifier.templates.first() else {
                    return Ok(yarn);
                };
                let excluded = first_members(self.nested(&with_head(block), offset)?.shallow(1));
                log::debug!("/without/: {} nodes to exclude", excluded.len());
                Ok(yarn.difference(&excluded))
            }
            QuantifierKind::Where => {
                let [antecedent, consequent] = quantifier.templates.as_slice() else {
                    return Err(vec![Diagnostic::syntax(offset, "Quantifier: /where/ needs exactly one /have/")]);
                };
                let a_results = self.nested(&with_head(antecedent), offset)?.fetch(None);
                let Some(size_a) = a_results.first().map(Vec::len) else {
                    return Ok(yarn);
                };
                let ah_template = format!("{}\n{}\n{}", head, antecedent, consequent);
                let ah_offset = offset + line_count(antecedent) + 1;
                let ah_results: BTreeSet<Vec<Node>> = self.nested(&ah_template, ah_offset)?.shallow(size_a);
                let failing = first_members(a_results.into_iter().filter(|t| !ah_results.contains(t)));
                log::debug!("/where/: {} nodes match the antecedent but not the consequent", failing.len());
                Ok(yarn.difference(&failing))
            }
            QuantifierKind::With => {
                let mut result = NodeSet::new();
                let mut offset = offset;
                for alternative in &quantifier.templates {
                    let found = first_members(self.nested(&with_head(alternative), offset)?.shallow(1));
                    result = result.union(&found.intersection(&yarn));
                    offset += line_count(alternative) + 1;
                }
                log::debug!("/with/: {} nodes satisfy an alternative", result.len());
                Ok(result)
            }
        }
    }
}
