//! Spinning: atom yarns, spread estimates and edge thinning
//!
//! A yarn holds the candidate nodes of one atom. Atom spinning fills the
//! yarns from node types, custom sets and feature conditions. Edge spinning
//! then removes nodes that cannot take part in any result, one relation at
//! a time, until no relation is worth spinning anymore.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::Rng;

use crate::compiler::ANY_TYPE;
use crate::engine::error::Diagnostic;
use crate::engine::search::Search;
use crate::relations::features::feature_value;
use crate::relations::{bulk, Shape, SlotKind, SpreadEstimate};
use crate::types::{Node, NodeSet};

/// Pick at most `limit` distinct nodes from a yarn, with replacement.
/// Small yarns are taken as a whole.
fn sample(rng: &mut StdRng, yarn: &NodeSet, limit: usize) -> Vec<Node> {
    if yarn.len() < limit {
        return yarn.as_slice().to_vec();
    }
    let picked: BTreeSet<Node> = (0..limit)
        .filter_map(|_| yarn.get(rng.gen_range(0..yarn.len())))
        .collect();
    picked.into_iter().collect()
}

impl<'c> Search<'c> {
    /// What kind of nodes the yarn of atom `q` can hold.
    pub(crate) fn slot_kind(&self, q: usize) -> SlotKind {
        let otype = self.graph.atoms[q].otype.as_str();
        let is_set = self.options.sets.as_ref().map_or(false, |sets| sets.contains_key(otype));
        if otype == ANY_TYPE || is_set {
            SlotKind::Mixed
        } else if otype == self.corpus.grid().slot_type() {
            SlotKind::Slots
        } else {
            SlotKind::NonSlots
        }
    }

    /// Nodes of the atom's type that satisfy its feature conditions.
    fn atom_yarn(&self, q: usize) -> NodeSet {
        let corpus = self.corpus;
        let ctx = corpus.context();
        let atom = &self.graph.atoms[q];
        let custom = self.options.sets.as_ref().and_then(|sets| sets.get(&atom.otype));
        let mut yarn = if atom.otype == ANY_TYPE {
            corpus.grid().all_nodes()
        } else if let Some(set) = custom {
            set.clone()
        } else {
            NodeSet::from_unsorted(corpus.grid().nodes_of_type(&atom.otype).to_vec())
        };
        yarn.retain(|n| {
            atom.conditions
                .iter()
                .all(|(feature, condition)| condition.accepts(feature_value(&ctx, feature, n).as_deref()))
        });
        yarn
    }

    /// Compute the yarn of every atom, quantifiers included.
    pub(crate) fn spin_atoms(&mut self) -> Result<(), Vec<Diagnostic>> {
        let mut yarns = Vec::with_capacity(self.graph.len());
        for (q, atom) in self.graph.atoms.iter().enumerate() {
            let mut yarn = self.atom_yarn(q);
            for quantifier in &atom.quantifiers {
                let before = yarn.len();
                yarn = self.apply_quantifier(atom, quantifier, yarn)?;
                log::debug!("Quantifier on atom {}: reduction from {} to {} nodes", q, before, yarn.len());
            }
            log::debug!("Atom {} ({}): {} nodes", q, atom.otype, yarn.len());
            yarns.push(yarn);
        }
        self.yarns = yarns;
        Ok(())
    }

    /// Estimate how many right nodes a left node relates to, for every edge
    /// in both directions.
    pub(crate) fn estimate_spreads(&mut self) {
        let mut spreads = Vec::with_capacity(self.graph.edges.len());
        let mut spreads_converse = Vec::with_capacity(self.graph.edges.len());
        for e in 0..self.graph.edges.len() {
            let edge = self.graph.edges[e];
            let converse = self.relations.converse(edge.relation).unwrap_or(edge.relation);
            spreads.push(self.estimate_spread(edge.from, edge.relation, edge.to));
            spreads_converse.push(self.estimate_spread(edge.to, converse, edge.from));
        }
        self.spreads = spreads;
        self.spreads_converse = spreads_converse;
    }

    fn estimate_spread(&mut self, from: usize, relation: usize, to: usize) -> f64 {
        let (kind_from, kind_to) = (self.slot_kind(from), self.slot_kind(to));
        let corpus = self.corpus;
        let ctx = corpus.context();
        let Some(relation) = self.relations.get(relation) else {
            return 0.0;
        };
        let yarn_to = &self.yarns[to];
        match relation.spread {
            SpreadEstimate::Constant(spread) => return spread,
            SpreadEstimate::Proportional(fraction) => return yarn_to.len() as f64 * fraction,
            SpreadEstimate::Sampled => {}
        }

        let tries = sample(&mut self.rng, &self.yarns[from], self.options.perf.try_limit_from);
        if tries.is_empty() {
            return 0.0;
        }
        let compiled = relation.compile(kind_from, kind_to);
        let mut total = 0.0;
        match compiled.shape() {
            Shape::Fanout => {
                let mut out = Vec::new();
                for &n in &tries {
                    out.clear();
                    compiled.fanout(&ctx, n, &mut out);
                    out.sort_unstable();
                    out.dedup();
                    total += out.iter().filter(|&&m| yarn_to.contains(m)).count() as f64;
                }
            }
            Shape::Test => {
                for &n in &tries {
                    let tries_to = sample(&mut self.rng, yarn_to, self.options.perf.try_limit_to);
                    if tries_to.is_empty() {
                        continue;
                    }
                    let hits = tries_to.iter().filter(|&&m| compiled.holds(&ctx, n, m)).count();
                    total += yarn_to.len() as f64 * hits as f64 / tries_to.len() as f64;
                }
            }
        }
        total / tries.len() as f64
    }

    /// Thin the yarns along the edges until every edge is up to date or a
    /// yarn is empty.
    pub(crate) fn spin_edges(&mut self) {
        self.estimate_spreads();
        let n_edges = self.graph.edges.len();
        let mut fresh = vec![false; n_edges];
        loop {
            if self.yarns.iter().any(NodeSet::is_empty) {
                log::info!("Empty yarn: the search has no results");
                break;
            }
            let Some(e) = self.choose_edge(&fresh) else {
                break;
            };
            fresh[e] = true;
            let (affected_from, affected_to) = self.spin_edge(e);
            if !(affected_from || affected_to) {
                continue;
            }
            self.thinned.insert(e);
            let edge = self.graph.edges[e];
            for (other, o) in self.graph.edges.iter().enumerate() {
                if other == e {
                    continue;
                }
                let touches = |q: usize| o.from == q || o.to == q;
                if (affected_from && touches(edge.from)) || (affected_to && touches(edge.to)) {
                    fresh[other] = false;
                }
            }
        }
    }

    /// The stale edge with the smallest `|F| * |T| * spread`.
    fn choose_edge(&self, fresh: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (e, edge) in self.graph.edges.iter().enumerate() {
            if fresh[e] {
                continue;
            }
            let size = self.yarns[edge.from].len() as f64 * self.yarns[edge.to].len() as f64 * self.spreads[e];
            if best.map_or(true, |(_, b)| size < b) {
                best = Some((e, size));
            }
        }
        best.map(|(e, _)| e)
    }

    /// Spin one edge. Returns whether the left and the right yarn shrank.
    fn spin_edge(&mut self, e: usize) -> (bool, bool) {
        let edge = self.graph.edges[e];
        let spread = self.spreads[e];
        let yarn_ratio = self.options.perf.yarn_ratio;
        let (len_from, len_to) = (self.yarns[edge.from].len() as f64, self.yarns[edge.to].len() as f64);
        let ratio = if len_from > 0.0 && len_to > 0.0 && spread > 0.0 {
            (len_from / len_to).max(len_to / len_from) / spread
        } else {
            -yarn_ratio
        };
        if ratio < yarn_ratio {
            return (false, false);
        }

        let (kind_from, kind_to) = (self.slot_kind(edge.from), self.slot_kind(edge.to));
        let corpus = self.corpus;
        let ctx = corpus.context();
        let Some(relation) = self.relations.get(edge.relation) else {
            return (false, false);
        };
        if let SpreadEstimate::Proportional(_) = relation.spread {
            return (false, false);
        }
        let yarn_from = &self.yarns[edge.from];
        let yarn_to = &self.yarns[edge.to];

        let bulk = if len_from * spread <= self.options.perf.spin_limit as f64 {
            bulk::apply(&ctx, &relation.kind, yarn_from, yarn_to)
        } else {
            None
        };
        let (new_from, new_to) = match bulk {
            Some(reduced) => reduced,
            None => {
                let compiled = relation.compile(kind_from, kind_to);
                let mut new_from = Vec::new();
                let mut new_to = Vec::new();
                let mut out = Vec::new();
                for n in yarn_from.iter() {
                    let before = new_to.len();
                    match compiled.shape() {
                        Shape::Fanout => {
                            out.clear();
                            compiled.fanout(&ctx, n, &mut out);
                            new_to.extend(out.iter().copied().filter(|&m| yarn_to.contains(m)));
                        }
                        Shape::Test => {
                            new_to.extend(yarn_to.iter().filter(|&m| compiled.holds(&ctx, n, m)));
                        }
                    }
                    if new_to.len() > before {
                        new_from.push(n);
                    }
                }
                (NodeSet::from_unsorted(new_from), NodeSet::from_unsorted(new_to))
            }
        };

        let affected_from = new_from.len() != yarn_from.len();
        let affected_to = new_to.len() != yarn_to.len();
        log::debug!(
            "Spun edge {} ({}): {} -> {} and {} -> {} nodes",
            e,
            relation.acro,
            yarn_from.len(),
            new_from.len(),
            yarn_to.len(),
            new_to.len()
        );
        self.yarns[edge.from] = new_from;
        self.yarns[edge.to] = new_to;
        (affected_from, affected_to)
    }
}
