//! Stitching: lazy enumeration of result tuples along the stitch plan

use crate::engine::plan::ends;
use crate::engine::search::Search;
use crate::relations::{CompiledRelation, RelationContext, Shape};
use crate::types::{Node, NodeSet};

/// One plan edge, ready to be evaluated.
struct Step<'s> {
    from: usize,
    to: usize,
    relation: CompiledRelation<'s>,
    /// Binds `to`; otherwise both ends are bound already and it is a check.
    introduces: bool,
}

/// Candidates for one atom and how far they have been tried.
struct Frame {
    atom: usize,
    candidates: Vec<Node>,
    cursor: usize,
    /// First step to evaluate once this frame has bound its atom.
    next_step: usize,
}

/// Iterator over result tuples in template order.
///
/// Depth-first over the plan with an explicit stack; it only does work when
/// the next tuple is requested, so it can be dropped at any point.
pub struct ResultIter<'s> {
    ctx: RelationContext<'s>,
    yarns: &'s [NodeSet],
    steps: Vec<Step<'s>>,
    binding: Vec<Option<Node>>,
    stack: Vec<Frame>,
}

impl<'s> ResultIter<'s> {
    pub(crate) fn new(search: &'s Search<'_>) -> Self {
        let mut iter = ResultIter {
            ctx: search.corpus.context(),
            yarns: &search.yarns,
            steps: Vec::new(),
            binding: vec![None; search.graph.len()],
            stack: Vec::new(),
        };
        if search.check().is_err() || search.yarns.iter().any(NodeSet::is_empty) {
            return iter;
        }
        let Some(plan) = search.plan.as_ref() else {
            return iter;
        };

        let mut placed = vec![false; search.graph.len()];
        placed[plan.seed] = true;
        for &e in &plan.edges {
            let (from, to) = ends(&search.graph, e);
            let edge = &search.graph.edges[e.edge];
            let relation = if e.forward {
                Some(edge.relation)
            } else {
                search.relations.converse(edge.relation)
            };
            let Some(relation) = relation.and_then(|r| search.relations.get(r)) else {
                return iter;
            };
            iter.steps.push(Step {
                from,
                to,
                relation: relation.compile(search.slot_kind(from), search.slot_kind(to)),
                introduces: !placed[to],
            });
            placed[to] = true;
        }

        iter.stack.push(Frame {
            atom: plan.seed,
            candidates: search.yarns[plan.seed].as_slice().to_vec(),
            cursor: 0,
            next_step: 0,
        });
        iter
    }

    /// Nodes of the yarn of `step.to` related to the bound `step.from`.
    fn candidates(&self, step: &Step<'s>) -> Vec<Node> {
        let yarn = &self.yarns[step.to];
        let Some(n) = self.binding[step.from] else {
            return Vec::new();
        };
        match step.relation.shape() {
            Shape::Fanout => {
                let mut out = Vec::new();
                step.relation.fanout(&self.ctx, n, &mut out);
                out.sort_unstable();
                out.dedup();
                out.retain(|&m| yarn.contains(m));
                out
            }
            Shape::Test => yarn.iter().filter(|&m| step.relation.holds(&self.ctx, n, m)).collect(),
        }
    }

    fn check(&self, step: &Step<'s>) -> bool {
        match (self.binding[step.from], self.binding[step.to]) {
            (Some(n), Some(m)) => step.relation.holds(&self.ctx, n, m),
            _ => false,
        }
    }
}

impl<'s> Iterator for ResultIter<'s> {
    type Item = Vec<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        'frames: loop {
            let frame = self.stack.last_mut()?;
            if frame.cursor >= frame.candidates.len() {
                self.binding[frame.atom] = None;
                self.stack.pop();
                continue;
            }
            let node = frame.candidates[frame.cursor];
            frame.cursor += 1;
            self.binding[frame.atom] = Some(node);

            let mut step = frame.next_step;
            while let Some(s) = self.steps.get(step) {
                if s.introduces {
                    let candidates = self.candidates(s);
                    let frame = Frame { atom: s.to, candidates, cursor: 0, next_step: step + 1 };
                    self.stack.push(frame);
                    continue 'frames;
                }
                if !self.check(s) {
                    continue 'frames;
                }
                step += 1;
            }
            return self.binding.iter().copied().collect();
        }
    }
}
