//! Connectivity checks and stitch planning strategies

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::compiler::QueryGraph;
use crate::engine::config::Strategy;
use crate::engine::error::{Diagnostic, DiagnosticKind};
use crate::types::NodeSet;

/// An edge of the template as the stitcher walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanEdge {
    pub edge: usize,
    /// `false` when the edge is walked through its converse relation.
    pub forward: bool,
}

/// Order in which atoms are bound and edges are used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StitchPlan {
    /// The atom whose yarn is iterated first.
    pub seed: usize,
    /// Atoms in the order they get bound.
    pub atoms: Vec<usize>,
    pub edges: Vec<PlanEdge>,
}

/// Ends of an edge in walking direction.
pub fn ends(graph: &QueryGraph, e: PlanEdge) -> (usize, usize) {
    let edge = &graph.edges[e.edge];
    if e.forward {
        (edge.from, edge.to)
    } else {
        (edge.to, edge.from)
    }
}

fn find(parent: &mut [usize], q: usize) -> usize {
    let mut root = q;
    while parent[root] != root {
        root = parent[root];
    }
    let mut q = q;
    while parent[q] != root {
        let next = parent[q];
        parent[q] = root;
        q = next;
    }
    root
}

/// A template must consist of exactly one connected component.
pub fn connectivity(graph: &QueryGraph, offset: usize) -> Vec<Diagnostic> {
    if graph.is_empty() {
        return vec![Diagnostic::new(
            DiagnosticKind::Connectivity,
            None,
            "Search without instructions. Tell me what to look for.",
        )];
    }
    let mut parent: Vec<usize> = (0..graph.len()).collect();
    for edge in &graph.edges {
        let (a, b) = (find(&mut parent, edge.from), find(&mut parent, edge.to));
        if a != b {
            parent[a.max(b)] = a.min(b);
        }
    }
    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for q in 0..graph.len() {
        let root = find(&mut parent, q);
        components.entry(root).or_default().push(q);
    }
    if components.len() == 1 {
        return Vec::new();
    }

    let mut problems = vec![Diagnostic::new(
        DiagnosticKind::Connectivity,
        None,
        format!("More than one connected component ({}):", components.len()),
    )];
    for atoms in components.values() {
        let lines: Vec<String> = atoms
            .iter()
            .map(|&q| (graph.atoms[q].line + offset + 1).to_string())
            .collect();
        problems.push(Diagnostic::new(
            DiagnosticKind::Connectivity,
            None,
            format!("    objects on line(s) {}", lines.join(", ")),
        ));
    }
    problems.push(Diagnostic::new(
        DiagnosticKind::Connectivity,
        None,
        "Either run the subqueries one by one, or connect the components by a relation",
    ));
    problems
}

/// Build the stitch plan of a connected template.
pub fn stitch_plan(
    strategy: Strategy,
    graph: &QueryGraph,
    yarns: &[NodeSet],
    spreads: &[f64],
    spreads_converse: &[f64],
) -> StitchPlan {
    let spread = |e: PlanEdge| {
        let s = if e.forward { spreads.get(e.edge) } else { spreads_converse.get(e.edge) };
        s.copied().unwrap_or(0.0)
    };
    let oriented: Vec<PlanEdge> = (0..graph.edges.len())
        .flat_map(|edge| [PlanEdge { edge, forward: true }, PlanEdge { edge, forward: false }])
        .collect();
    let by_spread = |descending: bool| {
        let mut ordered = oriented.clone();
        ordered.sort_by(|a, b| {
            let (sa, sb) = (spread(*a), spread(*b));
            let by_size = if descending { sb.partial_cmp(&sa) } else { sa.partial_cmp(&sb) };
            by_size
                .unwrap_or(Ordering::Equal)
                .then(a.edge.cmp(&b.edge))
                .then(b.forward.cmp(&a.forward))
        });
        ordered
    };

    let yarn_len = |q: usize| yarns.get(q).map_or(0, NodeSet::len);
    let mut plan = match strategy {
        Strategy::SmallChoiceFirst => {
            let seed = (0..graph.len()).min_by_key(|&q| yarn_len(q)).unwrap_or(0);
            let mut plan = StitchPlan { seed, atoms: vec![seed], edges: Vec::new() };
            extend(graph, &by_spread(false), &mut plan);
            plan
        }
        Strategy::BigChoiceFirst => {
            let seed = (0..graph.len()).min_by_key(|&q| Reverse(yarn_len(q))).unwrap_or(0);
            let mut plan = StitchPlan { seed, atoms: vec![seed], edges: Vec::new() };
            extend(graph, &by_spread(true), &mut plan);
            plan
        }
        Strategy::Spread1First => {
            let s1: Vec<PlanEdge> = oriented.iter().copied().filter(|&e| spread(e) <= 1.0).collect();
            let mut plan = (0..graph.len())
                .map(|q| spread_1_graph(graph, &s1, q))
                .max_by_key(|p| p.atoms.len() + p.edges.len())
                .unwrap_or(StitchPlan { seed: 0, atoms: vec![0], edges: Vec::new() });
            extend(graph, &by_spread(false), &mut plan);
            plan
        }
    };

    // an edge may have been taken in both directions; the second one adds nothing
    let mut seen = BTreeSet::new();
    plan.edges.retain(|e| seen.insert(e.edge));
    log::debug!("Stitch plan ({}): {:?}", strategy, plan);
    plan
}

/// Everything reachable from `start` over edges of spread at most 1.
fn spread_1_graph(graph: &QueryGraph, s1: &[PlanEdge], start: usize) -> StitchPlan {
    let mut plan = StitchPlan { seed: start, atoms: vec![start], edges: Vec::new() };
    loop {
        let mut added = false;
        for &e in s1 {
            let (f, t) = ends(graph, e);
            if !plan.atoms.contains(&f) {
                continue;
            }
            if !plan.atoms.contains(&t) {
                plan.atoms.push(t);
                added = true;
            }
            if !plan.edges.contains(&e) {
                plan.edges.push(e);
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    plan
}

/// Repeatedly add every edge between placed atoms, then the first edge in
/// `ordered` that leaves the placed atoms.
fn extend(graph: &QueryGraph, ordered: &[PlanEdge], plan: &mut StitchPlan) {
    let mut done: BTreeSet<usize> = plan.edges.iter().map(|e| e.edge).collect();
    loop {
        let mut added = false;
        for &e in ordered {
            if done.contains(&e.edge) {
                continue;
            }
            let (f, t) = ends(graph, e);
            if plan.atoms.contains(&f) && plan.atoms.contains(&t) {
                plan.edges.push(e);
                done.insert(e.edge);
                added = true;
            }
        }
        for &e in ordered {
            if done.contains(&e.edge) {
                continue;
            }
            let (f, t) = ends(graph, e);
            if plan.atoms.contains(&f) {
                if !plan.atoms.contains(&t) {
                    plan.atoms.push(t);
                }
                plan.edges.push(e);
                done.insert(e.edge);
                added = true;
                break;
            }
        }
        if !added {
            break;
        }
    }
}

/// The plan must bind every atom and use every edge.
pub fn consistency(plan: &StitchPlan, graph: &QueryGraph) -> Vec<Diagnostic> {
    let mut problems = Vec::new();
    let template_atoms: Vec<usize> = (0..graph.len()).collect();
    let mut plan_atoms = plan.atoms.clone();
    plan_atoms.sort_unstable();
    if plan_atoms != template_atoms {
        problems.push(Diagnostic::new(
            DiagnosticKind::PlanConsistency,
            None,
            format!("Object mismatch in plan:\nIn template: {:?}\nIn plan    : {:?}", template_atoms, plan_atoms),
        ));
    }
    let template_edges: Vec<usize> = (0..graph.edges.len()).collect();
    let mut plan_edges: Vec<usize> = plan.edges.iter().map(|e| e.edge).collect();
    plan_edges.sort_unstable();
    if plan_edges != template_edges {
        problems.push(Diagnostic::new(
            DiagnosticKind::PlanConsistency,
            None,
            format!("Relation mismatch in plan:\nIn template: {:?}\nIn plan    : {:?}", template_edges, plan_edges),
        ));
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{QueryAtom, QueryEdge};

    /// A chain of `word` atoms joined by the given (from, to) edges.
    fn graph(n_atoms: usize, edges: &[(usize, usize)]) -> QueryGraph {
        let atoms = (0..n_atoms)
            .map(|line| QueryAtom {
                otype: "word".to_string(),
                conditions: Vec::new(),
                source: "word".to_string(),
                quantifiers: Vec::new(),
                line,
            })
            .collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(line, &(from, to))| QueryEdge { from, relation: 0, to, line })
            .collect();
        QueryGraph { atoms, edges, names: BTreeMap::new() }
    }

    fn yarns(sizes: &[u32]) -> Vec<NodeSet> {
        sizes.iter().map(|&n| NodeSet::range(1, n)).collect()
    }

    fn fwd(edge: usize) -> PlanEdge {
        PlanEdge { edge, forward: true }
    }

    fn bwd(edge: usize) -> PlanEdge {
        PlanEdge { edge, forward: false }
    }

    // edge 0: 0 -> 1, spreads 3.0 / 0.5; edge 1: 1 -> 2, spreads 1.0 / 4.0
    const SPREADS: [f64; 2] = [3.0, 1.0];
    const SPREADS_CONVERSE: [f64; 2] = [0.5, 4.0];

    #[test]
    fn test_small_choice_first() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let plan = stitch_plan(Strategy::SmallChoiceFirst, &g, &yarns(&[5, 2, 9]), &SPREADS, &SPREADS_CONVERSE);
        assert_eq!(plan.seed, 1);
        assert_eq!(plan.atoms, vec![1, 0, 2]);
        assert_eq!(plan.edges, vec![bwd(0), fwd(1)]);
        assert!(consistency(&plan, &g).is_empty());
    }

    #[test]
    fn test_big_choice_first() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let plan = stitch_plan(Strategy::BigChoiceFirst, &g, &yarns(&[5, 2, 9]), &SPREADS, &SPREADS_CONVERSE);
        assert_eq!(plan.seed, 2);
        assert_eq!(plan.atoms, vec![2, 1, 0]);
        assert_eq!(plan.edges, vec![bwd(1), bwd(0)]);
        assert!(consistency(&plan, &g).is_empty());
    }

    #[test]
    fn test_spread_1_first_grows_the_cheap_subgraph() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let sizes = yarns(&[1, 50, 9]);

        let small = stitch_plan(Strategy::SmallChoiceFirst, &g, &sizes, &SPREADS, &SPREADS_CONVERSE);
        assert_eq!(small.seed, 0);
        assert_eq!(small.edges, vec![fwd(0), fwd(1)]);

        // only 1 -> 0 and 1 -> 2 have spread at most 1, both start at atom 1
        let plan = stitch_plan(Strategy::Spread1First, &g, &sizes, &SPREADS, &SPREADS_CONVERSE);
        assert_eq!(plan.seed, 1);
        assert_eq!(plan.atoms, vec![1, 0, 2]);
        assert_eq!(plan.edges, vec![bwd(0), fwd(1)]);
        assert!(consistency(&plan, &g).is_empty());
    }

    #[test]
    fn test_cycles_use_every_edge_once() {
        let g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
        for strategy in Strategy::ALL {
            let plan = stitch_plan(strategy, &g, &yarns(&[4, 4, 4]), &[1.0; 3], &[1.0; 3]);
            assert!(consistency(&plan, &g).is_empty(), "{}: {:?}", strategy, plan);
        }
    }

    #[test]
    fn test_consistency_detects_truncated_plans() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let truncated = StitchPlan { seed: 0, atoms: vec![0, 1], edges: vec![fwd(0)] };
        let problems = consistency(&truncated, &g);
        assert_eq!(problems.len(), 2);
        assert!(problems.iter().all(|p| p.kind == DiagnosticKind::PlanConsistency));
        assert!(problems[0].message.starts_with("Object mismatch in plan:"));
        assert!(problems[1].message.starts_with("Relation mismatch in plan:"));

        let duplicated = StitchPlan { seed: 0, atoms: vec![0, 1, 1, 2], edges: vec![fwd(0), fwd(1), bwd(1)] };
        assert_eq!(consistency(&duplicated, &g).len(), 2);
    }

    #[test]
    fn test_connectivity_reports_components() {
        let g = graph(4, &[(0, 1), (2, 3)]);
        let problems = connectivity(&g, 10);
        assert_eq!(problems[0].message, "More than one connected component (2):");
        assert_eq!(problems[1].message, "    objects on line(s) 11, 12");
        assert_eq!(problems[2].message, "    objects on line(s) 13, 14");
        assert!(connectivity(&graph(2, &[(1, 0)]), 0).is_empty());
    }
}
