//! Human readable rendering of a stitch plan

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::engine::plan::{ends, PlanEdge};
use crate::engine::search::Search;

impl<'c> Search<'c> {
    fn node_info(&self, q: usize, right: bool) -> String {
        let otype = &self.graph.atoms[q].otype;
        let choices = self.yarns.get(q).map_or(0, |y| y.len());
        let space = " ".repeat(19);
        if right {
            format!("node {} {:>2}-{:<13} ({:>6}   choices)", space, q, otype, choices)
        } else {
            format!("node {:>2}-{:<13} {} ({:>6}   choices)", q, otype, space, choices)
        }
    }

    fn edge_info(&self, e: PlanEdge) -> String {
        let (from, to) = ends(&self.graph, e);
        let edge = &self.graph.edges[e.edge];
        let relation = if e.forward { Some(edge.relation) } else { self.relations.converse(edge.relation) };
        let acro = relation
            .and_then(|r| self.relations.get(r))
            .map_or("?", |r| r.acro.as_str());
        let spreads = if e.forward { &self.spreads } else { &self.spreads_converse };
        let spread = spreads.get(e.edge).copied().unwrap_or(-1.0);
        format!(
            "edge {:>2}-{:<13} {:^2} {:>2}-{:<13} ({:8.1} choices{})",
            from,
            self.graph.atoms[from].otype,
            acro,
            to,
            self.graph.atoms[to].otype,
            spread,
            if self.thinned.contains(&e.edge) { " (thinned)" } else { "" }
        )
    }

    /// Describe how the results relate to the template. With `details`,
    /// also list the yarn sizes, the performance parameters and the order in
    /// which the relations are used.
    pub fn show_plan(&self, details: bool) -> String {
        let Some(plan) = self.plan.as_ref() else {
            return String::new();
        };
        let mut out = String::new();
        if details {
            let _ = writeln!(out, "Search with {} objects and {} relations", plan.atoms.len(), plan.edges.len());
            let _ = writeln!(out, "Results are instantiations of the following objects:");
            for q in 0..self.graph.len() {
                let _ = writeln!(out, "{}", self.node_info(q, false));
            }
            if let Some(&first) = plan.edges.first() {
                let perf = &self.options.perf;
                let _ = writeln!(out, "Performance parameters:");
                let _ = writeln!(out, "\t{:<20} = {:>7}", "yarn_ratio", perf.yarn_ratio);
                let _ = writeln!(out, "\t{:<20} = {:>7}", "try_limit_from", perf.try_limit_from);
                let _ = writeln!(out, "\t{:<20} = {:>7}", "try_limit_to", perf.try_limit_to);
                let _ = writeln!(out, "\t{:<20} = {:>7}", "spin_limit", perf.spin_limit);
                let _ = writeln!(out, "Instantiations are computed along the following relations:");
                let _ = writeln!(out, "{}", self.node_info(ends(&self.graph, first).0, true));
                for &e in &plan.edges {
                    let _ = writeln!(out, "{}", self.edge_info(e));
                }
            }
        }

        let _ = writeln!(out, "The results are connected to the original search template as follows:");
        let by_line: BTreeMap<usize, usize> = self
            .graph
            .atoms
            .iter()
            .enumerate()
            .map(|(q, atom)| (atom.line, q))
            .collect();
        for (i, line) in self.template.split('\n').enumerate() {
            let (prefix, result) = match by_line.get(&i) {
                Some(q) => ("R", q.to_string()),
                None => ("", String::new()),
            };
            let _ = writeln!(out, "{:>2} {:<1}{:<2} {}", i + self.options.offset, prefix, result, line);
        }
        out
    }
}
