//! The relation table.
//!
//! A corpus owns a base table with the fixed relations and one pair per edge
//! feature. A search clones it and adds parameterized instances (`=3:`,
//! `.lex=gloss.`, `-mother=1>`) as its template mentions them, so the
//! corpus table is never touched.

use std::collections::HashMap;
use std::fmt::Write;

use regex::Regex;

use crate::data::{EdgeDirection, FeatureProvider};
use crate::relations::{FeatureComparison, NearFamily, Relation, RelationKind, SpreadEstimate};
use crate::types::ValueCondition;

/// Families that only exist once instantiated, listed in the legend.
const FAMILY_LEGEND: &[(&str, &str)] = &[
    ("=k:", "left and right start at k-nearly the same slot"),
    (":k=", "left and right end at k-nearly the same slot"),
    (":k:", "left and right start and end at k-near slots"),
    ("<k:", "left k-nearly before right"),
    (":k>", "left k-nearly after right"),
    (".f.", "left.f = right.f"),
    (".f=g.", "left.f = right.g"),
    (".f~r~g.", "left.f matches right.g after deleting matches of r"),
    (".f#g.", "left.f # right.g"),
    (".f>g.", "left.f > right.g"),
    (".f<g.", "left.f < right.g"),
];

/// One side of a relation pair before it gets its index.
struct Entry {
    acro: String,
    kind: RelationKind,
    spread: SpreadEstimate,
    description: String,
}

fn entry(acro: &str, kind: RelationKind, spread: SpreadEstimate, description: &str) -> Entry {
    Entry {
        acro: acro.to_string(),
        kind,
        spread,
        description: description.to_string(),
    }
}

/// Table of relations addressable by acronym.
#[derive(Debug, Clone, Default)]
pub struct RelationTable {
    relations: Vec<Relation>,
    by_acro: HashMap<String, usize>,
    edge_features: Vec<(String, bool)>,
}

impl RelationTable {
    /// Fixed relations plus the relations of every edge feature.
    pub fn base(provider: &dyn FeatureProvider) -> Self {
        use RelationKind::*;
        use SpreadEstimate::*;

        let mut table = RelationTable::default();
        table.add_symmetric(entry("=", Equal, Constant(1.0), "left equal to right (as node)"));
        table.add_symmetric(entry("#", Unequal, Proportional(0.999), "left unequal to right (as node)"));
        table.add_pair(
            entry("<", CanonicalBefore, Proportional(0.5), "left before right (in canonical node ordering)"),
            entry(">", CanonicalAfter, Proportional(0.5), "left after right (in canonical node ordering)"),
        );
        table.add_symmetric(entry("==", SameSlots, Sampled, "left occupies same slots as right"));
        table.add_symmetric(entry("&&", Overlap, Sampled, "left has overlapping slots with right"));
        table.add_symmetric(entry("##", DifferentSlots, Proportional(0.99), "left and right do not have the same slot set"));
        table.add_symmetric(entry("||", Disjoint, Proportional(0.9), "left and right do not have common slots"));
        table.add_pair(
            entry("[[", Embeds, Sampled, "left embeds right"),
            entry("]]", EmbeddedIn, Sampled, "left embedded in right"),
        );
        table.add_pair(
            entry("<<", SlotBefore, Proportional(0.49), "left completely before right"),
            entry(">>", SlotAfter, Proportional(0.49), "left completely after right"),
        );
        table.add_symmetric(entry("=:", SameFirst, Sampled, "left and right start at the same slot"));
        table.add_symmetric(entry(":=", SameLast, Sampled, "left and right end at the same slot"));
        table.add_symmetric(entry("::", SameBoundary, Sampled, "left and right start and end at the same slot"));
        table.add_pair(
            entry("<:", AdjacentBefore, Sampled, "left immediately before right"),
            entry(":>", AdjacentAfter, Sampled, "left immediately after right"),
        );

        for name in provider.edge_feature_names() {
            let has_values = provider
                .edge_feature_info(&name)
                .map_or(false, |info| info.has_values);
            table.add_edge_relations(&name, has_values);
        }
        log::debug!("Relation table: {} base relations", table.len());
        table
    }

    fn add_edge_relations(&mut self, name: &str, has_values: bool) {
        let extra = if has_values { " with value specification allowed" } else { "" };
        let edge = |direction| RelationKind::Edge {
            feature: name.to_string(),
            direction,
            condition: None,
        };
        self.add_pair(
            entry(
                &format!("-{}>", name),
                edge(EdgeDirection::Forward),
                SpreadEstimate::Sampled,
                &format!("edge feature \"{}\"{}", name, extra),
            ),
            entry(
                &format!("<{}-", name),
                edge(EdgeDirection::Backward),
                SpreadEstimate::Sampled,
                &format!("edge feature \"{}\"{} (opposite direction)", name, extra),
            ),
        );
        self.add_symmetric(entry(
            &format!("<{}>", name),
            edge(EdgeDirection::Both),
            SpreadEstimate::Sampled,
            &format!("edge feature \"{}\"{} (either direction)", name, extra),
        ));
        self.edge_features.push((name.to_string(), has_values));
    }

    fn push(&mut self, e: Entry, converse: usize) -> usize {
        let idx = self.relations.len();
        self.by_acro.insert(e.acro.clone(), idx);
        self.relations.push(Relation {
            acro: e.acro,
            kind: e.kind,
            spread: e.spread,
            description: e.description,
            converse,
        });
        idx
    }

    /// Add a relation that is its own converse.
    fn add_symmetric(&mut self, e: Entry) -> usize {
        if let Some(&idx) = self.by_acro.get(&e.acro) {
            return idx;
        }
        let idx = self.relations.len();
        self.push(e, idx)
    }

    /// Add a relation and its converse; returns the index of `forward`.
    fn add_pair(&mut self, forward: Entry, converse: Entry) -> usize {
        if let Some(&idx) = self.by_acro.get(&forward.acro) {
            return idx;
        }
        let idx = self.relations.len();
        self.push(forward, idx + 1);
        self.push(converse, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Relation> {
        self.relations.get(idx)
    }

    pub fn lookup(&self, acro: &str) -> Option<usize> {
        self.by_acro.get(acro).copied()
    }

    pub fn converse(&self, idx: usize) -> Option<usize> {
        self.relations.get(idx).map(|r| r.converse)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    /// Instantiate a k-parameterized relation and return its index.
    pub fn instantiate_near(&mut self, family: NearFamily, k: u32) -> usize {
        let kind = |f| RelationKind::Near(f, k);
        let sampled = SpreadEstimate::Sampled;
        match family {
            NearFamily::First => self.add_symmetric(entry(
                &format!("={}:", k),
                kind(NearFamily::First),
                sampled,
                "left and right start at k-nearly the same slot",
            )),
            NearFamily::Last => self.add_symmetric(entry(
                &format!(":{}=", k),
                kind(NearFamily::Last),
                sampled,
                "left and right end at k-nearly the same slot",
            )),
            NearFamily::Boundary => self.add_symmetric(entry(
                &format!(":{}:", k),
                kind(NearFamily::Boundary),
                sampled,
                "left and right start and end at k-near slots",
            )),
            NearFamily::Before | NearFamily::After => {
                let before = self.add_pair(
                    entry(&format!("<{}:", k), kind(NearFamily::Before), sampled, "left k-nearly before right"),
                    entry(&format!(":{}>", k), kind(NearFamily::After), sampled, "left k-nearly after right"),
                );
                if family == NearFamily::Before {
                    before
                } else {
                    self.relations[before].converse
                }
            }
        }
    }

    /// Instantiate a feature comparison relation and return its index.
    pub fn instantiate_feature(&mut self, op: &FeatureOp) -> Result<usize, String> {
        if let Some(idx) = self.lookup(&op.acro()) {
            return Ok(idx);
        }
        let (f, g) = (op.left.as_str(), op.right.as_str());
        let feature = |left: &str, right: &str, comparison| RelationKind::Feature {
            left: left.to_string(),
            right: right.to_string(),
            comparison,
        };
        let idx = match &op.comparison {
            FeatureOpKind::Equal => {
                let fwd = entry(&op.acro(), feature(f, g, FeatureComparison::Equal), SpreadEstimate::Sampled, "left.f = right.g");
                if f == g {
                    self.add_symmetric(fwd)
                } else {
                    let back = entry(&format!(".{}={}.", g, f), feature(g, f, FeatureComparison::Equal), SpreadEstimate::Sampled, "left.f = right.g");
                    self.add_pair(fwd, back)
                }
            }
            FeatureOpKind::Unequal => {
                let spread = SpreadEstimate::Proportional(0.8);
                let fwd = entry(&op.acro(), feature(f, g, FeatureComparison::Unequal), spread, "left.f # right.g");
                if f == g {
                    self.add_symmetric(fwd)
                } else {
                    let back = entry(&format!(".{}#{}.", g, f), feature(g, f, FeatureComparison::Unequal), spread, "left.f # right.g");
                    self.add_pair(fwd, back)
                }
            }
            FeatureOpKind::Less | FeatureOpKind::Greater => {
                let spread = SpreadEstimate::Proportional(0.4);
                let less = op.comparison == FeatureOpKind::Less;
                let (cmp, back_cmp, back_sym) = if less {
                    (FeatureComparison::Less, FeatureComparison::Greater, '>')
                } else {
                    (FeatureComparison::Greater, FeatureComparison::Less, '<')
                };
                let fwd = entry(&op.acro(), feature(f, g, cmp), spread, if less { "left.f < right.g" } else { "left.f > right.g" });
                let back = entry(
                    &format!(".{}{}{}.", g, back_sym, f),
                    feature(g, f, back_cmp),
                    spread,
                    if less { "left.f > right.g" } else { "left.f < right.g" },
                );
                self.add_pair(fwd, back)
            }
            FeatureOpKind::Match(pattern) => {
                let re = Regex::new(pattern).map_err(|e| format!("Wrong regular expression \"{}\" in relation: {}", pattern, e))?;
                let desc = "left.f matches right.g after deleting matches of r";
                let fwd = entry(&op.acro(), feature(f, g, FeatureComparison::MatchAfterStrip(re.clone())), SpreadEstimate::Sampled, desc);
                if f == g {
                    self.add_symmetric(fwd)
                } else {
                    let back = entry(
                        &format!(".{}~{}~{}.", g, pattern, f),
                        feature(g, f, FeatureComparison::MatchAfterStrip(re)),
                        SpreadEstimate::Sampled,
                        desc,
                    );
                    self.add_pair(fwd, back)
                }
            }
        };
        Ok(idx)
    }

    /// Instantiate an edge relation with a value condition under `acro`.
    pub fn instantiate_edge(
        &mut self,
        acro: &str,
        feature: &str,
        direction: EdgeDirection,
        condition: ValueCondition,
        condition_text: &str,
    ) -> usize {
        if let Some(idx) = self.lookup(acro) {
            return idx;
        }
        let kind = |direction| RelationKind::Edge {
            feature: feature.to_string(),
            direction,
            condition: Some(condition.clone()),
        };
        let desc = format!("edge feature \"{}\" with values {}", feature, condition_text);
        let forward = format!("-{}{}>", feature, condition_text);
        let backward = format!("<{}{}-", feature, condition_text);
        match direction {
            EdgeDirection::Both => self.add_symmetric(entry(acro, kind(EdgeDirection::Both), SpreadEstimate::Sampled, &desc)),
            EdgeDirection::Forward | EdgeDirection::Backward => {
                let fwd = self.add_pair(
                    entry(&forward, kind(EdgeDirection::Forward), SpreadEstimate::Sampled, &desc),
                    entry(&backward, kind(EdgeDirection::Backward), SpreadEstimate::Sampled, &desc),
                );
                // the literal spelling may differ from the canonical one
                let idx = if direction == EdgeDirection::Forward { fwd } else { self.relations[fwd].converse };
                self.by_acro.insert(acro.to_string(), idx);
                idx
            }
        }
    }

    /// Whether an edge feature exists and whether it has values.
    pub fn edge_feature(&self, name: &str) -> Option<bool> {
        self.edge_features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Human readable list of all relations.
    pub fn legend(&self) -> String {
        let mut out = String::new();
        let mut seen = std::collections::HashSet::new();
        for relation in &self.relations {
            if !seen.insert(relation.acro.as_str()) {
                continue;
            }
            let _ = writeln!(out, "{:>23} {}", relation.acro, relation.description);
        }
        for (acro, desc) in FAMILY_LEGEND {
            let _ = writeln!(out, "{:>23} {}", acro, desc);
        }
        out.push_str("The slot containment edges cannot be used in searches.\n");
        out.push_str("One of the above relations on nodes and/or slots will suit you better.\n");
        out
    }
}

/// Comparison named by a feature operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureOpKind {
    Equal,
    Unequal,
    Less,
    Greater,
    Match(String),
}

/// A parsed `.f.`, `.f=g.`, `.f#g.`, `.f<g.`, `.f>g.` or `.f~r~g.` operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureOp {
    pub left: String,
    pub right: String,
    pub comparison: FeatureOpKind,
}

impl FeatureOp {
    /// Canonical spelling.
    pub fn acro(&self) -> String {
        let (f, g) = (&self.left, &self.right);
        match &self.comparison {
            FeatureOpKind::Equal if f == g => format!(".{}.", f),
            FeatureOpKind::Equal => format!(".{}={}.", f, g),
            FeatureOpKind::Unequal => format!(".{}#{}.", f, g),
            FeatureOpKind::Less => format!(".{}<{}.", f, g),
            FeatureOpKind::Greater => format!(".{}>{}.", f, g),
            FeatureOpKind::Match(r) => format!(".{}~{}~{}.", f, r, g),
        }
    }
}

fn is_feature_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '@')
}

/// Parse a feature operator; `None` if `op` is not one.
pub fn parse_feature_op(op: &str) -> Option<FeatureOp> {
    if op.len() < 3 || !op.starts_with('.') || !op.ends_with('.') {
        return None;
    }
    let inner = &op[1..op.len() - 1];
    let parsed = if let (Some(a), Some(b)) = (inner.find('~'), inner.rfind('~')) {
        if a == b {
            return None;
        }
        FeatureOp {
            left: inner[..a].to_string(),
            right: inner[b + 1..].to_string(),
            comparison: FeatureOpKind::Match(inner[a + 1..b].to_string()),
        }
    } else if let Some(pos) = inner.find(|c| matches!(c, '=' | '#' | '<' | '>')) {
        let comparison = match &inner[pos..pos + 1] {
            "=" => FeatureOpKind::Equal,
            "#" => FeatureOpKind::Unequal,
            "<" => FeatureOpKind::Less,
            _ => FeatureOpKind::Greater,
        };
        FeatureOp {
            left: inner[..pos].to_string(),
            right: inner[pos + 1..].to_string(),
            comparison,
        }
    } else {
        FeatureOp {
            left: inner.to_string(),
            right: inner.to_string(),
            comparison: FeatureOpKind::Equal,
        }
    };
    if is_feature_name(&parsed.left) && is_feature_name(&parsed.right) {
        Some(parsed)
    } else {
        None
    }
}

/// Parse a k-parameterized operator such as `=3:` or `:12>`.
pub fn parse_near_op(op: &str) -> Option<(NearFamily, u32)> {
    let start = op.find(|c: char| c.is_ascii_digit())?;
    let end = op[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(op.len(), |e| start + e);
    let k: u32 = op[start..end].parse().ok()?;
    let family = match (&op[..start], &op[end..]) {
        ("=", ":") => NearFamily::First,
        (":", "=") => NearFamily::Last,
        (":", ":") => NearFamily::Boundary,
        ("<", ":") => NearFamily::Before,
        (":", ">") => NearFamily::After,
        _ => return None,
    };
    Some((family, k))
}
