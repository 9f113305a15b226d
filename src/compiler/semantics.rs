//! From tokens to a validated query graph.
//!
//! Wiring follows indentation: every atom is embedded in its parent, an
//! operator in front of an atom relates the previous sibling (or the parent,
//! for a first child) to it, and an operator on a line of its own relates the
//! previous sibling to the parent. Validation then checks types, features
//! and relations against the corpus and reports every problem at once.

use std::collections::BTreeMap;

use regex::Regex;

use crate::compiler::ast::{
    QueryAtom, QueryEdge, QueryGraph, RawAtom, RawCondition, RawConditions, RawEdge, Token, WiredTemplate,
};
use crate::compiler::syntax::{de_context, read_condition, unescape};
use crate::data::{EdgeDirection, FeatureProvider};
use crate::engine::error::Diagnostic;
use crate::grid::Grid;
use crate::relations::features::OTYPE;
use crate::relations::{parse_feature_op, parse_near_op, RelationTable};
use crate::types::{FeatureValue, NodeSet, ValueCondition, ValueType};

/// Atom type that stands for every node.
pub const ANY_TYPE: &str = ".";

/// Relation that wires children to parents.
const EMBEDDED_IN: &str = "]]";

/// Wire atoms and relations. `is_type` tells whether a word is an object
/// type, so that relation lines may name types instead of atoms.
pub fn wire(tokens: Vec<Token>, offset: usize, is_type: &dyn Fn(&str) -> bool) -> Result<WiredTemplate, Vec<Diagnostic>> {
    let mut problems = Vec::new();
    let mut wired = WiredTemplate::default();

    // relation lines come after all atoms, so that they can refer forward
    let (mut ordered, relations): (Vec<Token>, Vec<Token>) =
        tokens.into_iter().partition(|t| !matches!(t, Token::Relation { .. }));
    ordered.extend(relations);

    // last atom per indentation level
    let mut stack: BTreeMap<usize, usize> = BTreeMap::new();

    for token in ordered {
        match token {
            Token::Atom(atom) => {
                let q = wired.atoms.len();
                wired.atoms.push(RawAtom {
                    otype: atom.otype.clone(),
                    features: atom.features.clone(),
                    source: atom.source.clone(),
                    quantifiers: atom.quantifiers.iter().map(|b| de_context(b, &atom.name)).collect(),
                    line: atom.line,
                });
                if !atom.name.is_empty() {
                    wired.names.insert(atom.name.clone(), q);
                }
                place(&mut wired, &mut stack, &mut problems, offset, atom.line, atom.indent, atom.op, Some(q));
            }
            Token::Op { line, indent, op } => {
                place(&mut wired, &mut stack, &mut problems, offset, line, indent, Some(op), None);
            }
            Token::Feature { line, features } => match wired.atoms.last_mut() {
                Some(atom) => atom.features.extend(features),
                None => problems.push(Diagnostic::semantic(
                    Some(line + offset),
                    format!("Features without atom: \"{}\"", render_features(&features)),
                )),
            },
            Token::Relation { line, left, op, right } => {
                let mut resolve = |name: &str| -> Option<usize> {
                    if let Some(&q) = wired.names.get(name) {
                        return Some(q);
                    }
                    if is_type(name) {
                        wired.atoms.push(RawAtom {
                            otype: name.to_string(),
                            features: RawConditions::new(),
                            source: name.to_string(),
                            quantifiers: Vec::new(),
                            line,
                        });
                        return Some(wired.atoms.len() - 1);
                    }
                    problems.push(Diagnostic::semantic(
                        Some(line + offset),
                        format!("Relation with undefined name: \"{}\"", name),
                    ));
                    None
                };
                let from = resolve(&left);
                let to = resolve(&right);
                if let (Some(from), Some(to)) = (from, to) {
                    wired.edges.push(RawEdge { from, op, to, line });
                }
            }
        }
    }

    // atoms whose type is the name of another atom
    for q in 0..wired.atoms.len() {
        let otype = wired.atoms[q].otype.clone();
        if let Some(&refer) = wired.names.get(&otype) {
            if refer != q {
                wired.atoms[q].otype = wired.atoms[refer].otype.clone();
                let line = wired.atoms[q].line;
                wired.edges.push(RawEdge { from: q, op: "=".to_string(), to: refer, line });
            }
        }
    }

    if problems.is_empty() {
        Ok(wired)
    } else {
        Err(problems)
    }
}

/// Attach an atom (`q` is set) or a lonely operator (`q` is `None`) to the
/// atoms above it.
#[allow(clippy::too_many_arguments)]
fn place(
    wired: &mut WiredTemplate,
    stack: &mut BTreeMap<usize, usize>,
    problems: &mut Vec<Diagnostic>,
    offset: usize,
    line: usize,
    indent: usize,
    op: Option<String>,
    q: Option<usize>,
) {
    let line_no = line + offset;
    let mut edge = |from: usize, op: &str, to: usize| {
        wired.edges.push(RawEdge { from, op: op.to_string(), to, line });
    };

    let deepest = stack.iter().next_back().map(|(&i, &q)| (i, q));
    let Some((top_indent, top)) = deepest else {
        if indent > 0 {
            problems.push(Diagnostic::semantic(Some(line_no), format!("Unexpected indent: {}, expected 0", indent)));
        }
        if op.is_some() {
            problems.push(Diagnostic::semantic(Some(line_no), "Lonely relation: not allowed at outermost level"));
        }
        if let Some(q) = q {
            stack.insert(0, q);
        }
        return;
    };

    if indent == top_indent {
        let parent = stack.range(..indent).next_back().map(|(_, &p)| p);
        match (q, parent) {
            (None, Some(parent)) => edge(top, op.as_deref().unwrap_or_default(), parent),
            (None, None) => {
                problems.push(Diagnostic::semantic(Some(line_no), "Lonely relation: not allowed at outermost level"));
            }
            (Some(q), parent) => {
                if let Some(parent) = parent {
                    edge(q, EMBEDDED_IN, parent);
                }
                if let Some(op) = &op {
                    edge(top, op, q);
                }
                stack.insert(indent, q);
            }
        }
    } else if indent > top_indent {
        match q {
            None => problems.push(Diagnostic::semantic(Some(line_no), "Lonely relation: not allowed as first child")),
            Some(q) => {
                edge(q, EMBEDDED_IN, top);
                if let Some(op) = &op {
                    edge(top, op, q);
                }
                stack.insert(indent, q);
            }
        }
    } else {
        let sibling = stack.get(&indent).copied();
        let Some(sibling) = sibling else {
            let expected: Vec<String> = stack.keys().filter(|&&k| k < indent).map(|k| k.to_string()).collect();
            let expected = if expected.is_empty() { "0".to_string() } else { expected.join(", ") };
            problems.push(Diagnostic::semantic(
                Some(line_no),
                format!("Unexpected indent: {}, expected one of {}", indent, expected),
            ));
            return;
        };
        let parent = stack.range(..indent).next_back().map(|(_, &p)| p);
        match (q, parent) {
            (None, Some(parent)) => edge(sibling, op.as_deref().unwrap_or_default(), parent),
            (None, None) => {
                problems.push(Diagnostic::semantic(Some(line_no), "Lonely relation: not allowed at outermost level"));
            }
            (Some(q), parent) => {
                if let Some(parent) = parent {
                    edge(q, EMBEDDED_IN, parent);
                }
                if let Some(op) = &op {
                    edge(sibling, op, q);
                }
            }
        }
        let deeper: Vec<usize> = stack.range(indent + 1..).map(|(&k, _)| k).collect();
        for k in deeper {
            stack.remove(&k);
        }
        if let Some(q) = q {
            stack.insert(indent, q);
        }
    }
}

fn render_features(features: &RawConditions) -> String {
    features
        .iter()
        .map(|(name, condition)| format!("{}{}", name, condition))
        .collect::<Vec<_>>()
        .join(" ")
}

/// What validation needs to know about the corpus.
#[derive(Clone, Copy)]
pub struct SemanticEnv<'a> {
    pub grid: &'a Grid,
    pub provider: &'a dyn FeatureProvider,
    pub sets: Option<&'a BTreeMap<String, NodeSet>>,
}

impl<'a> SemanticEnv<'a> {
    pub fn is_type(&self, name: &str) -> bool {
        name == ANY_TYPE || self.grid.has_type(name) || self.sets.map_or(false, |s| s.contains_key(name))
    }

    fn node_feature_type(&self, name: &str) -> Option<ValueType> {
        if name == OTYPE {
            return Some(ValueType::Str);
        }
        self.provider.node_feature_type(name)
    }
}

/// Problems grouped per feature, reported after all atoms and edges.
#[derive(Default)]
struct FeatureProblems {
    missing: BTreeMap<String, Vec<usize>>,
    superfluous: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
    wrong: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
}

impl FeatureProblems {
    fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.superfluous.is_empty() && self.wrong.is_empty()
    }

    fn report(self, offset: usize, problems: &mut Vec<Diagnostic>) {
        let lines = |ls: &[usize]| ls.iter().map(|l| (l + offset + 1).to_string()).collect::<Vec<_>>().join(", ");
        for (name, ls) in &self.missing {
            problems.push(Diagnostic::semantic(None, format!("Missing feature \"{}\" in line(s) {}", name, lines(ls))));
        }
        for (name, wrongs) in &self.superfluous {
            problems.push(Diagnostic::semantic(None, format!("Feature \"{}\" cannot have values:", name)));
            for (value, ls) in wrongs {
                problems.push(Diagnostic::semantic(None, format!("    \"{}\" superfluous: line(s) {}", value, lines(ls))));
            }
        }
        for (name, wrongs) in &self.wrong {
            problems.push(Diagnostic::semantic(None, format!("Feature \"{}\" has wrong values:", name)));
            for (detail, ls) in wrongs {
                problems.push(Diagnostic::semantic(None, format!("    {}: line(s) {}", detail, lines(ls))));
            }
        }
    }
}

/// Turn a written condition into a typed one, recording wrong values.
fn typed_condition(
    feature: &str,
    condition: &RawCondition,
    value_type: ValueType,
    line: usize,
    issues: &mut FeatureProblems,
) -> Option<ValueCondition> {
    let mut wrong = |detail: String| {
        issues
            .wrong
            .entry(feature.to_string())
            .or_default()
            .entry(detail)
            .or_default()
            .push(line);
    };
    let values = |values: &[String], wrong: &mut dyn FnMut(String)| -> Option<Vec<FeatureValue>> {
        let mut typed = Vec::with_capacity(values.len());
        let mut good = true;
        for v in values {
            match value_type {
                ValueType::Str => typed.push(FeatureValue::Str(v.clone())),
                ValueType::Int => match v.parse::<i64>() {
                    Ok(i) => typed.push(FeatureValue::Int(i)),
                    Err(_) => {
                        wrong(format!("\"{}\" is not a number", v));
                        good = false;
                    }
                },
            }
        }
        good.then_some(typed)
    };
    match condition {
        RawCondition::Present => Some(ValueCondition::Present),
        RawCondition::Absent => Some(ValueCondition::Absent),
        RawCondition::Any => Some(ValueCondition::Any),
        RawCondition::OneOf(vs) => values(vs, &mut wrong).map(ValueCondition::OneOf),
        RawCondition::NoneOf(vs) => values(vs, &mut wrong).map(ValueCondition::NoneOf),
        RawCondition::Less(_) | RawCondition::Greater(_) if value_type == ValueType::Str => {
            wrong("a numeric bound needs a numeric feature".to_string());
            None
        }
        RawCondition::Less(n) => Some(ValueCondition::Less(*n)),
        RawCondition::Greater(n) => Some(ValueCondition::Greater(*n)),
        RawCondition::Regex(_) if value_type == ValueType::Int => {
            wrong("a regular expression needs a string feature".to_string());
            None
        }
        RawCondition::Regex(pattern) => match Regex::new(pattern) {
            Ok(re) => Some(ValueCondition::Matches(re)),
            Err(e) => {
                wrong(format!("\"{}\" is not a valid regular expression: {}", pattern, e));
                None
            }
        },
    }
}

/// Check a wired template against the corpus and resolve its relations in
/// `table`, instantiating parameterized relations on the way.
pub fn validate(
    wired: WiredTemplate,
    env: &SemanticEnv<'_>,
    table: &mut RelationTable,
    offset: usize,
) -> Result<QueryGraph, Vec<Diagnostic>> {
    let mut problems = Vec::new();
    let mut issues = FeatureProblems::default();

    // object types
    let mut types_good = true;
    for atom in &wired.atoms {
        if !env.is_type(&atom.otype) {
            problems.push(Diagnostic::semantic(
                Some(atom.line + offset),
                format!("Unknown object type: \"{}\"", atom.otype),
            ));
            types_good = false;
        }
    }
    if !types_good {
        let valid: Vec<&str> = env.grid.type_names().collect();
        problems.push(Diagnostic::semantic(None, format!("Valid object types are: {}", valid.join(", "))));
        if let Some(sets) = env.sets {
            let names: Vec<&str> = sets.keys().map(String::as_str).collect();
            problems.push(Diagnostic::semantic(None, format!("Or choose a custom set from: {}", names.join(", "))));
        }
    }

    // node feature conditions
    let mut atoms = Vec::with_capacity(wired.atoms.len());
    for atom in wired.atoms {
        let mut conditions = Vec::with_capacity(atom.features.len());
        for (feature, condition) in &atom.features {
            let Some(value_type) = env.node_feature_type(feature) else {
                issues.missing.entry(feature.clone()).or_default().push(atom.line);
                continue;
            };
            if let Some(typed) = typed_condition(feature, condition, value_type, atom.line, &mut issues) {
                conditions.push((feature.clone(), typed));
            }
        }
        atoms.push(QueryAtom {
            otype: atom.otype,
            conditions,
            source: atom.source,
            quantifiers: atom.quantifiers,
            line: atom.line,
        });
    }

    // relations
    let mut edges = Vec::with_capacity(wired.edges.len());
    let mut relations_good = true;
    for edge in &wired.edges {
        match resolve_relation(&edge.op, edge.line, env, table, &mut issues) {
            Ok(Some(relation)) => edges.push(QueryEdge { from: edge.from, relation, to: edge.to, line: edge.line }),
            Ok(None) => {}
            Err(message) => {
                problems.push(Diagnostic::semantic(Some(edge.line + offset), message));
                relations_good = false;
            }
        }
    }
    if !relations_good {
        problems.push(Diagnostic::semantic(None, format!("Allowed relations:\n{}", table.legend())));
    }

    if !issues.is_empty() {
        issues.report(offset, &mut problems);
    }

    if problems.is_empty() {
        log::debug!("Template validated: {} atoms, {} edges", atoms.len(), edges.len());
        Ok(QueryGraph { atoms, edges, names: wired.names })
    } else {
        Err(problems)
    }
}

/// Find or instantiate the relation named by `op`. `Ok(None)` means the
/// problem has been recorded in `issues`.
fn resolve_relation(
    op: &str,
    line: usize,
    env: &SemanticEnv<'_>,
    table: &mut RelationTable,
    issues: &mut FeatureProblems,
) -> Result<Option<usize>, String> {
    let plain = unescape(op, false);
    if let Some(idx) = table.lookup(&plain) {
        return Ok(Some(idx));
    }

    if let Some((inner, direction)) = edge_shape(op) {
        if let Ok((feature, condition)) = read_condition(inner) {
            let Some(info) = env.provider.edge_feature_info(&feature) else {
                issues.missing.entry(feature).or_default().push(line);
                return Ok(None);
            };
            if !info.has_values {
                if condition != RawCondition::Present {
                    issues
                        .superfluous
                        .entry(feature)
                        .or_default()
                        .entry(condition.to_string())
                        .or_default()
                        .push(line);
                    return Ok(None);
                }
                return Ok(table.lookup(&edge_acro(&feature, direction)));
            }
            let text = condition.to_string();
            let Some(typed) = typed_condition(&feature, &condition, info.value_type, line, issues) else {
                return Ok(None);
            };
            return Ok(Some(table.instantiate_edge(&plain, &feature, direction, typed, &text)));
        }
    }

    if let Some(feature_op) = parse_feature_op(&plain) {
        let mut known = true;
        for feature in [&feature_op.left, &feature_op.right] {
            if env.node_feature_type(feature).is_none() {
                let lines = issues.missing.entry(feature.clone()).or_default();
                if !lines.contains(&line) {
                    lines.push(line);
                }
                known = false;
            }
        }
        if !known {
            return Ok(None);
        }
        return table.instantiate_feature(&feature_op).map(Some);
    }

    if let Some((family, k)) = parse_near_op(&plain) {
        return Ok(Some(table.instantiate_near(family, k)));
    }

    Err(format!("Unknown relation: \"{}\"", plain))
}

/// Split `-X>`, `<X-` and `<X>` into `X` and a direction.
fn edge_shape(op: &str) -> Option<(&str, EdgeDirection)> {
    if let Some(inner) = op.strip_prefix('-').and_then(|rest| rest.strip_suffix('>')) {
        return (!inner.is_empty()).then_some((inner, EdgeDirection::Forward));
    }
    let rest = op.strip_prefix('<')?;
    let (inner, direction) = if let Some(inner) = rest.strip_suffix('-') {
        (inner, EdgeDirection::Backward)
    } else {
        (rest.strip_suffix('>')?, EdgeDirection::Both)
    };
    (!inner.is_empty()).then_some((inner, direction))
}

fn edge_acro(feature: &str, direction: EdgeDirection) -> String {
    match direction {
        EdgeDirection::Forward => format!("-{}>", feature),
        EdgeDirection::Backward => format!("<{}-", feature),
        EdgeDirection::Both => format!("<{}>", feature),
    }
}
