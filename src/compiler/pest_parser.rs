use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::compiler::ast::{LineKind, RawCondition};

#[derive(Parser)]
#[grammar = "template.pest"]
pub struct TemplateParser;

/// Classify one escaped template line. Lines that are neither operator,
/// relation nor atom lines are feature lines.
pub fn classify(line: &str) -> LineKind {
    if let Some(pair) = parse_rule(Rule::op_line, line) {
        let mut indent = String::new();
        let mut op = String::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::indent => indent = inner.as_str().to_string(),
                Rule::op => op = inner.as_str().to_string(),
                _ => {}
            }
        }
        return LineKind::Op { indent, op };
    }

    if let Some(pair) = parse_rule(Rule::rel_line, line) {
        let mut indent = String::new();
        let mut op = String::new();
        let mut names = Vec::with_capacity(2);
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::indent => indent = inner.as_str().to_string(),
                Rule::op => op = inner.as_str().to_string(),
                Rule::name => names.push(inner.as_str().to_string()),
                _ => {}
            }
        }
        if let [left, right] = names.as_slice() {
            return LineKind::Relation { indent, left: left.clone(), op, right: right.clone() };
        }
    }

    if let Some(pair) = parse_rule(Rule::atom_line, line) {
        let mut indent = String::new();
        let mut op = None;
        let mut atom = "";
        let mut features = String::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::indent => indent = inner.as_str().to_string(),
                Rule::op => op = Some(inner.as_str().to_string()),
                Rule::atom => atom = inner.as_str(),
                Rule::features => features = inner.as_str().trim_end().to_string(),
                _ => {}
            }
        }
        let (name, otype) = match atom.split_once(':') {
            Some((name, otype)) => (name.to_string(), otype.to_string()),
            None => (String::new(), atom.to_string()),
        };
        return LineKind::Atom { indent, op, name, otype, features };
    }

    LineKind::Feature(line.to_string())
}

fn parse_rule(rule: Rule, line: &str) -> Option<Pair<'_, Rule>> {
    TemplateParser::parse(rule, line).ok().and_then(|mut pairs| pairs.next())
}

/// Pieces of a feature condition, still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionParts<'a> {
    Ready(RawCondition),
    Values { negated: bool, text: &'a str },
    Bound { less: bool, text: &'a str },
    Regex(&'a str),
}

/// Split a single escaped condition into its feature name and parts.
pub fn parse_condition(text: &str) -> Option<(&str, ConditionParts<'_>)> {
    let pair = parse_rule(Rule::condition, text)?;
    let cond = pair.into_inner().next()?;
    let rule = cond.as_rule();
    let mut name = "";
    let mut op = "";
    let mut value = "";
    for inner in cond.into_inner() {
        match inner.as_rule() {
            Rule::feat_name => name = inner.as_str(),
            Rule::ident_op | Rule::comp_op => op = inner.as_str(),
            Rule::value_text => value = inner.as_str(),
            _ => {}
        }
    }
    let parts = match rule {
        Rule::cond_any => ConditionParts::Ready(RawCondition::Any),
        Rule::cond_absent => ConditionParts::Ready(RawCondition::Absent),
        Rule::cond_present => ConditionParts::Ready(RawCondition::Present),
        Rule::cond_ident => ConditionParts::Values { negated: op == "#", text: value },
        Rule::cond_comp => ConditionParts::Bound { less: op == "<", text: value },
        Rule::cond_regex => ConditionParts::Regex(value),
        _ => return None,
    };
    Some((name, parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(line: &str) -> (String, Option<String>, String, String, String) {
        match classify(line) {
            LineKind::Atom { indent, op, name, otype, features } => (indent, op, name, otype, features),
            other => panic!("Expected atom line for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_classify_atoms() {
        assert_eq!(
            atom("word"),
            (String::new(), None, String::new(), "word".to_string(), String::new())
        );
        assert_eq!(
            atom("  =: w:word pos=verb gloss~^G "),
            (
                "  ".to_string(),
                Some("=:".to_string()),
                "w".to_string(),
                "word".to_string(),
                "pos=verb gloss~^G".to_string()
            )
        );
        assert_eq!(atom(".").3, ".");
        assert_eq!(atom("..").3, "..");
        assert_eq!(atom("  .text=gloss. word").1, Some(".text=gloss.".to_string()));
    }

    #[test]
    fn test_classify_other_lines() {
        assert_eq!(
            classify("  <:"),
            LineKind::Op { indent: "  ".to_string(), op: "<:".to_string() }
        );
        assert_eq!(
            classify("w1 < w2"),
            LineKind::Relation {
                indent: String::new(),
                left: "w1".to_string(),
                op: "<".to_string(),
                right: "w2".to_string()
            }
        );
        assert_eq!(
            classify("phrase == word"),
            LineKind::Relation {
                indent: String::new(),
                left: "phrase".to_string(),
                op: "==".to_string(),
                right: "word".to_string()
            }
        );
        assert_eq!(classify("  pos=verb"), LineKind::Feature("  pos=verb".to_string()));
        assert_eq!(classify("  number>2"), LineKind::Feature("  number>2".to_string()));
    }

    #[test]
    fn test_parse_conditions() {
        assert_eq!(parse_condition("pos"), Some(("pos", ConditionParts::Ready(RawCondition::Present))));
        assert_eq!(parse_condition("pos#"), Some(("pos", ConditionParts::Ready(RawCondition::Absent))));
        assert_eq!(parse_condition("pos*"), Some(("pos", ConditionParts::Ready(RawCondition::Any))));
        assert_eq!(
            parse_condition("pos=verb|noun"),
            Some(("pos", ConditionParts::Values { negated: false, text: "verb|noun" }))
        );
        assert_eq!(
            parse_condition("pos#verb"),
            Some(("pos", ConditionParts::Values { negated: true, text: "verb" }))
        );
        assert_eq!(parse_condition("number<3"), Some(("number", ConditionParts::Bound { less: true, text: "3" })));
        assert_eq!(parse_condition("number>x"), Some(("number", ConditionParts::Bound { less: false, text: "x" })));
        assert_eq!(parse_condition("gloss~^G"), Some(("gloss", ConditionParts::Regex("^G"))));
        assert_eq!(parse_condition("=verb"), None);
        assert_eq!(parse_condition("pos="), None);
    }
}
