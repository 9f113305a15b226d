//! Line level analysis of search templates.
//!
//! Escape sequences are encoded as control characters before a line is
//! classified, so that escaped spaces, bars and equal signs survive the
//! splitting of feature conditions. Quantifier blocks are not interpreted
//! here: their lines are collected verbatim and become templates of their
//! own.

use regex::Regex;

use crate::compiler::ast::{
    AtomToken, Keyword, LineKind, Quantifier, QuantifierBlocks, QuantifierKind, RawCondition, RawConditions, Token,
};
use crate::compiler::pest_parser::{classify, parse_condition, ConditionParts};
use crate::engine::error::Diagnostic;

/// Escape sequences, encoded as the character with their index.
const ESCAPES: [&str; 6] = ["\\\\", "\\ ", "\\t", "\\n", "\\|", "\\="];

/// What each escape stands for.
const ESCAPED: [&str; 6] = ["\\", " ", "\t", "\n", "|", "="];

/// Name of the parent atom inside quantifier templates.
pub const PARENT_REF: &str = "..";

/// Encode escape sequences as control characters.
pub fn escape(text: &str) -> String {
    let mut out = text.to_string();
    for (i, seq) in ESCAPES.iter().enumerate() {
        out = out.replace(seq, &char::from(i as u8).to_string());
    }
    out
}

/// Restore what encoded escapes stand for. Inside regular expressions an
/// escaped bar stays escaped, since a bare bar means alternation there.
pub fn unescape(text: &str, in_regex: bool) -> String {
    let mut out = text.to_string();
    for (i, plain) in ESCAPED.iter().enumerate() {
        let code = char::from(i as u8).to_string();
        let restored = if in_regex && *plain == "|" { "\\|" } else { plain };
        out = out.replace(&code, restored);
    }
    out
}

/// Turn encoded escapes back into escape sequences.
fn reescape(text: &str) -> String {
    let mut out = text.to_string();
    for (i, seq) in ESCAPES.iter().enumerate() {
        out = out.replace(&char::from(i as u8).to_string(), seq);
    }
    out
}

fn is_comment(line: &str) -> bool {
    line.starts_with('%') || line.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// Remove up to `n` leading whitespace characters.
fn strip_indent(line: &str, n: usize) -> String {
    let skip: usize = line
        .chars()
        .take(n)
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(char::len_utf8)
        .sum();
    line[skip..].to_string()
}

fn is_legal_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Parse one escaped feature condition.
pub fn read_condition(text: &str) -> Result<(String, RawCondition), String> {
    let Some((name, parts)) = parse_condition(text) else {
        return Err(format!("Unrecognized feature condition \"{}\"", unescape(text, false)));
    };
    let condition = match parts {
        ConditionParts::Ready(condition) => condition,
        ConditionParts::Values { negated, text } => {
            let values: Vec<String> = text.split('|').map(|v| unescape(v, false)).collect();
            if negated {
                RawCondition::NoneOf(values)
            } else {
                RawCondition::OneOf(values)
            }
        }
        ConditionParts::Bound { less, text } => {
            let limit: i64 = text
                .parse()
                .map_err(|_| format!("Limit is non numeric \"{}\"", unescape(text, false)))?;
            if less {
                RawCondition::Less(limit)
            } else {
                RawCondition::Greater(limit)
            }
        }
        ConditionParts::Regex(text) => {
            let pattern = unescape(text, true);
            Regex::new(&pattern).map_err(|e| format!("Wrong regular expression \"{}\": \"{}\"", pattern, e))?;
            RawCondition::Regex(pattern)
        }
    };
    Ok((unescape(name, false), condition))
}

/// Parse whitespace separated escaped feature conditions.
fn read_features(text: &str, line: usize, offset: usize, problems: &mut Vec<Diagnostic>) -> Option<RawConditions> {
    let mut features = RawConditions::new();
    let mut good = true;
    for chunk in text.split_whitespace() {
        match read_condition(chunk) {
            Ok((name, condition)) => {
                features.insert(name, condition);
            }
            Err(message) => {
                problems.push(Diagnostic::syntax(line + offset, message));
                good = false;
            }
        }
    }
    good.then_some(features)
}

/// A quantifier keyword that has not been closed yet.
struct OpenQuantifier {
    line: usize,
    keyword: Keyword,
    indent: usize,
}

/// Blocks of the outermost open quantifier and the atom token they belong to.
struct Collecting {
    atom: Option<usize>,
    blocks: QuantifierBlocks,
}

/// Split a template into tokens. Reported lines are shifted by `offset`;
/// token lines are not.
pub fn tokenize(template: &str, offset: usize) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut problems: Vec<Diagnostic> = Vec::new();
    let mut open: Vec<OpenQuantifier> = Vec::new();
    let mut collecting: Option<Collecting> = None;

    for (i, raw) in template.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let line_no = i + offset;
        let blank = line.trim().is_empty() || is_comment(line);

        if !open.is_empty() && blank {
            // keep the line count of nested templates intact
            if let Some(c) = collecting.as_mut() {
                if let Some(block) = c.blocks.blocks.last_mut() {
                    block.push(String::new());
                }
            }
            continue;
        }
        if blank {
            continue;
        }

        let indent = indent_of(line);
        let keyword = Keyword::parse(line.trim());

        let top = open.last().map(|t| (t.line, t.keyword, t.indent));
        let Some((top_line, top_keyword, top_indent)) = top else {
            match keyword {
                None => tokenize_line(line, i, offset, &mut tokens, &mut problems),
                Some(keyword) => {
                    if !keyword.opens() {
                        problems.push(Diagnostic::syntax(line_no, format!("Quantifier: Can not start with \"{}:\"", keyword)));
                    }
                    let atom = match tokens.last() {
                        None => {
                            problems.push(Diagnostic::syntax(line_no, "Quantifier: No preceding tokens"));
                            None
                        }
                        Some(Token::Atom(a)) if a.indent == indent => Some(tokens.len() - 1),
                        Some(_) => {
                            problems.push(Diagnostic::syntax(
                                line_no,
                                "Quantifier: Does not immediately follow an atom at the same level",
                            ));
                            None
                        }
                    };
                    open.push(OpenQuantifier { line: i, keyword, indent });
                    collecting = Some(Collecting {
                        atom,
                        blocks: QuantifierBlocks {
                            kind: QuantifierKind::from_keyword(keyword).unwrap_or(QuantifierKind::Without),
                            blocks: vec![Vec::new()],
                            line: i,
                        },
                    });
                }
            }
            continue;
        };

        let depth = open.len();
        let outer_indent = open[0].indent;
        let push_line = |collecting: &mut Option<Collecting>, text: String| {
            if let Some(block) = collecting.as_mut().and_then(|c| c.blocks.blocks.last_mut()) {
                block.push(text);
            }
        };

        match keyword {
            None => push_line(&mut collecting, strip_indent(line, outer_indent)),
            Some(keyword) if keyword.opens() => {
                push_line(&mut collecting, strip_indent(line, outer_indent));
                open.push(OpenQuantifier { line: i, keyword, indent });
            }
            Some(keyword) => {
                let wrong_successor = match keyword {
                    Keyword::Have => top_keyword != Keyword::Where,
                    Keyword::Or => !matches!(top_keyword, Keyword::With | Keyword::Or),
                    _ => top_keyword == Keyword::Where,
                };
                if wrong_successor {
                    let message = if keyword == Keyword::End {
                        format!(
                            "Quantifier: \"{}\" : premature end of \"{}\" on line {}",
                            keyword,
                            top_keyword,
                            top_line + offset + 1
                        )
                    } else {
                        format!(
                            "Quantifier: \"{}\" can not follow \"{}\" on line {}",
                            keyword,
                            top_keyword,
                            top_line + offset + 1
                        )
                    };
                    problems.push(Diagnostic::syntax(line_no, message));
                }
                if top_indent != indent {
                    problems.push(Diagnostic::syntax(
                        line_no,
                        format!(
                            "Quantifier \"{}\" has not same indentation as \"{}\" on line {}",
                            keyword,
                            top_keyword,
                            top_line + offset + 1
                        ),
                    ));
                }
                if depth > 1 {
                    push_line(&mut collecting, strip_indent(line, outer_indent));
                } else if keyword.continues() {
                    if let Some(c) = collecting.as_mut() {
                        c.blocks.blocks.push(Vec::new());
                    }
                }
                if keyword == Keyword::End {
                    open.pop();
                    if open.is_empty() {
                        if let Some(Collecting { atom: Some(idx), blocks }) = collecting.take() {
                            if let Some(Token::Atom(atom)) = tokens.get_mut(idx) {
                                atom.quantifiers.push(blocks);
                            }
                        }
                    }
                } else if let Some(top) = open.last_mut() {
                    *top = OpenQuantifier { line: i, keyword, indent };
                }
            }
        }
    }

    for unclosed in &open {
        problems.push(Diagnostic::syntax(
            unclosed.line + offset,
            format!("Quantifier: Unterminated \"{}\"", unclosed.keyword),
        ));
    }
    (tokens, problems)
}

/// Tokenize a line outside quantifiers.
fn tokenize_line(line: &str, i: usize, offset: usize, tokens: &mut Vec<Token>, problems: &mut Vec<Diagnostic>) {
    let escaped = escape(line);
    match classify(&escaped) {
        LineKind::Op { indent, op } => tokens.push(Token::Op { line: i, indent: indent.chars().count(), op }),
        LineKind::Relation { left, op, right, .. } => tokens.push(Token::Relation { line: i, left, op, right }),
        LineKind::Atom { indent, op, name, otype, features } => {
            let mut good = true;
            if !name.is_empty() && !is_legal_name(&name) {
                problems.push(Diagnostic::syntax(i + offset, format!("Illegal name: \"{}\"", unescape(&name, false))));
                good = false;
            }
            let features = read_features(&features, i, offset, problems);
            if let (true, Some(features)) = (good, features) {
                tokens.push(Token::Atom(AtomToken {
                    line: i,
                    indent: indent.chars().count(),
                    op,
                    name,
                    otype: unescape(&otype, false),
                    features,
                    source: line.trim_start().to_string(),
                    quantifiers: Vec::new(),
                }));
            }
        }
        LineKind::Feature(text) => {
            if let Some(features) = read_features(&text, i, offset, problems) {
                tokens.push(Token::Feature { line: i, features });
            }
        }
    }
}

/// Render a classified line back to template text.
fn render_line(kind: &LineKind) -> String {
    match kind {
        LineKind::Op { indent, op } => format!("{}{}", indent, reescape(op)),
        LineKind::Relation { indent, left, op, right } => format!("{}{} {} {}", indent, left, reescape(op), right),
        LineKind::Atom { indent, op, name, otype, features } => {
            let mut out = indent.clone();
            if let Some(op) = op {
                out.push_str(&reescape(op));
                out.push(' ');
            }
            if !name.is_empty() {
                out.push_str(name);
                out.push(':');
            }
            out.push_str(&reescape(otype));
            if !features.is_empty() {
                out.push(' ');
                out.push_str(&reescape(features));
            }
            out
        }
        LineKind::Feature(text) => reescape(text),
    }
}

/// The atom line of a quantified atom, named `parent` and without its
/// relation operator, to head the quantifier templates.
pub fn parent_line(source: &str, parent: &str) -> String {
    match classify(&escape(source)) {
        LineKind::Atom { otype, features, .. } => render_line(&LineKind::Atom {
            indent: String::new(),
            op: None,
            name: parent.to_string(),
            otype,
            features,
        }),
        _ => source.to_string(),
    }
}

/// Turn collected quantifier blocks into templates that refer to the
/// quantified atom by name. Anonymous atoms get a fresh name.
pub fn de_context(quantifier: &QuantifierBlocks, name: &str) -> Quantifier {
    let parent = if name.is_empty() {
        let used: Vec<String> = quantifier
            .blocks
            .iter()
            .flatten()
            .filter_map(|line| match classify(&escape(line)) {
                LineKind::Atom { name, .. } if !name.is_empty() => Some(name),
                _ => None,
            })
            .collect();
        let mut parent = "parent".to_string();
        while used.contains(&parent) {
            parent.push('x');
        }
        parent
    } else {
        name.to_string()
    };

    let templates = quantifier
        .blocks
        .iter()
        .map(|block| {
            block
                .iter()
                .map(|line| {
                    if line.trim().is_empty() || is_comment(line) {
                        return line.clone();
                    }
                    match classify(&escape(line)) {
                        LineKind::Relation { indent, left, op, right } if left == PARENT_REF || right == PARENT_REF => {
                            let side = |s: String| if s == PARENT_REF { parent.clone() } else { s };
                            render_line(&LineKind::Relation { indent, left: side(left), op, right: side(right) })
                        }
                        LineKind::Atom { indent, op, name, otype, features } if name.is_empty() && otype == PARENT_REF => {
                            render_line(&LineKind::Atom { indent, op, name, otype: parent.clone(), features })
                        }
                        _ => line.clone(),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    Quantifier { kind: quantifier.kind, templates, parent, line: quantifier.line }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::DiagnosticKind;

    fn atoms(tokens: &[Token]) -> Vec<&AtomToken> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Atom(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_escape_roundtrip() {
        let text = r"a\ b\|c\=d\\e";
        let escaped = escape(text);
        assert!(!escaped.contains('\\'));
        assert_eq!(unescape(&escaped, false), "a b|c=d\\e");
        assert_eq!(reescape(&escaped), text);
        assert_eq!(unescape(&escape(r"x\|y"), true), r"x\|y");
        assert_eq!(unescape(&escape(r"x\ty\nz"), false), "x\ty\nz");
    }

    #[test]
    fn test_tokenize_atoms_and_features() {
        let template = "% comment\n\nclause\n  p:phrase function=Pred|Subj\n    number>1\n# another comment\n  word";
        let (tokens, problems) = tokenize(template, 0);
        assert!(problems.is_empty(), "{:?}", problems);
        assert_eq!(tokens.len(), 4);
        let atoms = atoms(&tokens);
        assert_eq!(atoms[0].otype, "clause");
        assert_eq!(atoms[0].line, 2);
        assert_eq!(atoms[1].name, "p");
        assert_eq!(atoms[1].indent, 2);
        assert_eq!(
            atoms[1].features.get("function"),
            Some(&RawCondition::OneOf(vec!["Pred".to_string(), "Subj".to_string()]))
        );
        match &tokens[2] {
            Token::Feature { line, features } => {
                assert_eq!(*line, 4);
                assert_eq!(features.get("number"), Some(&RawCondition::Greater(1)));
            }
            other => panic!("Expected feature token, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_values() {
        let (tokens, problems) = tokenize(r"word text=a\ b|c\|d", 0);
        assert!(problems.is_empty());
        let atoms = atoms(&tokens);
        assert_eq!(
            atoms[0].features.get("text"),
            Some(&RawCondition::OneOf(vec!["a b".to_string(), "c|d".to_string()]))
        );
    }

    #[test]
    fn test_condition_errors() {
        let (_, problems) = tokenize("word number<x\nword gloss~(\nword =x", 10);
        assert_eq!(problems.len(), 3, "{:?}", problems);
        assert!(problems.iter().all(|p| p.kind == DiagnosticKind::Syntax));
        assert_eq!(problems[0].line, Some(10));
        assert!(problems[0].message.contains("non numeric"));
        assert!(problems[1].message.contains("Wrong regular expression"));
        assert!(problems[2].message.contains("Unrecognized feature condition"));
    }

    #[test]
    fn test_illegal_name() {
        let (tokens, problems) = tokenize("w@x:word", 0);
        assert!(tokens.is_empty());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.starts_with("Illegal name"));
    }

    #[test]
    fn test_quantifier_blocks() {
        let template = "phrase\n/where/\n  word pos=verb\n/have/\n  word gloss=God\n/-/\nword";
        let (tokens, problems) = tokenize(template, 0);
        assert!(problems.is_empty(), "{:?}", problems);
        let atoms = atoms(&tokens);
        assert_eq!(atoms.len(), 2);
        let q = &atoms[0].quantifiers[0];
        assert_eq!(q.kind, QuantifierKind::Where);
        assert_eq!(q.line, 1);
        assert_eq!(q.blocks, vec![vec!["  word pos=verb".to_string()], vec!["  word gloss=God".to_string()]]);
    }

    #[test]
    fn test_nested_quantifier_blocks_stay_verbatim() {
        let template = "  phrase\n  /without/\n    word\n    /with/\n      clause\n    /-/\n  /-/";
        let (tokens, problems) = tokenize(&format!("sentence\n{}", template), 0);
        assert!(problems.is_empty(), "{:?}", problems);
        let atoms = atoms(&tokens);
        let q = &atoms[1].quantifiers[0];
        assert_eq!(
            q.blocks[0],
            vec!["  word", "  /with/", "    clause", "  /-/"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_quantifier_misuse() {
        let (_, problems) = tokenize("/have/\n/-/", 0);
        assert!(problems.iter().any(|p| p.message.contains("Can not start with")));
        assert!(problems.iter().any(|p| p.message.contains("No preceding tokens")));

        let (_, problems) = tokenize("phrase\n  /without/\n  word\n  /-/", 0);
        assert!(problems.iter().any(|p| p.message.contains("Does not immediately follow")));

        let (_, problems) = tokenize("phrase\n/with/\n  word\n/have/\n  word\n/-/", 0);
        assert!(problems.iter().any(|p| p.message.contains("can not follow")));

        let (_, problems) = tokenize("phrase\n/where/\n  word\n/-/", 0);
        assert!(problems.iter().any(|p| p.message.contains("premature end")));

        let (_, problems) = tokenize("phrase\n/without/\n  word\n  /-/", 0);
        assert!(problems.iter().any(|p| p.message.contains("has not same indentation")));

        let (_, problems) = tokenize("phrase\n/without/\n  word", 3);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].line, Some(4));
        assert!(problems[0].message.contains("Unterminated"));
    }

    #[test]
    fn test_de_context() {
        let blocks = QuantifierBlocks {
            kind: QuantifierKind::Without,
            blocks: vec![vec!["  w:word".to_string(), "w < ..".to_string(), "..".to_string()]],
            line: 1,
        };
        let q = de_context(&blocks, "");
        assert_eq!(q.parent, "parent");
        assert_eq!(q.templates, vec!["  w:word\nw < parent\nparent".to_string()]);

        let blocks = QuantifierBlocks {
            kind: QuantifierKind::Without,
            blocks: vec![vec!["parent:word".to_string()]],
            line: 1,
        };
        assert_eq!(de_context(&blocks, "").parent, "parentx");
        assert_eq!(de_context(&blocks, "p").parent, "p");
    }

    #[test]
    fn test_parent_line() {
        assert_eq!(parent_line("=: phrase function=Pred", "parent"), "parent:phrase function=Pred");
        assert_eq!(parent_line(r"p:word text=a\ b", "p"), r"p:word text=a\ b");
    }
}
