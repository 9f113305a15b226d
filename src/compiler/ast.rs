use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::types::ValueCondition;

/// A feature condition as written, before it is checked against the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RawCondition {
    /// `name`
    Present,
    /// `name#`
    Absent,
    /// `name*`
    Any,
    /// `name=v1|v2`
    OneOf(Vec<String>),
    /// `name#v1|v2`
    NoneOf(Vec<String>),
    /// `name<n`
    Less(i64),
    /// `name>n`
    Greater(i64),
    /// `name~regex`
    Regex(String),
}

impl fmt::Display for RawCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawCondition::Present => Ok(()),
            RawCondition::Absent => f.write_str("#"),
            RawCondition::Any => f.write_str("*"),
            RawCondition::OneOf(values) => write!(f, "={}", values.join("|")),
            RawCondition::NoneOf(values) => write!(f, "#{}", values.join("|")),
            RawCondition::Less(n) => write!(f, "<{}", n),
            RawCondition::Greater(n) => write!(f, ">{}", n),
            RawCondition::Regex(re) => write!(f, "~{}", re),
        }
    }
}

/// Feature conditions by feature name; a later condition on the same
/// feature replaces an earlier one.
pub type RawConditions = BTreeMap<String, RawCondition>;

/// Quantifier keywords, each on a line of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Where,
    Have,
    Without,
    With,
    Or,
    End,
}

impl Keyword {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/where/" => Some(Keyword::Where),
            "/have/" => Some(Keyword::Have),
            "/without/" => Some(Keyword::Without),
            "/with/" => Some(Keyword::With),
            "/or/" => Some(Keyword::Or),
            "/-/" => Some(Keyword::End),
            _ => None,
        }
    }

    /// Keywords that open a quantifier.
    pub fn opens(self) -> bool {
        matches!(self, Keyword::Where | Keyword::Without | Keyword::With)
    }

    /// Keywords that start a further block of an open quantifier.
    pub fn continues(self) -> bool {
        matches!(self, Keyword::Have | Keyword::Or)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Where => "/where/",
            Keyword::Have => "/have/",
            Keyword::Without => "/without/",
            Keyword::With => "/with/",
            Keyword::Or => "/or/",
            Keyword::End => "/-/",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifierKind {
    Without,
    Where,
    With,
}

impl QuantifierKind {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Without => Some(QuantifierKind::Without),
            Keyword::Where => Some(QuantifierKind::Where),
            Keyword::With => Some(QuantifierKind::With),
            _ => None,
        }
    }
}

/// Quantifier blocks as collected by the tokenizer: verbatim lines with the
/// quantifier indentation stripped. `line` is the opening keyword line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantifierBlocks {
    pub kind: QuantifierKind,
    pub blocks: Vec<Vec<String>>,
    pub line: usize,
}

/// A quantifier ready to run: every block is a template whose `..`
/// references have been replaced by `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    pub templates: Vec<String>,
    pub parent: String,
    pub line: usize,
}

/// Classification of a single template line. Texts keep their escapes
/// encoded, see [`crate::compiler::syntax::escape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Op {
        indent: String,
        op: String,
    },
    Relation {
        indent: String,
        left: String,
        op: String,
        right: String,
    },
    Atom {
        indent: String,
        op: Option<String>,
        name: String,
        otype: String,
        features: String,
    },
    Feature(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    pub line: usize,
    pub indent: usize,
    /// Relation operator in front of the atom, escapes encoded.
    pub op: Option<String>,
    /// Empty when the atom is anonymous.
    pub name: String,
    pub otype: String,
    pub features: RawConditions,
    /// The atom line without leading whitespace, as written.
    pub source: String,
    pub quantifiers: Vec<QuantifierBlocks>,
}

/// One meaningful template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    /// A relation operator on a line of its own.
    Op { line: usize, indent: usize, op: String },
    /// Feature conditions continuing the previous atom.
    Feature { line: usize, features: RawConditions },
    /// `left OP right` between named atoms.
    Relation { line: usize, left: String, op: String, right: String },
}

impl Token {
    pub fn line(&self) -> usize {
        match self {
            Token::Atom(atom) => atom.line,
            Token::Op { line, .. } | Token::Feature { line, .. } | Token::Relation { line, .. } => *line,
        }
    }
}

/// An atom after wiring, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAtom {
    pub otype: String,
    pub features: RawConditions,
    pub source: String,
    pub quantifiers: Vec<Quantifier>,
    pub line: usize,
}

/// An edge after wiring, with its operator still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge {
    pub from: usize,
    pub op: String,
    pub to: usize,
    pub line: usize,
}

/// Atoms and edges of a template whose lines have been wired together.
#[derive(Debug, Clone, Default)]
pub struct WiredTemplate {
    pub atoms: Vec<RawAtom>,
    pub edges: Vec<RawEdge>,
    pub names: BTreeMap<String, usize>,
}

/// A validated atom.
#[derive(Debug, Clone)]
pub struct QueryAtom {
    pub otype: String,
    pub conditions: Vec<(String, ValueCondition)>,
    pub source: String,
    pub quantifiers: Vec<Quantifier>,
    pub line: usize,
}

/// A validated edge; `relation` indexes the search's relation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryEdge {
    pub from: usize,
    pub relation: usize,
    pub to: usize,
    pub line: usize,
}

/// The compiled template: atoms in declaration order and the edges between
/// them.
#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    pub atoms: Vec<QueryAtom>,
    pub edges: Vec<QueryEdge>,
    pub names: BTreeMap<String, usize>,
}

impl QueryGraph {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
