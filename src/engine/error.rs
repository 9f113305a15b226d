//! Diagnostics reported while studying a template, and search errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Syntax,
    Semantic,
    Connectivity,
    /// The planner lost atoms or edges; not caused by the template.
    PlanConsistency,
    Strategy,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Semantic => "semantic",
            DiagnosticKind::Connectivity => "connectivity",
            DiagnosticKind::PlanConsistency => "plan consistency",
            DiagnosticKind::Strategy => "strategy",
        };
        f.write_str(name)
    }
}

/// One problem found in a template. `line` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Self { kind, line, message: message.into() }
    }

    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, Some(line), message)
    }

    pub fn semantic(line: Option<usize>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Semantic, line, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} error: line {}: {}", self.kind, line + 1, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

/// Errors returned by search entry points.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search template cannot be executed:\n{}", render(.0))]
    NotExecutable(Vec<Diagnostic>),

    #[error("No template has been studied yet")]
    NotStudied,
}

/// One diagnostic per line.
pub fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_based() {
        let d = Diagnostic::semantic(Some(0), "Unknown object type: \"phrse\"");
        assert_eq!(d.to_string(), "semantic error: line 1: Unknown object type: \"phrse\"");
        let d = Diagnostic::new(DiagnosticKind::Connectivity, None, "2 components");
        assert_eq!(d.to_string(), "connectivity error: 2 components");
    }
}
