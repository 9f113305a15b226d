use serde::{Deserialize, Serialize};

use crate::engine::{Corpus, Diagnostic, Search};
use crate::types::Node;

/// Feature holding the surface text of slots.
pub const TEXT_FEATURE: &str = "text";

/// Composite nodes with more slots than this are shown abbreviated.
const GLEAN_MAX_SLOTS: usize = 6;

/// Results of one template run, ready for output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The template as given
    pub template: String,
    /// Stitching strategy that produced the tuples
    pub strategy: String,
    /// Number of tuples delivered
    pub count: usize,
    /// Result tuples, one node per template object
    pub tuples: Vec<Vec<Node>>,
    /// Problems found while studying the template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl SearchResults {
    /// Collect up to `limit` results of a studied search.
    pub fn collect(search: &Search<'_>, template: &str, limit: Option<usize>) -> Self {
        let tuples = search.fetch(limit);
        Self {
            template: template.to_string(),
            strategy: search.strategy().to_string(),
            count: tuples.len(),
            tuples,
            diagnostics: search.diagnostics().to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Format the results as a pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    /// One line per tuple, rendered with [`glean`].
    pub fn to_formatted_string(&self, corpus: &Corpus) -> String {
        let mut output = String::new();
        for d in &self.diagnostics {
            output.push_str(&format!("{}\n", d));
        }
        for (i, tuple) in self.tuples.iter().enumerate() {
            output.push_str(&format!("{:>5} {}\n", i + 1, glean(corpus, tuple)));
        }
        output.push_str(&format!("{} result(s)\n", self.count));
        output
    }
}

fn slot_text(corpus: &Corpus, slot: Node) -> String {
    match corpus.provider().node_feature_value(TEXT_FEATURE, slot) {
        Some(value) => value.to_string(),
        None => format!("{}#{}", corpus.grid().slot_type(), slot),
    }
}

fn node_text(corpus: &Corpus, n: Node) -> String {
    let grid = corpus.grid();
    if grid.is_slot(n) {
        return slot_text(corpus, n);
    }
    let otype = grid.node_type(n).unwrap_or("?");
    let slots = grid.slots_of(n);
    let words: Vec<String> = if slots.len() > GLEAN_MAX_SLOTS {
        let half = GLEAN_MAX_SLOTS / 2;
        let mut words: Vec<String> = slots[..half].iter().map(|&s| slot_text(corpus, s)).collect();
        words.push("...".to_string());
        words.extend(slots[slots.len() - half..].iter().map(|&s| slot_text(corpus, s)));
        words
    } else {
        slots.iter().map(|&s| slot_text(corpus, s)).collect()
    };
    format!("{}[{}]", otype, words.join(" "))
}

/// Compact rendering of a result tuple: slots by their text, other nodes by
/// type and the text of their slots.
pub fn glean(corpus: &Corpus, tuple: &[Node]) -> String {
    tuple
        .iter()
        .map(|&n| node_text(corpus, n))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::genesis;

    #[test]
    fn test_glean() {
        let corpus = Corpus::new(genesis()).unwrap();
        assert_eq!(glean(&corpus, &[14, 3]), "phrase[in the beginning] beginning");
        assert_eq!(
            glean(&corpus, &[11]),
            "sentence[in the beginning ... and the earth]"
        );
        assert_eq!(glean(&corpus, &[19]), "split[the god]");
    }

    #[test]
    fn test_collect_and_serialize() {
        let corpus = Corpus::new(genesis()).unwrap();
        let template = "phrase function=Pred|Subj";
        let mut search = Search::new(&corpus);
        assert!(search.study(template, None).is_empty());
        let results = SearchResults::collect(&search, template, None);
        assert_eq!(results.count, 2);
        assert_eq!(results.strategy, "small_choice_first");

        let json = results.to_json_pretty();
        let back: SearchResults = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tuples, vec![vec![15], vec![16]]);
        assert!(!json.contains("diagnostics"));
        assert!(json.contains("  \"count\": 2"));

        let text = results.to_formatted_string(&corpus);
        assert!(text.contains("    1 phrase[god]"));
        assert!(text.ends_with("2 result(s)\n"));
    }

    #[test]
    fn test_diagnostics_are_kept() {
        let corpus = Corpus::new(genesis()).unwrap();
        let mut search = Search::new(&corpus);
        assert!(!search.study("phrse", None).is_empty());
        let results = SearchResults::collect(&search, "phrse", None);
        assert!(results.is_empty());
        assert_eq!(results.diagnostics.len(), 1);
        assert!(results.to_json_pretty().contains("\"semantic\""));
    }
}
