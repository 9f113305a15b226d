//! Small corpora shared by unit tests.

use crate::data::memory::{CorpusBuilder, MemoryCorpus};
use crate::types::FeatureValue;

/// Five words, `phrase` 6 = {1,2} and `phrase` 7 = {3,4,5}.
pub fn two_phrases() -> MemoryCorpus {
    let mut b = CorpusBuilder::new("word", 5);
    b.set_slot_features("text", &["in", "the", "beginning", "god", "created"]);
    b.add_node("phrase", &[1, 2]);
    b.add_node("phrase", &[3, 4, 5]);
    b.build().unwrap()
}

/// Ten words with a sentence, clauses, phrases and a gapped `split` node.
///
/// ```text
/// 11 sentence     1..=10
/// 12 clause       1..=5
/// 13 clause       6..=10
/// 14 phrase       1 2 3     Time  number=1
/// 15 phrase       4         Subj  number=2
/// 16 phrase       5         Pred  number=3
/// 17 phrase       6..=10    Objc  number=4
/// 18 clause_atom  1..=5
/// 19 split        2 4
/// ```
pub fn genesis() -> MemoryCorpus {
    let mut b = CorpusBuilder::new("word", 10);
    b.set_slot_features(
        "text",
        &["in", "the", "beginning", "god", "created", "the", "heaven", "and", "the", "earth"],
    );
    b.set_slot_features(
        "pos",
        &["prep", "art", "subs", "subs", "verb", "art", "subs", "conj", "art", "subs"],
    );
    b.set_slot_features(
        "gloss",
        &["in", "the", "start", "God", "made", "the", "sky", "and", "the", "land"],
    );
    b.add_node("sentence", &(1..=10).collect::<Vec<_>>());
    b.add_node("clause", &[1, 2, 3, 4, 5]);
    b.add_node("clause", &[6, 7, 8, 9, 10]);
    let time = b.add_node("phrase", &[1, 2, 3]);
    let subj = b.add_node("phrase", &[4]);
    let pred = b.add_node("phrase", &[5]);
    let objc = b.add_node("phrase", &[6, 7, 8, 9, 10]);
    b.add_node("clause_atom", &[1, 2, 3, 4, 5]);
    b.add_node("split", &[2, 4]);
    for (node, function, number) in [(time, "Time", 1i64), (subj, "Subj", 2), (pred, "Pred", 3), (objc, "Objc", 4)] {
        b.set_feature("function", node, function);
        b.set_feature("number", node, number);
    }
    b.add_edge("mother", time, pred, None);
    b.add_edge("mother", subj, pred, None);
    b.add_edge("mother", objc, pred, None);
    b.add_edge("distance", 1, 3, Some(FeatureValue::Int(2)));
    b.add_edge("distance", 4, 5, Some(FeatureValue::Int(1)));
    b.build().unwrap()
}
