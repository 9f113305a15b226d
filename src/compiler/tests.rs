//! Tests for wiring and validating templates against a corpus.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::compiler::{compile, QueryGraph, SemanticEnv};
    use crate::data::fixtures::genesis;
    use crate::data::MemoryCorpus;
    use crate::engine::error::{Diagnostic, DiagnosticKind};
    use crate::grid::Grid;
    use crate::relations::RelationTable;
    use crate::types::{NodeSet, ValueCondition};

    struct Setup {
        corpus: MemoryCorpus,
        grid: Grid,
    }

    fn setup() -> Setup {
        let corpus = genesis();
        let grid = Grid::new(&corpus).unwrap();
        Setup { corpus, grid }
    }

    fn run(setup: &Setup, template: &str) -> (Result<QueryGraph, Vec<Diagnostic>>, RelationTable) {
        let env = SemanticEnv { grid: &setup.grid, provider: &setup.corpus, sets: None };
        let mut table = RelationTable::base(&setup.corpus);
        let result = compile(template, 0, &env, &mut table);
        (result, table)
    }

    fn graph(setup: &Setup, template: &str) -> (QueryGraph, RelationTable) {
        match run(setup, template) {
            (Ok(graph), table) => (graph, table),
            (Err(problems), _) => panic!("Template should compile: {:?}", problems),
        }
    }

    fn problems(setup: &Setup, template: &str) -> Vec<Diagnostic> {
        match run(setup, template) {
            (Err(problems), _) => problems,
            (Ok(_), _) => panic!("Template should not compile:\n{}", template),
        }
    }

    /// Edges as (from, acro, to), sorted.
    fn edges(graph: &QueryGraph, table: &RelationTable) -> Vec<(usize, String, usize)> {
        let mut out: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (e.from, table.get(e.relation).unwrap().acro.clone(), e.to))
            .collect();
        out.sort();
        out
    }

    fn edge(from: usize, acro: &str, to: usize) -> (usize, String, usize) {
        (from, acro.to_string(), to)
    }

    #[test]
    fn test_indentation_wires_embedding() {
        let setup = setup();
        let (graph, table) = graph(&setup, "sentence\n  clause\n    phrase\n  clause");
        assert_eq!(graph.len(), 4);
        assert_eq!(
            edges(&graph, &table),
            vec![edge(1, "]]", 0), edge(2, "]]", 1), edge(3, "]]", 0)]
        );
    }

    #[test]
    fn test_operator_in_front_of_atom() {
        let setup = setup();
        // first child: parent related to child; later sibling: previous sibling related to it
        let (graph, table) = graph(&setup, "clause\n  =: word\n  <: word");
        assert_eq!(
            edges(&graph, &table),
            vec![edge(0, "=:", 1), edge(1, "<:", 2), edge(1, "]]", 0), edge(2, "]]", 0)]
        );
    }

    #[test]
    fn test_lonely_operator_relates_sibling_to_parent() {
        let setup = setup();
        let (graph, table) = graph(&setup, "clause\n  phrase\n  :=");
        assert_eq!(edges(&graph, &table), vec![edge(1, ":=", 0), edge(1, "]]", 0)]);
    }

    #[test]
    fn test_outdent_finds_sibling_and_parent() {
        let setup = setup();
        let (graph, table) = graph(&setup, "sentence\n  clause\n    phrase\n  << clause");
        assert_eq!(
            edges(&graph, &table),
            vec![edge(1, "<<", 3), edge(1, "]]", 0), edge(2, "]]", 1), edge(3, "]]", 0)]
        );
    }

    #[test]
    fn test_relation_lines_and_names() {
        let setup = setup();
        let (graph, table) = graph(&setup, "c:clause\n  w1:word\n  w2:word\nw1 < w2\nw2 -distance> w1");
        assert_eq!(graph.names.get("w1"), Some(&1));
        assert_eq!(
            edges(&graph, &table),
            vec![edge(1, "<", 2), edge(1, "]]", 0), edge(2, "-distance>", 1), edge(2, "]]", 0)]
        );
    }

    #[test]
    fn test_relation_line_with_types() {
        let setup = setup();
        let (graph, table) = graph(&setup, "phrase == word");
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.atoms[0].otype, "phrase");
        assert_eq!(graph.atoms[1].otype, "word");
        assert_eq!(edges(&graph, &table), vec![edge(0, "==", 1)]);
    }

    #[test]
    fn test_atom_type_naming_another_atom() {
        let setup = setup();
        let (graph, table) = graph(&setup, "p:phrase\nclause\n  p");
        assert_eq!(graph.atoms[2].otype, "phrase");
        assert!(edges(&graph, &table).contains(&edge(2, "=", 0)));
    }

    #[test]
    fn test_feature_conditions_are_typed() {
        let setup = setup();
        let (graph, _) = graph(&setup, "phrase function=Pred|Subj\n  number>1\nword otype=word");
        let conditions = &graph.atoms[0].conditions;
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].0, "function");
        match &conditions[1] {
            (name, ValueCondition::Greater(1)) => assert_eq!(name, "number"),
            other => panic!("Expected a numeric bound, got {:?}", other),
        }
        let (graph, _) = self::graph(&setup, "phrase number=2|3");
        match &graph.atoms[0].conditions[0].1 {
            ValueCondition::OneOf(values) => assert_eq!(values[0].as_int(), Some(2)),
            other => panic!("Expected integer values, got {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_relations_are_instantiated() {
        let setup = setup();
        let (graph, table) = graph(&setup, "w1:word\nw2:word\nw1 <2: w2\nw1 .text=gloss. w2\nw1 -distance>1> w2");
        let acros: Vec<String> = edges(&graph, &table).into_iter().map(|(_, a, _)| a).collect();
        assert_eq!(acros, vec!["-distance>1>", ".text=gloss.", "<2:"]);
        assert!(table.lookup(":2>").is_some());
        assert!(table.lookup(".gloss=text.").is_some());
        assert!(table.lookup("<distance>1-").is_some());
    }

    #[test]
    fn test_unknown_type_is_reported_with_line() {
        let setup = setup();
        let problems = problems(&setup, "phrse");
        assert_eq!(problems[0].kind, DiagnosticKind::Semantic);
        assert_eq!(problems[0].line, Some(0));
        assert_eq!(problems[0].to_string(), "semantic error: line 1: Unknown object type: \"phrse\"");
        assert!(problems[1].message.starts_with("Valid object types are: sentence, clause"));
    }

    #[test]
    fn test_all_problems_are_collected() {
        let setup = setup();
        let problems = problems(&setup, "phrse\n  word lemma=x\n  word -frobs> word\nword # word\nword => word");
        let messages: Vec<&str> = problems.iter().map(|p| p.message.as_str()).collect();
        assert!(messages.contains(&"Unknown object type: \"phrse\""), "{:?}", messages);
        assert!(messages.contains(&"Unknown relation: \"=>\""));
        assert!(messages.contains(&"Missing feature \"lemma\" in line(s) 2"));
        assert!(messages.contains(&"Missing feature \"frobs\" in line(s) 3"));
    }

    #[test]
    fn test_wrong_values() {
        let setup = setup();
        let problems = problems(&setup, "phrase number=x\nword text<3\nphrase number~1");
        let messages: Vec<&str> = problems.iter().map(|p| p.message.as_str()).collect();
        assert!(messages.contains(&"Feature \"number\" has wrong values:"));
        assert!(messages.contains(&"    \"x\" is not a number: line(s) 1"));
        assert!(messages.contains(&"    a regular expression needs a string feature: line(s) 3"));
        assert!(messages.contains(&"    a numeric bound needs a numeric feature: line(s) 2"));
    }

    #[test]
    fn test_non_ascii_operators_are_unknown_relations() {
        let setup = setup();
        for op in ["<é", "-é>", "<é-", "<é>"] {
            let template = format!("clause\n  phrase\n  {}", op);
            let found = problems(&setup, &template);
            let expected = format!("Unknown relation: \"{}\"", op);
            assert!(
                found.iter().any(|p| p.kind == DiagnosticKind::Semantic && p.message == expected),
                "{}: {:?}",
                op,
                found
            );
        }
    }

    #[test]
    fn test_edge_values_need_valued_feature() {
        let setup = setup();
        let problems = problems(&setup, "phrase\n-mother=x> phrase");
        let messages: Vec<&str> = problems.iter().map(|p| p.message.as_str()).collect();
        assert!(messages.contains(&"Feature \"mother\" cannot have values:"), "{:?}", messages);
    }

    #[test]
    fn test_wiring_errors() {
        let setup = setup();
        let cases = [
            ("  word", "Unexpected indent: 2, expected 0"),
            ("<: word", "Lonely relation: not allowed at outermost level"),
            ("clause\n  <:", "Lonely relation: not allowed as first child"),
            ("word\n<:", "Lonely relation: not allowed at outermost level"),
            ("clause\n    phrase\n  word", "Unexpected indent: 2, expected one of 0"),
            ("w1 < w2", "Relation with undefined name: \"w1\""),
        ];
        for (template, expected) in cases {
            let problems = problems(&setup, template);
            assert!(
                problems.iter().any(|p| p.message == expected),
                "{:?}: expected {:?}, got {:?}",
                template,
                expected,
                problems
            );
        }
    }

    #[test]
    fn test_custom_sets_are_types() {
        let setup = setup();
        let mut sets = BTreeMap::new();
        sets.insert("subjects".to_string(), NodeSet::from_unsorted(vec![15]));
        let env = SemanticEnv { grid: &setup.grid, provider: &setup.corpus, sets: Some(&sets) };
        let mut table = RelationTable::base(&setup.corpus);
        let graph = compile("subjects\n  word", 0, &env, &mut table).unwrap();
        assert_eq!(graph.atoms[0].otype, "subjects");

        let problems = compile("objects", 0, &env, &mut table).unwrap_err();
        assert!(problems.iter().any(|p| p.message == "Or choose a custom set from: subjects"));
    }

    #[test]
    fn test_quantifiers_reach_the_graph() {
        let setup = setup();
        let (graph, _) = graph(&setup, "p:phrase\n/without/\n  word pos=verb\n/-/");
        assert_eq!(graph.len(), 1);
        let q = &graph.atoms[0].quantifiers[0];
        assert_eq!(q.parent, "p");
        assert_eq!(q.templates, vec!["  word pos=verb".to_string()]);
    }

    #[test]
    fn test_offset_shifts_lines() {
        let setup = setup();
        let env = SemanticEnv { grid: &setup.grid, provider: &setup.corpus, sets: None };
        let mut table = RelationTable::base(&setup.corpus);
        let problems = compile("word\n  phrse", 4, &env, &mut table).unwrap_err();
        assert_eq!(problems[0].line, Some(5));
    }
}
