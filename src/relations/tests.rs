//! Tests for relation evaluation, converses and bulk filters.

#[cfg(test)]
mod tests {
    use crate::data::fixtures::genesis;
    use crate::data::MemoryCorpus;
    use crate::grid::Grid;
    use crate::relations::{
        bulk, parse_feature_op, parse_near_op, FeatureOpKind, NearFamily, RelationContext, RelationTable, Shape,
        SlotKind,
    };
    use crate::types::{Node, NodeSet};

    fn setup() -> (MemoryCorpus, Grid) {
        let corpus = genesis();
        let grid = Grid::new(&corpus).unwrap();
        (corpus, grid)
    }

    fn table_with_extras(corpus: &MemoryCorpus) -> RelationTable {
        let mut table = RelationTable::base(corpus);
        for (family, k) in [(NearFamily::First, 1), (NearFamily::Last, 2), (NearFamily::Boundary, 1), (NearFamily::Before, 1), (NearFamily::After, 2)] {
            table.instantiate_near(family, k);
        }
        for op in [".number<number.", ".text=gloss.", ".function#function.", ".text~[gG]~gloss."] {
            let parsed = parse_feature_op(op).unwrap();
            table.instantiate_feature(&parsed).unwrap();
        }
        table
    }

    #[test]
    fn test_fanout_agrees_with_holds() {
        let (corpus, grid) = setup();
        let ctx = RelationContext { grid: &grid, provider: &corpus };
        let table = table_with_extras(&corpus);
        for relation in table.relations().filter(|r| r.shape() == Shape::Fanout) {
            let compiled = relation.compile(SlotKind::Mixed, SlotKind::Mixed);
            for n in 1..=grid.max_node() {
                let mut out = Vec::new();
                compiled.fanout(&ctx, n, &mut out);
                let fanned = NodeSet::from_unsorted(out);
                let tested: NodeSet = (1..=grid.max_node()).filter(|&m| compiled.holds(&ctx, n, m)).collect();
                assert_eq!(fanned, tested, "relation {} from node {}", relation.acro, n);
            }
        }
    }

    #[test]
    fn test_converse_relations_mirror() {
        let (corpus, grid) = setup();
        let ctx = RelationContext { grid: &grid, provider: &corpus };
        let table = table_with_extras(&corpus);
        for relation in table.relations() {
            let converse = table.get(relation.converse).unwrap();
            let r = relation.compile(SlotKind::Mixed, SlotKind::Mixed);
            let c = converse.compile(SlotKind::Mixed, SlotKind::Mixed);
            for n in 1..=grid.max_node() {
                for m in 1..=grid.max_node() {
                    assert_eq!(
                        r.holds(&ctx, n, m),
                        c.holds(&ctx, m, n),
                        "{} vs {} on ({}, {})",
                        relation.acro,
                        converse.acro,
                        n,
                        m
                    );
                }
            }
        }
    }

    #[test]
    fn test_slot_kind_specialization() {
        let (corpus, grid) = setup();
        let ctx = RelationContext { grid: &grid, provider: &corpus };
        let table = RelationTable::base(&corpus);
        let embeds = table.get(table.lookup("[[").unwrap()).unwrap();

        let mut out = Vec::new();
        embeds.compile(SlotKind::NonSlots, SlotKind::Slots).fanout(&ctx, 14, &mut out);
        assert_eq!(out, vec![1, 2, 3]);

        out.clear();
        embeds.compile(SlotKind::NonSlots, SlotKind::NonSlots).fanout(&ctx, 12, &mut out);
        assert_eq!(out, vec![18, 14, 19, 15, 16]);

        out.clear();
        embeds.compile(SlotKind::Slots, SlotKind::Mixed).fanout(&ctx, 3, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_specific_relations() {
        let (corpus, grid) = setup();
        let ctx = RelationContext { grid: &grid, provider: &corpus };
        let mut table = RelationTable::base(&corpus);
        let check = |table: &RelationTable, acro: &str, n: Node, m: Node| {
            let relation = table.get(table.lookup(acro).unwrap()).unwrap();
            relation.compile(SlotKind::Mixed, SlotKind::Mixed).holds(&ctx, n, m)
        };
        assert!(check(&table, "<:", 14, 4));
        assert!(!check(&table, "<:", 14, 5));
        assert!(check(&table, ":>", 15, 3));
        assert!(check(&table, "<<", 14, 17));
        assert!(check(&table, "||", 14, 15));
        assert!(!check(&table, "||", 14, 19));
        assert!(check(&table, "&&", 14, 19));
        assert!(check(&table, "==", 12, 18));
        assert!(check(&table, "##", 12, 14));
        assert!(check(&table, "<", 12, 18));
        assert!(check(&table, "-mother>", 15, 16));
        assert!(check(&table, "<mother-", 16, 15));
        assert!(check(&table, "<mother>", 16, 15));
        assert!(!check(&table, "-mother>", 16, 15));

        let idx = table.instantiate_near(NearFamily::Before, 1);
        assert_eq!(table.get(idx).unwrap().acro, "<1:");
        assert!(check(&table, "<1:", 14, 16));
        assert!(!check(&table, "<1:", 14, 17));
        assert!(check(&table, ":1>", 16, 14));

        let op = parse_feature_op(".number<number.").unwrap();
        table.instantiate_feature(&op).unwrap();
        assert!(check(&table, ".number<number.", 14, 15));
        assert!(check(&table, ".number>number.", 15, 14));

        let op = parse_feature_op(".text~[gG]~gloss.").unwrap();
        table.instantiate_feature(&op).unwrap();
        assert!(check(&table, ".text~[gG]~gloss.", 4, 4));
        assert!(!check(&table, ".text~[gG]~gloss.", 5, 5));

        let op = parse_feature_op(".otype.").unwrap();
        table.instantiate_feature(&op).unwrap();
        assert!(check(&table, ".otype.", 14, 17));
        assert!(!check(&table, ".otype.", 14, 12));
    }

    #[test]
    fn test_bulk_filters() {
        let (corpus, grid) = setup();
        let ctx = RelationContext { grid: &grid, provider: &corpus };
        let table = table_with_extras(&corpus);
        let kind = |acro: &str| table.get(table.lookup(acro).unwrap()).unwrap().kind.clone();

        let phrases = NodeSet::from_unsorted(vec![14, 15, 16, 17]);
        let late_words = NodeSet::from_unsorted(vec![4, 5]);
        let (f, t) = bulk::apply(&ctx, &kind("&&"), &phrases, &late_words).unwrap();
        assert_eq!(f.as_slice(), &[15, 16]);
        assert_eq!(t.as_slice(), &[4, 5]);

        let words = NodeSet::range(1, 10);
        let (f, t) = bulk::apply(&ctx, &kind("=="), &phrases, &words).unwrap();
        assert_eq!(f.as_slice(), &[15, 16]);
        assert_eq!(t.as_slice(), &[4, 5]);

        let (f, t) = bulk::apply(&ctx, &kind(".text=gloss."), &words, &words).unwrap();
        assert_eq!(f.as_slice(), &[1, 2, 6, 8, 9]);
        assert_eq!(t.as_slice(), &[1, 2, 6, 8, 9]);

        let (f, t) = bulk::apply(&ctx, &kind("="), &phrases, &NodeSet::from_unsorted(vec![15, 3])).unwrap();
        assert_eq!(f.as_slice(), &[15]);
        assert_eq!(t.as_slice(), &[15]);

        assert!(bulk::apply(&ctx, &kind("<<"), &phrases, &words).is_none());
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!(parse_near_op("=3:"), Some((NearFamily::First, 3)));
        assert_eq!(parse_near_op(":12>"), Some((NearFamily::After, 12)));
        assert_eq!(parse_near_op(":0:"), Some((NearFamily::Boundary, 0)));
        assert_eq!(parse_near_op("<:"), None);
        assert_eq!(parse_near_op("=3="), None);

        let op = parse_feature_op(".lex.").unwrap();
        assert_eq!((op.left.as_str(), op.right.as_str()), ("lex", "lex"));
        assert_eq!(op.comparison, FeatureOpKind::Equal);
        let op = parse_feature_op(".f~a|b~g.").unwrap();
        assert_eq!(op.comparison, FeatureOpKind::Match("a|b".to_string()));
        assert_eq!(parse_feature_op(".f>g.").unwrap().comparison, FeatureOpKind::Greater);
        assert!(parse_feature_op("..").is_none());
        assert!(parse_feature_op(".f").is_none());
        assert!(parse_feature_op(".f=.").is_none());
    }

    #[test]
    fn test_legend() {
        let (corpus, _) = setup();
        let legend = RelationTable::base(&corpus).legend();
        assert!(legend.contains("-mother>"));
        assert!(legend.contains("with value specification allowed"));
        assert!(legend.contains("=k:"));
        assert!(legend.contains("left embeds right"));
    }
}
