//! In-memory corpus: the default [`FeatureProvider`] implementation.

use std::collections::{BTreeMap, HashMap};

use crate::data::error::CorpusError;
use crate::data::provider::{EdgeDirection, EdgeFeatureInfo, FeatureProvider};
use crate::types::{FeatureValue, Node, ValueType};

#[derive(Debug, Clone)]
struct NodeFeature {
    value_type: ValueType,
    values: HashMap<Node, FeatureValue>,
}

type Adjacency = HashMap<Node, Vec<(Node, Option<FeatureValue>)>>;

#[derive(Debug, Clone)]
struct EdgeFeature {
    info: EdgeFeatureInfo,
    forward: Adjacency,
    backward: Adjacency,
}

/// Corpus held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryCorpus {
    slot_type: String,
    max_slot: Node,
    type_names: Vec<String>,
    /// Type index per composite, offset by `max_slot + 1`.
    composite_types: Vec<usize>,
    composite_slots: Vec<Vec<Node>>,
    node_features: BTreeMap<String, NodeFeature>,
    edge_features: BTreeMap<String, EdgeFeature>,
}

impl MemoryCorpus {
    fn composite_index(&self, node: Node) -> Option<usize> {
        if node <= self.max_slot {
            return None;
        }
        let idx = (node - self.max_slot - 1) as usize;
        if idx < self.composite_slots.len() {
            Some(idx)
        } else {
            None
        }
    }

    fn in_range(&self, node: Node) -> bool {
        node >= 1 && node <= self.max_node()
    }

    /// Number of nodes of every type.
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        counts.insert(self.slot_type.clone(), self.max_slot as usize);
        for &t in &self.composite_types {
            *counts.entry(self.type_names[t].clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl FeatureProvider for MemoryCorpus {
    fn max_slot(&self) -> Node {
        self.max_slot
    }

    fn max_node(&self) -> Node {
        self.max_slot + self.composite_slots.len() as Node
    }

    fn slot_type(&self) -> &str {
        &self.slot_type
    }

    fn node_type(&self, node: Node) -> Option<&str> {
        if node >= 1 && node <= self.max_slot {
            return Some(&self.slot_type);
        }
        self.composite_index(node)
            .map(|idx| self.type_names[self.composite_types[idx]].as_str())
    }

    fn slots_of(&self, node: Node) -> Vec<Node> {
        if node >= 1 && node <= self.max_slot {
            return vec![node];
        }
        self.composite_index(node)
            .map(|idx| self.composite_slots[idx].clone())
            .unwrap_or_default()
    }

    fn node_types(&self) -> Vec<String> {
        let mut types = vec![self.slot_type.clone()];
        types.extend(self.type_names.iter().cloned());
        types
    }

    fn nodes_of_type(&self, otype: &str) -> Vec<Node> {
        if otype == self.slot_type {
            return (1..=self.max_slot).collect();
        }
        let Some(t) = self.type_names.iter().position(|name| name == otype) else {
            return Vec::new();
        };
        self.composite_types
            .iter()
            .enumerate()
            .filter(|(_, &ct)| ct == t)
            .map(|(idx, _)| self.max_slot + 1 + idx as Node)
            .collect()
    }

    fn node_feature_names(&self) -> Vec<String> {
        self.node_features.keys().cloned().collect()
    }

    fn node_feature_type(&self, feature: &str) -> Option<ValueType> {
        self.node_features.get(feature).map(|f| f.value_type)
    }

    fn node_feature_value(&self, feature: &str, node: Node) -> Option<&FeatureValue> {
        self.node_features.get(feature)?.values.get(&node)
    }

    fn edge_feature_names(&self) -> Vec<String> {
        self.edge_features.keys().cloned().collect()
    }

    fn edge_feature_info(&self, feature: &str) -> Option<EdgeFeatureInfo> {
        self.edge_features.get(feature).map(|f| f.info)
    }

    fn edge_feature_targets(
        &self,
        feature: &str,
        node: Node,
        direction: EdgeDirection,
    ) -> Vec<(Node, Option<&FeatureValue>)> {
        let Some(edges) = self.edge_features.get(feature) else {
            return Vec::new();
        };
        if !self.in_range(node) {
            return Vec::new();
        }
        let mut out = Vec::new();
        match direction {
            EdgeDirection::Forward => extend_adjacent(&edges.forward, node, &mut out),
            EdgeDirection::Backward => extend_adjacent(&edges.backward, node, &mut out),
            EdgeDirection::Both => {
                extend_adjacent(&edges.forward, node, &mut out);
                extend_adjacent(&edges.backward, node, &mut out);
            }
        }
        out
    }
}

fn extend_adjacent<'a>(adjacency: &'a Adjacency, node: Node, out: &mut Vec<(Node, Option<&'a FeatureValue>)>) {
    if let Some(list) = adjacency.get(&node) {
        out.extend(list.iter().map(|(m, v)| (*m, v.as_ref())));
    }
}

/// Incremental builder for a [`MemoryCorpus`].
///
/// Composite nodes receive consecutive ids after the slots, in the order in
/// which they are added.
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    slot_type: String,
    max_slot: Node,
    composites: Vec<(String, Vec<Node>)>,
    node_values: BTreeMap<String, Vec<(Node, FeatureValue)>>,
    edge_declarations: BTreeMap<String, (bool, Option<ValueType>)>,
    edges: BTreeMap<String, Vec<(Node, Node, Option<FeatureValue>)>>,
}

impl CorpusBuilder {
    pub fn new(slot_type: &str, max_slot: Node) -> Self {
        Self {
            slot_type: slot_type.to_string(),
            max_slot,
            composites: Vec::new(),
            node_values: BTreeMap::new(),
            edge_declarations: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Add a composite node and return its id.
    pub fn add_node(&mut self, otype: &str, slots: &[Node]) -> Node {
        self.composites.push((otype.to_string(), slots.to_vec()));
        self.max_slot + self.composites.len() as Node
    }

    pub fn set_feature<V: Into<FeatureValue>>(&mut self, feature: &str, node: Node, value: V) -> &mut Self {
        self.node_values
            .entry(feature.to_string())
            .or_default()
            .push((node, value.into()));
        self
    }

    /// Set one feature on consecutive slots, starting at slot 1.
    pub fn set_slot_features<V: Into<FeatureValue> + Clone>(&mut self, feature: &str, values: &[V]) -> &mut Self {
        for (i, value) in values.iter().enumerate() {
            self.set_feature(feature, i as Node + 1, value.clone());
        }
        self
    }

    /// Declare an edge feature even if it ends up without edges.
    pub fn declare_edge_feature(&mut self, feature: &str, has_values: bool, value_type: Option<ValueType>) -> &mut Self {
        self.edge_declarations
            .insert(feature.to_string(), (has_values, value_type));
        self
    }

    pub fn add_edge(&mut self, feature: &str, from: Node, to: Node, value: Option<FeatureValue>) -> &mut Self {
        self.edges
            .entry(feature.to_string())
            .or_default()
            .push((from, to, value));
        self
    }

    pub fn build(self) -> Result<MemoryCorpus, CorpusError> {
        if self.max_slot == 0 {
            return Err(CorpusError::NoSlots);
        }
        let max_slot = self.max_slot;
        let max_node = max_slot + self.composites.len() as Node;

        let mut type_names: Vec<String> = Vec::new();
        let mut composite_types = Vec::with_capacity(self.composites.len());
        let mut composite_slots = Vec::with_capacity(self.composites.len());
        for (idx, (otype, slots)) in self.composites.into_iter().enumerate() {
            let node = max_slot + 1 + idx as Node;
            if otype == self.slot_type {
                return Err(CorpusError::SlotTypeReused(otype));
            }
            if slots.is_empty() {
                return Err(CorpusError::EmptySlots { node, otype });
            }
            if let Some(&slot) = slots.iter().find(|&&s| s == 0 || s > max_slot) {
                return Err(CorpusError::SlotOutOfRange { node, slot, max_slot });
            }
            let t = match type_names.iter().position(|name| *name == otype) {
                Some(t) => t,
                None => {
                    type_names.push(otype);
                    type_names.len() - 1
                }
            };
            let mut slots = slots;
            slots.sort_unstable();
            slots.dedup();
            composite_types.push(t);
            composite_slots.push(slots);
        }

        let check_node = |node: Node| -> Result<(), CorpusError> {
            if node == 0 || node > max_node {
                Err(CorpusError::NodeOutOfRange { node, max_node })
            } else {
                Ok(())
            }
        };

        let mut node_features = BTreeMap::new();
        for (name, values) in self.node_values {
            let Some(first) = values.first() else { continue };
            let value_type = first.1.value_type();
            let mut map = HashMap::with_capacity(values.len());
            for (node, value) in values {
                check_node(node)?;
                if value.value_type() != value_type {
                    return Err(CorpusError::MixedValueTypes {
                        feature: name,
                        expected: value_type,
                        found: value.value_type(),
                    });
                }
                map.insert(node, value);
            }
            node_features.insert(name, NodeFeature { value_type, values: map });
        }

        let mut edge_features: BTreeMap<String, EdgeFeature> = BTreeMap::new();
        for (name, (has_values, value_type)) in &self.edge_declarations {
            edge_features.insert(
                name.clone(),
                EdgeFeature {
                    info: EdgeFeatureInfo {
                        has_values: *has_values,
                        value_type: value_type.unwrap_or_default(),
                    },
                    forward: HashMap::new(),
                    backward: HashMap::new(),
                },
            );
        }
        for (name, edges) in self.edges {
            if node_features.contains_key(&name) {
                return Err(CorpusError::FeatureKindClash(name));
            }
            let declared = self.edge_declarations.get(&name).copied();
            let first_type = edges
                .iter()
                .find_map(|(_, _, v)| v.as_ref().map(FeatureValue::value_type));
            let value_type = declared
                .and_then(|(_, t)| t)
                .or(first_type)
                .unwrap_or_default();
            let has_values = declared.map(|(v, _)| v).unwrap_or(false) || first_type.is_some();
            let feature = edge_features.entry(name.clone()).or_insert_with(|| EdgeFeature {
                info: EdgeFeatureInfo { has_values, value_type },
                forward: HashMap::new(),
                backward: HashMap::new(),
            });
            feature.info = EdgeFeatureInfo { has_values, value_type };
            for (from, to, value) in edges {
                check_node(from)?;
                check_node(to)?;
                if let Some(v) = &value {
                    if v.value_type() != value_type {
                        return Err(CorpusError::MixedValueTypes {
                            feature: name,
                            expected: value_type,
                            found: v.value_type(),
                        });
                    }
                }
                feature.forward.entry(from).or_default().push((to, value.clone()));
                feature.backward.entry(to).or_default().push((from, value));
            }
        }

        log::debug!(
            "Built corpus: {} slots, {} composites, {} node features, {} edge features",
            max_slot,
            composite_slots.len(),
            node_features.len(),
            edge_features.len()
        );

        Ok(MemoryCorpus {
            slot_type: self.slot_type,
            max_slot,
            type_names,
            composite_types,
            composite_slots,
            node_features,
            edge_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryCorpus {
        let mut b = CorpusBuilder::new("word", 4);
        b.set_slot_features("text", &["a", "b", "c", "d"]);
        let p = b.add_node("phrase", &[2, 1]);
        b.add_node("phrase", &[3, 4, 4]);
        b.set_feature("number", p, 7i64);
        b.add_edge("mother", 1, 2, None);
        b.add_edge("distance", 1, 3, Some(FeatureValue::Int(5)));
        b.build().expect("corpus should build")
    }

    #[test]
    fn test_node_layout() {
        let corpus = sample();
        assert_eq!(corpus.max_slot(), 4);
        assert_eq!(corpus.max_node(), 6);
        assert_eq!(corpus.node_type(2), Some("word"));
        assert_eq!(corpus.node_type(5), Some("phrase"));
        assert_eq!(corpus.node_type(7), None);
        assert_eq!(corpus.slots_of(5), vec![1, 2]);
        assert_eq!(corpus.slots_of(6), vec![3, 4]);
        assert_eq!(corpus.slots_of(3), vec![3]);
        assert!(corpus.slots_of(0).is_empty());
        assert_eq!(corpus.nodes_of_type("phrase"), vec![5, 6]);
        assert_eq!(corpus.nodes_of_type("clause"), Vec::<Node>::new());
    }

    #[test]
    fn test_features() {
        let corpus = sample();
        assert_eq!(corpus.node_feature_type("text"), Some(ValueType::Str));
        assert_eq!(corpus.node_feature_type("number"), Some(ValueType::Int));
        assert_eq!(corpus.node_feature_value("number", 5), Some(&FeatureValue::Int(7)));
        assert_eq!(corpus.node_feature_value("number", 6), None);

        let mother = corpus.edge_feature_info("mother").expect("mother exists");
        assert!(!mother.has_values);
        let distance = corpus.edge_feature_info("distance").expect("distance exists");
        assert!(distance.has_values);
        assert_eq!(distance.value_type, ValueType::Int);

        let forward = corpus.edge_feature_targets("mother", 1, EdgeDirection::Forward);
        assert_eq!(forward, vec![(2, None)]);
        let backward = corpus.edge_feature_targets("mother", 2, EdgeDirection::Backward);
        assert_eq!(backward, vec![(1, None)]);
        assert!(corpus.edge_feature_targets("mother", 99, EdgeDirection::Both).is_empty());
    }

    #[test]
    fn test_invalid_corpus() {
        let mut b = CorpusBuilder::new("word", 2);
        b.add_node("phrase", &[1, 3]);
        match b.build() {
            Err(CorpusError::SlotOutOfRange { slot, .. }) => assert_eq!(slot, 3),
            other => panic!("Expected SlotOutOfRange, got {:?}", other),
        }

        let mut b = CorpusBuilder::new("word", 2);
        b.set_feature("n", 1, 1i64);
        b.set_feature("n", 2, "x");
        match b.build() {
            Err(CorpusError::MixedValueTypes { feature, .. }) => assert_eq!(feature, "n"),
            other => panic!("Expected MixedValueTypes, got {:?}", other),
        }
    }
}
