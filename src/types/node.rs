use serde::{Deserialize, Serialize};

/// Identifier of a slot or composite object. Slots are `1..=max_slot`,
/// composites follow up to `max_node`. Node `0` is never valid.
pub type Node = u32;

/// Sorted, duplicate-free set of nodes.
///
/// Yarns, custom node sets and slot sets are all represented this way, which
/// keeps iteration order deterministic (ascending node id) and makes
/// membership a binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Build a set from nodes in any order, possibly with duplicates.
    pub fn from_unsorted(mut nodes: Vec<Node>) -> Self {
        nodes.sort_unstable();
        nodes.dedup();
        Self { nodes }
    }

    /// The full range `first..=last`.
    pub fn range(first: Node, last: Node) -> Self {
        if first > last {
            return Self::new();
        }
        Self { nodes: (first..=last).collect() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: Node) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.iter().copied()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    pub fn first(&self) -> Option<Node> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<Node> {
        self.nodes.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<Node> {
        self.nodes.get(index).copied()
    }

    pub fn retain<F: FnMut(Node) -> bool>(&mut self, mut keep: F) {
        self.nodes.retain(|&n| keep(n));
    }

    pub fn intersection(&self, other: &NodeSet) -> NodeSet {
        let (mut i, mut j) = (0, 0);
        let mut out = Vec::with_capacity(self.len().min(other.len()));
        while i < self.nodes.len() && j < other.nodes.len() {
            let (a, b) = (self.nodes[i], other.nodes[j]);
            if a < b {
                i += 1;
            } else if b < a {
                j += 1;
            } else {
                out.push(a);
                i += 1;
                j += 1;
            }
        }
        NodeSet { nodes: out }
    }

    pub fn difference(&self, other: &NodeSet) -> NodeSet {
        let nodes = self.nodes.iter().copied().filter(|&n| !other.contains(n)).collect();
        NodeSet { nodes }
    }

    pub fn union(&self, other: &NodeSet) -> NodeSet {
        let mut nodes = Vec::with_capacity(self.len() + other.len());
        nodes.extend_from_slice(&self.nodes);
        nodes.extend_from_slice(&other.nodes);
        NodeSet::from_unsorted(nodes)
    }

    /// True when every member of `self` is also in `other`.
    pub fn is_subset(&self, other: &NodeSet) -> bool {
        is_sorted_subset(&self.nodes, &other.nodes)
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        NodeSet::from_unsorted(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Subset test on two ascending, duplicate-free slices.
pub fn is_sorted_subset(small: &[Node], big: &[Node]) -> bool {
    if small.len() > big.len() {
        return false;
    }
    let mut j = 0;
    for &s in small {
        while j < big.len() && big[j] < s {
            j += 1;
        }
        if j == big.len() || big[j] != s {
            return false;
        }
        j += 1;
    }
    true
}

/// True when two ascending slices share at least one element.
pub fn sorted_overlap(a: &[Node], b: &[Node]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            i += 1;
        } else if b[j] < a[i] {
            j += 1;
        } else {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unsorted_dedups() {
        let set = NodeSet::from_unsorted(vec![5, 1, 3, 1, 5]);
        assert_eq!(set.as_slice(), &[1, 3, 5]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
    }

    #[test]
    fn test_set_operations() {
        let a = NodeSet::from_unsorted(vec![1, 2, 3, 4]);
        let b = NodeSet::from_unsorted(vec![3, 4, 5]);
        assert_eq!(a.intersection(&b).as_slice(), &[3, 4]);
        assert_eq!(a.difference(&b).as_slice(), &[1, 2]);
        assert_eq!(a.union(&b).as_slice(), &[1, 2, 3, 4, 5]);
        assert!(NodeSet::from_unsorted(vec![3, 4]).is_subset(&a));
        assert!(!b.is_subset(&a));
    }

    #[test]
    fn test_sorted_slice_helpers() {
        assert!(is_sorted_subset(&[2, 4], &[1, 2, 3, 4]));
        assert!(!is_sorted_subset(&[2, 5], &[1, 2, 3, 4]));
        assert!(is_sorted_subset(&[], &[1]));
        assert!(sorted_overlap(&[1, 5, 9], &[2, 5]));
        assert!(!sorted_overlap(&[1, 3], &[2, 4]));
    }

    #[test]
    fn test_range() {
        assert_eq!(NodeSet::range(2, 4).as_slice(), &[2, 3, 4]);
        assert!(NodeSet::range(4, 2).is_empty());
    }
}
