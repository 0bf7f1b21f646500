//! Label tries over trace variants.

use std::collections::BTreeMap;

/// A trie of label sequences. Node 0 is the empty sequence.
#[derive(Debug, Clone)]
pub(super) struct Trie {
    children: Vec<BTreeMap<u32, usize>>,
}

impl Trie {
    pub(super) fn new() -> Self {
        Self {
            children: vec![BTreeMap::new()],
        }
    }

    pub(super) fn len(&self) -> usize {
        self.children.len()
    }

    /// Insert a sequence and return the node of every prefix, the empty
    /// prefix first.
    pub(super) fn insert<I: IntoIterator<Item = u32>>(&mut self, labels: I) -> Vec<usize> {
        let mut node = 0;
        let mut path = vec![0];
        for label in labels {
            node = match self.children[node].get(&label) {
                Some(&child) => child,
                None => {
                    let child = self.children.len();
                    self.children.push(BTreeMap::new());
                    self.children[node].insert(label, child);
                    child
                }
            };
            path.push(node);
        }
        path
    }

    /// Whether `label` was seen right after the sequence ending at `node`.
    pub(super) fn follows(&self, node: usize, label: u32) -> bool {
        self.children[node].contains_key(&label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_prefix_shares_nodes() {
        let mut trie = Trie::new();
        let ab = trie.insert([0, 1]);
        let ac = trie.insert([0, 2]);
        assert_eq!(ab[1], ac[1]);
        assert_ne!(ab[2], ac[2]);
        assert_eq!(trie.len(), 4);
        assert!(trie.follows(ab[1], 1));
        assert!(trie.follows(ab[1], 2));
        assert!(!trie.follows(ab[2], 2));
    }

    #[test]
    fn test_reinsert_is_stable() {
        let mut trie = Trie::new();
        let first = trie.insert([3, 4, 5]);
        let second = trie.insert([3, 4, 5]);
        assert_eq!(first, second);
        assert_eq!(trie.len(), 4);
    }
}
