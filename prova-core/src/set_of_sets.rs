use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Clone, Debug, Default)]
struct TrieNode {
    children: BTreeMap<usize, usize>,
    terminal: bool,
}

/// Collection of sets answering "is some stored set a subset of this candidate?".
///
/// Elements get a rank the first time they are added. Every stored set is a path
/// through a prefix tree with ranks ascending, so a subset query only descends
/// into children whose rank occurs in the candidate.
#[derive(Clone, Debug)]
pub struct SetOfSets<T> {
    ranks: HashMap<T, usize>,
    elements: Vec<T>,
    nodes: Vec<TrieNode>,
    len: usize,
}

impl<T: Clone + Eq + Hash> Default for SetOfSets<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> SetOfSets<T> {
    pub fn new() -> Self {
        Self {
            ranks: HashMap::new(),
            elements: Vec::new(),
            nodes: vec![TrieNode::default()],
            len: 0,
        }
    }

    /// Number of distinct stored sets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn add_singleton(&mut self, element: T) {
        self.add([element]);
    }

    pub fn add<I: IntoIterator<Item = T>>(&mut self, set: I) {
        let mut path: Vec<usize> = set.into_iter().map(|e| self.rank_or_assign(e)).collect();
        path.sort_unstable();
        path.dedup();

        let mut node = 0;
        for rank in path {
            node = match self.nodes[node].children.get(&rank) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(rank, child);
                    child
                }
            };
        }
        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.len += 1;
        }
    }

    /// True iff some stored set is contained in `candidate`. Read-only.
    pub fn contains_subset_of<'a, I>(&self, candidate: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        if self.len == 0 {
            return false;
        }
        // Elements never added cannot be on any stored path.
        let mut ranks: Vec<usize> = candidate
            .into_iter()
            .filter_map(|e| self.ranks.get(e).copied())
            .collect();
        ranks.sort_unstable();
        ranks.dedup();

        let mut stack = vec![(0usize, 0usize)];
        while let Some((node, from)) = stack.pop() {
            let trie = &self.nodes[node];
            if trie.terminal {
                return true;
            }
            for (i, rank) in ranks.iter().enumerate().skip(from) {
                if let Some(&child) = trie.children.get(rank) {
                    stack.push((child, i + 1));
                }
            }
        }
        false
    }

    /// Stored sets, each listed in rank order.
    pub fn sets(&self) -> Vec<Vec<T>> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![(0usize, Vec::<usize>::new())];
        while let Some((node, path)) = stack.pop() {
            let trie = &self.nodes[node];
            if trie.terminal {
                out.push(path.iter().map(|&r| self.elements[r].clone()).collect());
            }
            for (&rank, &child) in &trie.children {
                let mut next = path.clone();
                next.push(rank);
                stack.push((child, next));
            }
        }
        out
    }

    fn rank_or_assign(&mut self, element: T) -> usize {
        if let Some(&rank) = self.ranks.get(&element) {
            return rank;
        }
        let rank = self.elements.len();
        self.elements.push(element.clone());
        self.ranks.insert(element, rank);
        rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SetOfSets<char> {
        let mut s = SetOfSets::new();
        s.add(['A', 'B']);
        s.add_singleton('C');
        s
    }

    #[test]
    fn test_contains_subset_of_superset_candidates() {
        let s = fixture();
        assert!(s.contains_subset_of(&['A', 'B', 'C']));
        assert!(s.contains_subset_of(&['C', 'D']));
        assert!(s.contains_subset_of(&['B', 'A']));
    }

    #[test]
    fn test_partial_overlap_is_not_a_subset() {
        let s = fixture();
        assert!(!s.contains_subset_of(&['A', 'D']));
        assert!(!s.contains_subset_of(&['B']));
        assert!(!s.contains_subset_of(&[]));
    }

    #[test]
    fn test_match_skips_elements_between_path_ranks() {
        let mut s = SetOfSets::new();
        s.add([1, 2, 3]);
        s.add([1, 3]);
        assert!(s.contains_subset_of(&[3, 1]));
        assert!(!s.contains_subset_of(&[1, 2]));
    }

    #[test]
    fn test_empty_store_and_empty_member() {
        let mut s: SetOfSets<u8> = SetOfSets::new();
        assert!(!s.contains_subset_of(&[1, 2]));
        s.add(Vec::new());
        assert!(s.contains_subset_of(&[]));
    }

    #[test]
    fn test_duplicates_are_not_counted_twice() {
        let mut s = fixture();
        s.add(['B', 'A', 'A']);
        assert_eq!(s.len(), 2);
        let mut sets = s.sets();
        sets.sort();
        assert_eq!(sets, vec![vec!['A', 'B'], vec!['C']]);
    }

    #[test]
    fn test_ranks_survive_later_additions() {
        let mut s = fixture();
        assert!(s.contains_subset_of(&['A', 'B']));
        s.add(['Z', 'A']);
        assert!(s.contains_subset_of(&['A', 'B']));
        assert!(s.contains_subset_of(&['A', 'Z']));
        assert!(!s.contains_subset_of(&['Z']));
    }
}
