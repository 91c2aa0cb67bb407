//! Character trie answering "every entry starting with this prefix"

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<char, usize>,
    terminal: bool,
}

/// Arena-backed prefix index over a vocabulary.
///
/// Built once per expansion stage and dropped afterwards; there is no removal.
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    nodes: Vec<Node>,
    len: usize,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
        }
    }

    /// Insert a word. O(|word|).
    pub fn insert(&mut self, word: &str) {
        let mut idx = 0;
        for ch in word.chars() {
            idx = match self.nodes[idx].children.get(&ch) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[idx].children.insert(ch, next);
                    next
                }
            };
        }
        if !self.nodes[idx].terminal {
            self.nodes[idx].terminal = true;
            self.len += 1;
        }
    }

    fn find(&self, prefix: &str) -> Option<usize> {
        let mut idx = 0;
        for ch in prefix.chars() {
            idx = *self.nodes[idx].children.get(&ch)?;
        }
        Some(idx)
    }

    /// Whether `word` was inserted
    pub fn contains(&self, word: &str) -> bool {
        self.find(word)
            .map(|idx| self.nodes[idx].terminal)
            .unwrap_or(false)
    }

    /// Every inserted word starting with `prefix`, in no particular order.
    /// Empty when nothing matches.
    pub fn all_with_prefix(&self, prefix: &str) -> Vec<String> {
        let Some(start) = self.find(prefix) else {
            return Vec::new();
        };

        let mut results = Vec::new();
        // Explicit stack: deep vocabularies would otherwise recurse per character
        let mut stack = vec![(start, prefix.to_string())];
        while let Some((idx, word)) = stack.pop() {
            let node = &self.nodes[idx];
            if node.terminal {
                results.push(word.clone());
            }
            for (&ch, &child) in &node.children {
                let mut next = word.clone();
                next.push(ch);
                stack.push((child, next));
            }
        }
        results
    }

    /// Number of distinct words inserted
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PrefixIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = PrefixIndex::new();
        for word in iter {
            index.insert(word.as_ref());
        }
        index
    }
}
