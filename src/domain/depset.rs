//! Persistent ordered sets shared between a module and everything that depends on it.
//!
//! A `DepSet` is immutable once built. Merging a dependency's set into a new one only
//! stores an `Arc` to it, so a set read by thousands of dependents is never copied.
//! Flattening walks direct items first, then each transitive set in insertion order,
//! keeping the first occurrence of every item.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

struct DepSetNode<T> {
    direct: Vec<T>,
    transitive: Vec<DepSet<T>>,
}

/// Insertion-ordered, deduplicating set with structural sharing.
pub struct DepSet<T> {
    root: Option<Arc<DepSetNode<T>>>,
}

impl<T> Clone for DepSet<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T> Default for DepSet<T> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<T: Clone + Eq + Hash> DepSet<T> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> DepSetBuilder<T> {
        DepSetBuilder::default()
    }

    /// Build a set from direct items and already-published transitive sets.
    pub fn new(direct: impl IntoIterator<Item = T>, transitive: impl IntoIterator<Item = DepSet<T>>) -> Self {
        let mut builder = Self::builder();
        builder.direct_all(direct);
        for set in transitive {
            builder.transitive(set);
        }
        builder.build()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Flatten into an ordered list, first occurrence wins.
    pub fn to_list(&self) -> Vec<T> {
        let mut out = Vec::new();
        let mut seen_items = HashSet::new();
        let mut seen_nodes = HashSet::new();
        if let Some(root) = &self.root {
            walk(root, &mut out, &mut seen_items, &mut seen_nodes);
        }
        out
    }

    pub fn contains(&self, item: &T) -> bool {
        self.to_list().contains(item)
    }

    /// True when both handles point at the same shared node.
    pub fn shares_storage_with(&self, other: &DepSet<T>) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

fn walk<T: Clone + Eq + Hash>(
    node: &Arc<DepSetNode<T>>,
    out: &mut Vec<T>,
    seen_items: &mut HashSet<T>,
    seen_nodes: &mut HashSet<*const DepSetNode<T>>,
) {
    // A node already walked cannot contribute anything new.
    if !seen_nodes.insert(Arc::as_ptr(node)) {
        return;
    }
    for item in &node.direct {
        if seen_items.insert(item.clone()) {
            out.push(item.clone());
        }
    }
    for child in &node.transitive {
        if let Some(child_root) = &child.root {
            walk(child_root, out, seen_items, seen_nodes);
        }
    }
}

/// Accumulates direct items and transitive sets for a single `DepSet`.
pub struct DepSetBuilder<T> {
    direct: Vec<T>,
    transitive: Vec<DepSet<T>>,
}

impl<T> Default for DepSetBuilder<T> {
    fn default() -> Self {
        Self {
            direct: Vec::new(),
            transitive: Vec::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> DepSetBuilder<T> {
    pub fn direct_all(&mut self, items: impl IntoIterator<Item = T>) -> &mut Self {
        self.direct.extend(items);
        self
    }

    pub fn transitive(&mut self, set: DepSet<T>) -> &mut Self {
        if !set.is_empty() {
            self.transitive.push(set);
        }
        self
    }

    pub fn build(&mut self) -> DepSet<T> {
        let mut direct = std::mem::take(&mut self.direct);
        let mut transitive = std::mem::take(&mut self.transitive);

        let mut seen = HashSet::new();
        direct.retain(|item| seen.insert(item.clone()));

        if direct.is_empty() {
            match transitive.len() {
                0 => return DepSet::empty(),
                // Reuse the only child instead of wrapping it.
                1 => return transitive.remove(0),
                _ => {}
            }
        }
        transitive.dedup_by(|a, b| a.shares_storage_with(b));

        DepSet {
            root: Some(Arc::new(DepSetNode { direct, transitive })),
        }
    }
}

impl<T: Clone + Eq + Hash + fmt::Debug> fmt::Debug for DepSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_list()).finish()
    }
}

impl<T: Clone + Eq + Hash + Serialize> Serialize for DepSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_items_precede_transitive() {
        let child = DepSet::new(["c", "d"], []);
        let set = DepSet::new(["a", "b"], [child]);
        assert_eq!(set.to_list(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let left = DepSet::new(["x", "shared"], []);
        let right = DepSet::new(["shared", "y"], []);
        let set = DepSet::new(["shared"], [left, right]);
        assert_eq!(set.to_list(), vec!["shared", "x", "y"]);
    }

    #[test]
    fn test_merge_does_not_mutate_children() {
        let child = DepSet::new(["c"], []);
        let parent = DepSet::new(["p"], [child.clone()]);
        assert_eq!(parent.to_list(), vec!["p", "c"]);
        assert_eq!(child.to_list(), vec!["c"]);
    }

    #[test]
    fn test_single_transitive_child_is_shared() {
        let child = DepSet::new(["c"], []);
        let parent = DepSet::new(Vec::<&str>::new(), [child.clone()]);
        assert!(parent.shares_storage_with(&child));
    }

    #[test]
    fn test_empty_sets_are_dropped() {
        let set: DepSet<&str> = DepSet::new([], [DepSet::empty(), DepSet::empty()]);
        assert!(set.is_empty());
        assert!(set.to_list().is_empty());
    }

    #[test]
    fn test_diamond_is_flattened_once() {
        let base = DepSet::new(["base"], []);
        let left = DepSet::new(["left"], [base.clone()]);
        let right = DepSet::new(["right"], [base]);
        let top = DepSet::new(["top"], [left, right]);
        assert_eq!(top.to_list(), vec!["top", "left", "base", "right"]);
    }

    #[test]
    fn test_serializes_as_flat_list() {
        let set = DepSet::new(["a"], [DepSet::new(["b", "a"], [])]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }
}
