//! A part of a tree between two nodes
//!
//! A [`Range`] is an ancestor node plus optional trails (index paths, see
//! [`Node::trail`]) to its first and last node. Without trails the range
//! covers everything below the ancestor.
//!
//! The start node's children are in the range, the end node's children are
//! not; to include them, end the range at the last child you want.

use std::fmt;

use crate::error::{DomError, Result};
use crate::node::{Node, NodeData};

pub struct Range<T> {
    ancestor: Node<T>,
    start_trail: Option<Vec<usize>>,
    end_trail: Option<Vec<usize>>,
}

impl<T> Clone for Range<T> {
    fn clone(&self) -> Self {
        Self {
            ancestor: self.ancestor.clone(),
            start_trail: self.start_trail.clone(),
            end_trail: self.end_trail.clone(),
        }
    }
}

impl<T> Range<T> {
    /// A range below `ancestor`, the trails are relative to it.
    pub fn new(
        ancestor: Node<T>,
        start_trail: Option<Vec<usize>>,
        end_trail: Option<Vec<usize>>,
    ) -> Self {
        Self {
            ancestor,
            start_trail,
            end_trail,
        }
    }

    /// The range covering all descendants of `ancestor`.
    pub fn full(ancestor: Node<T>) -> Self {
        Self::new(ancestor, None, None)
    }

    /// The range from the start node up to and including the end node.
    ///
    /// Without a start node the range starts at the beginning of the tree,
    /// without an end node it runs to the end. The ancestor is the root if
    /// `from_root` is set or one node is missing, and otherwise the lowest
    /// common ancestor of both nodes.
    pub fn from_nodes(
        start: Option<&Node<T>>,
        end: Option<&Node<T>>,
        from_root: bool,
    ) -> Result<Self> {
        match (start, end) {
            (Some(start), Some(end)) if !from_root => {
                let (ancestor, start_trail, end_trail) = start
                    .common_ancestor_with_trail(end)
                    .ok_or(DomError::DifferentTrees)?;
                Ok(Self::new(ancestor, Some(start_trail), Some(end_trail)))
            }
            (Some(start), end) => {
                let root = start.root();
                if end.is_some_and(|end| !end.root().same(&root)) {
                    return Err(DomError::DifferentTrees);
                }
                Ok(Self::new(root, Some(start.trail()), end.map(Node::trail)))
            }
            (None, Some(end)) => Ok(Self::new(end.root(), None, Some(end.trail()))),
            (None, None) => Err(DomError::NoRangeNode),
        }
    }

    pub fn ancestor(&self) -> &Node<T> {
        &self.ancestor
    }

    pub fn start_trail(&self) -> Option<&[usize]> {
        self.start_trail.as_deref()
    }

    pub fn end_trail(&self) -> Option<&[usize]> {
        self.end_trail.as_deref()
    }

    fn follow(&self, trail: &[usize]) -> Option<Node<T>> {
        trail
            .iter()
            .try_fold(self.ancestor.clone(), |node, &i| node.get(i))
    }

    /// The first node, if the range has a start boundary.
    pub fn start_node(&self) -> Option<Node<T>> {
        self.follow(self.start_trail.as_deref()?)
    }

    /// The last node, if the range has an end boundary.
    pub fn end_node(&self) -> Option<Node<T>> {
        self.follow(self.end_trail.as_deref()?)
    }

    /// True if the end lies before the start, or there is nothing below the
    /// ancestor.
    pub fn is_empty(&self) -> bool {
        let start = self
            .start_trail
            .as_ref()
            .and_then(|t| t.first().copied())
            .unwrap_or(0);
        let end = match &self.end_trail {
            None => self.ancestor.len().checked_sub(1),
            Some(trail) => trail.first().copied(),
        };
        end.map_or(true, |end| start > end)
    }

    /// True if all descendants of the ancestor are in the range.
    pub fn is_full(&self) -> bool {
        let start_open = !self
            .start_trail
            .as_ref()
            .is_some_and(|t| t.iter().any(|&i| i > 0));
        start_open && self.end_open()
    }

    /// Whether the end boundary cuts nothing off.
    fn end_open(&self) -> bool {
        let Some(trail) = &self.end_trail else {
            return true;
        };
        let mut node = self.ancestor.clone();
        for &i in trail {
            if i + 1 < node.len() {
                return false;
            }
            match node.get(i) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.is_empty()
    }

    /// The trail from our ancestor to `node`, None if the node is not below
    /// the ancestor.
    pub fn trail_of(&self, node: &Node<T>) -> Option<Vec<usize>> {
        if node.same(&self.ancestor) {
            return Some(Vec::new());
        }
        let mut trail = Vec::new();
        for (parent, index) in node.ancestors_with_index() {
            trail.push(index);
            if parent.same(&self.ancestor) {
                trail.reverse();
                return Some(trail);
            }
        }
        None
    }

    fn trail_in_range(&self, trail: &[usize]) -> bool {
        if trail.is_empty() {
            return self.is_full();
        }
        let after_start = match self.start_trail.as_deref() {
            Some(start) if !start.is_empty() => trail >= start,
            _ => true,
        };
        after_start && self.end_trail.as_deref().map_or(true, |end| trail <= end)
    }

    fn trail_intersects(&self, trail: &[usize]) -> bool {
        let prefix = |bound: &[usize]| bound.len().min(trail.len());
        let after_start = match self.start_trail.as_deref() {
            Some(start) if !start.is_empty() => trail >= &start[..prefix(start)],
            _ => true,
        };
        let before_end = match self.end_trail.as_deref() {
            Some(end) if !end.is_empty() => trail <= &end[..prefix(end)],
            _ => true,
        };
        after_start && before_end
    }

    /// Whether the node lies completely within the range.
    ///
    /// The ancestor itself is only contained in a full range.
    pub fn contains(&self, node: &Node<T>) -> bool {
        self.trail_of(node)
            .is_some_and(|trail| self.trail_in_range(&trail))
    }

    /// Whether the node or some of its descendants lie within the range.
    pub fn intersects(&self, node: &Node<T>) -> bool {
        self.trail_of(node)
            .is_some_and(|trail| self.trail_intersects(&trail))
    }

    /// The nodes from the start node up to and including the end node, in
    /// document order.
    ///
    /// Without a start boundary this is every descendant of the ancestor up
    /// to the end node.
    pub fn nodes(&self) -> Vec<Node<T>> {
        let mut nodes = Vec::new();
        if !self.is_empty() {
            self.collect(&self.ancestor, &mut Vec::new(), &mut nodes);
        }
        nodes
    }

    fn collect(&self, node: &Node<T>, trail: &mut Vec<usize>, nodes: &mut Vec<Node<T>>) {
        for (index, child) in node.children().into_iter().enumerate() {
            trail.push(index);
            if self.trail_intersects(trail) {
                // ancestors of the start node intersect but come before it
                let after_start = match self.start_trail.as_deref() {
                    Some(start) => trail.as_slice() >= start,
                    None => true,
                };
                if after_start {
                    nodes.push(child.clone());
                }
                self.collect(&child, trail, nodes);
            }
            trail.pop();
        }
    }
}

impl<T: NodeData> Range<T> {
    /// A copy of the tree below the ancestor, with only the nodes that
    /// intersect the range.
    pub fn extract_tree(&self) -> Node<T> {
        let tree = Node::new(self.ancestor.data().duplicate());
        self.extract_into(&self.ancestor, &tree, &mut Vec::new());
        tree
    }

    fn extract_into(&self, node: &Node<T>, copy: &Node<T>, trail: &mut Vec<usize>) {
        for (index, child) in node.children().into_iter().enumerate() {
            trail.push(index);
            if self.trail_intersects(trail) {
                let child_copy = Node::new(child.data().duplicate());
                self.extract_into(&child, &child_copy, trail);
                copy.append(child_copy);
            }
            trail.pop();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Range @{:?}", self.ancestor)?;
        if let Some(start) = self.start_node() {
            write!(f, " start_node={:?}", start)?;
        }
        if let Some(end) = self.end_node() {
            write!(f, " end_node={:?}", end)?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Name(&'static str);

    impl NodeData for Name {
        fn node_type(&self) -> TypeId {
            TypeId::of::<Name>()
        }

        fn body_equals(&self, other: &Self) -> bool {
            self == other
        }

        fn duplicate(&self) -> Self {
            *self
        }
    }

    fn n(name: &'static str) -> Node<Name> {
        Node::new(Name(name))
    }

    /// a(b(c d) e(f g) h)
    fn tree() -> Node<Name> {
        n("a").with_children([
            n("b").with_children([n("c"), n("d")]),
            n("e").with_children([n("f"), n("g")]),
            n("h"),
        ])
    }

    fn names(nodes: Vec<Node<Name>>) -> Vec<&'static str> {
        nodes.iter().map(|n| n.data().0).collect()
    }

    fn at(node: &Node<Name>, trail: &[usize]) -> Node<Name> {
        trail
            .iter()
            .fold(node.clone(), |n, &i| n.get(i).expect("child exists"))
    }

    #[test]
    fn test_full_range() {
        let tree = tree();
        let r = Range::full(tree.clone());
        assert!(r.is_full());
        assert!(!r.is_empty());
        assert!(r.contains(&tree));
        assert_eq!(names(r.nodes()), ["b", "c", "d", "e", "f", "g", "h"]);
        assert!(r.extract_tree().equals(&tree));
        assert!(Range::full(n("x")).is_empty());
    }

    #[test]
    fn test_from_nodes() {
        let tree = tree();
        let d = at(&tree, &[0, 1]);
        let f = at(&tree, &[1, 0]);
        let r = Range::from_nodes(Some(&d), Some(&f), false).unwrap();
        assert!(r.ancestor().same(&tree));
        assert_eq!(r.start_trail(), Some(&[0, 1][..]));
        assert_eq!(r.end_trail(), Some(&[1, 0][..]));
        assert!(r.start_node().unwrap().same(&d));
        assert!(r.end_node().unwrap().same(&f));
        assert_eq!(names(r.nodes()), ["d", "e", "f"]);

        // a common ancestor below the root
        let c = at(&tree, &[0, 0]);
        let r = Range::from_nodes(Some(&c), Some(&d), false).unwrap();
        assert!(r.ancestor().same(&at(&tree, &[0])));
        let r = Range::from_nodes(Some(&c), Some(&d), true).unwrap();
        assert!(r.ancestor().same(&tree));
        assert_eq!(r.start_trail(), Some(&[0, 0][..]));

        let r = Range::from_nodes(None, Some(&f), false).unwrap();
        assert_eq!(r.start_trail(), None);
        assert_eq!(names(r.nodes()), ["b", "c", "d", "e", "f"]);

        assert_eq!(
            Range::<Name>::from_nodes(None, None, false).unwrap_err(),
            DomError::NoRangeNode
        );
        let other = tree.copy();
        assert_eq!(
            Range::from_nodes(Some(&d), Some(&other), false).unwrap_err(),
            DomError::DifferentTrees
        );
        assert_eq!(
            Range::from_nodes(Some(&d), Some(&at(&other, &[2])), true).unwrap_err(),
            DomError::DifferentTrees
        );
    }

    #[test]
    fn test_contains_and_intersects() {
        let tree = tree();
        let r = Range::from_nodes(Some(&at(&tree, &[0, 1])), Some(&at(&tree, &[1, 0])), false)
            .unwrap();
        let b = at(&tree, &[0]);
        let e = at(&tree, &[1]);
        // b and e are cut by the boundaries
        assert!(!r.contains(&b));
        assert!(r.intersects(&b));
        assert!(r.intersects(&e));
        assert!(!r.contains(&at(&tree, &[0, 0])));
        assert!(!r.intersects(&at(&tree, &[0, 0])));
        assert!(r.contains(&at(&tree, &[0, 1])));
        assert!(!r.intersects(&at(&tree, &[1, 1])));
        assert!(!r.intersects(&at(&tree, &[2])));
        assert!(!r.contains(&tree));
        assert!(!r.is_full());
        assert!(!r.contains(&n("x")));
    }

    #[test]
    fn test_empty_when_reversed() {
        let tree = tree();
        let r = Range::new(tree.clone(), Some(vec![2]), Some(vec![0]));
        assert!(r.is_empty());
        assert!(r.nodes().is_empty());
        // the end node's children are not in the range
        let r = Range::from_nodes(None, Some(&at(&tree, &[1])), false).unwrap();
        assert_eq!(names(r.nodes()), ["b", "c", "d", "e"]);
    }

    #[test]
    fn test_extract_tree() {
        let tree = tree();
        let r = Range::from_nodes(Some(&at(&tree, &[0, 1])), Some(&at(&tree, &[1, 0])), false)
            .unwrap();
        let extract = r.extract_tree();
        let expected = n("a").with_children([
            n("b").with_children([n("d")]),
            n("e").with_children([n("f")]),
        ]);
        assert!(extract.equals(&expected));
        assert!(extract.parent().is_none());
    }
}
