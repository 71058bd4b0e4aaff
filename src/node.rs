//! A simple ordered tree with weak parent references
//!
//! A [`Node`] is a cheap handle: cloning it clones the reference, not the
//! node. Children are owned by their parent, the parent is referred to with a
//! weak reference, so a tree never contains reference cycles and a subtree that
//! is cut out does not keep its old tree alive.
//!
//! Node identity and structural equality are two different things: use
//! [`Node::same`] to see whether two handles point to the same node, and
//! [`Node::equals`] to compare two trees by content.

use std::any::TypeId;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::rc::{Rc, Weak};

use crate::error::{DomError, Result};

/// Payload carried by every [`Node`].
///
/// The payload decides the runtime "type" of a node, which is used by the
/// typed queries such as [`Node::children_of_type`].
pub trait NodeData {
    /// The exact type of this node.
    fn node_type(&self) -> TypeId;

    /// Whether this node is of type `ty` or of a type that derives from it.
    fn is_instance_of(&self, ty: TypeId) -> bool {
        self.node_type() == ty
    }

    /// Extra checks for [`Node::equals`], called before the children are
    /// compared.
    fn body_equals(&self, _other: &Self) -> bool {
        true
    }

    /// A copy of this payload for use in a new, unrelated tree.
    fn duplicate(&self) -> Self
    where
        Self: Sized;
}

struct NodeInner<T> {
    parent: RefCell<Weak<NodeInner<T>>>,
    children: RefCell<Vec<Node<T>>>,
    data: RefCell<T>,
}

/// A node in a tree.
pub struct Node<T>(Rc<NodeInner<T>>);

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Node<T> {
    pub fn new(data: T) -> Self {
        Self(Rc::new(NodeInner {
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            data: RefCell::new(data),
        }))
    }

    /// Append the children and return self, for building trees in one
    /// expression.
    ///
    /// # Panics
    ///
    /// Panics if one of the children is this node.
    pub fn with_children(self, children: impl IntoIterator<Item = Node<T>>) -> Self {
        self.extend(children);
        self
    }

    pub fn data(&self) -> Ref<'_, T> {
        self.0.data.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, T> {
        self.0.data.borrow_mut()
    }

    /// Whether both handles refer to the very same node.
    pub fn same(&self, other: &Node<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<Node<T>> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn root(&self) -> Node<T> {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }

    pub fn len(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.children.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Node<T>> {
        self.0.children.borrow().get(index).cloned()
    }

    pub fn first(&self) -> Option<Node<T>> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last(&self) -> Option<Node<T>> {
        self.0.children.borrow().last().cloned()
    }

    /// A snapshot of the current children.
    pub fn children(&self) -> Vec<Node<T>> {
        self.0.children.borrow().clone()
    }

    /// The index of `child` in our children, compared by identity.
    pub fn index_of(&self, child: &Node<T>) -> Option<usize> {
        self.0.children.borrow().iter().position(|n| n.same(child))
    }

    /// Our index in the parent.
    pub fn index(&self) -> Option<usize> {
        self.parent().and_then(|p| p.index_of(self))
    }

    /// Append a node; its parent is set to this node.
    ///
    /// A node that still has another parent is taken out of it first.
    ///
    /// # Panics
    ///
    /// Panics if `node` is this node or one of its ancestors.
    pub fn append(&self, node: Node<T>) {
        assert!(!self.is_self_or_descendant_of(&node), "{}", DomError::Cycle);
        self.adopt(&node);
        self.0.children.borrow_mut().push(node);
    }

    /// Append nodes; their parent is set to this node.
    ///
    /// # Panics
    ///
    /// Panics if one of the nodes is this node or one of its ancestors.
    pub fn extend(&self, nodes: impl IntoIterator<Item = Node<T>>) {
        for node in nodes {
            self.append(node);
        }
    }

    /// Insert a node at `index`; its parent is set to this node.
    pub fn insert(&self, index: usize, node: Node<T>) -> Result<()> {
        if self.is_self_or_descendant_of(&node) {
            return Err(DomError::Cycle);
        }
        let len = self.len();
        if index > len {
            return Err(DomError::IndexOutOfRange { index, len });
        }
        self.adopt(&node);
        let index = index.min(self.len());
        self.0.children.borrow_mut().insert(index, node);
        Ok(())
    }

    /// Remove and return the child at `index`; its parent is cleared.
    pub fn pop(&self, index: usize) -> Result<Node<T>> {
        let len = self.len();
        if index >= len {
            return Err(DomError::IndexOutOfRange { index, len });
        }
        let node = self.0.children.borrow_mut().remove(index);
        node.clear_parent();
        Ok(node)
    }

    /// Remove and return a range of children; their parents are cleared.
    ///
    /// This is the way to move nodes to another parent.
    pub fn take(&self, range: impl RangeBounds<usize>) -> Result<Vec<Node<T>>> {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&i) => i + 1,
            Bound::Excluded(&i) => i,
            Bound::Unbounded => len,
        };
        if end > len {
            return Err(DomError::IndexOutOfRange { index: end, len });
        }
        if start > end {
            return Err(DomError::IndexOutOfRange { index: start, len });
        }
        let nodes: Vec<Node<T>> = self.0.children.borrow_mut().drain(start..end).collect();
        for node in &nodes {
            node.clear_parent();
        }
        Ok(nodes)
    }

    /// Replace the child at `index` with `node`, returning the old child with
    /// its parent cleared.
    pub fn replace(&self, index: usize, node: Node<T>) -> Result<Node<T>> {
        if self.is_self_or_descendant_of(&node) {
            return Err(DomError::Cycle);
        }
        let len = self.len();
        let current = self
            .get(index)
            .ok_or(DomError::IndexOutOfRange { index, len })?;
        if current.same(&node) {
            return Ok(node);
        }
        self.adopt(&node);
        // the index shifts when node was one of our own children
        let index = self.index_of(&current).unwrap_or(index);
        let old = std::mem::replace(&mut self.0.children.borrow_mut()[index], node);
        old.clear_parent();
        Ok(old)
    }

    /// Remove `child` (found by identity), returning the index it had.
    pub fn remove(&self, child: &Node<T>) -> Option<usize> {
        let index = self.index_of(child)?;
        self.0.children.borrow_mut().remove(index);
        child.clear_parent();
        Some(index)
    }

    /// Take this node out of its parent, returning the index it had.
    pub fn detach(&self) -> Option<usize> {
        let parent = self.parent()?;
        let index = parent.index_of(self);
        if let Some(index) = index {
            parent.0.children.borrow_mut().remove(index);
        }
        self.clear_parent();
        index
    }

    /// Whether this is the first child of its parent.
    pub fn is_first(&self) -> Result<bool> {
        let parent = self.parent().ok_or(DomError::NoParent)?;
        Ok(parent.first().is_some_and(|n| n.same(self)))
    }

    /// Whether this is the last child of its parent.
    pub fn is_last(&self) -> Result<bool> {
        let parent = self.parent().ok_or(DomError::NoParent)?;
        Ok(parent.last().is_some_and(|n| n.same(self)))
    }

    /// Yield the parent, then the parent's parent, etcetera.
    pub fn ancestors(&self) -> Ancestors<T> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// All descendants in document order (pre-order, depth-first).
    pub fn descendants(&self) -> Descendants<T> {
        Descendants::over(self.children(), false)
    }

    /// All descendants backwards: children from last to first, every node
    /// before its own children.
    pub fn descendants_rev(&self) -> Descendants<T> {
        Descendants::over(self.children(), true)
    }

    /// The indices of this node and its ancestors in their parents, the
    /// node's own index at the end.
    ///
    /// Comparing trails tells which node comes first in the document.
    pub fn trail(&self) -> Vec<usize> {
        let mut trail: Vec<usize> = self.ancestors_with_index().map(|(_, i)| i).collect();
        trail.reverse();
        trail
    }

    /// Yield each ancestor with the index of the child on our path.
    pub fn ancestors_with_index(&self) -> impl Iterator<Item = (Node<T>, usize)> {
        let mut node = self.clone();
        std::iter::from_fn(move || {
            let parent = node.parent()?;
            let index = parent.index_of(&node)?;
            node = parent.clone();
            Some((parent, index))
        })
    }

    /// The lowest node that is an ancestor of (or equal to) both nodes.
    ///
    /// Returns None if the nodes live in different trees.
    pub fn common_ancestor(&self, other: &Node<T>) -> Option<Node<T>> {
        if self.same(other) {
            return Some(self.clone());
        }
        let mut ancestors = vec![self.clone()];
        for n in self.ancestors() {
            if n.same(other) {
                return Some(n);
            }
            ancestors.push(n);
        }
        other
            .ancestors()
            .find(|n| ancestors.iter().any(|a| a.same(n)))
    }

    /// Like [`Node::common_ancestor`], but also return the index paths from
    /// the ancestor to self and to the other node.
    ///
    /// An empty trail means that node is the ancestor itself.
    pub fn common_ancestor_with_trail(
        &self,
        other: &Node<T>,
    ) -> Option<(Node<T>, Vec<usize>, Vec<usize>)> {
        if self.same(other) {
            return Some((self.clone(), vec![], vec![]));
        }
        let mut ancestors = Vec::new();
        let mut trail_self = Vec::new();
        for (n, i) in self.ancestors_with_index() {
            trail_self.push(i);
            if n.same(other) {
                trail_self.reverse();
                return Some((n, trail_self, vec![]));
            }
            ancestors.push(n);
        }
        let mut trail_other = Vec::new();
        for (n, i) in other.ancestors_with_index() {
            trail_other.push(i);
            if n.same(self) {
                trail_other.reverse();
                return Some((n, vec![], trail_other));
            }
            if let Some(depth) = ancestors.iter().position(|a| a.same(&n)) {
                let mut trail_self = trail_self[..=depth].to_vec();
                trail_self.reverse();
                trail_other.reverse();
                return Some((n, trail_self, trail_other));
            }
        }
        None
    }

    /// The number of ancestors.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// The longest distance to a descendant.
    pub fn height(&self) -> usize {
        self.children()
            .iter()
            .map(|n| n.height() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn left_sibling(&self) -> Option<Node<T>> {
        let parent = self.parent()?;
        let index = parent.index_of(self)?;
        index.checked_sub(1).and_then(|i| parent.get(i))
    }

    pub fn right_sibling(&self) -> Option<Node<T>> {
        let parent = self.parent()?;
        let index = parent.index_of(self)?;
        parent.get(index + 1)
    }

    /// The left siblings, nearest first.
    pub fn left_siblings(&self) -> Vec<Node<T>> {
        let Some(parent) = self.parent() else {
            return vec![];
        };
        let children = parent.children();
        let index = children.iter().position(|n| n.same(self)).unwrap_or(0);
        children[..index].iter().rev().cloned().collect()
    }

    pub fn right_siblings(&self) -> Vec<Node<T>> {
        let Some(parent) = self.parent() else {
            return vec![];
        };
        let children = parent.children();
        match children.iter().position(|n| n.same(self)) {
            Some(index) => children[index + 1..].to_vec(),
            None => vec![],
        }
    }

    /// Iterate forward from this node in document order, starting with the
    /// right sibling. Does not leave `upto` if given.
    pub fn forward(&self, upto: Option<&Node<T>>) -> Walk<T> {
        Walk {
            cursor: Some(self.clone()),
            upto: upto.cloned(),
            walk: Descendants::over(vec![], false),
            reverse: false,
        }
    }

    /// Iterate backward from this node, starting with the left sibling.
    /// Does not leave `upto` if given.
    pub fn backward(&self, upto: Option<&Node<T>>) -> Walk<T> {
        Walk {
            cursor: Some(self.clone()),
            upto: upto.cloned(),
            walk: Descendants::over(vec![], true),
            reverse: true,
        }
    }

    fn is_self_or_descendant_of(&self, node: &Node<T>) -> bool {
        self.same(node) || self.ancestors().any(|a| a.same(node))
    }

    fn clear_parent(&self) {
        *self.0.parent.borrow_mut() = Weak::new();
    }

    /// Take the node out of a previous parent and make us its parent.
    fn adopt(&self, node: &Node<T>) {
        if let Some(old) = node.parent() {
            if !old.same(self) {
                log::warn!("re-parenting a node that still has a parent");
            }
            node.detach();
        }
        *node.0.parent.borrow_mut() = Rc::downgrade(&self.0);
    }
}

impl<T: NodeData> Node<T> {
    /// Whether this node is of type `K` or a type derived from it.
    pub fn is_a<K: 'static>(&self) -> bool {
        self.data().is_instance_of(TypeId::of::<K>())
    }

    /// Whether this node is of exactly type `K`.
    pub fn is_exactly<K: 'static>(&self) -> bool {
        self.data().node_type() == TypeId::of::<K>()
    }

    /// Children whose type is exactly `K` (derived types don't match).
    pub fn children_of_type<K: 'static>(&self) -> impl Iterator<Item = Node<T>> {
        self.children().into_iter().filter(|n| n.is_exactly::<K>())
    }

    /// Descendants of type `K` or a derived type, in document order.
    pub fn descendants_of_type<K: 'static>(&self) -> impl Iterator<Item = Node<T>> {
        self.descendants().filter(|n| n.is_a::<K>())
    }

    /// Descendants of type `K` or a derived type, without descending into
    /// the ones that match.
    pub fn instances_of<K: 'static>(&self) -> impl Iterator<Item = Node<T>> {
        let mut walk = self.descendants();
        std::iter::from_fn(move || {
            while let Some(n) = walk.next() {
                if n.is_a::<K>() {
                    walk.skip_children();
                    return Some(n);
                }
            }
            None
        })
    }

    /// The nearest ancestor of type `K` or a derived type.
    pub fn first_ancestor_of_type<K: 'static>(&self) -> Option<Node<T>> {
        self.ancestors().find(|n| n.is_a::<K>())
    }

    /// Compare two trees by content: same type, same number of children,
    /// [`NodeData::body_equals`], and all children equal.
    pub fn equals(&self, other: &Node<T>) -> bool {
        if self.same(other) {
            return true;
        }
        {
            let (a, b) = (self.data(), other.data());
            if a.node_type() != b.node_type() || self.len() != other.len() || !a.body_equals(&b) {
                return false;
            }
        }
        self.children()
            .iter()
            .zip(other.children().iter())
            .all(|(a, b)| a.equals(b))
    }

    /// A deep copy of this node without parent.
    pub fn copy(&self) -> Node<T> {
        let node = Node::new(self.data().duplicate());
        node.extend(self.children().iter().map(Node::copy));
        node
    }
}

impl<T: fmt::Debug> Node<T> {
    /// A graphical representation of the node and its contents.
    pub fn dump(&self) -> String {
        let mut output = String::new();
        self.dump_into(&mut output, &mut Vec::new());
        output
    }

    fn dump_into(&self, output: &mut String, prefix: &mut Vec<bool>) {
        if let Some((&last, ancestors)) = prefix.split_last() {
            for &done in ancestors {
                output.push_str(if done { "   " } else { " │ " });
            }
            output.push_str(if last { " ╰╴" } else { " ├╴" });
        }
        output.push_str(&format!("{:?}\n", self));
        let children = self.children();
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            prefix.push(i + 1 == count);
            child.dump_into(output, prefix);
            prefix.pop();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:?}", self.data())?;
        match self.len() {
            0 => {}
            1 => write!(f, " (1 child)")?,
            n => write!(f, " ({} children)", n)?,
        }
        write!(f, ">")
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<T> {
    next: Option<Node<T>>,
}

impl<T> Iterator for Ancestors<T> {
    type Item = Node<T>;

    fn next(&mut self) -> Option<Node<T>> {
        let node = self.next.take()?;
        self.next = node.parent();
        Some(node)
    }
}

/// Depth-first iterator over a list of nodes and their descendants.
pub struct Descendants<T> {
    stack: Vec<(Vec<Node<T>>, usize)>,
    reverse: bool,
    entered: bool,
}

impl<T> Descendants<T> {
    fn over(mut nodes: Vec<Node<T>>, reverse: bool) -> Self {
        if reverse {
            nodes.reverse();
        }
        Self {
            stack: vec![(nodes, 0)],
            reverse,
            entered: false,
        }
    }

    /// Don't yield the children of the node that was yielded last.
    pub fn skip_children(&mut self) {
        if self.entered {
            self.stack.pop();
            self.entered = false;
        }
    }
}

impl<T> Iterator for Descendants<T> {
    type Item = Node<T>;

    fn next(&mut self) -> Option<Node<T>> {
        self.entered = false;
        loop {
            let (nodes, index) = self.stack.last_mut()?;
            if let Some(node) = nodes.get(*index).cloned() {
                *index += 1;
                let mut children = node.children();
                if !children.is_empty() {
                    if self.reverse {
                        children.reverse();
                    }
                    self.stack.push((children, 0));
                    self.entered = true;
                }
                return Some(node);
            }
            self.stack.pop();
        }
    }
}

/// Iterator returned by [`Node::forward`] and [`Node::backward`].
pub struct Walk<T> {
    cursor: Option<Node<T>>,
    upto: Option<Node<T>>,
    walk: Descendants<T>,
    reverse: bool,
}

impl<T> Iterator for Walk<T> {
    type Item = Node<T>;

    fn next(&mut self) -> Option<Node<T>> {
        loop {
            if let Some(node) = self.walk.next() {
                return Some(node);
            }
            let node = self.cursor.take()?;
            if self.upto.as_ref().is_some_and(|u| u.same(&node)) {
                return None;
            }
            let parent = node.parent()?;
            let mut siblings = if self.reverse {
                node.left_siblings()
            } else {
                node.right_siblings()
            };
            if self.reverse {
                // Descendants::over reverses again
                siblings.reverse();
            }
            self.walk = Descendants::over(siblings, self.reverse);
            self.cursor = Some(parent);
        }
    }
}
