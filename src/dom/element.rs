//! Elements: nodes with a head, a tail and whitespace preferences
//!
//! An [`Element`] is a [`Node`] carrying [`ElementData`]. The behaviour of an
//! element (how its head is read and written, its default spacing, how it
//! indents its children) is defined by its type, an [`ElementType`]
//! implemented by a unit struct.
//!
//! Elements are created in one of three ways:
//!
//! * [`Element::create`] and [`Element::with_head`], for hand-built trees;
//! * [`Element::from_origin`], reading head and tail from tokens, but without
//!   remembering them;
//! * [`Element::with_origin`], which also keeps the tokens, so the element
//!   knows where it lives in the source and can write back its changes.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::{DomError, Result};
use crate::node::{Node, NodeData};
use crate::token::Token;

use super::points::{Point, Points};
use super::spacing::{Space, SpaceOverrides, Spacing};
use super::value::{Mapped, Value};
use super::whitespace::combine_text;

/// An element in a document tree.
pub type Element = Node<ElementData>;

/// Upcast helper, so element types can be compared by their `TypeId`.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Which fragments an element type can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No head and no tail, only children.
    Bare,
    /// A head before the children.
    Head,
    /// A head before and a tail after the children.
    Block,
}

/// The type of an element.
///
/// Implement this for a unit struct and pass `&YourType` to the element
/// constructors. Every method has a default, so a type only overrides what
/// differs.
pub trait ElementType: AsAny {
    fn name(&self) -> &'static str;

    fn shape(&self) -> Shape {
        Shape::Head
    }

    /// Default whitespace preferences.
    fn spacing(&self) -> Spacing {
        Spacing::NONE
    }

    /// Head value of a newly created element.
    fn default_head(&self) -> Option<Value> {
        None
    }

    /// Tail value of a newly created element.
    fn default_tail(&self) -> Option<Value> {
        None
    }

    /// A fixed set of head texts and the values they stand for.
    ///
    /// If not empty, the default head hooks go through the mapping: only the
    /// mapped values are valid heads, and each is written as its text.
    fn mapping(&self) -> &'static [(&'static str, Mapped)] {
        &[]
    }

    /// Child types this element takes as arguments, see [`build_tree`].
    ///
    /// Every signature is a sequence of types; a type matches derived types
    /// too.
    ///
    /// [`build_tree`]: super::build_tree
    fn signatures(&self) -> Vec<Vec<TypeId>> {
        Vec::new()
    }

    /// Whether the value is acceptable as head.
    fn check_head(&self, head: &Value) -> bool {
        let mapping = self.mapping();
        mapping.is_empty() || mapping.iter().any(|(_, v)| *v == *head)
    }

    /// Compute the head value from its origin tokens.
    ///
    /// The default looks the text up in the [mapping], or else concatenates
    /// the token texts.
    ///
    /// [mapping]: ElementType::mapping
    fn read_head(&self, origin: &[Token]) -> Value {
        let text: String = origin.iter().map(|t| t.text.as_str()).collect();
        match self.mapping().iter().find(|(t, _)| *t == text) {
            Some((_, v)) => Value::from(*v),
            None => Value::Text(text),
        }
    }

    /// Compute the tail value from its origin tokens.
    fn read_tail(&self, origin: &[Token]) -> Value {
        Value::Text(origin.iter().map(|t| t.text.as_str()).collect())
    }

    /// The text representing the head value.
    fn write_head(&self, head: &Value) -> Result<String> {
        let mapping = self.mapping();
        if mapping.is_empty() {
            return Ok(head.to_string());
        }
        mapping
            .iter()
            .find(|(_, v)| *v == *head)
            .map(|(t, _)| t.to_string())
            .ok_or_else(|| DomError::InvalidHead {
                element: self.name(),
                value: head.to_string(),
            })
    }

    /// The text representing the tail value.
    fn write_tail(&self, tail: &Value) -> Result<String> {
        Ok(tail.to_string())
    }

    /// Minimum whitespace between two adjacent children of `parent`.
    fn concat(&self, parent: &Element, _node: &Element, _next: &Element) -> String {
        parent.space(Space::Between)
    }

    /// Whether the children indent a level when they start a new line.
    fn indent_children(&self) -> bool {
        self.shape() == Shape::Block
    }

    /// Child indices a new line may align with, in order of preference.
    fn indent_align_indices(&self, _node: &Element) -> Vec<usize> {
        Vec::new()
    }

    /// Indent to use when this element is the first on a new line,
    /// regardless of nesting.
    fn indent_override(&self, _node: &Element) -> Option<usize> {
        None
    }

    /// Whether this type is `ty` or derives from it.
    fn is_instance_of(&self, ty: TypeId) -> bool {
        Any::type_id(self.as_any()) == ty
    }
}

/// A placeholder for source text that has not been transformed.
///
/// It keeps its position, but can't be written.
#[derive(Debug)]
pub struct Unknown;

impl ElementType for Unknown {
    fn name(&self) -> &'static str {
        "Unknown"
    }

    fn write_head(&self, _head: &Value) -> Result<String> {
        Err(DomError::Unresolved { element: self.name() })
    }
}

/// Where the head and tail of an element came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Origin {
    /// Created by a program, no position in the source.
    #[default]
    Synthetic,
    /// Read from source; the tokens give the position of head and tail.
    Positioned { head: Vec<Token>, tail: Vec<Token> },
}

impl Origin {
    pub fn is_positioned(&self) -> bool {
        matches!(self, Origin::Positioned { .. })
    }

    pub fn head(&self) -> &[Token] {
        match self {
            Origin::Positioned { head, .. } => head,
            Origin::Synthetic => &[],
        }
    }

    pub fn tail(&self) -> &[Token] {
        match self {
            Origin::Positioned { tail, .. } => tail,
            Origin::Synthetic => &[],
        }
    }
}

fn span(tokens: &[Token]) -> (Option<usize>, Option<usize>) {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (Some(first.pos), Some(last.end)),
        _ => (None, None),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Modified {
    head: bool,
    tail: bool,
}

/// The payload of an [`Element`] node.
pub struct ElementData {
    class: &'static dyn ElementType,
    head: Option<Value>,
    tail: Option<Value>,
    origin: Origin,
    modified: Modified,
    spaces: SpaceOverrides,
}

impl ElementData {
    pub fn new(class: &'static dyn ElementType) -> Self {
        let (head, tail) = match class.shape() {
            Shape::Bare => (None, None),
            Shape::Head => (class.default_head(), None),
            Shape::Block => (class.default_head(), class.default_tail()),
        };
        Self {
            class,
            head,
            tail,
            origin: Origin::Synthetic,
            modified: Modified::default(),
            spaces: SpaceOverrides::default(),
        }
    }

    pub fn class(&self) -> &'static dyn ElementType {
        self.class
    }

    pub fn name(&self) -> &'static str {
        self.class.name()
    }

    pub fn head(&self) -> Option<&Value> {
        self.head.as_ref()
    }

    pub fn tail(&self) -> Option<&Value> {
        self.tail.as_ref()
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn is_head_modified(&self) -> bool {
        self.modified.head
    }

    pub fn is_tail_modified(&self) -> bool {
        self.modified.tail
    }

    /// Set the head value; marks the head modified if the value changes.
    pub fn set_head(&mut self, head: Value) -> Result<()> {
        if self.class.shape() == Shape::Bare {
            return Err(DomError::NoHead { element: self.name() });
        }
        if !self.class.check_head(&head) {
            return Err(DomError::InvalidHead {
                element: self.name(),
                value: head.to_string(),
            });
        }
        if self.head.as_ref() != Some(&head) {
            self.head = Some(head);
            self.modified.head = true;
        }
        Ok(())
    }

    /// Set the tail value; marks the tail modified if the value changes.
    pub fn set_tail(&mut self, tail: Value) -> Result<()> {
        if self.class.shape() != Shape::Block {
            return Err(DomError::NoTail { element: self.name() });
        }
        if self.tail.as_ref() != Some(&tail) {
            self.tail = Some(tail);
            self.modified.tail = true;
        }
        Ok(())
    }

    /// The whitespace preference, our own value or else the type's default.
    pub fn space(&self, space: Space) -> &str {
        self.spaces
            .get(space)
            .unwrap_or_else(|| self.class.spacing().get(space))
    }

    pub fn set_space(&mut self, space: Space, value: &str) {
        self.spaces
            .set(space, value, self.class.spacing().get(space));
    }

    /// The head text, None if this element prints no head.
    pub fn write_head(&self) -> Result<Option<String>> {
        match (&self.head, self.class.shape()) {
            (Some(head), Shape::Head | Shape::Block) => self.class.write_head(head).map(Some),
            _ => Ok(None),
        }
    }

    /// The tail text, None if this element prints no tail.
    pub fn write_tail(&self) -> Result<Option<String>> {
        match (&self.tail, self.class.shape()) {
            (Some(tail), Shape::Block) => self.class.write_tail(tail).map(Some),
            _ => Ok(None),
        }
    }

    pub fn head_point(&self) -> Result<Option<Point>> {
        if self.class.shape() == Shape::Bare {
            return Ok(None);
        }
        let (pos, end) = span(self.origin.head());
        Ok(Some(Point {
            pos,
            end,
            text: self.write_head()?.unwrap_or_default(),
            modified: self.modified.head,
        }))
    }

    pub fn tail_point(&self) -> Result<Option<Point>> {
        if self.class.shape() != Shape::Block {
            return Ok(None);
        }
        // the tail may have been missing in the source
        let (pos, end) = span(self.origin.tail());
        Ok(Some(Point {
            pos,
            end,
            text: self.write_tail()?.unwrap_or_default(),
            modified: self.modified.tail,
        }))
    }

    /// Take over the origin of another element.
    ///
    /// With `modified` set, the fragments that have an origin are flagged
    /// modified so they are written back; otherwise the flags are copied.
    /// Only a block has a tail to flag.
    fn copy_origin(&mut self, other: &ElementData, modified: bool) {
        self.origin = other.origin.clone();
        self.modified = if modified {
            let positioned = self.origin.is_positioned();
            Modified {
                head: positioned,
                tail: positioned && self.class.shape() == Shape::Block,
            }
        } else {
            other.modified
        };
    }
}

impl NodeData for ElementData {
    fn node_type(&self) -> TypeId {
        Any::type_id(self.class.as_any())
    }

    fn is_instance_of(&self, ty: TypeId) -> bool {
        self.class.is_instance_of(ty)
    }

    fn body_equals(&self, other: &Self) -> bool {
        self.head == other.head && self.tail == other.tail
    }

    fn duplicate(&self) -> Self {
        Self {
            class: self.class,
            head: self.head.clone(),
            tail: self.tail.clone(),
            origin: Origin::Synthetic,
            modified: Modified::default(),
            spaces: self.spaces.clone(),
        }
    }
}

impl fmt::Debug for ElementData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        // only variable heads are shown
        if self.class.default_head().is_none() {
            match &self.head {
                Some(Value::Text(s)) => write!(f, " {:?}", s)?,
                Some(v) => write!(f, " {}", v)?,
                None => {}
            }
        }
        if let (Some(pos), head_end) = span(self.origin.head()) {
            let end = span(self.origin.tail()).1.or(head_end).unwrap_or(pos);
            write!(f, " [{}:{}]", pos, end)?;
        }
        Ok(())
    }
}

impl Node<ElementData> {
    /// Create a synthetic element with the type's default head and tail.
    pub fn create(class: &'static dyn ElementType) -> Element {
        Node::new(ElementData::new(class))
    }

    /// Create a synthetic element with a head value.
    pub fn with_head(class: &'static dyn ElementType, head: impl Into<Value>) -> Result<Element> {
        let mut data = ElementData::new(class);
        data.set_head(head.into())?;
        data.modified = Modified::default();
        Ok(Node::new(data))
    }

    /// Create an element reading head and tail from the tokens, without
    /// keeping the tokens.
    pub fn from_origin(
        class: &'static dyn ElementType,
        head_origin: &[Token],
        tail_origin: &[Token],
    ) -> Element {
        let mut data = ElementData::new(class);
        if data.class.shape() != Shape::Bare && !head_origin.is_empty() {
            data.head = Some(class.read_head(head_origin));
        }
        if data.class.shape() == Shape::Block && !tail_origin.is_empty() {
            data.tail = Some(class.read_tail(tail_origin));
        }
        Node::new(data)
    }

    /// Create an element reading head and tail from the tokens, and keep the
    /// tokens so the element knows its position.
    pub fn with_origin(
        class: &'static dyn ElementType,
        head_origin: &[Token],
        tail_origin: &[Token],
    ) -> Element {
        let node = Self::from_origin(class, head_origin, tail_origin);
        node.data_mut().origin = Origin::Positioned {
            head: head_origin.to_vec(),
            tail: tail_origin.to_vec(),
        };
        node
    }

    /// Set a whitespace preference and return self.
    pub fn with_space(self, space: Space, value: &str) -> Element {
        self.set_space(space, value);
        self
    }

    pub fn class(&self) -> &'static dyn ElementType {
        self.data().class
    }

    pub fn head(&self) -> Option<Value> {
        self.data().head.clone()
    }

    pub fn tail(&self) -> Option<Value> {
        self.data().tail.clone()
    }

    pub fn set_head(&self, head: impl Into<Value>) -> Result<()> {
        self.data_mut().set_head(head.into())
    }

    pub fn set_tail(&self, tail: impl Into<Value>) -> Result<()> {
        self.data_mut().set_tail(tail.into())
    }

    pub fn space(&self, space: Space) -> String {
        self.data().space(space).to_string()
    }

    pub fn set_space(&self, space: Space, value: &str) {
        self.data_mut().set_space(space, value);
    }

    pub fn head_point(&self) -> Result<Option<Point>> {
        self.data().head_point()
    }

    pub fn tail_point(&self) -> Result<Option<Point>> {
        self.data().tail_point()
    }

    /// Deep copy including the origin and the modified flags.
    pub fn copy_with_origin(&self) -> Element {
        let data = self.data();
        let mut copy = data.duplicate();
        copy.copy_origin(&data, false);
        let node = Node::new(copy);
        node.extend(self.children().iter().map(Element::copy_with_origin));
        node
    }

    /// Replace the child at `index` with `node`, which takes over the origin
    /// of the old child, so it is written at the same place in the source.
    ///
    /// Returns the old child.
    pub fn replace_at(&self, index: usize, node: Element) -> Result<Element> {
        let old = self.get(index).ok_or(DomError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        if !old.same(&node) {
            node.data_mut().copy_origin(&old.data(), true);
        }
        self.replace(index, node)
    }

    /// Replace this element in its parent, see [`Element::replace_at`].
    pub fn replace_with(&self, node: Element) -> Result<Element> {
        let parent = self.parent().ok_or(DomError::NoParent)?;
        let index = parent.index_of(self).ok_or(DomError::NoParent)?;
        parent.replace_at(index, node)
    }

    fn head_pos(&self) -> Option<usize> {
        self.data().origin.head().first().map(|t| t.pos)
    }

    /// The position of this element in the source.
    ///
    /// Uses our own origin, else the first descendant that has one. Returns
    /// None if no element in this subtree has an origin.
    pub fn pos(&self) -> Option<usize> {
        self.head_pos()
            .or_else(|| self.descendants().find_map(|n| n.head_pos()))
    }

    /// The end position of this element in the source.
    pub fn end(&self) -> Option<usize> {
        let (head_end, tail_end) = {
            let data = self.data();
            (span(data.origin.head()).1, span(data.origin.tail()).1)
        };
        tail_end
            .or_else(|| self.children().iter().rev().find_map(|n| n.end()))
            .or(head_end)
    }

    /// The child touching `position`; of two touching children the right one.
    ///
    /// Children without position are skipped.
    pub fn find_child(&self, position: usize) -> Option<Element> {
        let children = self.children();
        let (mut lo, mut hi) = (0, children.len());
        let mut found = None;
        while lo < hi {
            let mid = (lo + hi) / 2;
            match (mid..hi).find_map(|i| children[i].pos().map(|pos| (i, pos))) {
                // mid..hi has no position at all
                None => hi = mid,
                Some((i, pos)) if pos <= position => {
                    found = Some(i);
                    lo = i + 1;
                }
                Some(_) => hi = mid,
            }
        }
        let node = children.get(found?)?;
        (node.end()? >= position).then(|| node.clone())
    }

    /// The child containing `position`, then the grandchild, etc.
    pub fn find_descendants(&self, position: usize) -> Vec<Element> {
        let mut path = Vec::new();
        let mut node = self.find_child(position);
        while let Some(n) = node {
            match (n.pos(), n.end()) {
                (Some(pos), Some(end)) if pos <= position && position <= end => {
                    node = n.find_child(position);
                    path.push(n);
                }
                _ => break,
            }
        }
        path
    }

    /// The deepest descendant containing `position`.
    pub fn find_descendant(&self, position: usize) -> Option<Element> {
        self.find_descendants(position).pop()
    }

    /// The text fragments of this subtree with their whitespace.
    pub fn points(&self) -> Points {
        Points::new(self.clone())
    }

    /// The text of this element and its children, not indented.
    pub fn write(&self) -> Result<String> {
        let points = self.points().collect::<Result<Vec<_>>>()?;
        let (_, text, _) = combine_text(
            points
                .iter()
                .map(|p| (&p.before, &p.point.text, &p.after)),
        );
        Ok(text)
    }
}
