//! The text fragments of an element tree, in document order
//!
//! Every head and tail becomes a [`Point`], paired with the whitespace wanted
//! around it. Both writing and editing consume the points.

use crate::error::Result;

use super::element::Element;
use super::spacing::Space;
use super::whitespace::collapse_whitespace;

/// A piece of text: the head or tail of an element.
///
/// `pos` and `end` are the original position of the text; both are None for
/// new (synthetic) elements.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub pos: Option<usize>,
    pub end: Option<usize>,
    pub text: String,
    pub modified: bool,
}

impl Point {
    /// The original span, if known.
    pub fn span(&self) -> Option<(usize, usize)> {
        self.pos.zip(self.end)
    }
}

/// A [`Point`] with the whitespace desired before and after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacedPoint {
    pub before: String,
    pub point: Point,
    pub after: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Child(usize),
    Tail,
    Done,
}

struct Frame {
    node: Element,
    /// whitespace the parent wants after this element
    last: String,
    state: State,
    children: Vec<Element>,
    tail: Option<Point>,
    after: String,
    last_space: String,
}

impl Frame {
    fn new(node: Element, last: String) -> Self {
        Self {
            node,
            last,
            state: State::Start,
            children: Vec::new(),
            tail: None,
            after: String::new(),
            last_space: String::new(),
        }
    }

    /// Enter the element, maybe yielding its head.
    fn start(&mut self) -> Result<Option<SpacedPoint>> {
        let data = self.node.data();
        let head = data.head_point()?;
        self.tail = data.tail_point()?;
        self.after = collapse_whitespace([data.space(Space::After), self.last.as_str()]);
        self.last_space = if self.tail.is_some() {
            data.space(Space::BeforeTail).to_string()
        } else {
            self.after.clone()
        };
        self.children = self.node.children();
        let before = data.space(Space::Before).to_string();
        let spaced = if self.children.is_empty() {
            self.state = State::Tail;
            head.map(|point| SpacedPoint {
                before,
                point,
                after: self.last_space.clone(),
            })
        } else {
            self.state = State::Child(0);
            head.map(|point| SpacedPoint {
                before,
                point,
                after: data.space(Space::AfterHead).to_string(),
            })
        };
        Ok(spaced)
    }
}

/// Iterator over the text fragments of an element and its descendants.
///
/// Returned by [`Element::points`]. The children of every element are read
/// when the iterator reaches that element. After an error the iterator is
/// exhausted.
pub struct Points {
    stack: Vec<Frame>,
}

impl Points {
    pub(crate) fn new(node: Element) -> Self {
        Self {
            stack: vec![Frame::new(node, String::new())],
        }
    }
}

impl Iterator for Points {
    type Item = Result<SpacedPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            match frame.state {
                State::Start => match frame.start() {
                    Ok(Some(point)) => return Some(Ok(point)),
                    Ok(None) => {}
                    Err(e) => {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                },
                State::Child(i) => {
                    let Some(child) = frame.children.get(i).cloned() else {
                        frame.state = State::Tail;
                        continue;
                    };
                    frame.state = State::Child(i + 1);
                    let last = match frame.children.get(i + 1) {
                        Some(next) => frame.node.class().concat(&frame.node, &child, next),
                        None => frame.last_space.clone(),
                    };
                    self.stack.push(Frame::new(child, last));
                }
                State::Tail => {
                    frame.state = State::Done;
                    if let Some(point) = frame.tail.take() {
                        return Some(Ok(SpacedPoint {
                            before: frame.node.space(Space::BeforeTail),
                            point,
                            after: frame.after.clone(),
                        }));
                    }
                }
                State::Done => {
                    self.stack.pop();
                }
            }
        }
    }
}
