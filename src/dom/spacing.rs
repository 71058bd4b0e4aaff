//! Whitespace preferences of elements

/// The five places where an element has a whitespace preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// before the element
    Before,
    /// after the head, before the first child
    AfterHead,
    /// between the children
    Between,
    /// after the last child, before the tail
    BeforeTail,
    /// after the element
    After,
}

impl Space {
    pub const ALL: [Space; 5] = [
        Space::Before,
        Space::AfterHead,
        Space::Between,
        Space::BeforeTail,
        Space::After,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// The default whitespace preferences of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing {
    pub before: &'static str,
    pub after_head: &'static str,
    pub between: &'static str,
    pub before_tail: &'static str,
    pub after: &'static str,
}

impl Spacing {
    /// No whitespace anywhere.
    pub const NONE: Spacing = Spacing {
        before: "",
        after_head: "",
        between: "",
        before_tail: "",
        after: "",
    };

    /// Whitespace between the children only.
    pub const fn between(between: &'static str) -> Spacing {
        Spacing { between, ..Spacing::NONE }
    }

    /// The same whitespace after the head, between the children and before
    /// the tail, which suits block elements like `{ a b }`.
    pub const fn inside(space: &'static str) -> Spacing {
        Spacing {
            after_head: space,
            between: space,
            before_tail: space,
            ..Spacing::NONE
        }
    }

    pub const fn with_before(self, before: &'static str) -> Spacing {
        Spacing { before, ..self }
    }

    pub const fn with_after(self, after: &'static str) -> Spacing {
        Spacing { after, ..self }
    }

    pub fn get(&self, space: Space) -> &'static str {
        match space {
            Space::Before => self.before,
            Space::AfterHead => self.after_head,
            Space::Between => self.between,
            Space::BeforeTail => self.before_tail,
            Space::After => self.after,
        }
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Spacing::NONE
    }
}

/// Whitespace values of a single element that deviate from its type's
/// defaults.
///
/// Nothing is allocated as long as all values are the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SpaceOverrides(Option<Box<[Option<String>; 5]>>);

impl SpaceOverrides {
    pub(crate) fn get(&self, space: Space) -> Option<&str> {
        self.0
            .as_ref()
            .and_then(|slots| slots[space.index()].as_deref())
    }

    /// Store a value, or forget it if it equals the default.
    pub(crate) fn set(&mut self, space: Space, value: &str, default: &str) {
        if value == default {
            if let Some(slots) = self.0.as_mut() {
                slots[space.index()] = None;
                if slots.iter().all(Option::is_none) {
                    self.0 = None;
                }
            }
        } else {
            let slots = self.0.get_or_insert_with(Default::default);
            slots[space.index()] = Some(value.to_string());
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}
