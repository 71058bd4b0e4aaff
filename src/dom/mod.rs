//! Document elements and their text
//!
//! Elements are built from tokens by a transformer outside this crate, or by
//! hand. A tree can be written as plain text ([`Element::write`]), as
//! indented text ([`Element::write_indented`]), or written back into the
//! source it was read from as a minimal set of edits ([`Element::edit`]).

mod build;
mod edit;
mod element;
mod indent;
mod points;
mod spacing;
mod value;
mod whitespace;

pub use build::{build_tree, head_mapping};
pub use edit::{Edit, EditRange, TextBuffer};
pub use element::{AsAny, Element, ElementData, ElementType, Origin, Shape, Unknown};
pub use indent::{IndentOptions, Indenter};
pub use points::{Point, Points, SpacedPoint};
pub use spacing::{Space, Spacing};
pub use value::{Fraction, Mapped, Value};
pub use whitespace::{collapse_whitespace, combine_text};
