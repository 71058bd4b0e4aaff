pub mod dom;
pub mod error;
pub mod node;
pub mod range;
pub mod token;

pub use dom::Element;
pub use error::{DomError, Result};
pub use node::{Node, NodeData};
pub use range::Range;
pub use token::Token;
