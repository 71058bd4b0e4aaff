use thiserror::Error;

pub type Result<T, E = DomError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    #[error("Index {index} out of range for node with {len} children")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Node has no parent")]
    NoParent,
    #[error("A node can't become its own descendant")]
    Cycle,
    #[error("{element} has no head")]
    NoHead { element: &'static str },
    #[error("{element} has no tail")]
    NoTail { element: &'static str },
    #[error("Invalid head value for {element}: {value}")]
    InvalidHead { element: &'static str, value: String },
    #[error("{element} can't be written before it is resolved")]
    Unresolved { element: &'static str },
    #[error("A range needs a start or an end node")]
    NoRangeNode,
    #[error("The nodes of a range must be in the same tree")]
    DifferentTrees,
    #[error("Edit {pos}..{end} does not fit in a text of {len} bytes")]
    InvalidEdit { pos: usize, end: usize, len: usize },
}
