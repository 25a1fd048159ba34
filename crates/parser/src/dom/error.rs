//! DOM specific errors for the Quill parser crate.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Invalid node operation: {0}")]
    InvalidOperation(String),

    #[error("Cannot bind {0:?} on a node that is not an element")]
    NotAnElement(String),
}
