use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ElementError {
    /// Element key absent from the type table; callers decide whether this
    /// is fatal or ignorable
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// The decoded value is not an element node at all
    #[error("Not an element node: {0}")]
    NotAnElement(String),
}
