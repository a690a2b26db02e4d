#![forbid(unsafe_code)]

//! Error type shared by the observable container and the batch collection.
//!
//! Every check runs before storage is touched, so an `Err` always means the
//! collection is exactly as it was before the call and no listener fired.

/// Errors from collection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// A required sequence argument was absent.
    #[error("argument `{argument}` must not be absent")]
    InvalidArgument { argument: &'static str },
    /// The element named by `argument` is not part of the collection.
    #[error("argument `{argument}` is not an element of the collection")]
    ElementNotFound { argument: &'static str },
    /// An index-based container operation addressed a slot past the end.
    #[error("index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A batch policy file could not be read or parsed.
    #[error("invalid batch policy: {0}")]
    Config(String),
}
