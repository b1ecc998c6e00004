//! Error taxonomy surfaced by this crate.

/// Errors that can be returned by this crate's public API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument was invalid, e.g. `k < 1` after clamping
    /// to the number of entries in an empty tree, or an empty training set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An axis index was out of range for the dimensionality of a hyperbox.
    #[error("axis {axis} out of range for a {dims}-dimensional hyperbox")]
    DomainError {
        /// The axis index that was out of range.
        axis: usize,
        /// The dimensionality of the hyperbox.
        dims: usize,
    },

    /// The adaptive search radius diverged to infinity without collecting
    /// enough candidates. This signals that the metric's pruning predicate
    /// is not a conservative over-approximation.
    #[error("no viable points: search radius diverged to infinity (is the metric's predicate broken?)")]
    NoViablePoints,

    /// An I/O or parsing error from an external data reader.
    ///
    /// The core of this crate never constructs this variant itself; it is
    /// kept in the public enum so out-of-scope collaborators (dataset
    /// readers) can report failures through the same error type.
    #[error("I/O or parse error: {0}")]
    IoOrParseError(String),
}
