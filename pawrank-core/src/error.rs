use thiserror::Error;

use crate::types::{ItemId, VoterId};

/// Boxed error coming out of a `VoteStore` implementation.
pub type BoxedStoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the ranking core.
///
/// An empty scope (no items, no votes) is not an error: every ranking method
/// returns an empty ordering for it.
#[derive(Debug, Error)]
pub enum RankError {
    /// A filter value violates a domain constraint.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A vote outcome outside {win, loss, tie}.
    #[error("malformed vote outcome {0:?} (expected \"win\", \"loss\" or \"tie\")")]
    MalformedOutcome(String),

    /// A graph broke a structural assumption of a ranking method.
    #[error("degenerate graph: {0}")]
    DegenerateGraph(String),

    #[error("margin matrix shape mismatch: {ids} ids but matrix is {rows}x{cols}")]
    ShapeMismatch { ids: usize, rows: usize, cols: usize },

    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("unknown voter {0}")]
    UnknownVoter(VoterId),

    #[error("unknown ranking method {0:?}")]
    UnknownMethod(String),

    /// A submitted vote that cannot be turned into an outcome.
    #[error("invalid vote: {0}")]
    InvalidVote(String),

    #[error("vote store error: {0}")]
    Store(#[source] BoxedStoreError),
}

impl RankError {
    /// Wrap a storage backend error.
    pub fn store(err: impl Into<BoxedStoreError>) -> Self {
        RankError::Store(err.into())
    }
}

pub type Result<T, E = RankError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = RankError::store(io);
        assert_eq!(err.to_string(), "vote store error: disk on fire");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = RankError::ShapeMismatch { ids: 3, rows: 2, cols: 3 };
        assert_eq!(err.to_string(), "margin matrix shape mismatch: 3 ids but matrix is 2x3");
    }
}
