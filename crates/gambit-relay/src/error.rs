//! Error types for the relay layer.

use gambit_session::{MoveError, SessionError};

/// Errors from relay operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// A registry lookup failed (usually: the session was destroyed).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A move was rejected. Only the submitter is told.
    #[error(transparent)]
    Move(#[from] MoveError),
}
