//! Error types for the session layer.

use gambit_protocol::SessionId;

/// Errors from session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session exists under this identifier.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// Both roles are already held by other participants.
    /// The relay registers the caller as an observer instead.
    #[error("session {0} is full")]
    SessionFull(SessionId),
}

/// Why a move request was rejected.
///
/// The `Display` text is exactly what the submitting client receives in
/// its `error` message. None of these end the session or the connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The session is still waiting for a second player, or already over.
    #[error("Game is not in progress")]
    NotInProgress,

    /// The submitter does not hold the role whose turn it is (observers
    /// never do).
    #[error("Not your turn")]
    NotYourTurn,

    /// The token could not be parsed by the rules engine.
    #[error("Invalid move encoding")]
    InvalidMoveEncoding(String),

    /// The token parsed but the move is not legal in this position.
    #[error("Invalid move")]
    IllegalMove(String),
}

impl MoveError {
    /// A stable, machine-readable code for logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotInProgress => "not-started-or-finished",
            Self::NotYourTurn => "not-your-turn",
            Self::InvalidMoveEncoding(_) => "invalid-move-encoding",
            Self::IllegalMove(_) => "illegal-move",
        }
    }
}
