/// Errors reported by a rules engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The move token could not be parsed at all.
    #[error("invalid move encoding: {0}")]
    InvalidMoveEncoding(String),

    /// The move parsed, but is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// A position string could not be decoded.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}
