//! The `RulesEngine` trait: the seam between the relay and the game rules.

use std::fmt;

use gambit_protocol::Role;

use crate::RulesError;

/// What the engine says about a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionStatus {
    /// Play continues and the side to move is not in check.
    Ongoing,
    /// Play continues; the side to move is in check.
    Check,
    /// The side to move is checkmated.
    Checkmate,
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Any other game-ending draw the engine recognizes (insufficient
    /// material, move-count rules, repetition).
    Draw,
}

impl PositionStatus {
    /// Returns `true` if the game is over in this position.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Checkmate | Self::Stalemate | Self::Draw)
    }
}

/// A turn-based, two-sided game's rules, seen as an opaque capability.
///
/// All functions are associated functions (no `self`): an engine is a
/// type-level choice, like picking a game, and keeps no state of its own.
/// Positions are values the caller owns and hands back on every query.
///
/// The session layer is generic over this trait, so its turn and
/// lifecycle logic can be tested against a tiny fake engine.
pub trait RulesEngine: Send + Sync + 'static {
    /// A complete board position.
    type Position: Clone + Send + Sync + fmt::Debug + 'static;

    /// One parsed move, not yet checked for legality.
    type Move: Clone + Send + Sync + fmt::Debug + 'static;

    /// The position a new game starts from.
    fn initial_position() -> Self::Position;

    /// The role whose turn it is in `position`.
    fn to_move(position: &Self::Position) -> Role;

    /// Parses a move token. Syntax only: a well-formed but illegal move
    /// parses fine and is caught by [`is_legal`](Self::is_legal).
    ///
    /// # Errors
    /// [`RulesError::InvalidMoveEncoding`] if the token is malformed.
    fn parse_move(token: &str) -> Result<Self::Move, RulesError>;

    /// Returns `true` if `mv` is legal in `position`.
    fn is_legal(position: &Self::Position, mv: &Self::Move) -> bool;

    /// Plays `mv` and returns the resulting position.
    ///
    /// # Errors
    /// [`RulesError::IllegalMove`] if `mv` is not legal in `position`.
    fn apply(
        position: &Self::Position,
        mv: &Self::Move,
    ) -> Result<Self::Position, RulesError>;

    /// Every legal move from `position`, encoded as tokens.
    fn legal_moves(position: &Self::Position) -> Vec<String>;

    fn status(position: &Self::Position) -> PositionStatus;

    /// Returns `true` if the side to move is in check.
    ///
    /// Default: derived from [`status`](Self::status). Engines that can
    /// be in check inside a drawn position should override this.
    fn is_check(position: &Self::Position) -> bool {
        matches!(
            Self::status(position),
            PositionStatus::Check | PositionStatus::Checkmate
        )
    }

    /// Portable string form of `position` (FEN for chess).
    fn encode_position(position: &Self::Position) -> String;

    fn encode_move(mv: &Self::Move) -> String;
}
