//! Standard chess on top of `shakmaty`.
//!
//! Positions travel as FEN, moves as UCI long algebraic tokens (`e2e4`,
//! `e7e8q`, castling as the king's two-square move `e1g1`).

use std::collections::HashMap;

use gambit_protocol::Role;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::Zobrist64;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

use crate::{PositionStatus, RulesEngine, RulesError};

/// Half-moves without a capture or pawn move that end the game on their
/// own (the seventy-five-move rule).
const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;

/// Occurrences of one position that end the game (fivefold repetition).
const FIVEFOLD_REPETITIONS: u32 = 5;

/// A chess position plus how often each position has occurred since the
/// last irreversible move.
///
/// FEN has no room for repetition history, so a position decoded from FEN
/// starts with a count of one for itself.
#[derive(Debug, Clone)]
pub struct ChessPosition {
    board: Chess,
    seen: HashMap<u64, u32>,
}

impl ChessPosition {
    fn new(board: Chess) -> Self {
        let mut seen = HashMap::new();
        seen.insert(repetition_key(&board), 1);
        Self { board, seen }
    }

    /// The underlying `shakmaty` position.
    pub fn board(&self) -> &Chess {
        &self.board
    }

    /// How many times the current position has occurred.
    pub fn repetitions(&self) -> u32 {
        self.seen
            .get(&repetition_key(&self.board))
            .copied()
            .unwrap_or(1)
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::new(Chess::default())
    }
}

// Excludes the move clocks; legal en passant only, as for FEN.
fn repetition_key(board: &Chess) -> u64 {
    let hash: Zobrist64 = board.zobrist_hash(EnPassantMode::Legal);
    hash.into()
}

/// The chess rules engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessEngine;

impl ChessEngine {
    /// Decodes a FEN string into a position.
    ///
    /// # Errors
    /// [`RulesError::InvalidPosition`] if the string is not valid FEN or
    /// describes an impossible position.
    pub fn position_from_fen(fen: &str) -> Result<ChessPosition, RulesError> {
        let fen: Fen = fen
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| {
                RulesError::InvalidPosition(e.to_string())
            })?;
        fen.into_position::<Chess>(CastlingMode::Standard)
            .map(ChessPosition::new)
            .map_err(|e| RulesError::InvalidPosition(e.to_string()))
    }
}

impl RulesEngine for ChessEngine {
    type Position = ChessPosition;
    type Move = UciMove;

    fn initial_position() -> ChessPosition {
        ChessPosition::default()
    }

    fn to_move(position: &ChessPosition) -> Role {
        match position.board.turn() {
            Color::White => Role::White,
            Color::Black => Role::Black,
        }
    }

    fn parse_move(token: &str) -> Result<UciMove, RulesError> {
        token
            .parse()
            .map_err(|_| RulesError::InvalidMoveEncoding(token.to_owned()))
    }

    fn is_legal(position: &ChessPosition, mv: &UciMove) -> bool {
        mv.to_move(&position.board).is_ok()
    }

    fn apply(
        position: &ChessPosition,
        mv: &UciMove,
    ) -> Result<ChessPosition, RulesError> {
        // `to_move` only succeeds for legal moves, so playing unchecked
        // afterwards is sound.
        let m = mv
            .to_move(&position.board)
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))?;

        // No earlier position can recur after an irreversible move.
        let mut seen = if position.board.is_irreversible(m) {
            HashMap::new()
        } else {
            position.seen.clone()
        };
        let mut board = position.board.clone();
        board.play_unchecked(m);
        *seen.entry(repetition_key(&board)).or_insert(0) += 1;

        Ok(ChessPosition { board, seen })
    }

    fn legal_moves(position: &ChessPosition) -> Vec<String> {
        position
            .board
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard).to_string())
            .collect()
    }

    fn status(position: &ChessPosition) -> PositionStatus {
        let board = &position.board;
        if board.is_checkmate() {
            PositionStatus::Checkmate
        } else if board.is_stalemate() {
            PositionStatus::Stalemate
        } else if board.is_insufficient_material()
            || board.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES
            || position.repetitions() >= FIVEFOLD_REPETITIONS
        {
            PositionStatus::Draw
        } else if board.is_check() {
            PositionStatus::Check
        } else {
            PositionStatus::Ongoing
        }
    }

    // A drawn position can still have the king in check.
    fn is_check(position: &ChessPosition) -> bool {
        position.board.is_check()
    }

    fn encode_position(position: &ChessPosition) -> String {
        Fen::from_position(&position.board, EnPassantMode::Legal).to_string()
    }

    fn encode_move(mv: &UciMove) -> String {
        mv.to_string()
    }
}
