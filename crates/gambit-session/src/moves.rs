//! The turn/move state machine.
//!
//! ```text
//! Waiting ──(both roles held)──→ AwaitingMove(white)
//!                                   │        ↑
//!                          accepted │        │ accepted
//!                                   ▼        │
//!                               AwaitingMove(black)
//!                                   │
//!                      terminal position after an accepted move
//!                                   ▼
//!                                Finished
//! ```
//!
//! Validation happens in a fixed order and stops at the first failure; a
//! rejected move never touches the position or the turn.

use gambit_protocol::{ParticipantId, Role, SessionStatus};
use gambit_rules::{PositionStatus, RulesEngine};

use crate::{MoveError, Session};

/// The outcome of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    /// The role that moved.
    pub role: Role,
    /// The move, re-encoded by the engine.
    pub token: String,
    /// What the engine says about the new position.
    pub position_status: PositionStatus,
}

impl MoveApplied {
    /// Returns `true` if this move ended the game.
    pub fn finished(&self) -> bool {
        self.position_status.is_terminal()
    }
}

impl<E: RulesEngine> Session<E> {
    /// Validates and plays one move for `participant`.
    ///
    /// Checks, in order: the game is in progress, it is the participant's
    /// turn, the token parses, the move is legal. On success the position
    /// advances, the turn flips, and the session finishes if the new
    /// position is terminal.
    ///
    /// Callers must hold the session's lock for the whole call so that
    /// concurrent submissions are serialized.
    ///
    /// # Errors
    /// The first failed check, as a [`MoveError`].
    pub fn submit_move(
        &mut self,
        participant: &ParticipantId,
        token: &str,
    ) -> Result<MoveApplied, MoveError> {
        if !self.status.is_ongoing() {
            return Err(MoveError::NotInProgress);
        }

        let role = self.role_of(participant);
        if role != Some(self.turn) {
            return Err(MoveError::NotYourTurn);
        }
        let role = self.turn;

        let mv = self
            .position
            .parse_move(token)
            .map_err(|_| MoveError::InvalidMoveEncoding(token.to_owned()))?;

        if !self.position.is_legal(&mv) {
            return Err(MoveError::IllegalMove(token.to_owned()));
        }

        self.position
            .apply(&mv)
            .map_err(|_| MoveError::IllegalMove(token.to_owned()))?;
        self.turn = self.turn.other();

        let position_status = self.position.status();
        let applied = MoveApplied {
            role,
            token: E::encode_move(&mv),
            position_status,
        };
        tracing::info!(
            session_id = %self.id(),
            participant_id = %participant,
            role = ?role,
            token = %applied.token,
            "move applied"
        );

        if position_status.is_terminal()
            && self.status.can_transition_to(SessionStatus::Finished)
        {
            self.status = SessionStatus::Finished;
            tracing::info!(
                session_id = %self.id(),
                outcome = ?position_status,
                "game finished"
            );
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use gambit_protocol::SessionId;
    use gambit_rules::{ChessEngine, PositionStore};

    use super::*;

    fn p(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    /// A session with alice (white) and bob (black) seated.
    fn ongoing() -> Session<ChessEngine> {
        let mut s = Session::new(SessionId::new("g1"));
        s.assign_role(&p("alice")).unwrap();
        s.assign_role(&p("bob")).unwrap();
        s
    }

    #[test]
    fn test_submit_move_waiting_session_returns_not_in_progress() {
        let mut s = Session::<ChessEngine>::new(SessionId::new("g1"));
        s.assign_role(&p("alice")).unwrap();

        let result = s.submit_move(&p("alice"), "e2e4");

        assert_eq!(result, Err(MoveError::NotInProgress));
        assert_eq!(s.turn(), Role::White);
    }

    #[test]
    fn test_submit_move_legal_opening_flips_turn() {
        let mut s = ongoing();

        let applied = s.submit_move(&p("alice"), "e2e4").unwrap();

        assert_eq!(applied.role, Role::White);
        assert_eq!(applied.token, "e2e4");
        assert!(!applied.finished());
        assert_eq!(s.turn(), Role::Black);
        assert_eq!(s.status(), SessionStatus::Ongoing);
        assert_eq!(
            s.position().encode(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_submit_move_wrong_role_returns_not_your_turn_and_keeps_state() {
        let mut s = ongoing();
        let before = s.position().encode();

        let result = s.submit_move(&p("bob"), "e7e5");

        assert_eq!(result, Err(MoveError::NotYourTurn));
        assert_eq!(s.turn(), Role::White);
        assert_eq!(s.position().encode(), before);
    }

    #[test]
    fn test_submit_move_observer_returns_not_your_turn() {
        let mut s = ongoing();
        assert!(s.assign_role(&p("carol")).is_err());

        let result = s.submit_move(&p("carol"), "e2e4");

        assert_eq!(result, Err(MoveError::NotYourTurn));
    }

    #[test]
    fn test_submit_move_turn_checked_before_encoding() {
        // Garbage from the wrong player is still "not your turn".
        let mut s = ongoing();
        assert_eq!(
            s.submit_move(&p("bob"), "garbage"),
            Err(MoveError::NotYourTurn)
        );
    }

    #[test]
    fn test_submit_move_garbage_returns_invalid_encoding() {
        let mut s = ongoing();

        let result = s.submit_move(&p("alice"), "garbage");

        assert!(matches!(result, Err(MoveError::InvalidMoveEncoding(_))));
        assert_eq!(s.turn(), Role::White);
    }

    #[test]
    fn test_submit_move_illegal_returns_illegal_move_and_keeps_state() {
        let mut s = ongoing();
        let before = s.position().encode();

        let result = s.submit_move(&p("alice"), "e2e5");

        assert!(matches!(result, Err(MoveError::IllegalMove(_))));
        assert_eq!(s.turn(), Role::White);
        assert_eq!(s.position().encode(), before);
    }

    #[test]
    fn test_submit_move_checkmate_finishes_session() {
        let mut s = ongoing();
        s.submit_move(&p("alice"), "f2f3").unwrap();
        s.submit_move(&p("bob"), "e7e5").unwrap();
        s.submit_move(&p("alice"), "g2g4").unwrap();

        let applied = s.submit_move(&p("bob"), "d8h4").unwrap();

        assert!(applied.finished());
        assert_eq!(applied.position_status, PositionStatus::Checkmate);
        assert_eq!(s.status(), SessionStatus::Finished);
        let snap = s.snapshot();
        assert!(snap.is_checkmate);
        assert!(snap.is_check);
        assert!(snap.legal_moves.is_empty());
    }

    #[test]
    fn test_submit_move_after_finish_returns_not_in_progress() {
        let mut s = ongoing();
        for (who, token) in [
            ("alice", "f2f3"),
            ("bob", "e7e5"),
            ("alice", "g2g4"),
            ("bob", "d8h4"),
        ] {
            s.submit_move(&p(who), token).unwrap();
        }

        assert_eq!(
            s.submit_move(&p("alice"), "e2e4"),
            Err(MoveError::NotInProgress)
        );
        assert_eq!(s.status(), SessionStatus::Finished);
    }

    #[test]
    fn test_submit_move_into_stalemate_finishes_session() {
        // White plays Qf7, leaving the black king on h8 with no move.
        let position = ChessEngine::position_from_fen(
            "7k/8/6K1/8/8/8/8/5Q2 w - - 0 1",
        )
        .unwrap();
        let mut s = Session::<ChessEngine>::with_position(
            SessionId::new("g1"),
            PositionStore::from_position(position),
        );
        s.assign_role(&p("alice")).unwrap();
        s.assign_role(&p("bob")).unwrap();

        let applied = s.submit_move(&p("alice"), "f1f7").unwrap();

        assert_eq!(applied.position_status, PositionStatus::Stalemate);
        assert_eq!(s.status(), SessionStatus::Finished);
        assert!(s.snapshot().is_stalemate);
    }

    #[test]
    fn test_submit_move_fivefold_repetition_finishes_session() {
        let mut s = ongoing();
        let shuffle =
            [("alice", "g1f3"), ("bob", "g8f6"), ("alice", "f3g1"), ("bob", "f6g8")];

        for _ in 0..3 {
            for (who, token) in shuffle {
                s.submit_move(&p(who), token).unwrap();
            }
        }
        assert_eq!(s.status(), SessionStatus::Ongoing);

        // The fourth return to the start position is its fifth occurrence.
        let mut last = None;
        for (who, token) in shuffle {
            last = Some(s.submit_move(&p(who), token).unwrap());
        }

        assert_eq!(
            last.map(|applied| applied.position_status),
            Some(PositionStatus::Draw)
        );
        assert_eq!(s.status(), SessionStatus::Finished);
        assert_eq!(
            s.submit_move(&p("alice"), "g1f3"),
            Err(MoveError::NotInProgress)
        );
    }
}
