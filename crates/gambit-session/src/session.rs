//! Session types: the state of one match between two participants.

use std::time::Duration;

use gambit_protocol::{
    GameSnapshot, ParticipantId, Role, SessionId, SessionStatus,
};
use gambit_rules::{PositionStatus, PositionStore, RulesEngine};
use tokio::time::Instant;

use crate::SessionError;

/// One match: a position, two role slots, a turn and a lifecycle status.
///
/// ## Invariants
///
/// - Each role is held by at most one participant, and a participant holds
///   at most one role. Roles are assigned once and never reassigned.
/// - `status == Ongoing` implies both roles are held.
/// - `status == Finished` implies the engine reports a terminal position.
/// - `status` only moves forward: `Waiting → Ongoing → Finished`.
///
/// A `Session` is plain data. Callers that share it across tasks wrap it
/// in a [`SessionHandle`](crate::SessionHandle) and mutate it only while
/// holding that lock.
pub struct Session<E: RulesEngine> {
    id: SessionId,
    pub(crate) position: PositionStore<E>,
    white: Option<ParticipantId>,
    black: Option<ParticipantId>,
    pub(crate) turn: Role,
    pub(crate) status: SessionStatus,
    /// Monotonic clock, so paused-time tests can move it forward.
    created_at: Instant,
}

impl<E: RulesEngine> Session<E> {
    /// A fresh session at the engine's initial position.
    pub fn new(id: SessionId) -> Self {
        Self::with_position(id, PositionStore::new())
    }

    /// A fresh session starting from an arbitrary position. The first turn
    /// belongs to whichever side the engine says is to move.
    pub fn with_position(id: SessionId, position: PositionStore<E>) -> Self {
        let turn = position.to_move();
        Self {
            id,
            position,
            white: None,
            black: None,
            turn,
            status: SessionStatus::Waiting,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn position(&self) -> &PositionStore<E> {
        &self.position
    }

    /// The role allowed to move next.
    pub fn turn(&self) -> Role {
        self.turn
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The participant holding `role`, if any.
    pub fn occupant(&self, role: Role) -> Option<&ParticipantId> {
        match role {
            Role::White => self.white.as_ref(),
            Role::Black => self.black.as_ref(),
        }
    }

    /// The role `participant` holds, or `None` for observers and strangers.
    pub fn role_of(&self, participant: &ParticipantId) -> Option<Role> {
        if self.white.as_ref() == Some(participant) {
            Some(Role::White)
        } else if self.black.as_ref() == Some(participant) {
            Some(Role::Black)
        } else {
            None
        }
    }

    /// Gives `participant` a role, or confirms the one they already hold.
    ///
    /// White is filled first. Filling black completes the pairing and
    /// moves the session from `Waiting` to `Ongoing`.
    ///
    /// # Errors
    /// [`SessionError::SessionFull`] if both roles are held by others.
    pub fn assign_role(
        &mut self,
        participant: &ParticipantId,
    ) -> Result<Role, SessionError> {
        // Re-joining keeps the same role.
        if let Some(role) = self.role_of(participant) {
            return Ok(role);
        }

        if self.white.is_none() {
            self.white = Some(participant.clone());
            tracing::info!(
                session_id = %self.id,
                participant_id = %participant,
                role = ?Role::White,
                "role assigned"
            );
            return Ok(Role::White);
        }

        if self.black.is_none() {
            self.black = Some(participant.clone());
            tracing::info!(
                session_id = %self.id,
                participant_id = %participant,
                role = ?Role::Black,
                "role assigned"
            );
            if self.status.can_transition_to(SessionStatus::Ongoing) {
                self.status = SessionStatus::Ongoing;
                tracing::info!(session_id = %self.id, "game started");
            }
            return Ok(Role::Black);
        }

        Err(SessionError::SessionFull(self.id.clone()))
    }

    /// Time since the session was created.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// A consistent view of the session, ready to broadcast.
    pub fn snapshot(&self) -> GameSnapshot {
        let status = self.position.status();
        GameSnapshot {
            fen: self.position.encode(),
            current_turn: self.turn,
            status: self.status,
            white_player: self.white.clone(),
            black_player: self.black.clone(),
            legal_moves: self.position.legal_moves(),
            is_check: self.position.is_check(),
            is_checkmate: status == PositionStatus::Checkmate,
            is_stalemate: status == PositionStatus::Stalemate,
            time_elapsed: format_elapsed(self.elapsed()),
        }
    }
}

impl<E: RulesEngine> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("white", &self.white)
            .field("black", &self.black)
            .field("turn", &self.turn)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Formats a duration as `HH:MM:SS`. Hours keep growing past 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
