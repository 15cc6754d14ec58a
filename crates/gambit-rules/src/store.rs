//! The position store: one board per session, queries delegated to `E`.

use gambit_protocol::Role;

use crate::{PositionStatus, RulesEngine, RulesError};

/// Holds the current position of one session.
///
/// The store never decides anything itself; every question goes to the
/// engine `E`. It exists so the session only ever mutates its position
/// through [`apply`](Self::apply), which either plays a legal move or
/// leaves the position untouched.
pub struct PositionStore<E: RulesEngine> {
    position: E::Position,
}

impl<E: RulesEngine> PositionStore<E> {
    /// A store holding the engine's initial position.
    pub fn new() -> Self {
        Self::from_position(E::initial_position())
    }

    /// A store holding an arbitrary position.
    pub fn from_position(position: E::Position) -> Self {
        Self { position }
    }

    pub fn position(&self) -> &E::Position {
        &self.position
    }

    /// The role whose turn it is according to the engine.
    pub fn to_move(&self) -> Role {
        E::to_move(&self.position)
    }

    pub fn parse_move(&self, token: &str) -> Result<E::Move, RulesError> {
        E::parse_move(token)
    }

    pub fn is_legal(&self, mv: &E::Move) -> bool {
        E::is_legal(&self.position, mv)
    }

    /// Plays `mv`, replacing the held position.
    ///
    /// # Errors
    /// [`RulesError::IllegalMove`] if the engine refuses the move; the
    /// position is unchanged in that case.
    pub fn apply(&mut self, mv: &E::Move) -> Result<(), RulesError> {
        self.position = E::apply(&self.position, mv)?;
        Ok(())
    }

    pub fn legal_moves(&self) -> Vec<String> {
        E::legal_moves(&self.position)
    }

    pub fn status(&self) -> PositionStatus {
        E::status(&self.position)
    }

    pub fn is_check(&self) -> bool {
        E::is_check(&self.position)
    }

    /// The position in its portable string form.
    pub fn encode(&self) -> String {
        E::encode_position(&self.position)
    }
}

impl<E: RulesEngine> Default for PositionStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RulesEngine> Clone for PositionStore<E> {
    fn clone(&self) -> Self {
        Self {
            position: self.position.clone(),
        }
    }
}

impl<E: RulesEngine> std::fmt::Debug for PositionStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore")
            .field("position", &self.position)
            .finish()
    }
}
