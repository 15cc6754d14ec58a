//! Core protocol types for Gambit's wire format.
//!
//! These are the structures that get serialized to JSON, sent over the
//! realtime channel, and parsed on the other side. Field names follow the
//! browser client's expectations (`fen`, `current_turn`, `white_player`...).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identifier of one session (one match between two participants).
///
/// Opaque to the relay: it comes straight from the endpoint path, or from
/// the session-creation call that hands out fresh random tokens.
///
/// `#[serde(transparent)]` serializes this as the bare string, not as
/// `{ "0": "..." }`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The identifier a participant chose for themselves.
///
/// Same newtype pattern as [`SessionId`]; you can't pass one where the
/// other is expected even though both are strings underneath.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// One of the two playing positions in a session.
///
/// `White` moves first (the "first-mover" role), `Black` second.
/// Serialized lowercase: `"white"` / `"black"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    White,
    Black,
}

impl Role {
    /// The opposing role.
    pub fn other(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a session. Strictly monotonic:
///
/// ```text
/// Waiting → Ongoing → Finished
/// ```
///
/// - **Waiting**: fewer than two roles are occupied.
/// - **Ongoing**: both roles occupied, no terminal condition yet.
/// - **Finished**: the rules engine reported a terminal condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Waiting,
    Ongoing,
    Finished,
}

impl SessionStatus {
    /// Returns `true` while moves may be submitted.
    pub fn is_ongoing(&self) -> bool {
        matches!(self, Self::Ongoing)
    }

    /// Returns `true` once the game has ended.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The only state this one may advance to, or `None` for `Finished`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Ongoing),
            Self::Ongoing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` keeps the order monotonic.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => f.write_str("waiting"),
            Self::Ongoing => f.write_str("ongoing"),
            Self::Finished => f.write_str("finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameSnapshot
// ---------------------------------------------------------------------------

/// An immutable view of one session, broadcast to every connection.
///
/// Built under the session's lock so it never shows a half-applied move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Board position in its portable string form (FEN for chess).
    pub fen: String,
    /// The role allowed to move next.
    pub current_turn: Role,
    pub status: SessionStatus,
    /// Occupant of the first-mover role, `null` while unassigned.
    pub white_player: Option<ParticipantId>,
    /// Occupant of the second-mover role, `null` while unassigned.
    pub black_player: Option<ParticipantId>,
    /// Every legal move token from the current position.
    pub legal_moves: Vec<String>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    /// Time since the session was created, `HH:MM:SS`. Informational only.
    pub time_elapsed: String,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Requests a client may send over the realtime channel.
///
/// `#[serde(tag = "type")]` makes this "internally tagged":
/// `{ "type": "move", "move": "e2e4" }`. Any other `type` value decodes
/// to [`ClientMessage::Unsupported`] instead of failing, so reserved kinds
/// never tear down the receive loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit one move, encoded as an engine-specific token (UCI for chess).
    Move {
        #[serde(rename = "move")]
        token: String,
    },

    /// Any request kind the relay doesn't handle.
    #[serde(other)]
    Unsupported,
}

/// Messages the relay sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// `{ "type": "game_state", "data": { ... } }`: sent to every
    /// connection of a session on each change and on every sweep tick.
    GameState { data: GameSnapshot },

    /// `{ "type": "error", "message": "..." }`: sent only to the
    /// connection whose request failed.
    Error { message: String },
}

impl ServerMessage {
    /// Shorthand for an error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<GameSnapshot> for ServerMessage {
    fn from(data: GameSnapshot) -> Self {
        Self::GameState { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> GameSnapshot {
        GameSnapshot {
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
                .into(),
            current_turn: Role::White,
            status: SessionStatus::Waiting,
            white_player: Some(ParticipantId::new("alice")),
            black_player: None,
            legal_moves: vec!["e2e4".into()],
            is_check: false,
            is_checkmate: false,
            is_stalemate: false,
            time_elapsed: "00:00:00".into(),
        }
    }

    #[test]
    fn test_game_state_wire_shape() {
        let msg = ServerMessage::from(snapshot());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "game_state");
        assert_eq!(value["data"]["current_turn"], "white");
        assert_eq!(value["data"]["status"], "waiting");
        assert_eq!(value["data"]["white_player"], "alice");
        assert_eq!(value["data"]["black_player"], json!(null));
        assert_eq!(value["data"]["legal_moves"], json!(["e2e4"]));
        assert_eq!(value["data"]["time_elapsed"], "00:00:00");
    }

    #[test]
    fn test_error_wire_shape() {
        let value =
            serde_json::to_value(ServerMessage::error("Not your turn")).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "Not your turn"}));
    }

    #[test]
    fn test_unknown_request_type_decodes_as_unsupported() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "chat", "text": "hi"}))
                .unwrap();
        assert_eq!(msg, ClientMessage::Unsupported);
    }

    #[test]
    fn test_role_other_flips() {
        assert_eq!(Role::White.other(), Role::Black);
        assert_eq!(Role::Black.other(), Role::White);
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        assert!(
            SessionStatus::Waiting.can_transition_to(SessionStatus::Ongoing)
        );
        assert!(
            SessionStatus::Ongoing.can_transition_to(SessionStatus::Finished)
        );
        assert!(
            !SessionStatus::Finished.can_transition_to(SessionStatus::Waiting)
        );
        assert!(
            !SessionStatus::Waiting.can_transition_to(SessionStatus::Finished)
        );
        assert_eq!(SessionStatus::Finished.next(), None);
    }

    #[test]
    fn test_identifiers_serialize_transparently() {
        let value = serde_json::to_value(SessionId::new("abc")).unwrap();
        assert_eq!(value, json!("abc"));
        assert_eq!(ParticipantId::from("bob").to_string(), "bob");
    }
}
