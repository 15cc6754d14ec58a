//! The connection table: per session, which participant is reachable how.

use std::collections::HashMap;

use gambit_protocol::{ParticipantId, ServerMessage, SessionId};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel for delivering outbound messages to one connection's task.
///
/// Unbounded, so enqueueing never blocks a broadcast. When the receiving
/// task is gone the send fails, and the broadcast just moves on.
pub type ParticipantSender = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug)]
struct Entry {
    conn_id: ConnectionId,
    sender: ParticipantSender,
}

/// What [`ConnectionTable::leave`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Nothing was removed: the participant is unknown, or its entry now
    /// belongs to a newer connection.
    NotMember,
    /// Removed; this many connections remain in the session.
    Remaining(usize),
    /// Removed, and it was the last one. The caller must destroy the
    /// session.
    Emptied,
}

/// Per-session mapping from participant to its one live channel.
///
/// Plain data like the registry; the relay holds it behind a mutex.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    sessions: HashMap<SessionId, HashMap<ParticipantId, Entry>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sender` as the outbound path for `participant`.
    ///
    /// A participant has at most one live channel per session: joining
    /// again replaces the previous entry, whose connection id is returned.
    /// Dropping the old sender closes that connection's outbound queue.
    pub fn join(
        &mut self,
        session_id: &SessionId,
        participant: &ParticipantId,
        conn_id: ConnectionId,
        sender: ParticipantSender,
    ) -> Option<ConnectionId> {
        self.sessions
            .entry(session_id.clone())
            .or_default()
            .insert(participant.clone(), Entry { conn_id, sender })
            .map(|old| old.conn_id)
    }

    /// Removes `participant`'s entry if it still belongs to `conn_id`.
    ///
    /// The connection id guard makes a replaced connection's late cleanup
    /// harmless: it cannot evict the connection that replaced it.
    pub fn leave(
        &mut self,
        session_id: &SessionId,
        participant: &ParticipantId,
        conn_id: ConnectionId,
    ) -> LeaveOutcome {
        let Some(members) = self.sessions.get_mut(session_id) else {
            return LeaveOutcome::NotMember;
        };
        match members.get(participant) {
            Some(entry) if entry.conn_id == conn_id => {
                members.remove(participant);
            }
            _ => return LeaveOutcome::NotMember,
        }

        if members.is_empty() {
            self.sessions.remove(session_id);
            LeaveOutcome::Emptied
        } else {
            LeaveOutcome::Remaining(members.len())
        }
    }

    /// A copy of every channel in the session, for fan-out.
    ///
    /// The copy is taken at call time; joins and leaves afterwards do not
    /// affect it.
    pub fn channels_for(
        &self,
        session_id: &SessionId,
    ) -> Vec<(ParticipantId, ParticipantSender)> {
        self.sessions
            .get(session_id)
            .map(|members| {
                members
                    .iter()
                    .map(|(pid, entry)| (pid.clone(), entry.sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The connection currently registered for `participant`, if any.
    pub fn connection_of(
        &self,
        session_id: &SessionId,
        participant: &ParticipantId,
    ) -> Option<ConnectionId> {
        self.sessions
            .get(session_id)?
            .get(participant)
            .map(|entry| entry.conn_id)
    }

    /// Number of live connections in a session.
    pub fn connection_count(&self, session_id: &SessionId) -> usize {
        self.sessions.get(session_id).map_or(0, HashMap::len)
    }

    /// Number of sessions with at least one connection.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
