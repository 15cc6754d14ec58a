//! The relay: session registry plus connection table, one owner for both.

use gambit_protocol::{GameSnapshot, ParticipantId, Role, SessionId};
use gambit_rules::RulesEngine;
use gambit_session::{
    MoveApplied, SessionError, SessionRegistry, new_session_id,
};
use gambit_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::{ConnectionTable, LeaveOutcome, ParticipantSender, RelayError};

/// What happened when a connection joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The participant's role, or `None` for an observer.
    pub role: Option<Role>,
    /// `true` if this join created the session.
    pub created: bool,
    /// The connection this one replaced, if the participant was already
    /// connected.
    pub replaced: Option<ConnectionId>,
}

/// Shared state for every session and connection.
///
/// Constructed once when the server starts and handed to every
/// connection task and to the periodic sweep behind an `Arc`. There is no
/// global state: two relays in one process know nothing of each other.
pub struct Relay<E: RulesEngine> {
    pub(crate) registry: Mutex<SessionRegistry<E>>,
    pub(crate) table: Mutex<ConnectionTable>,
}

impl<E: RulesEngine> Relay<E> {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(SessionRegistry::new()),
            table: Mutex::new(ConnectionTable::new()),
        }
    }

    /// A fresh session identifier. Touches no state; the session itself
    /// is created by the first join.
    pub fn create_session_id(&self) -> SessionId {
        new_session_id()
    }

    /// Adds a connection to a session and pushes the new state to
    /// everyone in it.
    ///
    /// Creates the session if needed and gives the participant a free role.
    /// With both roles taken by others, the participant joins as an
    /// observer. A participant already connected has their old channel
    /// replaced by `sender`.
    pub async fn join(
        &self,
        session_id: &SessionId,
        participant: &ParticipantId,
        conn_id: ConnectionId,
        sender: ParticipantSender,
    ) -> JoinOutcome {
        // The table entry goes in before the registry lock is released, so
        // a concurrent last leave cannot destroy the session under us. The
        // session lock is taken only after that, so a busy session never
        // holds up joins elsewhere.
        let (handle, created, replaced) = {
            let mut registry = self.registry.lock().await;
            let (handle, created) = registry.ensure_session(session_id);
            let replaced = self
                .table
                .lock()
                .await
                .join(session_id, participant, conn_id, sender);
            (handle, created, replaced)
        };

        let mut session = handle.lock().await;
        let role = match session.assign_role(participant) {
            Ok(role) => Some(role),
            Err(SessionError::SessionFull(_)) => {
                tracing::info!(
                    %session_id,
                    participant_id = %participant,
                    "session full, joining as observer"
                );
                None
            }
            Err(SessionError::NotFound(_)) => None,
        };

        if let Some(old) = replaced {
            tracing::info!(
                %session_id,
                participant_id = %participant,
                old_conn = %old,
                new_conn = %conn_id,
                "connection replaced"
            );
        }
        tracing::info!(
            %session_id,
            participant_id = %participant,
            %conn_id,
            role = ?role,
            "connection joined"
        );

        self.broadcast_locked(&session).await;

        JoinOutcome {
            role,
            created,
            replaced,
        }
    }

    /// Removes a connection. Destroys the session if it was the last one,
    /// otherwise tells the others about the departure.
    ///
    /// `conn_id` must be the id the connection joined with; a connection
    /// that was replaced leaves without effect.
    pub async fn leave(
        &self,
        session_id: &SessionId,
        participant: &ParticipantId,
        conn_id: ConnectionId,
    ) -> LeaveOutcome {
        let outcome = {
            let mut registry = self.registry.lock().await;
            let outcome =
                self.table.lock().await.leave(session_id, participant, conn_id);
            if outcome == LeaveOutcome::Emptied {
                // The table entry and the session go together.
                let _ = registry.destroy_session(session_id);
            }
            outcome
        };

        match outcome {
            LeaveOutcome::NotMember => {
                tracing::debug!(
                    %session_id,
                    participant_id = %participant,
                    %conn_id,
                    "stale leave ignored"
                );
            }
            LeaveOutcome::Emptied => {
                tracing::info!(
                    %session_id,
                    participant_id = %participant,
                    %conn_id,
                    "connection left, session empty"
                );
            }
            LeaveOutcome::Remaining(remaining) => {
                tracing::info!(
                    %session_id,
                    participant_id = %participant,
                    %conn_id,
                    remaining,
                    "connection left"
                );
                // A join may have emptied-and-recreated in between; either
                // way whoever is there now gets the current state.
                let _ = self.broadcast_state(session_id).await;
            }
        }
        outcome
    }

    /// Runs a move through the session's state machine and, if accepted,
    /// broadcasts the new state before releasing the session lock.
    ///
    /// # Errors
    /// - [`RelayError::Session`] if the session does not exist
    /// - [`RelayError::Move`] if the move was rejected; nothing changed
    ///   and nothing was broadcast
    pub async fn submit_move(
        &self,
        session_id: &SessionId,
        participant: &ParticipantId,
        token: &str,
    ) -> Result<MoveApplied, RelayError> {
        let handle = self.registry.lock().await.get(session_id)?;
        let mut session = handle.lock().await;

        let applied = session.submit_move(participant, token).inspect_err(|e| {
            tracing::debug!(
                %session_id,
                participant_id = %participant,
                reason = e.reason_code(),
                token,
                "move rejected"
            );
        })?;

        self.broadcast_locked(&session).await;
        Ok(applied)
    }

    /// The current state of a session, as it would be broadcast.
    ///
    /// # Errors
    /// [`RelayError::Session`] if the session does not exist.
    pub async fn snapshot(
        &self,
        session_id: &SessionId,
    ) -> Result<GameSnapshot, RelayError> {
        let handle = self.registry.lock().await.get(session_id)?;
        let session = handle.lock().await;
        Ok(session.snapshot())
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Number of live connections in a session.
    pub async fn connection_count(&self, session_id: &SessionId) -> usize {
        self.table.lock().await.connection_count(session_id)
    }
}

impl<E: RulesEngine> Default for Relay<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use gambit_protocol::{ServerMessage, SessionStatus};
    use gambit_rules::ChessEngine;
    use gambit_session::MoveError;
    use tokio::sync::mpsc;

    use super::*;

    type Rx = mpsc::UnboundedReceiver<ServerMessage>;

    fn sid(id: &str) -> SessionId {
        SessionId::new(id)
    }

    fn p(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    async fn join(
        relay: &Relay<ChessEngine>,
        session: &str,
        who: &str,
        conn: u64,
    ) -> (JoinOutcome, Rx) {
        let (tx, rx) = mpsc::unbounded_channel();
        let outcome =
            relay.join(&sid(session), &p(who), ConnectionId::new(conn), tx).await;
        (outcome, rx)
    }

    /// Pops the next queued message, which must be a state snapshot.
    fn next_state(rx: &mut Rx) -> GameSnapshot {
        match rx.try_recv() {
            Ok(ServerMessage::GameState { data }) => data,
            other => panic!("expected game_state, got {other:?}"),
        }
    }

    fn drain(rx: &mut Rx) {
        while rx.try_recv().is_ok() {}
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[tokio::test]
    async fn test_join_first_participant_gets_white_and_state() {
        let relay = Relay::<ChessEngine>::new();

        let (outcome, mut rx) = join(&relay, "g1", "alice", 1).await;

        assert_eq!(outcome.role, Some(Role::White));
        assert!(outcome.created);
        assert_eq!(outcome.replaced, None);
        let state = next_state(&mut rx);
        assert_eq!(state.status, SessionStatus::Waiting);
        assert_eq!(state.white_player, Some(p("alice")));
        assert_eq!(state.black_player, None);
    }

    #[tokio::test]
    async fn test_join_second_participant_starts_game_for_both() {
        let relay = Relay::<ChessEngine>::new();
        let (_, mut rx_a) = join(&relay, "g1", "alice", 1).await;
        drain(&mut rx_a);

        let (outcome, mut rx_b) = join(&relay, "g1", "bob", 2).await;

        assert_eq!(outcome.role, Some(Role::Black));
        assert!(!outcome.created);
        for rx in [&mut rx_a, &mut rx_b] {
            let state = next_state(rx);
            assert_eq!(state.status, SessionStatus::Ongoing);
            assert_eq!(state.white_player, Some(p("alice")));
            assert_eq!(state.black_player, Some(p("bob")));
        }
    }

    #[tokio::test]
    async fn test_join_third_participant_becomes_observer() {
        let relay = Relay::<ChessEngine>::new();
        join(&relay, "g1", "alice", 1).await;
        join(&relay, "g1", "bob", 2).await;

        let (outcome, mut rx_c) = join(&relay, "g1", "carol", 3).await;

        assert_eq!(outcome.role, None);
        let state = next_state(&mut rx_c);
        assert_eq!(state.white_player, Some(p("alice")));
        assert_eq!(state.black_player, Some(p("bob")));
        assert_eq!(relay.connection_count(&sid("g1")).await, 3);
    }

    #[tokio::test]
    async fn test_join_same_participant_replaces_channel_keeps_role() {
        let relay = Relay::<ChessEngine>::new();
        let (_, mut old_rx) = join(&relay, "g1", "alice", 1).await;
        drain(&mut old_rx);

        let (outcome, mut new_rx) = join(&relay, "g1", "alice", 2).await;

        assert_eq!(outcome.role, Some(Role::White));
        assert_eq!(outcome.replaced, Some(ConnectionId::new(1)));
        assert!(new_rx.try_recv().is_ok());
        assert_eq!(
            old_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );

        // The replaced connection's cleanup must not remove the new one.
        let outcome = relay.leave(&sid("g1"), &p("alice"), ConnectionId::new(1)).await;
        assert_eq!(outcome, LeaveOutcome::NotMember);
        assert_eq!(relay.session_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_join_other_session_not_blocked_by_busy_session() {
        let relay = Arc::new(Relay::<ChessEngine>::new());
        let (_, _rx_a) = join(&relay, "a", "alice", 1).await;

        // Hold session "a" and park a second join on it.
        let handle = relay.registry.lock().await.get(&sid("a")).unwrap();
        let busy = handle.lock().await;
        let parked = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move {
                let (tx, _rx) = mpsc::unbounded_channel();
                relay
                    .join(&sid("a"), &p("bob"), ConnectionId::new(2), tx)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let other = tokio::time::timeout(
            Duration::from_millis(500),
            join(&relay, "b", "carol", 3),
        )
        .await;
        assert!(other.is_ok(), "join on another session was blocked");
        assert!(!parked.is_finished());

        drop(busy);
        let outcome = parked.await.unwrap();
        assert_eq!(outcome.role, Some(Role::Black));
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[tokio::test]
    async fn test_leave_last_connection_destroys_session() {
        let relay = Relay::<ChessEngine>::new();
        join(&relay, "g1", "alice", 1).await;
        join(&relay, "g1", "bob", 2).await;
        relay.submit_move(&sid("g1"), &p("alice"), "e2e4").await.unwrap();

        relay.leave(&sid("g1"), &p("alice"), ConnectionId::new(1)).await;
        let outcome = relay.leave(&sid("g1"), &p("bob"), ConnectionId::new(2)).await;

        assert_eq!(outcome, LeaveOutcome::Emptied);
        assert_eq!(relay.session_count().await, 0);
        assert!(matches!(
            relay.snapshot(&sid("g1")).await,
            Err(RelayError::Session(SessionError::NotFound(_)))
        ));

        // Same id again: a brand-new game.
        let (outcome, mut rx) = join(&relay, "g1", "carol", 3).await;
        assert!(outcome.created);
        assert_eq!(outcome.role, Some(Role::White));
        let state = next_state(&mut rx);
        assert_eq!(state.status, SessionStatus::Waiting);
        assert_eq!(
            state.fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[tokio::test]
    async fn test_leave_with_others_present_broadcasts_departure() {
        let relay = Relay::<ChessEngine>::new();
        join(&relay, "g1", "alice", 1).await;
        let (_, mut rx_b) = join(&relay, "g1", "bob", 2).await;
        drain(&mut rx_b);

        let outcome = relay.leave(&sid("g1"), &p("alice"), ConnectionId::new(1)).await;

        assert_eq!(outcome, LeaveOutcome::Remaining(1));
        // Roles are never reassigned; alice's seat stays hers.
        let state = next_state(&mut rx_b);
        assert_eq!(state.white_player, Some(p("alice")));
        assert_eq!(relay.session_count().await, 1);
    }

    // =====================================================================
    // submit_move()
    // =====================================================================

    #[tokio::test]
    async fn test_submit_move_accepted_broadcasts_to_everyone() {
        let relay = Relay::<ChessEngine>::new();
        let (_, mut rx_a) = join(&relay, "g1", "alice", 1).await;
        let (_, mut rx_b) = join(&relay, "g1", "bob", 2).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        let applied = relay
            .submit_move(&sid("g1"), &p("alice"), "e2e4")
            .await
            .expect("legal move");

        assert_eq!(applied.role, Role::White);
        for rx in [&mut rx_a, &mut rx_b] {
            let state = next_state(rx);
            assert_eq!(state.current_turn, Role::Black);
            assert_eq!(
                state.fen,
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
            );
        }
    }

    #[tokio::test]
    async fn test_submit_move_rejected_broadcasts_nothing() {
        let relay = Relay::<ChessEngine>::new();
        let (_, mut rx_a) = join(&relay, "g1", "alice", 1).await;
        let (_, mut rx_b) = join(&relay, "g1", "bob", 2).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        let result = relay.submit_move(&sid("g1"), &p("bob"), "e7e5").await;

        assert_eq!(result, Err(RelayError::Move(MoveError::NotYourTurn)));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submit_move_unknown_session_returns_not_found() {
        let relay = Relay::<ChessEngine>::new();
        let result = relay.submit_move(&sid("nope"), &p("alice"), "e2e4").await;
        assert!(matches!(
            result,
            Err(RelayError::Session(SessionError::NotFound(_)))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_submit_move_concurrent_same_move_exactly_one_succeeds() {
        let relay = Arc::new(Relay::<ChessEngine>::new());
        let (_, _rx_a) = join(&relay, "g1", "alice", 1).await;
        let (_, _rx_b) = join(&relay, "g1", "bob", 2).await;

        let mut tasks = Vec::new();
        for token in ["e2e4", "d2d4"] {
            let relay = Arc::clone(&relay);
            tasks.push(tokio::spawn(async move {
                relay.submit_move(&sid("g1"), &p("alice"), token).await
            }));
        }

        let mut ok = 0;
        let mut rejected = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(RelayError::Move(MoveError::NotYourTurn)) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!((ok, rejected), (1, 1));

        let state = relay.snapshot(&sid("g1")).await.unwrap();
        assert_eq!(state.current_turn, Role::Black);
    }

    // =====================================================================
    // broadcast_state() / broadcast_all()
    // =====================================================================

    #[tokio::test]
    async fn test_broadcast_closed_receiver_does_not_block_others() {
        let relay = Relay::<ChessEngine>::new();
        let (_, rx_a) = join(&relay, "g1", "alice", 1).await;
        let (_, mut rx_b) = join(&relay, "g1", "bob", 2).await;
        drain(&mut rx_b);
        drop(rx_a);

        let delivered = relay.broadcast_state(&sid("g1")).await.unwrap();

        assert_eq!(delivered, 1);
        assert!(next_state(&mut rx_b).white_player.is_some());
    }

    #[tokio::test]
    async fn test_broadcast_all_visits_each_session_only_for_its_members() {
        let relay = Relay::<ChessEngine>::new();
        let (_, mut rx_1) = join(&relay, "g1", "alice", 1).await;
        let (_, mut rx_2) = join(&relay, "g2", "bob", 2).await;
        drain(&mut rx_1);
        drain(&mut rx_2);

        let visited = relay.broadcast_all().await;

        assert_eq!(visited, 2);
        assert_eq!(next_state(&mut rx_1).white_player, Some(p("alice")));
        assert_eq!(next_state(&mut rx_2).white_player, Some(p("bob")));
        assert!(rx_1.try_recv().is_err());
        assert!(rx_2.try_recv().is_err());
    }
}
