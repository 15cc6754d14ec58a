//! The broadcast engine: snapshot a session, push it to every connection.

use gambit_protocol::{ServerMessage, SessionId};
use gambit_rules::RulesEngine;
use gambit_session::Session;

use crate::{Relay, RelayError};

impl<E: RulesEngine> Relay<E> {
    /// Sends the current state of `session_id` to all of its connections.
    ///
    /// Returns how many connections the snapshot was enqueued for.
    ///
    /// # Errors
    /// [`RelayError::Session`] if the session no longer exists.
    pub async fn broadcast_state(
        &self,
        session_id: &SessionId,
    ) -> Result<usize, RelayError> {
        let handle = self.registry.lock().await.get(session_id)?;
        let session = handle.lock().await;
        Ok(self.broadcast_locked(&session).await)
    }

    /// Broadcasts every live session once. Used by the periodic sweep.
    ///
    /// Returns the number of sessions visited.
    pub async fn broadcast_all(&self) -> usize {
        // Copy the handles out so the registry lock is not held while we
        // wait on individual sessions.
        let handles = self.registry.lock().await.handles();
        for (_, handle) in &handles {
            let session = handle.lock().await;
            self.broadcast_locked(&session).await;
        }
        handles.len()
    }

    /// Snapshots `session` and enqueues it on every channel in its table
    /// entry.
    ///
    /// The caller holds the session lock, so the snapshot is consistent
    /// and snapshots of one session are enqueued in state order. A closed
    /// channel is skipped; it never stops delivery to the rest.
    pub(crate) async fn broadcast_locked(&self, session: &Session<E>) -> usize {
        let channels = self.table.lock().await.channels_for(session.id());
        if channels.is_empty() {
            return 0;
        }

        let msg = ServerMessage::from(session.snapshot());
        let mut delivered = 0;
        for (participant_id, sender) in channels {
            if sender.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(
                    session_id = %session.id(),
                    %participant_id,
                    "outbound channel closed, skipping"
                );
            }
        }
        delivered
    }
}
