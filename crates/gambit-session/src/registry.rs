//! The session registry: every live session, keyed by its identifier.
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself; it is a plain `HashMap`.
//! The relay wraps it in a mutex for the map, and each session sits behind
//! its own [`SessionHandle`] lock, so work on one session never blocks
//! lookups for another.

use std::collections::HashMap;
use std::sync::Arc;

use gambit_protocol::SessionId;
use gambit_rules::RulesEngine;
use rand::Rng;
use tokio::sync::Mutex;

use crate::{Session, SessionError};

/// A shared, lockable session.
///
/// Every mutation of a session's position, turn, status or roles happens
/// while holding this lock, and so does building a snapshot of it.
pub type SessionHandle<E> = Arc<Mutex<Session<E>>>;

/// Maps session identifiers to sessions.
///
/// ## Lifecycle
///
/// ```text
/// ensure_session() ──→ [live] ──→ destroy_session()
///        ↑                              │
///        └──── same id, fresh session ──┘
/// ```
///
/// Sessions are created lazily by the first connection and destroyed
/// when the last connection leaves; the relay decides when that is.
pub struct SessionRegistry<E: RulesEngine> {
    sessions: HashMap<SessionId, SessionHandle<E>>,
}

impl<E: RulesEngine> SessionRegistry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Returns the session for `id`, creating it if needed.
    ///
    /// The second element is `true` when this call created the session.
    /// Since the caller holds `&mut self`, two calls with the same id can
    /// never both create one.
    pub fn ensure_session(&mut self, id: &SessionId) -> (SessionHandle<E>, bool) {
        if let Some(handle) = self.sessions.get(id) {
            return (Arc::clone(handle), false);
        }

        let handle = Arc::new(Mutex::new(Session::new(id.clone())));
        self.sessions.insert(id.clone(), Arc::clone(&handle));
        tracing::info!(session_id = %id, "session created");
        (handle, true)
    }

    /// Looks up a session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session exists for `id`.
    pub fn get(&self, id: &SessionId) -> Result<SessionHandle<E>, SessionError> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Removes a session and everything it holds.
    ///
    /// Only call this once the session has no connections left.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session exists for `id`.
    pub fn destroy_session(&mut self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        tracing::info!(session_id = %id, "session destroyed");
        Ok(())
    }

    /// A point-in-time list of every session, for the periodic sweep.
    pub fn handles(&self) -> Vec<(SessionId, SessionHandle<E>)> {
        self.sessions
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<E: RulesEngine> Default for SessionRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a fresh session identifier: 32 lowercase hex characters
/// (128 bits from the thread-local CSPRNG).
pub fn new_session_id() -> SessionId {
    SessionId::new(generate_token())
}

fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
