//! Transport abstraction layer for Gambit.
//!
//! Provides the [`Connection`] trait the session endpoint talks to, and a
//! WebSocket implementation over an upgraded axum socket. Accepting
//! connections, HTTP routing, and the upgrade handshake belong to axum;
//! this crate starts once a socket exists.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketConnection`] via `axum::extract::ws`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;

/// Opaque identifier for a connection.
///
/// Two connections from the same participant get different ids, which is
/// how the relay tells a replaced connection from its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw counter value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One participant's realtime channel, as the endpoint sees it.
///
/// `send` and `recv` may be awaited concurrently from the same task's
/// `select!`, so implementations keep the two directions independent.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Delivers one encoded relay message.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Waits for the client's next request frame.
    ///
    /// `Ok(None)` means the client went away cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Tells the client we are done with it.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        assert_eq!(ConnectionId::new(1), ConnectionId::new(1));
        assert_ne!(ConnectionId::new(1), ConnectionId::new(2));
    }
}
