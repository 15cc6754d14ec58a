//! Unified error type for Gambit.

use gambit_protocol::ProtocolError;
use gambit_relay::RelayError;
use gambit_session::SessionError;
use gambit_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attributes let `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum GambitError {
    /// A transport-level error (send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (not found, full).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A relay-level error (rejected move, vanished session).
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Binding or serving the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
