//! Wire protocol for Gambit.
//!
//! This crate defines what clients and the relay say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`GameSnapshot`]):
//!   the JSON shapes that travel over the realtime channel.
//! - **Identity** ([`SessionId`], [`ParticipantId`], [`Role`]): who is
//!   talking, about which session, and which side they play.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or sessions. It only
//! knows how messages look and how to (de)serialize them.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage/ServerMessage) → Relay
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, GameSnapshot, ParticipantId, Role, ServerMessage,
    SessionId, SessionStatus,
};
