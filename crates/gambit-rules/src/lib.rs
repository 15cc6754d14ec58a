//! Rules engine layer for Gambit.
//!
//! The relay never decides what a legal move is. It hands positions and
//! move tokens to a [`RulesEngine`] and acts on the answers:
//!
//! - **Engine seam** ([`RulesEngine`], [`PositionStatus`]): the capability
//!   the session layer is generic over.
//! - **Position store** ([`PositionStore`]): one position per session, with
//!   every query delegated to the engine.
//! - **Chess** ([`ChessEngine`]): the production binding, FEN positions and
//!   UCI move tokens on top of `shakmaty`.
//!
//! ```text
//! Session Layer (above)  ← owns one PositionStore per session
//!     ↕
//! Rules Layer (this crate)  ← legality, apply, status, encodings
//! ```

#[cfg(feature = "chess")]
mod chess;
mod engine;
mod error;
mod store;

#[cfg(feature = "chess")]
pub use chess::{ChessEngine, ChessPosition};
pub use engine::{PositionStatus, RulesEngine};
pub use error::RulesError;
pub use store::PositionStore;
