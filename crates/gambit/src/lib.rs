//! # Gambit
//!
//! Real-time relay for two-player, turn-based board games.
//!
//! Two participants connect to the same session over WebSockets; the relay
//! pairs them into roles, enforces whose turn it is, asks a
//! [`RulesEngine`] whether each move is legal, and pushes the shared state
//! to every connection on each change and once per sweep interval.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gambit::prelude::*;
//!
//! # async fn run() -> Result<(), GambitError> {
//! let server = GambitServer::<ChessEngine>::builder()
//!     .bind("0.0.0.0:8000")
//!     .build::<ChessEngine>()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod routes;
mod server;

pub use config::ServerConfig;
pub use error::GambitError;
pub use routes::{NewGameResponse, router};
pub use server::{GambitServer, GambitServerBuilder};

pub use gambit_rules::{ChessEngine, RulesEngine};

/// Everything needed to run a server, in one import.
pub mod prelude {
    pub use crate::{
        GambitError, GambitServer, GambitServerBuilder, NewGameResponse,
        ServerConfig,
    };
    pub use gambit_protocol::{
        ClientMessage, GameSnapshot, ParticipantId, Role, ServerMessage,
        SessionId, SessionStatus,
    };
    pub use gambit_relay::Relay;
    pub use gambit_rules::{ChessEngine, PositionStatus, RulesEngine};
    pub use gambit_tick::TickConfig;
}
