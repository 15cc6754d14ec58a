//! The relay layer for Gambit: who is connected, and what they are told.
//!
//! - **Connection table** ([`ConnectionTable`]): per session, participant →
//!   live outbound channel.
//! - **Relay** ([`Relay`]): the one object that owns the session registry
//!   and the connection table, and runs join, leave, move and broadcast
//!   against them with a fixed lock order.
//! - **Periodic sweep** ([`PeriodicSweep`]): a background task that
//!   re-broadcasts every session once per tick until told to stop.
//!
//! # Lock order
//!
//! ```text
//! registry map → session → connection table
//! ```
//!
//! Every path takes a subset of these in this order and never the reverse,
//! so the relay cannot deadlock against itself.

mod broadcast;
mod error;
mod relay;
mod sweep;
mod table;

pub use error::RelayError;
pub use relay::{JoinOutcome, Relay};
pub use sweep::{PeriodicSweep, SweepHandle};
pub use table::{ConnectionTable, LeaveOutcome, ParticipantSender};
