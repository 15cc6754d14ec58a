//! Session management for Gambit.
//!
//! This crate owns everything about a single match:
//!
//! 1. **Session state** ([`Session`]): the position, who holds which role,
//!    whose turn it is, and the `waiting → ongoing → finished` lifecycle.
//! 2. **Role assignment** ([`Session::assign_role`]): pairing participants
//!    into the two roles as they join.
//! 3. **Moves** ([`Session::submit_move`]): the turn/move state machine.
//! 4. **Registry** ([`SessionRegistry`]): session id → session, created
//!    lazily and destroyed when the last connection leaves.
//!
//! # How it fits in the stack
//!
//! ```text
//! Relay Layer (above)  ← locks sessions, fans snapshots out to connections
//!     ↕
//! Session Layer (this crate)  ← turn enforcement and lifecycle
//!     ↕
//! Rules Layer (below)  ← legality, apply, status
//! ```

mod error;
mod moves;
mod registry;
mod session;

pub use error::{MoveError, SessionError};
pub use moves::MoveApplied;
pub use registry::{SessionHandle, SessionRegistry, new_session_id};
pub use session::{Session, format_elapsed};
