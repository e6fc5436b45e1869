//! Poker game engine - table model and phase state machine.
//!
//! This module provides the in-memory side of a cash table:
//! - Cards and a deck that deals without replacement
//! - Players and their per-round betting state
//! - The roster, which derives positions, turn order and round predicates
//! - The [`Game`] aggregate driving `STARTING → PREFLOP → FLOP → TURN → RIVER`
//!
//! Nothing in here performs I/O; persistence and serialization of access
//! live in [`crate::table`] and [`crate::db`].

pub mod entities;
pub mod errors;
pub mod player;
pub mod roster;
pub mod state_machine;

pub use entities::{Action, ActionKind, Card, Chips, Deck, Phase, SeatNumber, Suit, TableId, UserId};
pub use errors::{GameError, GameResult};
pub use player::Player;
pub use roster::Roster;
pub use state_machine::{ActionOutcome, Applied, Game};
