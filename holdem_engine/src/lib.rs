//! # Holdem Engine
//!
//! A server-side engine for multi-seat Texas Hold'em cash tables.
//!
//! The engine tracks seated players, posts blinds, deals hole cards and the
//! board, enforces betting legality and turn order, and advances each table
//! through its phases as players act:
//!
//! - **STARTING**: Waiting for at least two sitting players
//! - **PREFLOP**: Blinds posted, two hole cards dealt to each player
//! - **FLOP**: Three board cards
//! - **TURN**: Fourth board card
//! - **RIVER**: Fifth board card
//!
//! Showdown and pot settlement are not part of the engine.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, players, the roster and the phase state machine
//! - [`table`]: Table operations, per-table actors and the table manager
//! - [`db`]: Storage records and repositories (PostgreSQL and in-memory)
//!
//! ## Example
//!
//! ```
//! use holdem_engine::{Action, Game, Phase, TableConfig};
//! use uuid::Uuid;
//!
//! let mut rng = rand::rng();
//! let mut game = Game::new(Uuid::new_v4(), TableConfig::default());
//! game.seat_player(1, 1, 10_000, &mut rng).unwrap();
//! game.seat_player(2, 2, 10_000, &mut rng).unwrap();
//! assert_eq!(game.phase, Phase::Preflop);
//!
//! game.act(1, Action::CheckOrCall, &mut rng).unwrap();
//! game.act(2, Action::CheckOrCall, &mut rng).unwrap();
//! assert_eq!(game.phase, Phase::Flop);
//! assert_eq!(game.pot_amount, 100);
//! ```

/// Cards, players, roster and the phase state machine.
pub mod game;
pub use game::{
    Action, ActionKind, ActionOutcome, Game, GameError, GameResult, Phase,
    entities::{self, Chips, TableId, UserId},
};

/// Table operations, actors and configuration.
pub mod table;
pub use table::{ManagerConfig, TableConfig, TableError, TableManager, TableResult, service};

/// Table storage.
pub mod db;
pub use db::{InMemoryTableRepository, PgTableRepository, TableRepository};
