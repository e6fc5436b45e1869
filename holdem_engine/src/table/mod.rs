//! Table module: the operations callers run against a table, and the
//! actors that serialize them.
//!
//! This module implements:
//! - `service`: load-mutate-persist operations over a [`TableRepository`]
//! - `TableActor`: async actor owning a single table
//! - `TableManager`: spawns and tracks table actors
//! - Table configuration, client views and errors
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! The actor is the per-table mutual-exclusion boundary: it handles one
//! message at a time, so concurrent requests for one table are applied
//! in arrival order against the latest stored state.
//!
//! ## Example
//!
//! ```no_run
//! use holdem_engine::db::InMemoryTableRepository;
//! use holdem_engine::game::ActionKind;
//! use holdem_engine::table::{ManagerConfig, TableConfig, TableManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), holdem_engine::table::TableError> {
//!     let repo = Arc::new(InMemoryTableRepository::new());
//!     let manager = TableManager::new(repo, ManagerConfig::default());
//!
//!     let table = manager.create_table(TableConfig::default()).await?;
//!     manager.seat_player(table.id, 1, 1, 10_000).await?;
//!     manager.seat_player(table.id, 2, 2, 10_000).await?;
//!     manager.act(table.id, 1, ActionKind::CheckOrCall, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! [`TableRepository`]: crate::db::TableRepository

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod service;
pub mod views;

pub use actor::{TableActor, TableHandle};
pub use config::{MAX_SEATS, ManagerConfig, TableConfig};
pub use errors::{TableError, TableResult};
pub use manager::TableManager;
pub use messages::TableMessage;
pub use views::{PlayerView, TableView};
