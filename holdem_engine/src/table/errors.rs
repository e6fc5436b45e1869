//! Table error types.

use thiserror::Error;

use crate::game::{GameError, TableId};

/// Table errors
#[derive(Debug, Error)]
pub enum TableError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Rejected by the game rules or a broken game state
    #[error(transparent)]
    Game(#[from] GameError),

    /// Table configuration failed validation
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(String),

    /// Table not found
    #[error("Table {0} not found")]
    TableNotFound(TableId),

    /// A stored record can't be mapped back onto the table model
    #[error("Corrupt record for table {table_id}: {reason}")]
    CorruptRecord { table_id: TableId, reason: String },

    /// The table's actor has shut down
    #[error("Table {0} is closed")]
    TableClosed(TableId),
}

impl TableError {
    /// Whether the error signals a broken table or backend rather than a
    /// bad request.
    pub fn is_internal(&self) -> bool {
        match self {
            TableError::Database(_) | TableError::CorruptRecord { .. } => true,
            TableError::Game(err) => err.is_internal(),
            _ => false,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and consistency errors are collapsed to a generic message;
    /// everything else describes a rejected request and is safe to expose.
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            return "Internal server error".to_string();
        }
        match self {
            TableError::TableNotFound(_) => "Table not found".to_string(),
            TableError::TableClosed(_) => "Table is closed".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
