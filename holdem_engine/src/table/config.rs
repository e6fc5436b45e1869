//! Table and manager configuration models.

use serde::{Deserialize, Serialize};
use std::env;

use super::errors::{TableError, TableResult};
use crate::game::entities::Chips;

/// Largest table the deck can serve: two hole cards per seat plus a full
/// five card board.
pub const MAX_SEATS: u8 = 23;

/// Table configuration, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table display name
    pub name: String,

    /// Number of seats (2..=23)
    pub seat_count: u8,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Minimum buy-in in chips
    pub min_buyin: Chips,

    /// Maximum buy-in in chips
    pub max_buyin: Chips,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            seat_count: 9,
            small_blind: 25,
            big_blind: 50,
            min_buyin: 10_000,
            max_buyin: 20_000,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> TableResult<()> {
        let invalid = |reason: &str| Err(TableError::InvalidConfig(reason.to_string()));

        if self.name.trim().is_empty() {
            return invalid("Table name must not be empty");
        }

        if self.seat_count < 2 || self.seat_count > MAX_SEATS {
            return invalid("Seat count must be between 2 and 23");
        }

        if self.small_blind == 0 {
            return invalid("Small blind must be greater than 0");
        }

        if self.big_blind <= self.small_blind {
            return invalid("Big blind must be greater than small blind");
        }

        if self.min_buyin == 0 {
            return invalid("Min buy-in must be greater than 0");
        }

        if self.min_buyin < self.big_blind {
            return invalid("Min buy-in must cover the big blind");
        }

        if self.max_buyin < self.min_buyin {
            return invalid("Max buy-in can not be less than min buy-in");
        }

        // Every chip at the table must fit in one pot.
        if u64::from(self.max_buyin) * u64::from(self.seat_count) > u64::from(Chips::MAX) {
            return invalid("Max buy-in times seat count exceeds the chip limit");
        }

        Ok(())
    }
}

/// Runtime settings for the table manager and its actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Seconds the active player has before being auto check-or-folded.
    /// Zero disables the clock.
    pub action_timeout_secs: u64,

    /// Capacity of each table actor's message inbox
    pub inbox_capacity: usize,

    /// How often actors check the action clock, in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            action_timeout_secs: 0,
            inbox_capacity: 100,
            tick_interval_ms: 1000,
        }
    }
}

impl ManagerConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `ENGINE_ACTION_TIMEOUT_SECS`: Action clock in seconds (default: 0, disabled)
    /// - `ENGINE_INBOX_CAPACITY`: Actor inbox size (default: 100)
    /// - `ENGINE_TICK_INTERVAL_MS`: Actor tick interval (default: 1000)
    ///
    /// # Errors
    ///
    /// Returns `TableError::InvalidConfig` if a variable is set but unparseable
    pub fn from_env() -> TableResult<Self> {
        let defaults = Self::default();
        let config = Self {
            action_timeout_secs: parse_env_or(
                "ENGINE_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            )?,
            inbox_capacity: parse_env_or("ENGINE_INBOX_CAPACITY", defaults.inbox_capacity)?,
            tick_interval_ms: parse_env_or("ENGINE_TICK_INTERVAL_MS", defaults.tick_interval_ms)?,
        };

        if config.inbox_capacity == 0 {
            return Err(TableError::InvalidConfig(
                "ENGINE_INBOX_CAPACITY must be greater than 0".to_string(),
            ));
        }
        if config.tick_interval_ms == 0 {
            return Err(TableError::InvalidConfig(
                "ENGINE_TICK_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Reads `var` and parses it, falling back to `default` when unset.
pub(crate) fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> TableResult<T> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| TableError::InvalidConfig(format!("{var} has an invalid value {raw:?}"))),
        Err(_) => Ok(default),
    }
}
