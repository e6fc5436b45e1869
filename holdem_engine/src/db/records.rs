//! Flat storage records and their mapping onto the table model.
//!
//! Records mirror the `poker_tables` and `poker_players` rows column for
//! column. Every field is mapped explicitly in both directions so a missing
//! or extra column is a compile error rather than a silently ignored key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{
    Deck, Game, Player, Roster, TableId, UserId,
    entities::{format_cards, parse_cards},
};
use crate::table::{
    config::TableConfig,
    errors::{TableError, TableResult},
};

/// Stored form of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: TableId,
    pub name: String,
    pub seat_count: i16,
    pub small_blind: i64,
    pub big_blind: i64,
    pub min_buyin: i64,
    pub max_buyin: i64,
    pub phase: String,
    pub pot_amount: i64,
    /// Space separated cards, e.g. `Ah Kd 7c`
    pub board: String,
    /// Space separated undealt cards, top first
    pub deck: String,
    pub created_at: DateTime<Utc>,
}

/// Stored form of a seated player. Keyed by `(table_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub table_id: TableId,
    pub user_id: UserId,
    pub seat_number: i16,
    pub buyin: i64,
    pub stack: i64,
    pub position: Option<i16>,
    pub current_bet: i64,
    pub amount_in_pot: i64,
    pub is_active: bool,
    pub has_folded: bool,
    pub has_acted: bool,
    pub sitting_out: bool,
    pub hand: String,
}

impl From<&Game> for TableRecord {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            name: game.config.name.clone(),
            seat_count: i16::from(game.config.seat_count),
            small_blind: i64::from(game.config.small_blind),
            big_blind: i64::from(game.config.big_blind),
            min_buyin: i64::from(game.config.min_buyin),
            max_buyin: i64::from(game.config.max_buyin),
            phase: game.phase.as_str().to_string(),
            pot_amount: i64::from(game.pot_amount),
            board: format_cards(&game.board),
            deck: format_cards(game.deck.cards()),
            created_at: game.created_at,
        }
    }
}

impl From<&Player> for PlayerRecord {
    fn from(player: &Player) -> Self {
        Self {
            table_id: player.table_id,
            user_id: player.user_id,
            seat_number: i16::from(player.seat_number),
            buyin: i64::from(player.buyin),
            stack: i64::from(player.stack),
            position: player.position.map(i16::from),
            current_bet: i64::from(player.current_bet),
            amount_in_pot: i64::from(player.amount_in_pot),
            is_active: player.is_active,
            has_folded: player.has_folded,
            has_acted: player.has_acted,
            sitting_out: player.sitting_out,
            hand: format_cards(&player.hand),
        }
    }
}

/// Splits a game into the records that persist it.
pub fn to_records(game: &Game) -> (TableRecord, Vec<PlayerRecord>) {
    (
        TableRecord::from(game),
        game.roster.players().iter().map(PlayerRecord::from).collect(),
    )
}

impl TableRecord {
    /// Rebuilds the aggregate from this table row and its player rows.
    pub fn into_game(self, players: Vec<PlayerRecord>) -> TableResult<Game> {
        let id = self.id;
        let config = TableConfig {
            seat_count: narrow(id, "seat_count", self.seat_count)?,
            small_blind: narrow(id, "small_blind", self.small_blind)?,
            big_blind: narrow(id, "big_blind", self.big_blind)?,
            min_buyin: narrow(id, "min_buyin", self.min_buyin)?,
            max_buyin: narrow(id, "max_buyin", self.max_buyin)?,
            name: self.name,
        };
        let players = players
            .into_iter()
            .map(|record| record.into_player(id))
            .collect::<TableResult<Vec<_>>>()?;

        Ok(Game {
            id,
            config,
            phase: self.phase.parse()?,
            pot_amount: narrow(id, "pot_amount", self.pot_amount)?,
            board: parse_cards(&self.board)?,
            deck: Deck::from_cards(parse_cards(&self.deck)?),
            roster: Roster::new(players),
            created_at: self.created_at,
        })
    }
}

impl PlayerRecord {
    fn into_player(self, table_id: TableId) -> TableResult<Player> {
        if self.table_id != table_id {
            return Err(TableError::CorruptRecord {
                table_id,
                reason: format!("player {} belongs to table {}", self.user_id, self.table_id),
            });
        }
        Ok(Player {
            table_id,
            user_id: self.user_id,
            seat_number: narrow(table_id, "seat_number", self.seat_number)?,
            buyin: narrow(table_id, "buyin", self.buyin)?,
            stack: narrow(table_id, "stack", self.stack)?,
            position: self
                .position
                .map(|position| narrow(table_id, "position", position))
                .transpose()?,
            current_bet: narrow(table_id, "current_bet", self.current_bet)?,
            amount_in_pot: narrow(table_id, "amount_in_pot", self.amount_in_pot)?,
            is_active: self.is_active,
            has_folded: self.has_folded,
            has_acted: self.has_acted,
            sitting_out: self.sitting_out,
            hand: parse_cards(&self.hand)?,
        })
    }
}

/// Converts a stored column into the model's narrower type.
fn narrow<S, T>(table_id: TableId, column: &str, value: S) -> TableResult<T>
where
    S: Copy + std::fmt::Display,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| TableError::CorruptRecord {
        table_id,
        reason: format!("{column} out of range: {value}"),
    })
}
