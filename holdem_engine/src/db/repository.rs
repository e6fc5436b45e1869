//! Repository trait for table storage, with the PostgreSQL implementation.
//!
//! The engine only ever talks to storage through [`TableRepository`], so
//! every operation receives the repository as an explicit argument and
//! tests can swap in [`super::InMemoryTableRepository`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use super::records::{PlayerRecord, TableRecord};
use crate::game::TableId;
use crate::table::errors::TableResult;

const SCHEMA: &str = include_str!("../../migrations/001_poker_tables.sql");

/// Trait for table and player storage operations
#[async_trait]
pub trait TableRepository: Send + Sync {
    /// Insert a newly created table
    async fn insert_table(&self, table: &TableRecord) -> TableResult<()>;

    /// Find table by ID
    async fn load_table(&self, table_id: TableId) -> TableResult<Option<TableRecord>>;

    /// Overwrite a table's runtime state
    async fn save_table(&self, table: &TableRecord) -> TableResult<()>;

    /// All stored tables, oldest first
    async fn list_tables(&self) -> TableResult<Vec<TableRecord>>;

    /// Players seated at a table
    async fn load_players(&self, table_id: TableId) -> TableResult<Vec<PlayerRecord>>;

    /// Overwrite the state of already seated players
    async fn save_players(&self, players: &[PlayerRecord]) -> TableResult<()>;

    /// Seat a new player
    async fn add_player(&self, player: &PlayerRecord) -> TableResult<()>;

    /// Seat a new player and persist the table with all of its players.
    /// Either every write lands or none does.
    async fn add_player_and_save(
        &self,
        player: &PlayerRecord,
        table: &TableRecord,
        players: &[PlayerRecord],
    ) -> TableResult<()>;

    /// Persist a table together with all of its players
    ///
    /// Implementations backed by a real database should override this to
    /// commit both writes in one transaction.
    async fn save_aggregate(&self, table: &TableRecord, players: &[PlayerRecord]) -> TableResult<()> {
        self.save_table(table).await?;
        self.save_players(players).await
    }
}

/// Default PostgreSQL implementation of `TableRepository`
#[derive(Clone)]
pub struct PgTableRepository {
    pool: PgPool,
}

impl PgTableRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `poker_tables` and `poker_players` tables if missing
    pub async fn migrate(&self) -> TableResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_player(
        tx: &mut Transaction<'_, Postgres>,
        player: &PlayerRecord,
    ) -> TableResult<()> {
        sqlx::query(&format!(
            "INSERT INTO poker_players ({PLAYER_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(player.table_id)
        .bind(player.user_id)
        .bind(player.seat_number)
        .bind(player.buyin)
        .bind(player.stack)
        .bind(player.position)
        .bind(player.current_bet)
        .bind(player.amount_in_pot)
        .bind(player.is_active)
        .bind(player.has_folded)
        .bind(player.has_acted)
        .bind(player.sitting_out)
        .bind(&player.hand)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn update_table(
        tx: &mut Transaction<'_, Postgres>,
        table: &TableRecord,
    ) -> TableResult<()> {
        sqlx::query(
            "UPDATE poker_tables
             SET phase = $2, pot_amount = $3, board = $4, deck = $5, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(table.id)
        .bind(&table.phase)
        .bind(table.pot_amount)
        .bind(&table.board)
        .bind(&table.deck)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn update_player(
        tx: &mut Transaction<'_, Postgres>,
        player: &PlayerRecord,
    ) -> TableResult<()> {
        sqlx::query(
            "UPDATE poker_players
             SET stack = $3, position = $4, current_bet = $5, amount_in_pot = $6,
                 is_active = $7, has_folded = $8, has_acted = $9, sitting_out = $10,
                 hand = $11, updated_at = NOW()
             WHERE table_id = $1 AND user_id = $2",
        )
        .bind(player.table_id)
        .bind(player.user_id)
        .bind(player.stack)
        .bind(player.position)
        .bind(player.current_bet)
        .bind(player.amount_in_pot)
        .bind(player.is_active)
        .bind(player.has_folded)
        .bind(player.has_acted)
        .bind(player.sitting_out)
        .bind(&player.hand)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

fn table_from_row(r: &PgRow) -> TableRecord {
    TableRecord {
        id: r.get("id"),
        name: r.get("name"),
        seat_count: r.get("seat_count"),
        small_blind: r.get("small_blind"),
        big_blind: r.get("big_blind"),
        min_buyin: r.get("min_buyin"),
        max_buyin: r.get("max_buyin"),
        phase: r.get("phase"),
        pot_amount: r.get("pot_amount"),
        board: r.get("board"),
        deck: r.get("deck"),
        created_at: r.get("created_at"),
    }
}

fn player_from_row(r: &PgRow) -> PlayerRecord {
    PlayerRecord {
        table_id: r.get("table_id"),
        user_id: r.get("user_id"),
        seat_number: r.get("seat_number"),
        buyin: r.get("buyin"),
        stack: r.get("stack"),
        position: r.get("position"),
        current_bet: r.get("current_bet"),
        amount_in_pot: r.get("amount_in_pot"),
        is_active: r.get("is_active"),
        has_folded: r.get("has_folded"),
        has_acted: r.get("has_acted"),
        sitting_out: r.get("sitting_out"),
        hand: r.get("hand"),
    }
}

const TABLE_COLUMNS: &str = "id, name, seat_count, small_blind, big_blind, min_buyin, max_buyin,
     phase, pot_amount, board, deck, created_at";

const PLAYER_COLUMNS: &str = "table_id, user_id, seat_number, buyin, stack, position, current_bet,
     amount_in_pot, is_active, has_folded, has_acted, sitting_out, hand";

#[async_trait]
impl TableRepository for PgTableRepository {
    async fn insert_table(&self, table: &TableRecord) -> TableResult<()> {
        sqlx::query(&format!(
            "INSERT INTO poker_tables ({TABLE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(table.id)
        .bind(&table.name)
        .bind(table.seat_count)
        .bind(table.small_blind)
        .bind(table.big_blind)
        .bind(table.min_buyin)
        .bind(table.max_buyin)
        .bind(&table.phase)
        .bind(table.pot_amount)
        .bind(&table.board)
        .bind(&table.deck)
        .bind(table.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_table(&self, table_id: TableId) -> TableResult<Option<TableRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {TABLE_COLUMNS} FROM poker_tables WHERE id = $1"
        ))
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(table_from_row))
    }

    async fn save_table(&self, table: &TableRecord) -> TableResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::update_table(&mut tx, table).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_tables(&self) -> TableResult<Vec<TableRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {TABLE_COLUMNS} FROM poker_tables ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(table_from_row).collect())
    }

    async fn load_players(&self, table_id: TableId) -> TableResult<Vec<PlayerRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAYER_COLUMNS} FROM poker_players WHERE table_id = $1 ORDER BY seat_number"
        ))
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(player_from_row).collect())
    }

    async fn save_players(&self, players: &[PlayerRecord]) -> TableResult<()> {
        let mut tx = self.pool.begin().await?;
        for player in players {
            Self::update_player(&mut tx, player).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn add_player(&self, player: &PlayerRecord) -> TableResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_player(&mut tx, player).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn add_player_and_save(
        &self,
        player: &PlayerRecord,
        table: &TableRecord,
        players: &[PlayerRecord],
    ) -> TableResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_player(&mut tx, player).await?;
        Self::update_table(&mut tx, table).await?;
        for seated in players {
            Self::update_player(&mut tx, seated).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn save_aggregate(&self, table: &TableRecord, players: &[PlayerRecord]) -> TableResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::update_table(&mut tx, table).await?;
        for player in players {
            Self::update_player(&mut tx, player).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
