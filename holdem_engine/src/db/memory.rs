//! In-memory `TableRepository` for tests and database-less deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::records::{PlayerRecord, TableRecord};
use super::repository::TableRepository;
use crate::game::{TableId, UserId};
use crate::table::errors::{TableError, TableResult};

/// Keeps records in hash maps behind async locks.
///
/// Writes to rows that don't exist are ignored, the same as an `UPDATE`
/// that matches nothing.
#[derive(Debug, Default)]
pub struct InMemoryTableRepository {
    tables: RwLock<HashMap<TableId, TableRecord>>,
    players: RwLock<HashMap<(TableId, UserId), PlayerRecord>>,
    writes: AtomicUsize,
}

impl InMemoryTableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TableRepository for InMemoryTableRepository {
    async fn insert_table(&self, table: &TableRecord) -> TableResult<()> {
        self.record_write();
        self.tables.write().await.insert(table.id, table.clone());
        Ok(())
    }

    async fn load_table(&self, table_id: TableId) -> TableResult<Option<TableRecord>> {
        Ok(self.tables.read().await.get(&table_id).cloned())
    }

    async fn save_table(&self, table: &TableRecord) -> TableResult<()> {
        self.record_write();
        if let Some(stored) = self.tables.write().await.get_mut(&table.id) {
            *stored = table.clone();
        }
        Ok(())
    }

    async fn list_tables(&self) -> TableResult<Vec<TableRecord>> {
        let mut tables: Vec<_> = self.tables.read().await.values().cloned().collect();
        tables.sort_by_key(|t| (t.created_at, t.id));
        Ok(tables)
    }

    async fn load_players(&self, table_id: TableId) -> TableResult<Vec<PlayerRecord>> {
        let mut players: Vec<_> = self
            .players
            .read()
            .await
            .values()
            .filter(|p| p.table_id == table_id)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.seat_number);
        Ok(players)
    }

    async fn save_players(&self, players: &[PlayerRecord]) -> TableResult<()> {
        self.record_write();
        let mut stored = self.players.write().await;
        for player in players {
            if let Some(row) = stored.get_mut(&(player.table_id, player.user_id)) {
                *row = player.clone();
            }
        }
        Ok(())
    }

    async fn add_player(&self, player: &PlayerRecord) -> TableResult<()> {
        self.record_write();
        if !self.tables.read().await.contains_key(&player.table_id) {
            return Err(TableError::TableNotFound(player.table_id));
        }
        self.players
            .write()
            .await
            .insert((player.table_id, player.user_id), player.clone());
        Ok(())
    }

    async fn add_player_and_save(
        &self,
        player: &PlayerRecord,
        table: &TableRecord,
        players: &[PlayerRecord],
    ) -> TableResult<()> {
        self.record_write();
        let mut tables = self.tables.write().await;
        let mut stored = self.players.write().await;
        let Some(stored_table) = tables.get_mut(&table.id) else {
            return Err(TableError::TableNotFound(table.id));
        };

        *stored_table = table.clone();
        stored.insert((player.table_id, player.user_id), player.clone());
        for seated in players {
            if let Some(row) = stored.get_mut(&(seated.table_id, seated.user_id)) {
                *row = seated.clone();
            }
        }
        Ok(())
    }
}
