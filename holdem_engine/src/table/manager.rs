//! Table manager for spawning and managing multiple table actors.

use std::{collections::HashMap, sync::Arc};
use tokio::{sync::RwLock, task::JoinHandle};

use super::{
    actor::{TableActor, TableHandle},
    config::{ManagerConfig, TableConfig},
    errors::{TableError, TableResult},
    service,
    views::TableView,
};
use crate::db::{
    records::{PlayerRecord, TableRecord},
    repository::TableRepository,
};
use crate::game::{ActionKind, ActionOutcome, Chips, SeatNumber, TableId, UserId};

/// A spawned actor: its handle and the task running it.
struct RunningTable {
    handle: TableHandle,
    task: JoinHandle<()>,
}

impl RunningTable {
    fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }
}

/// Table manager for managing multiple table instances
///
/// Every operation on a table goes through that table's actor, so two
/// requests for the same table never interleave. Requests for different
/// tables run in parallel.
pub struct TableManager {
    /// Table storage
    repo: Arc<dyn TableRepository>,

    config: ManagerConfig,

    /// Running table actors
    tables: Arc<RwLock<HashMap<TableId, RunningTable>>>,
}

impl TableManager {
    pub fn new(repo: Arc<dyn TableRepository>, config: ManagerConfig) -> Self {
        Self {
            repo,
            config,
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn actors for every stored table that isn't running yet
    ///
    /// # Returns
    ///
    /// * `TableResult<usize>` - Number of actors spawned
    pub async fn load_existing_tables(&self) -> TableResult<usize> {
        let records = service::list_tables(self.repo.as_ref()).await?;
        let mut tables = self.tables.write().await;
        let mut spawned = 0;
        for record in records {
            if tables.get(&record.id).is_some_and(|t| !t.is_closed()) {
                continue;
            }
            if let Some(stale) = tables.remove(&record.id) {
                Self::join(record.id, stale.task).await;
            }
            tables.insert(record.id, self.spawn(record.id));
            spawned += 1;
            log::info!("Loaded and spawned existing table {}", record.id);
        }
        Ok(spawned)
    }

    /// Create a table and spawn its actor
    pub async fn create_table(&self, config: TableConfig) -> TableResult<TableRecord> {
        let record = service::create_table(self.repo.as_ref(), config).await?;
        self.tables
            .write()
            .await
            .insert(record.id, self.spawn(record.id));
        Ok(record)
    }

    /// Handle to a table's actor, spawning it if the table is stored but
    /// not running
    pub async fn get_table(&self, table_id: TableId) -> TableResult<TableHandle> {
        if let Some(running) = self.tables.read().await.get(&table_id)
            && !running.is_closed()
        {
            return Ok(running.handle.clone());
        }

        let mut tables = self.tables.write().await;
        if let Some(running) = tables.get(&table_id)
            && !running.is_closed()
        {
            return Ok(running.handle.clone());
        }
        if self.repo.load_table(table_id).await?.is_none() {
            return Err(TableError::TableNotFound(table_id));
        }

        // Reap the stopped actor before replacing it.
        if let Some(stale) = tables.remove(&table_id) {
            Self::join(table_id, stale.task).await;
        }

        let running = self.spawn(table_id);
        let handle = running.handle.clone();
        tables.insert(table_id, running);
        log::info!("Spawned actor for stored table {}", table_id);
        Ok(handle)
    }

    pub async fn seat_player(
        &self,
        table_id: TableId,
        user_id: UserId,
        seat_number: SeatNumber,
        buyin: Chips,
    ) -> TableResult<PlayerRecord> {
        self.get_table(table_id)
            .await?
            .seat_player(user_id, seat_number, buyin)
            .await
    }

    pub async fn act(
        &self,
        table_id: TableId,
        user_id: UserId,
        kind: ActionKind,
        amount: Option<Chips>,
    ) -> TableResult<ActionOutcome> {
        self.get_table(table_id)
            .await?
            .act(user_id, kind, amount)
            .await
    }

    pub async fn set_sitting_out(
        &self,
        table_id: TableId,
        user_id: UserId,
        sitting_out: bool,
    ) -> TableResult<bool> {
        self.get_table(table_id)
            .await?
            .set_sitting_out(user_id, sitting_out)
            .await
    }

    pub async fn table_view(
        &self,
        table_id: TableId,
        viewer: Option<UserId>,
    ) -> TableResult<TableView> {
        self.get_table(table_id).await?.view(viewer).await
    }

    /// All stored tables, running or not
    pub async fn list_tables(&self) -> TableResult<Vec<TableRecord>> {
        service::list_tables(self.repo.as_ref()).await
    }

    /// Stop a table's actor. The table stays in storage and is respawned on
    /// its next request.
    ///
    /// Holds the table map until the actor has drained its inbox and
    /// exited, so no replacement actor can start while the old one still
    /// writes.
    pub async fn close_table(&self, table_id: TableId) -> TableResult<()> {
        let mut tables = self.tables.write().await;
        let running = tables
            .remove(&table_id)
            .ok_or(TableError::TableNotFound(table_id))?;

        if let Err(e) = running.handle.close().await {
            log::warn!("Table {} was already stopped: {}", table_id, e);
        }
        Self::join(table_id, running.task).await;
        drop(tables);

        log::info!("Closed table {}", table_id);
        Ok(())
    }

    /// Number of running table actors
    pub async fn active_table_count(&self) -> usize {
        self.tables
            .read()
            .await
            .values()
            .filter(|t| !t.is_closed())
            .count()
    }

    fn spawn(&self, table_id: TableId) -> RunningTable {
        let (actor, handle) = TableActor::new(table_id, self.repo.clone(), &self.config);
        let task = tokio::spawn(actor.run());
        RunningTable { handle, task }
    }

    async fn join(table_id: TableId, task: JoinHandle<()>) {
        if let Err(e) = task.await {
            log::error!("Table {} actor task failed: {}", table_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTableRepository;
    use crate::game::GameError;
    use async_trait::async_trait;
    use std::time::Duration;
    use uuid::Uuid;

    /// In-memory storage with slow player reads, so requests stay in flight
    /// long enough to race against other calls.
    struct SlowPlayerReads(InMemoryTableRepository);

    #[async_trait]
    impl TableRepository for SlowPlayerReads {
        async fn insert_table(&self, table: &TableRecord) -> TableResult<()> {
            self.0.insert_table(table).await
        }

        async fn load_table(&self, table_id: TableId) -> TableResult<Option<TableRecord>> {
            self.0.load_table(table_id).await
        }

        async fn save_table(&self, table: &TableRecord) -> TableResult<()> {
            self.0.save_table(table).await
        }

        async fn list_tables(&self) -> TableResult<Vec<TableRecord>> {
            self.0.list_tables().await
        }

        async fn load_players(&self, table_id: TableId) -> TableResult<Vec<PlayerRecord>> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.0.load_players(table_id).await
        }

        async fn save_players(&self, players: &[PlayerRecord]) -> TableResult<()> {
            self.0.save_players(players).await
        }

        async fn add_player(&self, player: &PlayerRecord) -> TableResult<()> {
            self.0.add_player(player).await
        }

        async fn add_player_and_save(
            &self,
            player: &PlayerRecord,
            table: &TableRecord,
            players: &[PlayerRecord],
        ) -> TableResult<()> {
            self.0.add_player_and_save(player, table, players).await
        }
    }

    fn manager() -> (Arc<InMemoryTableRepository>, TableManager) {
        let repo = Arc::new(InMemoryTableRepository::new());
        let manager = TableManager::new(repo.clone(), ManagerConfig::default());
        (repo, manager)
    }

    #[tokio::test]
    async fn test_create_table_spawns_actor() {
        let (_, manager) = manager();
        let record = manager.create_table(TableConfig::default()).await.unwrap();

        assert_eq!(manager.active_table_count().await, 1);
        assert!(manager.get_table(record.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let (_, manager) = manager();
        let missing = Uuid::new_v4();
        assert!(matches!(
            manager.table_view(missing, None).await,
            Err(TableError::TableNotFound(id)) if id == missing
        ));
        assert!(matches!(
            manager.close_table(missing).await,
            Err(TableError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_table_respawns_on_demand() {
        let (_, manager) = manager();
        let record = manager.create_table(TableConfig::default()).await.unwrap();
        manager.seat_player(record.id, 1, 1, 10_000).await.unwrap();

        manager.close_table(record.id).await.unwrap();
        assert_eq!(manager.active_table_count().await, 0);

        let view = manager.table_view(record.id, Some(1)).await.unwrap();
        assert_eq!(view.players.len(), 1);
        assert_eq!(manager.active_table_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_waits_for_in_flight_request() {
        let repo = Arc::new(SlowPlayerReads(InMemoryTableRepository::new()));
        let manager = Arc::new(TableManager::new(repo.clone(), ManagerConfig::default()));
        let record = manager.create_table(TableConfig::default()).await.unwrap();
        let table_id = record.id;

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.seat_player(table_id, 1, 1, 10_000).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let close = tokio::spawn({
            let manager = manager.clone();
            async move { manager.close_table(table_id).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = manager.seat_player(table_id, 2, 1, 10_000).await;
        assert!(matches!(
            second,
            Err(TableError::Game(GameError::SeatTaken(1)))
        ));
        assert!(first.await.unwrap().is_ok());
        assert!(close.await.unwrap().is_ok());

        let seated: Vec<_> = repo
            .load_players(table_id)
            .await
            .unwrap()
            .iter()
            .map(|p| (p.user_id, p.seat_number))
            .collect();
        assert_eq!(seated, vec![(1, 1)]);
        assert_eq!(manager.active_table_count().await, 1);
    }

    #[tokio::test]
    async fn test_load_existing_tables() {
        let repo = Arc::new(InMemoryTableRepository::new());
        for _ in 0..3 {
            service::create_table(repo.as_ref(), TableConfig::default())
                .await
                .unwrap();
        }

        let manager = TableManager::new(repo, ManagerConfig::default());
        assert_eq!(manager.load_existing_tables().await.unwrap(), 3);
        assert_eq!(manager.load_existing_tables().await.unwrap(), 0);
        assert_eq!(manager.list_tables().await.unwrap().len(), 3);
    }
}
